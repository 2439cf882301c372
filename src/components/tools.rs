use eframe::egui;

use crate::ops::brush::Composition;
use crate::settings::AppSettings;

/// What a left-drag on the interactive view does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ToolMode {
    /// Drag pans, wheel zooms.
    #[default]
    None,
    Erase,
    Paint,
}

impl ToolMode {
    pub fn is_brush(self) -> bool {
        !matches!(self, ToolMode::None)
    }

    /// Brush compositing for this tool; `None` when the tool is not a brush.
    pub fn composition(self) -> Option<Composition> {
        match self {
            ToolMode::None => None,
            ToolMode::Erase => Some(Composition::Clear),
            ToolMode::Paint => Some(Composition::Source),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolMode::None => "Pan / Zoom",
            ToolMode::Erase => "Erase",
            ToolMode::Paint => "Paint",
        }
    }
}

/// Result of one frame of toolbar interaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ToolbarChange {
    pub tool: Option<ToolMode>,
    pub brush_radius: Option<u32>,
}

// ============================================================================
// TOOLBAR
// ============================================================================

/// Erase / Paint toggle buttons plus the brush size slider.
///
/// The two toggles are mutually exclusive; the tool is `None` exactly when
/// neither is checked.
pub struct ToolsPanel {
    erase_checked: bool,
    paint_checked: bool,
    tool: ToolMode,
    pub brush_radius: u32,
}

impl ToolsPanel {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            erase_checked: false,
            paint_checked: false,
            tool: ToolMode::None,
            brush_radius: settings.default_brush_radius,
        }
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn erase_checked(&self) -> bool {
        self.erase_checked
    }

    pub fn paint_checked(&self) -> bool {
        self.paint_checked
    }

    /// The Erase button was clicked and is now `checked`.
    pub fn on_erase_clicked(&mut self, checked: bool) -> ToolMode {
        self.erase_checked = checked;
        if checked {
            self.paint_checked = false;
            self.tool = ToolMode::Erase;
        } else if !self.paint_checked {
            self.tool = ToolMode::None;
        }
        self.tool
    }

    /// The Paint button was clicked and is now `checked`.
    pub fn on_paint_clicked(&mut self, checked: bool) -> ToolMode {
        self.paint_checked = checked;
        if checked {
            self.erase_checked = false;
            self.tool = ToolMode::Paint;
        } else if !self.erase_checked {
            self.tool = ToolMode::None;
        }
        self.tool
    }

    /// Uncheck both toggles (after a new interactive image is loaded).
    pub fn reset_tool(&mut self) {
        self.erase_checked = false;
        self.paint_checked = false;
        self.tool = ToolMode::None;
    }

    /// Toolbar readout of what a drag on the view currently does.
    pub fn status_text(&self) -> String {
        format!("Tool: {}", self.tool.label())
    }

    pub fn show(&mut self, ui: &mut egui::Ui, settings: &AppSettings) -> ToolbarChange {
        let mut change = ToolbarChange::default();
        ui.horizontal(|ui| {
            let mut erase = self.erase_checked;
            if ui.toggle_value(&mut erase, ToolMode::Erase.label()).clicked() {
                change.tool = Some(self.on_erase_clicked(erase));
            }

            let mut paint = self.paint_checked;
            if ui.toggle_value(&mut paint, ToolMode::Paint.label()).clicked() {
                change.tool = Some(self.on_paint_clicked(paint));
            }

            ui.separator();

            let slider = egui::Slider::new(&mut self.brush_radius, settings.brush_radius_range.clone())
                .text("Brush size");
            if ui.add(slider).changed() {
                self.brush_radius = settings.clamp_brush_radius(self.brush_radius);
                change.brush_radius = Some(self.brush_radius);
            }

            ui.separator();
            ui.label(self.status_text());
        });
        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel() -> ToolsPanel {
        ToolsPanel::new(&AppSettings::default())
    }

    fn consistent(p: &ToolsPanel) -> bool {
        let expected = match (p.erase_checked(), p.paint_checked()) {
            (true, false) => ToolMode::Erase,
            (false, true) => ToolMode::Paint,
            (false, false) => ToolMode::None,
            (true, true) => return false,
        };
        p.tool() == expected
    }

    #[test]
    fn erase_then_paint_is_exclusive() {
        let mut p = panel();
        assert_eq!(p.on_erase_clicked(true), ToolMode::Erase);
        assert_eq!(p.on_paint_clicked(true), ToolMode::Paint);
        assert!(!p.erase_checked());
        assert!(p.paint_checked());
        assert_eq!(p.on_erase_clicked(true), ToolMode::Erase);
        assert!(!p.paint_checked());
    }

    #[test]
    fn unchecking_active_tool_returns_to_none() {
        let mut p = panel();
        p.on_erase_clicked(true);
        assert_eq!(p.on_erase_clicked(false), ToolMode::None);
        p.on_paint_clicked(true);
        assert_eq!(p.on_paint_clicked(false), ToolMode::None);
    }

    #[test]
    fn every_click_sequence_stays_consistent() {
        // Exhaustive over all click sequences of length 6
        for seq in 0u32..(1 << 12) {
            let mut p = panel();
            for step in 0..6 {
                let bits = (seq >> (step * 2)) & 0b11;
                match bits {
                    0 => p.on_erase_clicked(!p.erase_checked()),
                    1 => p.on_paint_clicked(!p.paint_checked()),
                    2 => p.on_erase_clicked(true),
                    _ => p.on_paint_clicked(false),
                };
                assert!(consistent(&p), "sequence {seq:#b} broke at step {step}");
            }
        }
    }

    #[test]
    fn reset_clears_both() {
        let mut p = panel();
        p.on_paint_clicked(true);
        p.brush_radius = 77;
        p.reset_tool();
        assert_eq!(p.tool(), ToolMode::None);
        assert!(!p.erase_checked() && !p.paint_checked());
        assert_eq!(p.brush_radius, 77);
    }

    #[test]
    fn brush_tools_map_to_compositions() {
        assert_eq!(ToolMode::None.composition(), None);
        assert_eq!(ToolMode::Erase.composition(), Some(Composition::Clear));
        assert_eq!(ToolMode::Paint.composition(), Some(Composition::Source));
        assert!(!ToolMode::None.is_brush());
    }

    #[test]
    fn status_names_the_active_tool() {
        let mut p = panel();
        assert_eq!(p.status_text(), "Tool: Pan / Zoom");
        p.on_paint_clicked(true);
        assert_eq!(p.status_text(), "Tool: Paint");
        p.on_erase_clicked(true);
        assert_eq!(p.status_text(), "Tool: Erase");
        p.on_erase_clicked(false);
        assert_eq!(p.status_text(), "Tool: Pan / Zoom");
    }
}
