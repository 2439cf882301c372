//! Application tunables.
//!
//! Built once at startup and handed to the components that need them.
//! Nothing here is read from or written to disk.

use std::ops::RangeInclusive;
use std::time::Duration;

use eframe::egui::Color32;

pub struct AppSettings {
    /// Brush radius in image pixels when the app starts.
    pub default_brush_radius: u32,
    /// Slider bounds for the brush radius.
    pub brush_radius_range: RangeInclusive<u32>,
    /// Scale factor applied per wheel notch (inverse when zooming out).
    pub zoom_step: f32,
    /// Bounds for the view scale reachable by wheel zoom.
    pub zoom_range: RangeInclusive<f32>,
    /// Mirror refresh period while an interaction is open.
    pub mirror_refresh_interval: Duration,
    /// Opacity of the preview image drawn over the masked view.
    pub preview_opacity: f32,
    /// Initial inner size of the main window.
    pub main_window_size: [f32; 2],
    /// Initial inner size of both mirror windows.
    pub mirror_window_size: [f32; 2],
    /// Fill of the circular brush cursor.
    pub cursor_color: Color32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_brush_radius: 20,
            brush_radius_range: 1..=200,
            zoom_step: 1.2,
            zoom_range: 0.1..=100.0,
            mirror_refresh_interval: Duration::from_millis(50),
            preview_opacity: 0.3,
            main_window_size: [1200.0, 800.0],
            mirror_window_size: [640.0, 480.0],
            cursor_color: Color32::from_rgba_unmultiplied(255, 255, 255, 100),
        }
    }
}

impl AppSettings {
    /// Clamp a requested brush radius into the slider range.
    pub fn clamp_brush_radius(&self, radius: u32) -> u32 {
        radius.clamp(*self.brush_radius_range.start(), *self.brush_radius_range.end())
    }
}
