use crate::canvas::{Canvas, CanvasEvents, ViewTextures};
use crate::components::mirror::{MirrorSnapshot, MirrorWindow, StaticMirrorWindow};
use crate::components::preview::PreviewView;
use crate::components::static_view::{StaticPicture, StaticTab};
use crate::components::tools::{ToolMode, ToolsPanel};
use crate::interaction::Interaction;
use crate::io::{FileHandler, LoadedImage};
use crate::ops::brush::Overlay;
use crate::settings::AppSettings;
use eframe::egui;
use egui::Vec2;
use std::path::PathBuf;

/// Which tab of the main window is selected; also decides where an opened
/// image goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Interactive,
    Static,
}

impl Tab {
    pub fn label(self) -> &'static str {
        match self {
            Tab::Interactive => "Interactive",
            Tab::Static => "Static",
        }
    }
}

// ============================================================================
// INTERACTIVE TAB
// ============================================================================

/// Base image, editable overlay, the view showing them and the translucent
/// preview drawn on top.
pub struct InteractiveTab {
    pub image: Option<LoadedImage>,
    pub overlay: Option<Overlay>,
    pub canvas: Canvas,
    pub preview: PreviewView,
    pub textures: ViewTextures,
}

impl InteractiveTab {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            image: None,
            overlay: None,
            canvas: Canvas::new(settings),
            preview: PreviewView::new(settings.preview_opacity),
            textures: ViewTextures::default(),
        }
    }

    /// Replace the base image, start a fresh opaque overlay of the same size,
    /// fit the view and re-register the preview.
    pub fn load(&mut self, image: LoadedImage) {
        let size = Vec2::new(image.width() as f32, image.height() as f32);
        self.overlay = Some(Overlay::new_opaque(image.width(), image.height()));
        self.image = Some(image);
        self.textures.clear();
        self.canvas.fit_in_view(size);
        self.preview.sync_from(&self.canvas.transform);
    }

    pub fn snapshot(&self) -> MirrorSnapshot {
        MirrorSnapshot {
            image_id: self.image.as_ref().map(|i| i.id),
            image_size: self
                .image
                .as_ref()
                .map(|i| Vec2::new(i.width() as f32, i.height() as f32))
                .unwrap_or(Vec2::ZERO),
            transform: self.canvas.transform,
            view_size: self
                .canvas
                .last_canvas_rect
                .map(|r| r.size())
                .unwrap_or(Vec2::ZERO),
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) -> CanvasEvents {
        self.canvas.show(
            ui,
            self.image.as_ref(),
            self.overlay.as_mut(),
            &mut self.textures,
            &mut self.preview,
        )
    }
}

// ============================================================================
// MAIN WINDOW
// ============================================================================

pub struct MaskViewApp {
    settings: AppSettings,
    file_handler: FileHandler,
    tab: Tab,
    tools_panel: ToolsPanel,
    pub interactive: InteractiveTab,
    pub static_tab: StaticTab,
    interaction: Interaction,
    pub mirror: MirrorWindow,
    pub static_mirror: StaticMirrorWindow,
    shutting_down: bool,
}

impl MaskViewApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        Self::with_settings(settings)
    }

    /// Build the app state without a window (also used by tests).
    pub fn with_settings(settings: AppSettings) -> Self {
        Self {
            file_handler: FileHandler::new(),
            tab: Tab::Interactive,
            tools_panel: ToolsPanel::new(&settings),
            interactive: InteractiveTab::new(&settings),
            static_tab: StaticTab::default(),
            interaction: Interaction::new(settings.mirror_refresh_interval),
            mirror: MirrorWindow::new(settings.mirror_window_size),
            static_mirror: StaticMirrorWindow::new(settings.mirror_window_size),
            shutting_down: false,
            settings,
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn tool(&self) -> ToolMode {
        self.interactive.canvas.tool()
    }

    pub fn tools_panel(&self) -> &ToolsPanel {
        &self.tools_panel
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    // ---- tools ----

    fn apply_tool(&mut self, tool: ToolMode) {
        self.interactive.canvas.set_tool(tool);
    }

    fn apply_brush_radius(&mut self, radius: u32) {
        self.interactive.canvas.set_brush_radius(radius);
    }

    pub fn click_erase(&mut self, checked: bool) {
        let tool = self.tools_panel.on_erase_clicked(checked);
        self.apply_tool(tool);
    }

    pub fn click_paint(&mut self, checked: bool) {
        let tool = self.tools_panel.on_paint_clicked(checked);
        self.apply_tool(tool);
    }

    pub fn set_brush_radius(&mut self, radius: u32) {
        let radius = self.settings.clamp_brush_radius(radius);
        self.tools_panel.brush_radius = radius;
        self.apply_brush_radius(radius);
    }

    // ---- open image ----

    /// File > Open Image...: pick, decode, route to the current tab.
    fn handle_open_file(&mut self, ctx: &egui::Context) {
        if let Some(path) = self.file_handler.pick_image_path() {
            self.open_file_by_path(ctx, path);
        }
    }

    /// Decode `path` and hand it to the active tab. Failures leave every
    /// piece of state untouched.
    pub fn open_file_by_path(&mut self, ctx: &egui::Context, path: PathBuf) {
        match crate::io::load_image(&path) {
            Ok(image) => self.route_image(ctx, image),
            Err(e) => {
                log_warn!("Open aborted for {}: {}", path.display(), e);
            }
        }
    }

    pub fn route_image(&mut self, ctx: &egui::Context, image: LoadedImage) {
        log_info!(
            "Loaded {} ({}x{}) into {} tab",
            image.name(),
            image.width(),
            image.height(),
            self.tab.label()
        );
        match self.tab {
            Tab::Interactive => self.load_interactive_image(image),
            Tab::Static => self.load_static_image(ctx, image),
        }
    }

    pub fn load_interactive_image(&mut self, image: LoadedImage) {
        self.interactive.load(image);
        self.tools_panel.reset_tool();
        self.apply_tool(ToolMode::None);
        self.update_mirror();
    }

    pub fn load_static_image(&mut self, ctx: &egui::Context, image: LoadedImage) {
        let picture = StaticPicture::upload(ctx, &image);
        self.static_tab.set_picture(picture.clone());
        self.static_mirror.set_image(picture);
    }

    // ---- interaction + mirror ----

    /// Push a fresh snapshot to the mirror and re-register the preview.
    pub fn update_mirror(&mut self) {
        self.mirror.set_snapshot(self.interactive.snapshot());
        self.interactive
            .preview
            .sync_from(&self.interactive.canvas.transform);
    }

    /// React to one frame of view input at time `now` (egui seconds).
    pub fn handle_canvas_events(&mut self, events: CanvasEvents, now: f64) {
        if events.interaction_started {
            self.interaction.begin(now);
        }
        if events.wants_mirror_update() {
            self.update_mirror();
        }
        if events.interaction_ended {
            self.interaction.end();
        }
    }

    /// Timer tick; returns true when a refresh was pushed.
    pub fn tick(&mut self, now: f64) -> bool {
        if self.interaction.poll(now) {
            self.update_mirror();
            true
        } else {
            false
        }
    }

    /// Main window is closing: let the mirrors go.
    pub fn shut_down(&mut self, ctx: &egui::Context) {
        if self.shutting_down {
            return;
        }
        self.shutting_down = true;
        log_info!("Main window closing; detaching mirror windows");
        self.mirror.shut_down(ctx);
        self.static_mirror.shut_down(ctx);
    }

    // ---- UI ----

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Image...").clicked() {
                        ui.close_menu();
                        self.handle_open_file(ctx);
                    }
                });
            });
        });
    }

    fn show_toolbar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            let change = self.tools_panel.show(ui, &self.settings);
            if let Some(tool) = change.tool {
                self.apply_tool(tool);
            }
            if let Some(radius) = change.brush_radius {
                self.apply_brush_radius(radius);
            }
            ui.horizontal(|ui| {
                for tab in [Tab::Interactive, Tab::Static] {
                    ui.selectable_value(&mut self.tab, tab, tab.label());
                }
            });
        });
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        // Only the first supported file counts, like a single dialog pick
        if let Some(path) = dropped.into_iter().find(|p| crate::io::is_supported_image(p)) {
            self.open_file_by_path(ctx, path);
        }
    }
}

impl eframe::App for MaskViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.shut_down(ctx);
        }

        self.handle_dropped_files(ctx);
        self.show_menu_bar(ctx);
        self.show_toolbar(ctx);

        let mut events = CanvasEvents::default();
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| match self.tab {
                Tab::Interactive => events = self.interactive.show(ui),
                Tab::Static => self.static_tab.show(ui),
            });

        let now = ctx.input(|i| i.time);
        self.handle_canvas_events(events, now);
        self.tick(now);
        if let Some(left) = self.interaction.timer().remaining(now) {
            ctx.request_repaint_after(left);
        }

        self.mirror.show(ctx, &self.interactive.textures);
        self.static_mirror.show(ctx);
    }
}
