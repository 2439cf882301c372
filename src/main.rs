// GUI-subsystem binary: no console window on Windows.
#![windows_subsystem = "windows"]

use eframe::egui;
use maskview::app::MaskViewApp;
use maskview::{log_err, log_info};
use maskview::settings::AppSettings;

fn main() -> Result<(), eframe::Error> {
    // Initialize session log (overwrites previous session log)
    maskview::logger::init();

    let settings = AppSettings::default();
    log_info!(
        "Starting; brush radius {}, mirror refresh every {:?}",
        settings.default_brush_radius,
        settings.mirror_refresh_interval
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(settings.main_window_size)
            .with_title("Main with 2 Tabs + 2 Mirrors")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let result = eframe::run_native(
        "MaskView",
        options,
        Box::new(move |cc| Box::new(MaskViewApp::new(cc, settings))),
    );
    if let Err(e) = &result {
        log_err!("Event loop exited with error: {}", e);
    }
    result
}
