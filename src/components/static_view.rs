use eframe::egui;
use egui::{Color32, Rect, TextureHandle, TextureOptions, Vec2};

use crate::canvas::FULL_UV;
use crate::io::LoadedImage;

/// Largest size with the aspect ratio of `image` that fits inside `bounds`.
/// Scales up as well as down. Zero when either size is empty.
pub fn fit_keep_aspect(image: Vec2, bounds: Vec2) -> Vec2 {
    if image.x <= 0.0 || image.y <= 0.0 || bounds.x <= 0.0 || bounds.y <= 0.0 {
        return Vec2::ZERO;
    }
    let s = (bounds.x / image.x).min(bounds.y / image.y);
    (image * s).min(bounds)
}

/// `fit_keep_aspect` placed in the centre of `bounds`.
pub fn fit_rect(image: Vec2, bounds: Rect) -> Rect {
    Rect::from_center_size(bounds.center(), fit_keep_aspect(image, bounds.size()))
}

/// The second, non-editable image: decoded pixels are dropped after upload.
#[derive(Clone)]
pub struct StaticPicture {
    pub name: String,
    pub size: Vec2,
    pub texture: TextureHandle,
}

impl StaticPicture {
    pub fn upload(ctx: &egui::Context, image: &LoadedImage) -> Self {
        let color = egui::ColorImage::from_rgba_unmultiplied(image.size(), image.pixels.as_raw());
        Self {
            name: image.name(),
            size: Vec2::new(image.width() as f32, image.height() as f32),
            texture: ctx.load_texture(format!("static-{}", image.id), color, TextureOptions::LINEAR),
        }
    }

    /// Draw centred in `bounds`, aspect preserved.
    pub fn paint(&self, painter: &egui::Painter, bounds: Rect) -> Rect {
        let rect = fit_rect(self.size, bounds);
        painter.image(self.texture.id(), rect, FULL_UV, Color32::WHITE);
        rect
    }
}

/// The "Static" tab: one image fitted into the tab area.
#[derive(Default)]
pub struct StaticTab {
    picture: Option<StaticPicture>,
}

impl StaticTab {
    pub const PLACEHOLDER: &'static str = "No image loaded yet";

    pub fn picture(&self) -> Option<&StaticPicture> {
        self.picture.as_ref()
    }

    pub fn set_picture(&mut self, picture: StaticPicture) {
        self.picture = Some(picture);
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        match &self.picture {
            Some(picture) => {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                picture.paint(ui.painter(), rect);
            }
            None => {
                ui.centered_and_justified(|ui| {
                    ui.label(Self::PLACEHOLDER);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    #[test]
    fn fit_preserves_aspect_and_stays_inside() {
        let images = [
            Vec2::new(1920.0, 1080.0),
            Vec2::new(3.0, 7.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(4000.0, 17.0),
        ];
        let bounds = [
            Vec2::new(640.0, 480.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(333.0, 1001.0),
            Vec2::new(1.0, 5000.0),
        ];
        for image in images {
            for b in bounds {
                let fit = fit_keep_aspect(image, b);
                assert!(fit.x <= b.x && fit.y <= b.y, "{image:?} in {b:?} -> {fit:?}");
                let ratio_in = image.x / image.y;
                let ratio_out = fit.x / fit.y;
                assert!((ratio_in - ratio_out).abs() / ratio_in < 1e-4);
                // One axis is filled
                assert!((fit.x - b.x).abs() < 1e-3 || (fit.y - b.y).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn empty_sizes_fit_to_zero() {
        assert_eq!(fit_keep_aspect(Vec2::ZERO, Vec2::new(5.0, 5.0)), Vec2::ZERO);
        assert_eq!(fit_keep_aspect(Vec2::new(5.0, 5.0), Vec2::new(0.0, 5.0)), Vec2::ZERO);
    }

    #[test]
    fn fit_rect_is_centred() {
        let bounds = Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(200.0, 100.0));
        let r = fit_rect(Vec2::new(50.0, 50.0), bounds);
        assert_eq!(r.size(), Vec2::new(100.0, 100.0));
        assert_eq!(r.center(), bounds.center());
    }

    #[test]
    fn upload_records_size_and_name() {
        let ctx = egui::Context::default();
        let image = LoadedImage::new(
            image::RgbaImage::new(12, 5),
            Some(std::path::PathBuf::from("/tmp/static.png")),
        )
        .unwrap();
        let picture = StaticPicture::upload(&ctx, &image);
        assert_eq!(picture.size, Vec2::new(12.0, 5.0));
        assert_eq!(picture.name, "static.png");
        assert_eq!(picture.texture.size(), [12, 5]);

        let mut tab = StaticTab::default();
        assert!(tab.picture().is_none());
        tab.set_picture(picture);
        assert!(tab.picture().is_some());
    }
}
