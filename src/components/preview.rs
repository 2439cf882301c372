use eframe::egui;
use egui::{Color32, Rect, TextureHandle, Vec2};

use crate::canvas::{FULL_UV, ViewTransform};

/// Translucent copy of the unmasked base image, drawn over the interactive
/// view so the operator can see what lies under the mask.
///
/// It never allocates a response, so every pointer event falls through to the
/// view below. Its transform is a copy of the view's, refreshed on every zoom,
/// pan and mirror refresh.
pub struct PreviewView {
    transform: ViewTransform,
    opacity: f32,
}

impl PreviewView {
    pub fn new(opacity: f32) -> Self {
        Self {
            transform: ViewTransform::default(),
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    pub fn transform(&self) -> &ViewTransform {
        &self.transform
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn sync_from(&mut self, view: &ViewTransform) {
        self.transform = *view;
    }

    /// Whether the preview is registered with `view`.
    pub fn in_sync_with(&self, view: &ViewTransform) -> bool {
        self.transform == *view
    }

    pub fn tint(&self) -> Color32 {
        Color32::from_white_alpha((self.opacity * 255.0).round() as u8)
    }

    /// Paint into the same rectangle the interactive view occupies.
    pub fn paint(&self, painter: &egui::Painter, view_rect: Rect, texture: &TextureHandle, image_size: Vec2) {
        let image_rect = self.transform.image_rect(view_rect, image_size);
        painter.image(texture.id(), image_rect, FULL_UV, self.tint());
    }
}
