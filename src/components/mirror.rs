//! Secondary top-level windows that mirror the main window's content.
//!
//! Both mirrors are opened at startup and cannot be closed by the user while
//! the main window lives. The main window detaches them during shutdown, after
//! which a close request is honoured.

use eframe::egui;
use egui::{Color32, Rect, Vec2, ViewportBuilder, ViewportClass, ViewportCommand, ViewportId};
use uuid::Uuid;

use crate::canvas::{FULL_UV, ViewTextures, ViewTransform};
use crate::components::static_view::StaticPicture;

/// Ownership state of a mirror window relative to the main window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorLifecycle {
    /// Main window is alive; close requests are refused.
    Attached,
    /// Main window is shutting down; the next close request is honoured.
    Detached,
    Closed,
}

impl MirrorLifecycle {
    /// Apply a user close request. Returns true if the window may close.
    pub fn request_close(&mut self) -> bool {
        match self {
            MirrorLifecycle::Attached => false,
            MirrorLifecycle::Detached | MirrorLifecycle::Closed => {
                *self = MirrorLifecycle::Closed;
                true
            }
        }
    }

    pub fn detach(&mut self) {
        if *self == MirrorLifecycle::Attached {
            *self = MirrorLifecycle::Detached;
        }
    }

    pub fn is_visible(self) -> bool {
        self != MirrorLifecycle::Closed
    }
}

/// The state shared by both mirror kinds: where they live and whether they
/// may close.
struct MirrorShell {
    viewport_id: ViewportId,
    title: &'static str,
    size: [f32; 2],
    lifecycle: MirrorLifecycle,
}

impl MirrorShell {
    fn new(title: &'static str, size: [f32; 2]) -> Self {
        Self {
            viewport_id: ViewportId::from_hash_of(title),
            title,
            size,
            lifecycle: MirrorLifecycle::Attached,
        }
    }

    /// Detach and ask the OS window to close.
    fn shut_down(&mut self, ctx: &egui::Context) {
        self.lifecycle.detach();
        if self.lifecycle.request_close() {
            ctx.send_viewport_cmd_to(self.viewport_id, ViewportCommand::Close);
        }
    }

    /// Run `add_contents` inside the mirror's own viewport (or an embedded
    /// window when the backend has only one).
    fn show(&mut self, ctx: &egui::Context, add_contents: impl FnOnce(&mut egui::Ui)) {
        if !self.lifecycle.is_visible() {
            return;
        }
        let builder = ViewportBuilder::default()
            .with_title(self.title)
            .with_inner_size(self.size);
        let lifecycle = &mut self.lifecycle;
        let (title, size) = (self.title, self.size);
        ctx.show_viewport_immediate(self.viewport_id, builder, |ctx, class| {
            if matches!(class, ViewportClass::Embedded) {
                egui::Window::new(title)
                    .default_size(Vec2::from(size) * 0.5)
                    .show(ctx, |ui| add_contents(ui));
                return;
            }

            if ctx.input(|i| i.viewport().close_requested()) && !lifecycle.request_close() {
                ctx.send_viewport_cmd(ViewportCommand::CancelClose);
            }

            egui::CentralPanel::default()
                .frame(egui::Frame::none().fill(Color32::BLACK))
                .show(ctx, |ui| add_contents(ui));
        });
    }
}

// ============================================================================
// INTERACTIVE MIRROR
// ============================================================================

/// What the interactive view looked like at the last refresh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MirrorSnapshot {
    pub image_id: Option<Uuid>,
    pub image_size: Vec2,
    pub transform: ViewTransform,
    /// Size of the interactive view when the snapshot was taken.
    pub view_size: Vec2,
}

impl MirrorSnapshot {
    /// Whether `textures` still hold the image this snapshot was taken of.
    pub fn shows(&self, textures: &ViewTextures) -> bool {
        self.image_id.is_some() && self.image_id == textures.image_id()
    }
}

/// Live copy of the interactive view, stretched to fill its own window.
pub struct MirrorWindow {
    shell: MirrorShell,
    snapshot: Option<MirrorSnapshot>,
    snapshots_received: u64,
}

impl MirrorWindow {
    pub const PLACEHOLDER: &'static str = "Mirror content here.";

    pub fn new(size: [f32; 2]) -> Self {
        Self {
            shell: MirrorShell::new("Interactive Mirror", size),
            snapshot: None,
            snapshots_received: 0,
        }
    }

    pub fn lifecycle(&self) -> MirrorLifecycle {
        self.shell.lifecycle
    }

    pub fn snapshot(&self) -> Option<&MirrorSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn snapshots_received(&self) -> u64 {
        self.snapshots_received
    }

    pub fn set_snapshot(&mut self, snapshot: MirrorSnapshot) {
        self.snapshot = Some(snapshot);
        self.snapshots_received += 1;
    }

    pub fn shut_down(&mut self, ctx: &egui::Context) {
        self.shell.shut_down(ctx);
    }

    pub fn show(&mut self, ctx: &egui::Context, textures: &ViewTextures) {
        let snapshot = self.snapshot;
        self.shell.show(ctx, |ui| {
            let Some(snap) = snapshot.filter(|s| s.view_size.x > 0.0 && s.view_size.y > 0.0) else {
                ui.centered_and_justified(|ui| {
                    ui.label(Self::PLACEHOLDER);
                });
                return;
            };
            let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
            if !snap.shows(textures) {
                return;
            }
            let painter = ui.painter_at(rect);
            let image_rect = snapshot_image_rect(&snap, rect);
            if let Some(base) = textures.base() {
                painter.image(base.id(), image_rect, FULL_UV, Color32::WHITE);
            }
            if let Some(mask) = textures.overlay() {
                painter.image(mask.id(), image_rect, FULL_UV, Color32::WHITE);
            }
        });
    }
}

/// Where the image lands when the snapshot's view is stretched over `target`.
pub fn snapshot_image_rect(snap: &MirrorSnapshot, target: Rect) -> Rect {
    let stretch = Vec2::new(
        target.width() / snap.view_size.x,
        target.height() / snap.view_size.y,
    );
    let view_local = Rect::from_min_size(
        snap.transform.offset.to_pos2(),
        Vec2::new(snap.image_size.x * snap.transform.sx, snap.image_size.y * snap.transform.sy),
    );
    Rect::from_min_max(
        target.min + view_local.min.to_vec2() * stretch,
        target.min + view_local.max.to_vec2() * stretch,
    )
}

// ============================================================================
// STATIC MIRROR
// ============================================================================

/// Holds the untouched static image, refitted to its window every frame.
pub struct StaticMirrorWindow {
    shell: MirrorShell,
    picture: Option<StaticPicture>,
}

impl StaticMirrorWindow {
    pub fn new(size: [f32; 2]) -> Self {
        Self {
            shell: MirrorShell::new("Static Mirror", size),
            picture: None,
        }
    }

    pub fn lifecycle(&self) -> MirrorLifecycle {
        self.shell.lifecycle
    }

    pub fn picture(&self) -> Option<&StaticPicture> {
        self.picture.as_ref()
    }

    pub fn set_image(&mut self, picture: StaticPicture) {
        self.picture = Some(picture);
    }

    pub fn shut_down(&mut self, ctx: &egui::Context) {
        self.shell.shut_down(ctx);
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let picture = self.picture.as_ref();
        self.shell.show(ctx, |ui| {
            if let Some(picture) = picture {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                picture.paint(&ui.painter_at(rect), rect);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    #[test]
    fn attached_mirror_refuses_to_close() {
        let mut l = MirrorLifecycle::Attached;
        assert!(!l.request_close());
        assert!(!l.request_close());
        assert_eq!(l, MirrorLifecycle::Attached);
        assert!(l.is_visible());
    }

    #[test]
    fn detached_mirror_closes() {
        let mut l = MirrorLifecycle::Attached;
        l.detach();
        assert_eq!(l, MirrorLifecycle::Detached);
        assert!(l.request_close());
        assert_eq!(l, MirrorLifecycle::Closed);
        assert!(!l.is_visible());
        // Detaching a closed window does not resurrect it
        l.detach();
        assert_eq!(l, MirrorLifecycle::Closed);
    }

    #[test]
    fn shut_down_closes_both_kinds() {
        let ctx = egui::Context::default();
        let mut m = MirrorWindow::new([100.0, 100.0]);
        let mut s = StaticMirrorWindow::new([100.0, 100.0]);
        m.shut_down(&ctx);
        s.shut_down(&ctx);
        assert_eq!(m.lifecycle(), MirrorLifecycle::Closed);
        assert_eq!(s.lifecycle(), MirrorLifecycle::Closed);
    }

    #[test]
    fn snapshots_are_counted() {
        let mut m = MirrorWindow::new([100.0, 100.0]);
        assert!(m.snapshot().is_none());
        let snap = MirrorSnapshot {
            image_id: None,
            image_size: Vec2::new(10.0, 10.0),
            transform: ViewTransform::default(),
            view_size: Vec2::new(100.0, 100.0),
        };
        m.set_snapshot(snap);
        m.set_snapshot(snap);
        assert_eq!(m.snapshots_received(), 2);
        assert_eq!(m.snapshot().map(|s| s.view_size), Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn snapshot_is_stretched_to_the_mirror() {
        let snap = MirrorSnapshot {
            image_id: None,
            image_size: Vec2::new(50.0, 20.0),
            transform: ViewTransform {
                sx: 2.0,
                sy: 2.0,
                offset: Vec2::new(10.0, 5.0),
            },
            view_size: Vec2::new(200.0, 100.0),
        };
        let target = Rect::from_min_size(Pos2::new(0.0, 0.0), Vec2::new(400.0, 50.0));
        let r = snapshot_image_rect(&snap, target);
        assert_eq!(r.min, Pos2::new(20.0, 2.5));
        assert_eq!(r.max, Pos2::new(220.0, 22.5));
    }

    #[test]
    fn snapshot_draws_only_its_own_image() {
        let ctx = egui::Context::default();
        let first = crate::io::LoadedImage::new(image::RgbaImage::new(4, 4), None).unwrap();
        let second = crate::io::LoadedImage::new(image::RgbaImage::new(4, 4), None).unwrap();
        let mut overlay = crate::ops::brush::Overlay::new_opaque(4, 4);
        let mut textures = ViewTextures::default();

        let snap = MirrorSnapshot {
            image_id: Some(first.id),
            image_size: Vec2::new(4.0, 4.0),
            transform: ViewTransform::default(),
            view_size: Vec2::new(10.0, 10.0),
        };
        assert!(!snap.shows(&textures));
        textures.sync(&ctx, &first, &mut overlay);
        assert!(snap.shows(&textures));
        textures.sync(&ctx, &second, &mut overlay);
        assert!(!snap.shows(&textures));

        let empty = MirrorSnapshot { image_id: None, ..snap };
        assert!(!empty.shows(&ViewTextures::default()));
    }
}
