use eframe::egui;
use egui::{Color32, ColorImage, CursorIcon, Pos2, Rect, TextureHandle, TextureOptions, Vec2};
use std::ops::RangeInclusive;
use uuid::Uuid;

use crate::components::preview::PreviewView;
use crate::components::tools::ToolMode;
use crate::io::LoadedImage;
use crate::ops::brush::Overlay;
use crate::settings::AppSettings;

/// Full-texture UV rectangle.
pub const FULL_UV: Rect = Rect {
    min: Pos2::ZERO,
    max: Pos2 { x: 1.0, y: 1.0 },
};

// ============================================================================
// VIEW TRANSFORM
// ============================================================================

/// Scale + translate from scene (image pixel) space to view space.
///
/// View space is relative to the top-left of the view rectangle, so the
/// transform survives the view being moved around by layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub sx: f32,
    pub sy: f32,
    /// View-space position of the scene origin.
    pub offset: Vec2,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewTransform {
    /// Uniform scale that shows the whole image, centred, aspect preserved.
    pub fn fit(image_size: Vec2, view_size: Vec2) -> Self {
        if image_size.x <= 0.0 || image_size.y <= 0.0 || view_size.x <= 0.0 || view_size.y <= 0.0 {
            return Self::default();
        }
        let s = (view_size.x / image_size.x).min(view_size.y / image_size.y);
        Self {
            sx: s,
            sy: s,
            offset: (view_size - image_size * s) * 0.5,
        }
    }

    pub fn map_to_scene(&self, view_pos: Pos2) -> Pos2 {
        Pos2::new(
            (view_pos.x - self.offset.x) / self.sx,
            (view_pos.y - self.offset.y) / self.sy,
        )
    }

    pub fn map_from_scene(&self, scene_pos: Pos2) -> Pos2 {
        Pos2::new(
            scene_pos.x * self.sx + self.offset.x,
            scene_pos.y * self.sy + self.offset.y,
        )
    }

    /// Average of the x/y scale components.
    pub fn mean_scale(&self) -> f32 {
        (self.sx + self.sy) / 2.0
    }

    /// Scale by `factor` keeping the scene point under `anchor` in place:
    /// record the scene point, scale, then translate by the difference.
    ///
    /// The resulting scale stays inside `limits`. A scale that already lies
    /// outside them (a fit of a very large image) may only move back toward
    /// the range. Returns the factor actually applied.
    pub fn zoom_around_screen_point(
        &mut self,
        factor: f32,
        anchor: Pos2,
        limits: &RangeInclusive<f32>,
    ) -> f32 {
        let old = self.mean_scale();
        if !old.is_finite() || old <= 0.0 || !factor.is_finite() || factor <= 0.0 {
            return 1.0;
        }
        let lo = limits.start().min(old);
        let hi = limits.end().max(old);
        let actual_factor = (old * factor).clamp(lo, hi) / old;
        if actual_factor == 1.0 {
            return 1.0;
        }
        let before = self.map_to_scene(anchor);
        self.sx *= actual_factor;
        self.sy *= actual_factor;
        let drifted = self.map_from_scene(before);
        self.offset += anchor - drifted;
        actual_factor
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Screen rectangle covered by an image of `image_size` inside `view_rect`.
    pub fn image_rect(&self, view_rect: Rect, image_size: Vec2) -> Rect {
        let min = view_rect.min + self.offset;
        Rect::from_min_size(min, Vec2::new(image_size.x * self.sx, image_size.y * self.sy))
    }
}

/// On-screen radius of the brush glyph: the brush radius in image pixels
/// times the current zoom, never below one pixel.
pub fn cursor_screen_radius(brush_radius: u32, transform: &ViewTransform) -> f32 {
    ((brush_radius as f32 * transform.mean_scale()) as i32).max(1) as f32
}

// ============================================================================
// SCROLL BARS
// ============================================================================

/// Thickness of the view's scroll bars.
pub const SCROLL_BAR_WIDTH: f32 = 12.0;
const MIN_HANDLE_LEN: f32 = 16.0;

/// Scroll range along one axis, in view-local points. The range spans the
/// image and the visible window, so a view panned off the image can always
/// scroll back to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollAxis {
    pub min: f32,
    pub max: f32,
    pub view_len: f32,
}

impl ScrollAxis {
    /// `None` when the image already fits inside the view on this axis.
    pub fn new(image_start: f32, image_len: f32, view_len: f32) -> Option<Self> {
        if view_len <= 0.0 || !image_start.is_finite() || !image_len.is_finite() {
            return None;
        }
        let min = image_start.min(0.0);
        let max = (image_start + image_len).max(view_len);
        if max - min <= view_len + 0.5 {
            return None;
        }
        Some(Self { min, max, view_len })
    }

    pub fn extent(&self) -> f32 {
        self.max - self.min
    }

    /// Start and length of the handle on a track `track_len` long.
    pub fn handle(&self, track_len: f32) -> (f32, f32) {
        let scale = track_len / self.extent();
        let len = (self.view_len * scale).max(MIN_HANDLE_LEN.min(track_len));
        let start = (-self.min * scale).clamp(0.0, (track_len - len).max(0.0));
        (start, len)
    }

    /// Offset change for dragging the handle `drag` points along the track.
    /// The visible window never leaves the scroll range.
    pub fn offset_delta(&self, drag: f32, track_len: f32) -> f32 {
        if track_len <= 0.0 {
            return 0.0;
        }
        let shift = (drag * self.extent() / track_len).clamp(self.min, self.max - self.view_len);
        -shift
    }
}

// ============================================================================
// TEXTURES
// ============================================================================

/// GPU copies of the interactive tab's base image and overlay.
#[derive(Default)]
pub struct ViewTextures {
    image_id: Option<Uuid>,
    base: Option<TextureHandle>,
    overlay: Option<TextureHandle>,
}

impl ViewTextures {
    /// Image the textures were uploaded from.
    pub fn image_id(&self) -> Option<Uuid> {
        self.image_id
    }

    pub fn base(&self) -> Option<&TextureHandle> {
        self.base.as_ref()
    }

    pub fn overlay(&self) -> Option<&TextureHandle> {
        self.overlay.as_ref()
    }

    /// Bring the textures up to date. A new image id re-uploads both;
    /// otherwise only the overlay's dirty region is sent.
    pub fn sync(&mut self, ctx: &egui::Context, base: &LoadedImage, overlay: &mut Overlay) {
        if self.image_id != Some(base.id) {
            let base_img = ColorImage::from_rgba_unmultiplied(base.size(), base.pixels.as_raw());
            self.base = Some(ctx.load_texture(
                format!("base-{}", base.id),
                base_img,
                TextureOptions::LINEAR,
            ));
            let (w, h) = overlay.dimensions();
            let overlay_img = ColorImage::from_rgba_unmultiplied(
                [w as usize, h as usize],
                overlay.pixels().as_raw(),
            );
            self.overlay = Some(ctx.load_texture(
                format!("overlay-{}", base.id),
                overlay_img,
                TextureOptions::LINEAR,
            ));
            self.image_id = Some(base.id);
            overlay.take_dirty();
            return;
        }

        if let Some(rect) = overlay.take_dirty()
            && let Some(tex) = self.overlay.as_mut()
        {
            let patch = ColorImage::from_rgba_unmultiplied(
                [rect.width() as usize, rect.height() as usize],
                &overlay.region_rgba(rect),
            );
            tex.set_partial([rect.x0 as usize, rect.y0 as usize], patch, TextureOptions::LINEAR);
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// PRIMARY VIEW
// ============================================================================

/// What one frame of input did to the view. The main window turns these into
/// mirror refreshes and interaction timer changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanvasEvents {
    pub interaction_started: bool,
    pub interaction_ended: bool,
    pub stroke_applied: bool,
    pub zoomed: bool,
    pub panned: bool,
    /// Moved by a scroll bar rather than a press on the view.
    pub scrolled: bool,
}

impl CanvasEvents {
    pub fn merge(&mut self, other: CanvasEvents) {
        self.interaction_started |= other.interaction_started;
        self.interaction_ended |= other.interaction_ended;
        self.stroke_applied |= other.stroke_applied;
        self.zoomed |= other.zoomed;
        self.panned |= other.panned;
        self.scrolled |= other.scrolled;
    }

    /// Whether the mirror should get a fresh snapshot this frame.
    pub fn wants_mirror_update(&self) -> bool {
        self.stroke_applied || self.zoomed || self.scrolled || self.interaction_ended
    }
}

/// The interactive view: base image, overlay mask, zoom/pan and brush input.
pub struct Canvas {
    pub transform: ViewTransform,
    tool: ToolMode,
    brush_radius: u32,
    zoom_step: f32,
    zoom_range: RangeInclusive<f32>,
    cursor_color: Color32,
    pub last_canvas_rect: Option<Rect>,
    /// Set on image load; applied once the view rectangle is known.
    pending_fit: Option<Vec2>,
    /// Left button went down on the view and has not come up yet.
    pressing: bool,
    /// Image pixel of the previous brush stamp in the current stroke.
    last_stamp: Option<(i32, i32)>,
}

impl Canvas {
    pub fn new(settings: &AppSettings) -> Self {
        Self {
            transform: ViewTransform::default(),
            tool: ToolMode::None,
            brush_radius: settings.default_brush_radius,
            zoom_step: settings.zoom_step,
            zoom_range: settings.zoom_range.clone(),
            cursor_color: settings.cursor_color,
            last_canvas_rect: None,
            pending_fit: None,
            pressing: false,
            last_stamp: None,
        }
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn set_tool(&mut self, tool: ToolMode) {
        self.tool = tool;
        self.last_stamp = None;
    }

    pub fn brush_radius(&self) -> u32 {
        self.brush_radius
    }

    pub fn set_brush_radius(&mut self, radius: u32) {
        self.brush_radius = radius.max(1);
    }

    /// Hand-drag panning is only available without a brush tool.
    pub fn drag_pans(&self) -> bool {
        !self.tool.is_brush()
    }

    pub fn is_pressing(&self) -> bool {
        self.pressing
    }

    /// Fit `image_size` into the view now if the view has been laid out,
    /// otherwise on the next frame.
    pub fn fit_in_view(&mut self, image_size: Vec2) {
        match self.last_canvas_rect {
            Some(rect) if rect.width() > 0.0 && rect.height() > 0.0 => {
                self.transform = ViewTransform::fit(image_size, rect.size());
                self.pending_fit = None;
            }
            _ => self.pending_fit = Some(image_size),
        }
    }

    /// View-local position to overlay pixel, truncated toward zero.
    pub fn screen_to_canvas(&self, view_pos: Pos2) -> (i32, i32) {
        let scene = self.transform.map_to_scene(view_pos);
        (scene.x as i32, scene.y as i32)
    }

    // ---- input handlers (view-local positions) ----

    pub fn on_wheel(&mut self, view_pos: Pos2, zoom_in: bool) -> CanvasEvents {
        if self.tool.is_brush() {
            return CanvasEvents::default();
        }
        let factor = if zoom_in { self.zoom_step } else { 1.0 / self.zoom_step };
        let applied = self
            .transform
            .zoom_around_screen_point(factor, view_pos, &self.zoom_range);
        CanvasEvents {
            zoomed: applied != 1.0,
            ..Default::default()
        }
    }

    pub fn on_press(&mut self, view_pos: Pos2, overlay: Option<&mut Overlay>) -> CanvasEvents {
        self.pressing = true;
        let mut events = CanvasEvents {
            interaction_started: true,
            ..Default::default()
        };
        if let Some(mode) = self.tool.composition()
            && let Some(overlay) = overlay
        {
            let (x, y) = self.screen_to_canvas(view_pos);
            overlay.stamp(x, y, self.brush_radius, mode);
            self.last_stamp = Some((x, y));
            events.stroke_applied = true;
        }
        events
    }

    pub fn on_drag(&mut self, view_pos: Pos2, delta: Vec2, overlay: Option<&mut Overlay>) -> CanvasEvents {
        if !self.pressing {
            return CanvasEvents::default();
        }
        match self.tool.composition() {
            None => {
                if delta == Vec2::ZERO {
                    return CanvasEvents::default();
                }
                self.transform.pan_by(delta);
                CanvasEvents {
                    panned: true,
                    ..Default::default()
                }
            }
            Some(mode) => {
                let Some(overlay) = overlay else {
                    return CanvasEvents::default();
                };
                let target = self.screen_to_canvas(view_pos);
                match self.last_stamp {
                    Some(prev) if prev == target => return CanvasEvents::default(),
                    Some(prev) => overlay.stroke(prev, target, self.brush_radius, mode),
                    None => overlay.stamp(target.0, target.1, self.brush_radius, mode),
                }
                self.last_stamp = Some(target);
                CanvasEvents {
                    stroke_applied: true,
                    ..Default::default()
                }
            }
        }
    }

    /// Scroll-bar movement: shifts the view whatever tool is active.
    pub fn scroll_by(&mut self, delta: Vec2) -> CanvasEvents {
        if delta == Vec2::ZERO {
            return CanvasEvents::default();
        }
        self.transform.pan_by(delta);
        CanvasEvents {
            scrolled: true,
            ..Default::default()
        }
    }

    pub fn on_release(&mut self) -> CanvasEvents {
        if !self.pressing {
            return CanvasEvents::default();
        }
        self.pressing = false;
        self.last_stamp = None;
        CanvasEvents {
            interaction_ended: true,
            ..Default::default()
        }
    }

    // ---- frame ----

    /// Lay out, handle input and paint the view. `preview` is drawn on top of
    /// the masked image and re-synced whenever the transform moves.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        image: Option<&LoadedImage>,
        mut overlay: Option<&mut Overlay>,
        textures: &mut ViewTextures,
        preview: &mut PreviewView,
    ) -> CanvasEvents {
        let (full_rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        let canvas_rect = Rect::from_min_max(
            full_rect.min,
            (full_rect.max - Vec2::splat(SCROLL_BAR_WIDTH)).max(full_rect.min),
        );
        let sense = egui::Sense::click_and_drag().union(egui::Sense::hover());
        let response = ui.interact(canvas_rect, ui.id().with("view"), sense);
        let painter = ui.painter_at(canvas_rect);
        let bar_painter = ui.painter_at(full_rect);
        self.last_canvas_rect = Some(canvas_rect);

        if let Some(size) = self.pending_fit {
            self.fit_in_view(size);
            preview.sync_from(&self.transform);
        }

        let mut events = CanvasEvents::default();
        let to_local = |p: Pos2| (p - canvas_rect.min).to_pos2();
        let (hover_pos, interact_pos, pressed, released, down, delta, scrolls) = ui.input(|i| {
            let scrolls: Vec<f32> = i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Scroll(d) if d.y != 0.0 => Some(d.y),
                    _ => None,
                })
                .collect();
            (
                i.pointer.hover_pos(),
                i.pointer.interact_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.primary_down(),
                i.pointer.delta(),
                scrolls,
            )
        });

        if response.hovered()
            && let Some(pos) = hover_pos
        {
            for notch in scrolls {
                events.merge(self.on_wheel(to_local(pos), notch > 0.0));
            }
        }

        if pressed
            && response.hovered()
            && let Some(pos) = interact_pos
        {
            events.merge(self.on_press(to_local(pos), overlay.as_deref_mut()));
        } else if self.pressing
            && down
            && let Some(pos) = interact_pos
        {
            events.merge(self.on_drag(to_local(pos), delta, overlay.as_deref_mut()));
        }

        if released || (self.pressing && !down) {
            events.merge(self.on_release());
        }

        bar_painter.rect_filled(full_rect, 0.0, ui.visuals().faint_bg_color);
        if let Some(image) = image {
            let image_size = Vec2::new(image.width() as f32, image.height() as f32);
            events.merge(self.show_scroll_bars(ui, &bar_painter, canvas_rect, image_size));
        }

        if events.zoomed || events.panned || events.scrolled {
            preview.sync_from(&self.transform);
        }

        // ---- paint ----
        painter.rect_filled(canvas_rect, 0.0, ui.visuals().extreme_bg_color);

        if let (Some(image), Some(overlay)) = (image, overlay) {
            textures.sync(ui.ctx(), image, overlay);
            let image_size = Vec2::new(image.width() as f32, image.height() as f32);
            let image_rect = self.transform.image_rect(canvas_rect, image_size);
            if let Some(base) = textures.base() {
                painter.image(base.id(), image_rect, FULL_UV, Color32::WHITE);
            }
            if let Some(mask) = textures.overlay() {
                painter.image(mask.id(), image_rect, FULL_UV, Color32::WHITE);
            }
            if let Some(base) = textures.base() {
                preview.paint(&painter, canvas_rect, base, image_size);
            }
        }

        // ---- cursor ----
        if response.hovered() {
            if self.tool.is_brush() {
                ui.ctx().set_cursor_icon(CursorIcon::None);
                if let Some(pos) = hover_pos {
                    let r = cursor_screen_radius(self.brush_radius, &self.transform);
                    painter.circle_filled(pos, r, self.cursor_color);
                }
            } else if self.pressing {
                ui.ctx().set_cursor_icon(CursorIcon::Grabbing);
            } else {
                ui.ctx().set_cursor_icon(CursorIcon::Grab);
            }
        }

        events
    }

    /// Horizontal and vertical bars along the bottom and right edges of the
    /// view, shown only on axes where the image does not fit.
    fn show_scroll_bars(
        &mut self,
        ui: &egui::Ui,
        painter: &egui::Painter,
        canvas_rect: Rect,
        image_size: Vec2,
    ) -> CanvasEvents {
        let local = self
            .transform
            .image_rect(Rect::from_min_size(Pos2::ZERO, canvas_rect.size()), image_size);
        let bars = [
            (
                ScrollAxis::new(local.min.x, local.width(), canvas_rect.width()),
                Rect::from_min_size(
                    canvas_rect.left_bottom(),
                    Vec2::new(canvas_rect.width(), SCROLL_BAR_WIDTH),
                ),
                Vec2::X,
            ),
            (
                ScrollAxis::new(local.min.y, local.height(), canvas_rect.height()),
                Rect::from_min_size(
                    canvas_rect.right_top(),
                    Vec2::new(SCROLL_BAR_WIDTH, canvas_rect.height()),
                ),
                Vec2::Y,
            ),
        ];

        let mut events = CanvasEvents::default();
        for (i, (axis, track, dir)) in bars.into_iter().enumerate() {
            let Some(axis) = axis else {
                continue;
            };
            let response = ui.interact(track, ui.id().with(("scroll_bar", i)), egui::Sense::drag());
            let track_len = track.size().dot(dir);
            if response.dragged() {
                let delta = axis.offset_delta(response.drag_delta().dot(dir), track_len);
                events.merge(self.scroll_by(dir * delta));
            }

            let (start, len) = axis.handle(track_len);
            let across = Vec2::splat(SCROLL_BAR_WIDTH) - dir * SCROLL_BAR_WIDTH;
            let handle = Rect::from_min_size(track.min + dir * start, dir * len + across);
            painter.rect_filled(handle.shrink(2.0), 3.0, ui.style().interact(&response).bg_fill);
        }
        events
    }
}
