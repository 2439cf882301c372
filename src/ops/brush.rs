// ============================================================================
// OVERLAY MASK + CIRCULAR BRUSH
// ============================================================================
//
// The overlay is a plain RGBA buffer the same size as the base image. It starts
// fully opaque black; the erase brush clears pixels to transparent and the
// paint brush puts opaque black back. There is no blending: a pixel inside the
// brush footprint is overwritten, a pixel outside is untouched.

use image::{Rgba, RgbaImage};

/// Fully opaque black, the colour of an untouched mask pixel.
pub const MASK_OPAQUE: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Fully transparent, the colour of an erased mask pixel.
pub const MASK_CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// How a brush stamp writes into the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composition {
    /// Alpha-clear: every covered pixel becomes fully transparent.
    Clear,
    /// Source-replace with opaque black.
    Source,
}

impl Composition {
    fn pixel(self) -> Rgba<u8> {
        match self {
            Composition::Clear => MASK_CLEAR,
            Composition::Source => MASK_OPAQUE,
        }
    }
}

/// Inclusive-exclusive pixel rectangle: `[x0, x1) × [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    pub fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Bounding box of a radius-`r` circle centred on `(cx, cy)`, clipped to a
/// `width × height` bitmap. `None` when nothing of it lands on the bitmap.
pub fn clipped_circle_bounds(cx: i32, cy: i32, r: u32, width: u32, height: u32) -> Option<PixelRect> {
    let r = r as i64;
    let (cx, cy) = (cx as i64, cy as i64);
    let x0 = (cx - r).max(0);
    let y0 = (cy - r).max(0);
    let x1 = (cx + r).min(width as i64);
    let y1 = (cy + r).min(height as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(PixelRect {
        x0: x0 as u32,
        y0: y0 as u32,
        x1: x1 as u32,
        y1: y1 as u32,
    })
}

/// Whether pixel `(px, py)` is covered by the circle: its centre lies inside
/// the ellipse inscribed in `(cx - r, cy - r, 2r, 2r)`.
#[inline]
pub fn circle_covers(cx: i32, cy: i32, r: u32, px: u32, py: u32) -> bool {
    let dx = px as f64 + 0.5 - cx as f64;
    let dy = py as f64 + 0.5 - cy as f64;
    let r = r as f64;
    dx * dx + dy * dy <= r * r
}

/// Write a filled circle into `img`. Pixels past the bitmap edge are dropped.
/// Returns the touched region, if any.
pub fn stamp_circle(img: &mut RgbaImage, cx: i32, cy: i32, r: u32, mode: Composition) -> Option<PixelRect> {
    let bounds = clipped_circle_bounds(cx, cy, r, img.width(), img.height())?;
    let value = mode.pixel();
    for py in bounds.y0..bounds.y1 {
        for px in bounds.x0..bounds.x1 {
            if circle_covers(cx, cy, r, px, py) {
                img.put_pixel(px, py, value);
            }
        }
    }
    Some(bounds)
}

/// Parameter range `[t0, t1]` of the segment `from + t * d` (`t` in `0..=1`)
/// that lies inside `reach = [x0, y0, x1, y1]`. Liang-Barsky.
fn clip_segment(from: (f64, f64), d: (f64, f64), reach: [f64; 4]) -> Option<(f64, f64)> {
    let [x0, y0, x1, y1] = reach;
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-d.0, from.0 - x0),
        (d.0, x1 - from.0),
        (-d.1, from.1 - y0),
        (d.1, y1 - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// Stamp centres from `from` (exclusive) to `to` (inclusive), no more than
/// `spacing` pixels apart, so a fast drag leaves a continuous trail.
///
/// Only centres inside `reach` (`[x0, y0, x1, y1]`, the area where a stamp
/// can still touch the bitmap) are produced, so the count is bounded by the
/// bitmap size however far apart the endpoints are.
pub fn stroke_points(
    from: (i32, i32),
    to: (i32, i32),
    spacing: u32,
    reach: [f64; 4],
) -> impl Iterator<Item = (i32, i32)> {
    let dx = to.0 as f64 - from.0 as f64;
    let dy = to.1 as f64 - from.1 as f64;
    let dist = (dx * dx + dy * dy).sqrt();
    let steps = ((dist / spacing.max(1) as f64).ceil() as u64).max(1);
    let (first, last) = match clip_segment((from.0 as f64, from.1 as f64), (dx, dy), reach) {
        // One step of slack on both sides; stamps that miss are no-ops
        Some((t0, t1)) => (
            ((t0 * steps as f64).floor() as u64).max(1),
            ((t1 * steps as f64).ceil() as u64).min(steps),
        ),
        None => (1, 0),
    };
    (first..=last).map(move |i| {
        let t = i as f64 / steps as f64;
        (
            (from.0 as f64 + dx * t).round() as i32,
            (from.1 as f64 + dy * t).round() as i32,
        )
    })
}

/// Brush spacing for interpolated strokes.
pub fn stroke_spacing(radius: u32) -> u32 {
    (radius / 4).max(1)
}

// ============================================================================
// OVERLAY
// ============================================================================

/// The editable mask drawn above the base image.
pub struct Overlay {
    pixels: RgbaImage,
    /// Region modified since the last `take_dirty`.
    dirty: Option<PixelRect>,
}

impl Overlay {
    /// A fully opaque mask of the given size.
    pub fn new_opaque(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, MASK_OPAQUE),
            dirty: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// True when every pixel is opaque black.
    pub fn is_fully_opaque(&self) -> bool {
        self.pixels.pixels().all(|p| *p == MASK_OPAQUE)
    }

    /// Apply one brush stamp at image pixel `(cx, cy)`.
    pub fn stamp(&mut self, cx: i32, cy: i32, radius: u32, mode: Composition) {
        if let Some(rect) = stamp_circle(&mut self.pixels, cx, cy, radius, mode) {
            self.dirty = Some(match self.dirty {
                Some(d) => d.union(rect),
                None => rect,
            });
        }
    }

    /// Stamp along the segment `from → to` (the start point is assumed to
    /// have been stamped already).
    pub fn stroke(&mut self, from: (i32, i32), to: (i32, i32), radius: u32, mode: Composition) {
        let r = radius as f64 + 1.0;
        let reach = [-r, -r, self.width() as f64 + r, self.height() as f64 + r];
        for (x, y) in stroke_points(from, to, stroke_spacing(radius), reach) {
            self.stamp(x, y, radius, mode);
        }
    }

    /// Region touched since the previous call, cleared on return.
    pub fn take_dirty(&mut self) -> Option<PixelRect> {
        self.dirty.take()
    }

    /// Copy a region out as tightly packed RGBA bytes.
    pub fn region_rgba(&self, rect: PixelRect) -> Vec<u8> {
        let row_bytes = rect.width() as usize * 4;
        let stride = self.width() as usize * 4;
        let raw = self.pixels.as_raw();
        let mut out = Vec::with_capacity(row_bytes * rect.height() as usize);
        for y in rect.y0..rect.y1 {
            let start = y as usize * stride + rect.x0 as usize * 4;
            out.extend_from_slice(&raw[start..start + row_bytes]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_overlay_is_opaque_black() {
        let o = Overlay::new_opaque(16, 9);
        assert_eq!(o.dimensions(), (16, 9));
        assert!(o.is_fully_opaque());
    }

    #[test]
    fn erase_clears_centre_and_leaves_outside() {
        let mut o = Overlay::new_opaque(50, 50);
        o.stamp(25, 25, 5, Composition::Clear);
        assert_eq!(o.pixels().get_pixel(25, 25), &MASK_CLEAR);
        assert_eq!(o.pixels().get_pixel(24, 24), &MASK_CLEAR);
        // Corner of the bounding box is outside the circle
        assert_eq!(o.pixels().get_pixel(20, 20), &MASK_OPAQUE);
        assert_eq!(o.pixels().get_pixel(40, 25), &MASK_OPAQUE);
    }

    #[test]
    fn erase_then_paint_restores_opacity() {
        let mut o = Overlay::new_opaque(64, 64);
        o.stamp(30, 30, 12, Composition::Clear);
        assert!(!o.is_fully_opaque());
        o.stamp(30, 30, 12, Composition::Source);
        assert!(o.is_fully_opaque());
    }

    #[test]
    fn erase_then_paint_restores_opacity_at_edges() {
        let mut o = Overlay::new_opaque(20, 20);
        o.stamp(-3, 18, 9, Composition::Clear);
        o.stamp(-3, 18, 9, Composition::Source);
        assert!(o.is_fully_opaque());
    }

    #[test]
    fn stamp_past_edge_is_clipped() {
        let mut o = Overlay::new_opaque(10, 10);
        o.stamp(0, 0, 4, Composition::Clear);
        assert_eq!(o.pixels().get_pixel(0, 0), &MASK_CLEAR);
        assert_eq!(o.take_dirty(), Some(PixelRect { x0: 0, y0: 0, x1: 4, y1: 4 }));
    }

    #[test]
    fn stamp_fully_outside_changes_nothing() {
        let mut o = Overlay::new_opaque(10, 10);
        o.stamp(-50, 5, 4, Composition::Clear);
        o.stamp(5, 100, 4, Composition::Clear);
        assert!(o.is_fully_opaque());
        assert_eq!(o.take_dirty(), None);
    }

    #[test]
    fn radius_one_covers_the_four_pixels_around_the_corner() {
        let mut img = RgbaImage::from_pixel(4, 4, MASK_OPAQUE);
        stamp_circle(&mut img, 2, 2, 1, Composition::Clear);
        let cleared: Vec<(u32, u32)> = img
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == MASK_CLEAR)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(cleared, vec![(1, 1), (2, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn dirty_regions_accumulate_until_taken() {
        let mut o = Overlay::new_opaque(100, 100);
        o.stamp(10, 10, 2, Composition::Clear);
        o.stamp(50, 60, 2, Composition::Clear);
        assert_eq!(
            o.take_dirty(),
            Some(PixelRect { x0: 8, y0: 8, x1: 52, y1: 62 })
        );
        assert_eq!(o.take_dirty(), None);
    }

    const OPEN: [f64; 4] = [-1e9, -1e9, 1e9, 1e9];

    #[test]
    fn stroke_points_are_evenly_spaced_and_end_on_target() {
        let pts: Vec<_> = stroke_points((0, 0), (10, 0), 3, OPEN).collect();
        assert_eq!(pts.len(), 4);
        assert_eq!(*pts.last().unwrap(), (10, 0));
        for w in pts.windows(2) {
            assert!((w[1].0 - w[0].0).abs() <= 3);
        }
        let same: Vec<_> = stroke_points((4, 4), (4, 4), 3, OPEN).collect();
        assert_eq!(same, vec![(4, 4)]);
    }

    #[test]
    fn stroke_points_skip_what_cannot_reach_the_bitmap() {
        let reach = [-2.0, -2.0, 102.0, 102.0];
        let pts: Vec<_> = stroke_points((-5_000_000, 50), (5_000_000, 50), 1, reach).collect();
        assert!(pts.len() < 110, "{} points", pts.len());
        assert!(pts.iter().all(|&(x, _)| (-3..=103).contains(&x)));

        assert_eq!(stroke_points((-500, -500), (-400, 900), 1, reach).count(), 0);
    }

    #[test]
    fn long_stroke_across_small_overlay_is_cheap_and_complete() {
        let mut o = Overlay::new_opaque(100, 100);
        o.stroke((-3_000_000, 50), (3_000_000, 50), 1, Composition::Clear);
        for x in 0..100 {
            assert_eq!(o.pixels().get_pixel(x, 49), &MASK_CLEAR, "gap at x={x}");
        }
        assert_eq!(o.take_dirty(), Some(PixelRect { x0: 0, y0: 49, x1: 100, y1: 51 }));
    }

    #[test]
    fn stroke_leaves_no_gap() {
        let mut o = Overlay::new_opaque(100, 20);
        o.stamp(5, 10, 4, Composition::Clear);
        o.stroke((5, 10), (90, 10), 4, Composition::Clear);
        for x in 5..90 {
            assert_eq!(o.pixels().get_pixel(x, 10), &MASK_CLEAR, "gap at x={x}");
        }
    }

    #[test]
    fn region_copy_matches_pixels() {
        let mut o = Overlay::new_opaque(8, 8);
        o.stamp(4, 4, 2, Composition::Clear);
        let rect = PixelRect { x0: 2, y0: 3, x1: 6, y1: 5 };
        let bytes = o.region_rgba(rect);
        assert_eq!(bytes.len(), 4 * 2 * 4);
        // Row 1 of the copy is y = 4; column 1 is x = 3.
        let px = &bytes[(4 + 1) * 4..(4 + 2) * 4];
        assert_eq!(px, o.pixels().get_pixel(3, 4).0.as_slice());
    }
}
