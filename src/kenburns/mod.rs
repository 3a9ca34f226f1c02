//! # Ken-Burns Animator
//!
//! A pure pan/zoom animation over a static image: a linear scale ramp
//! between two zoom factors plus a pixel offset path chosen by a pan
//! direction. Nothing carries across frames — both quantities are
//! plain functions of the query time, recomputed independently.
//!
//! The image is first cover-resized to the output canvas (CSS
//! `object-fit: cover`); zooming past 1.0 then produces overflow that
//! the pan paths travel through. Offsets are measured against the
//! overflow at the end-zoom parameter, which makes `out` exactly the
//! time-reverse of `in`.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pan direction for a single clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanDirection {
    Left,
    Right,
    Up,
    Down,
    In,
    Out,
}

impl PanDirection {
    /// The fixed cycle the slideshow pipeline walks through
    pub const CYCLE: [PanDirection; 6] = [
        PanDirection::Left,
        PanDirection::Right,
        PanDirection::Up,
        PanDirection::Down,
        PanDirection::In,
        PanDirection::Out,
    ];

    /// Resolve "auto" to one random direction for the whole clip
    pub fn random<R: Rng>(rng: &mut R) -> PanDirection {
        *Self::CYCLE.choose(rng).expect("cycle is non-empty")
    }
}

/// Diagonal pans use this share of the available overflow.
const DIAGONAL_PAN_SHARE: f64 = 0.6;

/// Cover-resize dimensions: the smallest scale of (img_w, img_h) that
/// fully covers the canvas, like CSS `object-fit: cover`
pub fn cover_size(img_w: u32, img_h: u32, canvas_w: u32, canvas_h: u32) -> (u32, u32) {
    let img_ratio = img_w as f64 / img_h as f64;
    let canvas_ratio = canvas_w as f64 / canvas_h as f64;

    if img_ratio >= canvas_ratio {
        // Image is proportionally wider: match height
        let w = (canvas_h as f64 * img_ratio).round() as u32;
        (w.max(canvas_w), canvas_h)
    } else {
        // Image is proportionally taller: match width
        let h = (canvas_w as f64 / img_ratio).round() as u32;
        (canvas_w, h.max(canvas_h))
    }
}

/// One clip's pan/zoom parameters, fixed at construction
#[derive(Debug, Clone)]
pub struct KenBurns {
    /// Cover-resized base dimensions at scale 1.0
    base_w: u32,
    base_h: u32,

    /// Output canvas dimensions
    canvas_w: u32,
    canvas_h: u32,

    /// Zoom at t=0 and t=duration (already swapped for `out`)
    zoom_from: f64,
    zoom_to: f64,

    /// Overflow available to pan through, from the end-zoom parameter
    overflow_x: f64,
    overflow_y: f64,

    pan: PanDirection,
    duration: f64,
}

impl KenBurns {
    /// Set up a clip animation
    ///
    /// `base` is the cover-resized image size, `canvas` the output
    /// frame size. `zoom_start`/`zoom_end` are the nominal interval;
    /// `out` plays it backwards.
    pub fn new(
        base: (u32, u32),
        canvas: (u32, u32),
        zoom_start: f64,
        zoom_end: f64,
        pan: PanDirection,
        duration: f64,
    ) -> Self {
        let (zoom_from, zoom_to) = match pan {
            PanDirection::Out => (zoom_end, zoom_start),
            _ => (zoom_start, zoom_end),
        };

        // Offsets are clamped within the overflow produced by the
        // end-of-interval zoom amount (zoom_end regardless of pan
        // reversal, so out(0) mirrors in(duration)).
        let overflow_x = (base.0 as f64 * zoom_end - canvas.0 as f64).max(0.0);
        let overflow_y = (base.1 as f64 * zoom_end - canvas.1 as f64).max(0.0);

        Self {
            base_w: base.0,
            base_h: base.1,
            canvas_w: canvas.0,
            canvas_h: canvas.1,
            zoom_from,
            zoom_to,
            overflow_x,
            overflow_y,
            pan,
            duration,
        }
    }

    pub fn base_size(&self) -> (u32, u32) {
        (self.base_w, self.base_h)
    }

    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_w, self.canvas_h)
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Linear-interpolated scale factor at time `t`
    pub fn scale_at(&self, t: f64) -> f64 {
        self.zoom_from + (self.zoom_to - self.zoom_from) * (t / self.duration)
    }

    /// Pixel offset of the image's top-left corner at time `t`
    ///
    /// Offsets are zero or negative: a negative x moves the image left
    /// inside the canvas, exposing its right side.
    pub fn offset_at(&self, t: f64) -> (f64, f64) {
        let progress = t / self.duration;
        let ox = self.overflow_x;
        let oy = self.overflow_y;

        match self.pan {
            PanDirection::Left => {
                // Start flush, end showing the right edge
                (-ox * progress, 0.0)
            }
            PanDirection::Right => ((-ox) * (1.0 - progress), 0.0),
            PanDirection::Up => (0.0, -oy * progress),
            PanDirection::Down => (0.0, (-oy) * (1.0 - progress)),
            PanDirection::In => {
                (-ox * progress * DIAGONAL_PAN_SHARE, -oy * progress * DIAGONAL_PAN_SHARE)
            }
            PanDirection::Out => (
                -ox * (1.0 - progress) * DIAGONAL_PAN_SHARE,
                -oy * (1.0 - progress) * DIAGONAL_PAN_SHARE,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator(pan: PanDirection) -> KenBurns {
        // 4:3 image cover-resized onto a 16:9 canvas
        let base = cover_size(1440, 1080, 1920, 1080);
        KenBurns::new(base, (1920, 1080), 1.05, 1.15, pan, 10.0)
    }

    #[test]
    fn test_cover_size_matches_wider_and_taller_images() {
        // Wider than the canvas ratio: match height
        assert_eq!(cover_size(4000, 1000, 1920, 1080), (4320, 1080));
        // Taller: match width
        assert_eq!(cover_size(1000, 2000, 1920, 1080), (1920, 3840));
        // Same ratio: exact cover
        assert_eq!(cover_size(3840, 2160, 1920, 1080), (1920, 1080));
    }

    #[test]
    fn test_scale_endpoints() {
        let kb = animator(PanDirection::Left);
        assert!((kb.scale_at(0.0) - 1.05).abs() < 1e-9);
        assert!((kb.scale_at(10.0) - 1.15).abs() < 1e-9);

        let kb = animator(PanDirection::Out);
        assert!((kb.scale_at(0.0) - 1.15).abs() < 1e-9);
        assert!((kb.scale_at(10.0) - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_offset_endpoints_per_direction() {
        for pan in PanDirection::CYCLE {
            let kb = animator(pan);
            let (x0, y0) = kb.offset_at(0.0);
            let (x1, y1) = kb.offset_at(10.0);

            match pan {
                PanDirection::Left => {
                    assert_eq!((x0, y0), (0.0, 0.0));
                    assert!(x1 < 0.0 && y1 == 0.0);
                }
                PanDirection::Right => {
                    assert!(x0 < 0.0 && y0 == 0.0);
                    assert_eq!((x1, y1), (0.0, 0.0));
                }
                PanDirection::Up => {
                    assert_eq!((x0, y0), (0.0, 0.0));
                    assert!(y1 <= 0.0);
                }
                PanDirection::Down => {
                    assert!(y0 <= 0.0);
                    assert_eq!((x1, y1), (0.0, 0.0));
                }
                PanDirection::In => {
                    assert_eq!((x0, y0), (0.0, 0.0));
                    assert!(x1 <= 0.0 && y1 <= 0.0);
                }
                PanDirection::Out => {
                    assert!(x1 == 0.0 && y1 == 0.0);
                }
            }
        }
    }

    #[test]
    fn test_out_is_time_reversed_in() {
        let kb_in = animator(PanDirection::In);
        let kb_out = animator(PanDirection::Out);

        for t in [0.0, 2.5, 5.0, 7.5, 10.0] {
            let (ix, iy) = kb_in.offset_at(10.0 - t);
            let (ox, oy) = kb_out.offset_at(t);
            assert!((ix - ox).abs() < 1e-9, "t={}: {} vs {}", t, ix, ox);
            assert!((iy - oy).abs() < 1e-9, "t={}: {} vs {}", t, iy, oy);
        }

        // And the zooms run in opposite directions
        assert!((kb_in.scale_at(0.0) - kb_out.scale_at(10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_left_pan_traverses_full_overflow() {
        let base = cover_size(1440, 1080, 1920, 1080);
        let kb = KenBurns::new(base, (1920, 1080), 1.0, 1.2, PanDirection::Left, 10.0);
        let overflow = base.0 as f64 * 1.2 - 1920.0;

        let (x_end, _) = kb.offset_at(10.0);
        assert!((x_end + overflow).abs() < 1e-9);
    }

    #[test]
    fn test_no_overflow_means_no_pan() {
        // Zoom never exceeds 1.0 and the image exactly covers: nothing to pan through
        let kb = KenBurns::new((1920, 1080), (1920, 1080), 1.0, 1.0, PanDirection::Left, 10.0);
        assert_eq!(kb.offset_at(5.0), (0.0, 0.0));
    }

    #[test]
    fn test_random_direction_is_from_the_cycle() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let pan = PanDirection::random(&mut rng);
            assert!(PanDirection::CYCLE.contains(&pan));
        }
    }
}
