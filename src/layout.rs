//! Screen-size derived geometry.
//!
//! (0,0) is the top-left corner and y grows downwards, same as the panel.

use crate::config::FaceConfig;

/// Sub-pixel point used by the layout and the canvas transform.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Positions and radii of the two eyes, recomputed on every surface change.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LayoutMetrics {
    pub center: PointF,
    pub eye_radius: f32,
    pub hand_radius: f32,
    /// Left eye, shows the hour.
    pub hour_pivot_x: f32,
    /// Right eye, shows the minute.
    pub minute_pivot_x: f32,
}

impl LayoutMetrics {
    /// Derive metrics for a `width` x `height` surface.
    ///
    /// Only the horizontal centre scales the eyes, so round and square panels
    /// of the same width get the same face; insets ("chins") are ignored.
    pub fn from_surface(width: u32, height: u32, cfg: &FaceConfig) -> Self {
        let center = PointF::new(width as f32 / 2.0, height as f32 / 2.0);
        let eye_radius = center.x * cfg.eye_ratio;
        let hand_radius = eye_radius * cfg.hand_ratio;

        Self {
            center,
            eye_radius,
            hand_radius,
            hour_pivot_x: center.x - eye_radius - cfg.pivot_gap,
            minute_pivot_x: center.x + eye_radius + cfg.pivot_gap,
        }
    }

    #[inline]
    pub fn hour_pivot(&self) -> PointF {
        PointF::new(self.hour_pivot_x, self.center.y)
    }

    #[inline]
    pub fn minute_pivot(&self) -> PointF {
        PointF::new(self.minute_pivot_x, self.center.y)
    }

    /// Unrotated pupil centre for the eye at `pivot`: straight up, half a
    /// pupil radius off the pivot.
    #[inline]
    pub fn pupil_rest(&self, pivot: PointF) -> PointF {
        PointF::new(pivot.x, pivot.y - self.hand_radius / 2.0)
    }

    /// Baseline of the `HH:MM` readout.
    #[inline]
    pub fn time_anchor(&self, cfg: &FaceConfig) -> PointF {
        PointF::new(self.center.x, self.center.y + self.eye_radius + cfg.time_offset)
    }

    /// Baseline of the tapped overlay glyph.
    #[inline]
    pub fn glyph_anchor(&self, cfg: &FaceConfig) -> PointF {
        PointF::new(self.center.x, self.center.y + cfg.glyph_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn four_hundred_wide_surface() {
        let m = LayoutMetrics::from_surface(400, 400, &FaceConfig::default());
        assert_eq!(m.center, PointF::new(200.0, 200.0));
        assert_eq!(m.eye_radius, 50.0);
        assert!(close(m.hand_radius, 30.0));
        assert_eq!(m.hour_pivot_x, 140.0);
        assert_eq!(m.minute_pivot_x, 260.0);
    }

    #[test]
    fn radii_scale_with_center() {
        let cfg = FaceConfig::default();
        for width in [2u32, 120, 240, 333, 466, 1024] {
            let m = LayoutMetrics::from_surface(width, width / 2 + 1, &cfg);
            let cx = width as f32 / 2.0;
            assert!((m.eye_radius - 0.25 * cx).abs() < 1e-4);
            assert!((m.hand_radius - 0.6 * m.eye_radius).abs() < 1e-4);
        }
    }

    #[test]
    fn recomputing_is_idempotent() {
        let cfg = FaceConfig::default();
        let a = LayoutMetrics::from_surface(466, 466, &cfg);
        let b = LayoutMetrics::from_surface(466, 466, &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn text_anchors_sit_below_the_eyes() {
        let cfg = FaceConfig::default();
        let m = LayoutMetrics::from_surface(400, 400, &cfg);
        assert_eq!(m.time_anchor(&cfg), PointF::new(200.0, 310.0));
        assert_eq!(m.glyph_anchor(&cfg), PointF::new(200.0, 250.0));
        let rest = m.pupil_rest(m.hour_pivot());
        assert_eq!(rest.x, 140.0);
        assert!(close(rest.y, 185.0));
    }
}
