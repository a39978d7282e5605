//! Watch face tuning constants.
//!
//! Everything the renderer derives from screen size or appearance flags is
//! parameterised here so a board profile can adjust it without touching the
//! drawing code. `FaceConfig::default()` reproduces the stock face.

/// Geometry and paint constants for the googly-eyes face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceConfig {
    /// Eye radius as a fraction of the horizontal centre.
    pub eye_ratio: f32,
    /// Pupil ("hand") radius as a fraction of the eye radius.
    pub hand_ratio: f32,
    /// Horizontal gap between an eye's edge and the screen centre, in px.
    pub pivot_gap: f32,
    /// Stroke width shared by every paint.
    pub stroke_width: u32,
    /// Alpha applied to hand and eye paints while muted.
    pub muted_alpha: u8,
    /// Alpha applied to hand and eye paints otherwise.
    pub active_alpha: u8,
    /// Nominal size of the `HH:MM` readout; drawn at the font's native size.
    pub time_text_size: f32,
    /// Nominal size of the tapped overlay glyph, scaled relative to the readout.
    pub glyph_text_size: f32,
    /// Glyph shown while the eyes are "closed".
    pub tapped_glyph: &'static str,
    /// Vertical offset of the glyph baseline below the centre.
    pub glyph_offset: f32,
    /// Vertical offset of the time baseline below the bottom of the eyes.
    pub time_offset: f32,
    /// First hour (inclusive) that counts as day time.
    pub day_start_hour: u8,
    /// First hour (inclusive) that counts as night time again.
    pub day_end_hour: u8,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            eye_ratio: 0.25,
            hand_ratio: 0.6,
            pivot_gap: 10.0,
            stroke_width: 2,
            muted_alpha: 100,
            active_alpha: 255,
            time_text_size: 50.0,
            glyph_text_size: 160.0,
            tapped_glyph: "> <",
            glyph_offset: 50.0,
            time_offset: 60.0,
            day_start_hour: 6,
            day_end_hour: 18,
        }
    }
}

impl FaceConfig {
    /// True if `hour` (0-23) falls outside the day window.
    #[inline]
    pub fn is_night_hour(&self, hour: u8) -> bool {
        !(self.day_start_hour..self.day_end_hour).contains(&hour)
    }

    /// Alpha for hand and eye paints given the mute state.
    #[inline]
    pub fn dim_alpha(&self, muted: bool) -> u8 {
        if muted { self.muted_alpha } else { self.active_alpha }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn night_window_excludes_six_to_seventeen() {
        let cfg = FaceConfig::default();
        for hour in 0..24u8 {
            let expected = !(6..18).contains(&hour);
            assert_eq!(cfg.is_night_hour(hour), expected, "hour {hour}");
        }
    }

    #[test]
    fn dim_alpha_follows_mute() {
        let cfg = FaceConfig::default();
        assert_eq!(cfg.dim_alpha(true), 100);
        assert_eq!(cfg.dim_alpha(false), 255);
    }
}
