//! Appearance flags and the paints derived from them.
//!
//! Paints are never edited in place: any flag change re-runs
//! [`derive_appearance`] and swaps the whole set.

use embedded_graphics::{pixelcolor::Rgb565, prelude::RgbColor};

use crate::config::FaceConfig;

/// The two inks the face uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaintColor {
    Black,
    White,
}

impl PaintColor {
    #[inline]
    pub fn to_rgb565(self) -> Rgb565 {
        match self {
            PaintColor::Black => Rgb565::BLACK,
            PaintColor::White => Rgb565::WHITE,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PaintStyle {
    Stroke,
    Fill,
    FillAndStroke,
}

/// Colour, stroke and text settings for one kind of element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaintDescriptor {
    pub color: PaintColor,
    pub stroke_width: u32,
    pub style: PaintStyle,
    pub anti_alias: bool,
    pub alpha: u8,
    pub text_size: f32,
}

impl PaintDescriptor {
    /// Opaque, anti-aliased black. Text size is only meaningful for text paints.
    pub fn black(style: PaintStyle, cfg: &FaceConfig) -> Self {
        Self {
            color: PaintColor::Black,
            stroke_width: cfg.stroke_width,
            style,
            anti_alias: true,
            alpha: cfg.active_alpha,
            text_size: cfg.time_text_size,
        }
    }

    /// Resolve the paint colour over `background`, blending by alpha.
    ///
    /// The panel has no alpha channel, so translucency is pre-multiplied
    /// against the frame background.
    pub fn resolve(&self, background: Rgb565) -> Rgb565 {
        blend(self.color.to_rgb565(), background, self.alpha)
    }
}

/// Integer source-over blend of two RGB565 colours.
pub fn blend(fg: Rgb565, bg: Rgb565, alpha: u8) -> Rgb565 {
    let a = alpha as u16;
    let mix = |f: u8, b: u8| -> u8 { ((f as u16 * a + b as u16 * (255 - a) + 127) / 255) as u8 };
    Rgb565::new(mix(fg.r(), bg.r()), mix(fg.g(), bg.g()), mix(fg.b(), bg.b()))
}

/// Independently toggled mode flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AppearanceState {
    pub ambient: bool,
    pub night: bool,
    pub muted: bool,
    pub tapped: bool,
}

impl AppearanceState {
    /// Black background for ambient and night, white otherwise.
    #[inline]
    pub fn background(&self) -> PaintColor {
        if self.ambient || self.night {
            PaintColor::Black
        } else {
            PaintColor::White
        }
    }
}

/// The four paints used per frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Paints {
    pub hand: PaintDescriptor,
    pub eye: PaintDescriptor,
    pub text: PaintDescriptor,
    pub tapped: PaintDescriptor,
}

impl Paints {
    /// Paints installed at create time: all black, anti-aliased.
    pub fn defaults(cfg: &FaceConfig) -> Self {
        derive_appearance(&AppearanceState::default(), cfg)
    }
}

/// Map appearance flags to paints.
///
/// | ambient | night | hand          | eye                  | text        |
/// |---------|-------|---------------|----------------------|-------------|
/// | yes     | any   | white stroke  | white stroke         | white stroke|
/// | no      | yes   | black fill    | white fill+stroke    | white fill  |
/// | no      | no    | black fill    | black stroke         | black fill  |
///
/// Ambient drops anti-aliasing on hand, eye and text. The tapped overlay
/// follows the text colour and keeps its fill style. Mute only dims the hand
/// and the eye.
pub fn derive_appearance(state: &AppearanceState, cfg: &FaceConfig) -> Paints {
    let dim = cfg.dim_alpha(state.muted);

    let mut hand = PaintDescriptor::black(PaintStyle::Fill, cfg);
    let mut eye = PaintDescriptor::black(PaintStyle::Stroke, cfg);
    let mut text = PaintDescriptor::black(PaintStyle::Fill, cfg);
    let mut tapped = PaintDescriptor {
        text_size: cfg.glyph_text_size,
        ..PaintDescriptor::black(PaintStyle::Fill, cfg)
    };

    if state.ambient {
        for paint in [&mut hand, &mut eye, &mut text] {
            paint.color = PaintColor::White;
            paint.style = PaintStyle::Stroke;
            paint.anti_alias = false;
        }
        tapped.color = PaintColor::White;
    } else if state.night {
        eye.color = PaintColor::White;
        eye.style = PaintStyle::FillAndStroke;
        text.color = PaintColor::White;
        tapped.color = PaintColor::White;
    }

    hand.alpha = dim;
    eye.alpha = dim;

    Paints { hand, eye, text, tapped }
}
