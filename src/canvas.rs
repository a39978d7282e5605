//! Save/rotate/restore canvas over an embedded-graphics draw target.
//!
//! embedded-graphics has no notion of a current transform, so the canvas keeps
//! one: primitives are positioned through it, and `save`/`restore` push and pop
//! it on a small fixed stack. Rotation preserves lengths, so circles only have
//! their centre mapped.

use core::f32::consts::PI;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::Dimensions,
    mono_font::{ascii::FONT_9X15, MonoTextStyle},
    pixelcolor::Rgb565,
    prelude::{Point, Primitive, Size},
    primitives::{Circle, PrimitiveStyleBuilder, Rectangle},
    text::{Alignment, Text},
    Drawable, Pixel,
};
use heapless::Vec;

use crate::appearance::{PaintColor, PaintDescriptor, PaintStyle};
use crate::config::FaceConfig;
use crate::layout::PointF;
use crate::scene::{DrawOp, Scene};

/// Nested saves allowed before `save` fails.
pub const SAVE_DEPTH: usize = 4;

/// 2D affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Rotation by `degrees` about `pivot`. With y pointing down, positive
    /// angles turn clockwise on screen.
    pub fn rotation_about(degrees: f32, pivot: PointF) -> Self {
        let rad = degrees * (PI / 180.0);
        let (sin, cos) = (libm::sinf(rad), libm::cosf(rad));
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            tx: pivot.x - pivot.x * cos + pivot.y * sin,
            ty: pivot.y - pivot.x * sin - pivot.y * cos,
        }
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    pub fn then(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            tx: self.a * other.tx + self.c * other.ty + self.tx,
            ty: self.b * other.tx + self.d * other.ty + self.ty,
        }
    }

    #[inline]
    pub fn map(&self, p: PointF) -> PointF {
        PointF::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Canvas error: either the target failed or the save stack was misused.
#[derive(Debug, PartialEq, Eq)]
pub enum CanvasError<E> {
    Draw(E),
    StackOverflow,
    StackUnderflow,
}

impl<E> From<E> for CanvasError<E> {
    fn from(e: E) -> Self {
        CanvasError::Draw(e)
    }
}

#[inline]
fn to_point(p: PointF) -> Point {
    Point::new(libm::roundf(p.x) as i32, libm::roundf(p.y) as i32)
}

#[inline]
fn text_scale(text_size: f32, base_text_size: f32) -> u32 {
    if base_text_size <= 0.0 {
        return 1;
    }
    libm::roundf(text_size / base_text_size).max(1.0) as u32
}

// Pixel at `p` becomes a `scale` x `scale` block at `origin + p * scale`.
struct Scaled<'a, D> {
    target: &'a mut D,
    origin: Point,
    scale: u32,
}

impl<D: DrawTarget<Color = Rgb565>> Dimensions for Scaled<'_, D> {
    fn bounding_box(&self) -> Rectangle {
        let b = self.target.bounding_box();
        let s = self.scale as i32;
        let top_left = Point::new(
            (b.top_left.x - self.origin.x).div_euclid(s),
            (b.top_left.y - self.origin.y).div_euclid(s),
        );
        Rectangle::new(
            top_left,
            Size::new(b.size.width / self.scale + 1, b.size.height / self.scale + 1),
        )
    }
}

impl<D: DrawTarget<Color = Rgb565>> DrawTarget for Scaled<'_, D> {
    type Color = Rgb565;
    type Error = D::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Rgb565>>,
    {
        let block = Size::new_equal(self.scale);
        for Pixel(p, c) in pixels {
            let top_left = self.origin + p * self.scale as i32;
            self.target.fill_solid(&Rectangle::new(top_left, block), c)?;
        }
        Ok(())
    }
}

pub struct Canvas<'d, D> {
    target: &'d mut D,
    transform: Affine,
    stack: Vec<Affine, SAVE_DEPTH>,
    background: Rgb565,
    base_text_size: f32,
}

impl<'d, D> Canvas<'d, D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: &'d mut D, cfg: &FaceConfig) -> Self {
        Self {
            target,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            background: Rgb565::new(0, 0, 0),
            base_text_size: cfg.time_text_size,
        }
    }

    #[inline]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Number of outstanding saves.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Fill the whole target. Later translucent paints blend against this colour.
    pub fn clear(&mut self, color: PaintColor) -> Result<(), CanvasError<D::Error>> {
        self.background = color.to_rgb565();
        self.target.clear(self.background)?;
        Ok(())
    }

    pub fn save(&mut self) -> Result<(), CanvasError<D::Error>> {
        self.stack
            .push(self.transform)
            .map_err(|_| CanvasError::StackOverflow)
    }

    pub fn restore(&mut self) -> Result<(), CanvasError<D::Error>> {
        self.transform = self.stack.pop().ok_or(CanvasError::StackUnderflow)?;
        Ok(())
    }

    /// Pre-concatenate a rotation about `pivot` onto the current transform.
    pub fn rotate(&mut self, degrees: f32, pivot: PointF) {
        self.transform = self.transform.then(&Affine::rotation_about(degrees, pivot));
    }

    pub fn draw_circle(
        &mut self,
        center: PointF,
        radius: f32,
        paint: &PaintDescriptor,
    ) -> Result<(), CanvasError<D::Error>> {
        let color = paint.resolve(self.background);
        let style = match paint.style {
            PaintStyle::Stroke => PrimitiveStyleBuilder::new()
                .stroke_color(color)
                .stroke_width(paint.stroke_width),
            PaintStyle::Fill => PrimitiveStyleBuilder::new().fill_color(color),
            PaintStyle::FillAndStroke => PrimitiveStyleBuilder::new()
                .fill_color(color)
                .stroke_color(color)
                .stroke_width(paint.stroke_width),
        }
        .build();

        let diameter = libm::roundf(radius * 2.0).max(0.0) as u32;
        Circle::with_center(to_point(self.transform.map(center)), diameter)
            .into_styled(style)
            .draw(self.target)?;
        Ok(())
    }

    /// Draw `text` centred on `anchor`, baseline on `anchor.y`.
    ///
    /// The font is drawn at an integer scale of `text_size / time_text_size`,
    /// so the readout is native size and larger text grows in whole pixels.
    pub fn draw_text(
        &mut self,
        text: &str,
        anchor: PointF,
        paint: &PaintDescriptor,
    ) -> Result<(), CanvasError<D::Error>> {
        let color = paint.resolve(self.background);
        let style = MonoTextStyle::new(&FONT_9X15, color);
        let anchor = to_point(self.transform.map(anchor));
        let scale = text_scale(paint.text_size, self.base_text_size);

        if scale == 1 {
            Text::with_alignment(text, anchor, style, Alignment::Center).draw(self.target)?;
        } else {
            let mut scaled = Scaled {
                target: &mut *self.target,
                origin: anchor,
                scale,
            };
            Text::with_alignment(text, Point::zero(), style, Alignment::Center).draw(&mut scaled)?;
        }
        Ok(())
    }

    /// Replay a scene in order.
    pub fn render(&mut self, scene: &Scene) -> Result<(), CanvasError<D::Error>> {
        for op in scene.ops() {
            match op {
                DrawOp::Clear(color) => self.clear(*color)?,
                DrawOp::Save => self.save()?,
                DrawOp::Rotate { degrees, pivot } => self.rotate(*degrees, *pivot),
                DrawOp::Restore => self.restore()?,
                DrawOp::Circle { center, radius, paint } => self.draw_circle(*center, *radius, paint)?,
                DrawOp::Text { text, anchor, paint } => self.draw_text(text, *anchor, paint)?,
            }
        }
        Ok(())
    }
}
