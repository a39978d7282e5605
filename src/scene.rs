//! Draw operations for one frame.
//!
//! A `Scene` is built without touching any display, then replayed onto a
//! [`Canvas`](crate::canvas::Canvas). Keeping the two apart lets the frame
//! contents be checked without rasterising anything.

use heapless::{String, Vec};

use crate::appearance::{PaintColor, PaintDescriptor};
use crate::layout::PointF;

/// Upper bound on operations per frame: clear, two eyes, two rotated pupils
/// (save/rotate/circle/restore each), one or two texts.
pub const SCENE_CAPACITY: usize = 16;

/// Longest string a text op can carry.
pub const TEXT_CAPACITY: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Clear(PaintColor),
    Save,
    /// Clockwise rotation (screen coordinates) about `pivot`.
    Rotate { degrees: f32, pivot: PointF },
    Restore,
    Circle {
        center: PointF,
        radius: f32,
        paint: PaintDescriptor,
    },
    /// Text horizontally centred on `anchor`, `anchor.y` is the baseline.
    Text {
        text: String<TEXT_CAPACITY>,
        anchor: PointF,
        paint: PaintDescriptor,
    },
}

impl DrawOp {
    /// Text op, truncating `text` to [`TEXT_CAPACITY`] bytes on a char boundary.
    pub fn text(text: &str, anchor: PointF, paint: PaintDescriptor) -> Self {
        let mut owned = String::new();
        for ch in text.chars() {
            if owned.push(ch).is_err() {
                break;
            }
        }
        DrawOp::Text { text: owned, anchor, paint }
    }
}

/// Ordered, bounded list of draw operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    ops: Vec<DrawOp, SCENE_CAPACITY>,
}

impl Scene {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Append an op. Ops past [`SCENE_CAPACITY`] are dropped with a warning.
    pub fn push(&mut self, op: DrawOp) {
        if self.ops.push(op).is_err() {
            log::warn!("scene full, dropping draw op");
        }
    }

    #[inline]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Text of every text op, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of circle ops.
    pub fn circle_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Circle { .. }))
            .count()
    }
}
