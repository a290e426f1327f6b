use serde::{Deserialize, Serialize};

use crate::shared::embedding::Embedding;

/// Axis-aligned face box as `[x1, y1, x2, y2]` in source image pixels.
///
/// Opaque to matching; carried through only so callers can report which
/// face in the classroom image was matched.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from(b: [f32; 4]) -> Self {
        Self {
            x1: b[0],
            y1: b[1],
            x2: b[2],
            y2: b[3],
        }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// A normalized face embedding from one classroom image.
///
/// Request-scoped: created per attendance request and never cached.
/// `index` is the face's position in the extractor output and stays stable
/// even when earlier faces are dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub index: usize,
    pub embedding: Embedding,
    pub bbox: Option<BoundingBox>,
    pub confidence: f32,
}

impl DetectedFace {
    pub fn new(index: usize, embedding: Embedding) -> Self {
        Self {
            index,
            embedding,
            bbox: None,
            confidence: 1.0,
        }
    }
}
