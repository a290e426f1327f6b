use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::shared::detected_face::BoundingBox;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("no face detected in image")]
    NoFaceDetected,
    #[error("embedding extraction failed: {0}")]
    Failed(String),
    #[error("embedding extraction timed out after {0:?}")]
    TimedOut(Duration),
}

/// One face as reported by the recognition model, before normalization.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawFace {
    pub embedding: Vec<f32>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
}

fn default_confidence() -> f32 {
    1.0
}

impl RawFace {
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            confidence: default_confidence(),
            bbox: None,
        }
    }

    pub fn area(&self) -> f32 {
        self.bbox.map_or(0.0, |b| b.area())
    }
}

/// Domain interface to the face-recognition model.
///
/// Returns one raw embedding per face found in `image`. An empty list and
/// [`ExtractionError::NoFaceDetected`] both mean "no faces"; callers decide
/// whether that is an error for their context.
pub trait EmbeddingExtractor: Send + Sync {
    fn extract_embeddings(&self, image: &[u8]) -> Result<Vec<RawFace>, ExtractionError>;
}
