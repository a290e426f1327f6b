use serde::Deserialize;

use crate::extraction::domain::embedding_extractor::{EmbeddingExtractor, ExtractionError, RawFace};

/// Reads pre-extracted embeddings from JSON instead of running a model.
///
/// Accepts a list of face objects (`{"embedding": [...], "confidence": f,
/// "bbox": [x1, y1, x2, y2]}`), a single face object, or a bare number
/// array for a single embedding. An empty list is a valid document with no
/// faces in it.
pub struct JsonEmbeddingExtractor;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Faces(Vec<RawFace>),
    Face(RawFace),
    Vector(Vec<f32>),
}

impl JsonEmbeddingExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonEmbeddingExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingExtractor for JsonEmbeddingExtractor {
    fn extract_embeddings(&self, image: &[u8]) -> Result<Vec<RawFace>, ExtractionError> {
        let document: Document = serde_json::from_slice(image)
            .map_err(|e| ExtractionError::Failed(format!("invalid embedding JSON: {e}")))?;

        Ok(match document {
            Document::Faces(faces) => faces,
            Document::Face(face) => vec![face],
            Document::Vector(v) if v.is_empty() => Vec::new(),
            Document::Vector(v) => vec![RawFace::new(v)],
        })
    }
}
