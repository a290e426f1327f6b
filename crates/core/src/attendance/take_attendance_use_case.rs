use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::attendance::attendance_engine::AttendanceEngine;
use crate::attendance::attendance_record::AttendanceRecord;
use crate::enrollment::enrolled_student::EnrolledStudent;
use crate::enrollment::reference_cache::ReferenceEmbeddingCache;
use crate::extraction::domain::embedding_extractor::{EmbeddingExtractor, ExtractionError, RawFace};
use crate::extraction::domain::reference_image_source::ReferenceImageSource;
use crate::shared::config::{AttendanceConfig, ConfigError};
use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::Embedding;
use crate::shared::roll_id::RollId;

/// Request-level failures. An extractor that reports no detectable face
/// surfaces here; an extractor that returns an empty face list yields an
/// all-absent roster instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttendanceError {
    #[error("no face detected in classroom image")]
    NoFaceDetected,
    #[error("classroom image extraction failed: {0}")]
    Extraction(#[source] ExtractionError),
}

impl From<ExtractionError> for AttendanceError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::NoFaceDetected => Self::NoFaceDetected,
            other => Self::Extraction(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceReport {
    pub attendance: Vec<AttendanceRecord>,
    pub present_count: usize,
    /// Faces the extractor reported in the classroom image.
    pub faces_detected: usize,
    /// Faces that survived confidence filtering and normalization.
    pub faces_scored: usize,
}

/// Takes attendance for one classroom image against an enrolled roster.
///
/// Per-face and per-student problems degrade single entries: degenerate or
/// low-confidence faces are dropped, and a student whose references cannot
/// be built is reported absent with no score.
pub struct TakeAttendanceUseCase {
    face_extractor: Arc<dyn EmbeddingExtractor>,
    references: Arc<dyn ReferenceImageSource>,
    cache: Arc<ReferenceEmbeddingCache>,
    engine: AttendanceEngine,
    detection_confidence_threshold: f64,
    embedding_dim: usize,
}

impl TakeAttendanceUseCase {
    pub fn new(
        face_extractor: Arc<dyn EmbeddingExtractor>,
        references: Arc<dyn ReferenceImageSource>,
        cache: Arc<ReferenceEmbeddingCache>,
        config: &AttendanceConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            face_extractor,
            references,
            cache,
            engine: AttendanceEngine::greedy(config.similarity_threshold),
            detection_confidence_threshold: config.detection_confidence_threshold,
            embedding_dim: config.embedding_dim,
        })
    }

    /// Replaces the default greedy engine, e.g. to plug in another resolver.
    pub fn with_engine(mut self, engine: AttendanceEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn execute(
        &self,
        classroom_image: &[u8],
        roster: &[RollId],
    ) -> Result<AttendanceReport, AttendanceError> {
        let raw_faces = self.face_extractor.extract_embeddings(classroom_image)?;
        let faces_detected = raw_faces.len();
        let faces = self.detected_faces(raw_faces);
        let students = self.enrolled_students(roster);

        let attendance = self.engine.decide(&students, &faces);
        let present_count = attendance.iter().filter(|r| r.is_present()).count();
        info!(
            "Attendance: {present_count}/{} present, {} of {faces_detected} faces scored",
            attendance.len(),
            faces.len()
        );

        Ok(AttendanceReport {
            attendance,
            present_count,
            faces_detected,
            faces_scored: faces.len(),
        })
    }

    fn detected_faces(&self, raw_faces: Vec<RawFace>) -> Vec<DetectedFace> {
        raw_faces
            .into_iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                if raw.confidence.is_nan()
                    || (raw.confidence as f64) < self.detection_confidence_threshold
                {
                    log::debug!(
                        "Dropping face {index}: confidence {:.2} below threshold",
                        raw.confidence
                    );
                    return None;
                }
                match Embedding::normalize_with_dim(&raw.embedding, self.embedding_dim) {
                    Ok(embedding) => Some(DetectedFace {
                        index,
                        embedding,
                        bbox: raw.bbox,
                        confidence: raw.confidence,
                    }),
                    Err(e) => {
                        warn!("Dropping face {index}: {e}");
                        None
                    }
                }
            })
            .collect()
    }

    fn enrolled_students(&self, roster: &[RollId]) -> Vec<EnrolledStudent> {
        roster
            .iter()
            .map(|roll_id| {
                match self.cache.get_or_build(roll_id, self.references.as_ref()) {
                    Ok(embeddings) => EnrolledStudent::new(roll_id.clone(), embeddings),
                    // Already logged by the cache; the student stays unscorable.
                    Err(_) => EnrolledStudent::unscorable(roll_id.clone()),
                }
            })
            .collect()
    }
}
