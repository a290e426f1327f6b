use thiserror::Error;

use crate::shared::roll_id::RollId;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("failed to fetch reference images for {roll_id}: {message}")]
pub struct SourceError {
    pub roll_id: RollId,
    pub message: String,
}

/// Domain interface to wherever enrolled students' reference photos live.
///
/// Zero images is a valid answer: the student is enrolled but unscorable.
pub trait ReferenceImageSource: Send + Sync {
    fn fetch_reference_images(&self, roll_id: &RollId) -> Result<Vec<Vec<u8>>, SourceError>;
}
