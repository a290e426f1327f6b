use std::sync::Arc;

use crate::shared::embedding::Embedding;
use crate::shared::roll_id::RollId;

/// A roster student with the reference embeddings available for this request.
///
/// Embeddings are shared with the reference cache, so handing out a student
/// never copies vectors. An empty set means the student cannot be scored.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrolledStudent {
    pub roll_id: RollId,
    pub embeddings: Arc<[Embedding]>,
}

impl EnrolledStudent {
    pub fn new(roll_id: RollId, embeddings: Arc<[Embedding]>) -> Self {
        Self {
            roll_id,
            embeddings,
        }
    }

    pub fn unscorable(roll_id: RollId) -> Self {
        Self::new(roll_id, Arc::from(Vec::new()))
    }

    pub fn is_scorable(&self) -> bool {
        !self.embeddings.is_empty()
    }
}
