use crate::matching::score_matrix::ScoreMatrix;
use crate::shared::roll_id::RollId;

/// A committed face-to-student pairing, by matrix row and column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Assignment {
    pub face: usize,
    pub student: usize,
    pub score: f64,
}

/// Domain interface for turning a score matrix into committed pairings.
///
/// Implementations must commit each face and each student at most once and
/// never commit a pairing scored below `threshold`. `roll_ids` is indexed
/// by matrix column and is available for deterministic tie-breaking.
/// Every returned `face` must be a row and every `student` a column of
/// `matrix`; callers drop pairings that fall outside it.
pub trait AssignmentResolver: Send + Sync {
    fn resolve(&self, matrix: &ScoreMatrix, roll_ids: &[RollId], threshold: f64)
        -> Vec<Assignment>;
}
