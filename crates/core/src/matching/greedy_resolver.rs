use std::cmp::Ordering;

use crate::matching::assignment_resolver::{Assignment, AssignmentResolver};
use crate::matching::score_matrix::{Candidate, ScoreMatrix};
use crate::shared::roll_id::RollId;

/// Highest-score-first assignment.
///
/// Candidates at or above the threshold are visited in descending score
/// order and committed whenever both the face and the student are still
/// free. Equal scores are ordered by roll ID, then by matrix position, so
/// the outcome is identical across runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyResolver;

impl GreedyResolver {
    pub fn new() -> Self {
        Self
    }
}

impl AssignmentResolver for GreedyResolver {
    fn resolve(
        &self,
        matrix: &ScoreMatrix,
        roll_ids: &[RollId],
        threshold: f64,
    ) -> Vec<Assignment> {
        let mut candidates = matrix.candidates(threshold);
        candidates.sort_by(|a, b| rank(a, b, roll_ids));

        let mut face_taken = vec![false; matrix.num_faces()];
        let mut student_taken = vec![false; matrix.num_students()];
        let mut assignments = Vec::new();

        for c in candidates {
            if face_taken[c.face] || student_taken[c.student] {
                continue;
            }
            face_taken[c.face] = true;
            student_taken[c.student] = true;
            assignments.push(Assignment {
                face: c.face,
                student: c.student,
                score: c.score,
            });
        }
        assignments
    }
}

fn rank(a: &Candidate, b: &Candidate, roll_ids: &[RollId]) -> Ordering {
    // partial_cmp keeps 0.0 and -0.0 equal so the roll ID decides.
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| roll_ids.get(a.student).cmp(&roll_ids.get(b.student)))
        .then(a.student.cmp(&b.student))
        .then(a.face.cmp(&b.face))
}
