use log::{debug, warn};

use crate::attendance::attendance_record::AttendanceRecord;
use crate::enrollment::enrolled_student::EnrolledStudent;
use crate::matching::assignment_resolver::AssignmentResolver;
use crate::matching::greedy_resolver::GreedyResolver;
use crate::matching::score_matrix::ScoreMatrix;
use crate::shared::detected_face::DetectedFace;
use crate::shared::roll_id::RollId;

/// Turns already-materialized embeddings into an attendance roster.
///
/// Pure and synchronous: scores every face against every student, lets the
/// resolver commit pairings, then emits one record per student in roster
/// order.
pub struct AttendanceEngine {
    resolver: Box<dyn AssignmentResolver>,
    similarity_threshold: f64,
}

impl AttendanceEngine {
    pub fn new(resolver: Box<dyn AssignmentResolver>, similarity_threshold: f64) -> Self {
        Self {
            resolver,
            similarity_threshold,
        }
    }

    pub fn greedy(similarity_threshold: f64) -> Self {
        Self::new(Box::new(GreedyResolver::new()), similarity_threshold)
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    pub fn decide(
        &self,
        students: &[EnrolledStudent],
        faces: &[DetectedFace],
    ) -> Vec<AttendanceRecord> {
        let matrix = ScoreMatrix::build(faces, students);
        let roll_ids: Vec<RollId> = students.iter().map(|s| s.roll_id.clone()).collect();
        let assignments = self
            .resolver
            .resolve(&matrix, &roll_ids, self.similarity_threshold);

        let mut assigned: Vec<Option<(f64, &DetectedFace)>> = vec![None; students.len()];
        for a in &assignments {
            match (assigned.get_mut(a.student), faces.get(a.face)) {
                (Some(slot), Some(face)) => *slot = Some((a.score, face)),
                _ => warn!(
                    "Ignoring assignment of face {} to student {} outside the {}x{} matrix",
                    a.face,
                    a.student,
                    faces.len(),
                    students.len()
                ),
            }
        }
        debug!(
            "Resolved {} of {} students against {} faces",
            assignments.len(),
            students.len(),
            faces.len()
        );

        students
            .iter()
            .zip(assigned)
            .enumerate()
            .map(|(col, (student, assignment))| match assignment {
                Some((score, face)) => {
                    AttendanceRecord::present(student.roll_id.clone(), score, face)
                }
                None => {
                    AttendanceRecord::absent(student.roll_id.clone(), matrix.best_for_student(col))
                }
            })
            .collect()
    }
}
