use ndarray::Array2;

use crate::enrollment::enrolled_student::EnrolledStudent;
use crate::matching::similarity_matcher;
use crate::shared::detected_face::DetectedFace;

/// One scorable (face, student) pairing. Indices are positions in the
/// matrix, not face or roll identifiers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub face: usize,
    pub student: usize,
    pub score: f64,
}

/// Faces × students similarity scores for a single request.
///
/// Rows follow the order of the detected faces and columns the order of the
/// roster. `None` marks a pairing that could not be scored.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreMatrix {
    scores: Array2<Option<f64>>,
}

impl ScoreMatrix {
    pub fn build(faces: &[DetectedFace], students: &[EnrolledStudent]) -> Self {
        let scores = Array2::from_shape_fn((faces.len(), students.len()), |(f, s)| {
            similarity_matcher::score(&faces[f], &students[s])
        });
        Self { scores }
    }

    pub fn from_scores(scores: Array2<Option<f64>>) -> Self {
        Self { scores }
    }

    pub fn num_faces(&self) -> usize {
        self.scores.nrows()
    }

    pub fn num_students(&self) -> usize {
        self.scores.ncols()
    }

    pub fn get(&self, face: usize, student: usize) -> Option<f64> {
        self.scores.get((face, student)).copied().flatten()
    }

    /// Highest score any face achieved against `student`, thresholds aside.
    pub fn best_for_student(&self, student: usize) -> Option<f64> {
        self.scores
            .column(student)
            .iter()
            .flatten()
            .copied()
            .reduce(f64::max)
    }

    /// Every scored pairing at or above `threshold` (inclusive), in
    /// row-major order.
    pub fn candidates(&self, threshold: f64) -> Vec<Candidate> {
        self.scores
            .indexed_iter()
            .filter_map(|((face, student), score)| {
                score
                    .filter(|s| *s >= threshold)
                    .map(|score| Candidate {
                        face,
                        student,
                        score,
                    })
            })
            .collect()
    }
}
