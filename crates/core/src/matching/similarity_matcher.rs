//! Cosine scoring of detected faces against enrolled students.

use crate::enrollment::enrolled_student::EnrolledStudent;
use crate::shared::detected_face::DetectedFace;
use crate::shared::embedding::Embedding;

/// Cosine similarity of two unit-norm embeddings, clamped to `[-1, 1]`
/// to absorb floating-point overshoot. Orthogonal vectors always score
/// `+0.0`, never `-0.0`.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f64 {
    a.dot(b).clamp(-1.0, 1.0) + 0.0
}

/// Best similarity between `face` and any of the student's reference
/// embeddings.
///
/// `None` when the student has nothing to compare against. That is distinct
/// from a weak score and must not be read as 0.0. References whose
/// dimensionality differs from the face are ignored.
pub fn score(face: &DetectedFace, student: &EnrolledStudent) -> Option<f64> {
    student
        .embeddings
        .iter()
        .filter(|r| r.dim() == face.embedding.dim())
        .map(|r| cosine_similarity(&face.embedding, r))
        .reduce(f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::roll_id::RollId;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn emb(v: &[f32]) -> Embedding {
        Embedding::normalize(v).unwrap()
    }

    fn student(refs: &[&[f32]]) -> EnrolledStudent {
        let embeddings: Vec<Embedding> = refs.iter().map(|r| emb(r)).collect();
        EnrolledStudent::new(RollId::new("s").unwrap(), Arc::from(embeddings))
    }

    #[test]
    fn test_self_similarity_is_one() {
        let a = emb(&[0.2, -0.4, 0.9, 0.1]);
        assert_relative_eq!(cosine_similarity(&a, &a), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_similarity_never_exceeds_bounds() {
        let samples: Vec<Embedding> = (1..50)
            .map(|i| {
                let x = i as f32;
                emb(&[x.sin(), x.cos(), (x * 0.3).sin(), 1e-3 * x])
            })
            .collect();
        for a in &samples {
            for b in &samples {
                let s = cosine_similarity(a, b);
                assert!((-1.0..=1.0).contains(&s), "{s} out of range");
            }
            let neg = emb(&a.as_slice().iter().map(|x| -x).collect::<Vec<_>>());
            assert!(cosine_similarity(a, &neg) >= -1.0);
        }
    }

    #[test]
    fn test_opposite_vectors() {
        assert_relative_eq!(
            cosine_similarity(&emb(&[1.0, 0.0]), &emb(&[-1.0, 0.0])),
            -1.0
        );
    }

    #[test]
    fn test_orthogonal_score_is_positive_zero() {
        let s = cosine_similarity(&emb(&[1.0, 0.0]), &emb(&[-0.0, -1.0]));
        assert_eq!(s, 0.0);
        assert!(s.is_sign_positive());
    }

    #[test]
    fn test_score_takes_best_reference() {
        let face = DetectedFace::new(0, emb(&[1.0, 0.0]));
        let s = student(&[&[0.0, 1.0], &[1.0, 1.0], &[-1.0, 0.0]]);

        assert_relative_eq!(score(&face, &s).unwrap(), 0.5f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_score_without_references_is_none() {
        let face = DetectedFace::new(0, emb(&[1.0, 0.0]));
        assert_eq!(score(&face, &student(&[])), None);
    }

    #[test]
    fn test_score_ignores_mismatched_dimensions() {
        let face = DetectedFace::new(0, emb(&[1.0, 0.0]));
        assert_eq!(score(&face, &student(&[&[1.0, 0.0, 0.0]])), None);
    }
}
