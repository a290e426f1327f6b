use thiserror::Error;

/// Reasons a raw vector cannot become a unit-norm [`Embedding`].
///
/// Always signals an upstream extraction problem; a degenerate vector is
/// never coerced into a zero embedding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DegenerateEmbeddingError {
    #[error("embedding is empty")]
    Empty,
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding contains NaN or infinite values")]
    NonFinite,
    #[error("embedding has zero norm")]
    ZeroNorm,
}

/// An L2-normalized face embedding.
///
/// Only constructible through [`Embedding::normalize`], so every instance
/// has unit norm (within f32 precision) and is immutable afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Scales `raw` to unit L2 norm.
    pub fn normalize(raw: &[f32]) -> Result<Self, DegenerateEmbeddingError> {
        if raw.is_empty() {
            return Err(DegenerateEmbeddingError::Empty);
        }
        if raw.iter().any(|x| !x.is_finite()) {
            return Err(DegenerateEmbeddingError::NonFinite);
        }

        // Accumulate in f64 so large-but-finite components cannot overflow.
        let norm = raw
            .iter()
            .map(|x| (*x as f64) * (*x as f64))
            .sum::<f64>()
            .sqrt();
        if !norm.is_finite() {
            return Err(DegenerateEmbeddingError::NonFinite);
        }
        if norm == 0.0 {
            return Err(DegenerateEmbeddingError::ZeroNorm);
        }

        let values = raw.iter().map(|x| (*x as f64 / norm) as f32).collect();
        Ok(Self { values })
    }

    /// Like [`Embedding::normalize`] but also enforces the model dimensionality.
    pub fn normalize_with_dim(raw: &[f32], dim: usize) -> Result<Self, DegenerateEmbeddingError> {
        if !raw.is_empty() && raw.len() != dim {
            return Err(DegenerateEmbeddingError::DimensionMismatch {
                expected: dim,
                actual: raw.len(),
            });
        }
        Self::normalize(raw)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// Raw dot product accumulated in f64. Unclamped.
    pub fn dot(&self, other: &Embedding) -> f64 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (*a as f64) * (*b as f64))
            .sum()
    }
}

/// Free-function form of [`Embedding::normalize`].
pub fn normalize(raw: &[f32]) -> Result<Embedding, DegenerateEmbeddingError> {
    Embedding::normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn norm(e: &Embedding) -> f64 {
        e.as_slice()
            .iter()
            .map(|x| (*x as f64) * (*x as f64))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_normalize_scales_to_unit_length() {
        let e = normalize(&[3.0, 4.0]).unwrap();
        assert_relative_eq!(e.as_slice()[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(e.as_slice()[1], 0.8, epsilon = 1e-6);
        assert_relative_eq!(norm(&e), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_already_unit() {
        let e = normalize(&[1.0, 0.0, 0.0]).unwrap();
        assert_eq!(e.as_slice(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_normalize_large_components_do_not_overflow() {
        let e = normalize(&[3.0e30, 4.0e30]).unwrap();
        assert_relative_eq!(norm(&e), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_512_dims() {
        let raw: Vec<f32> = (0..512).map(|i| (i as f32).sin() + 0.01).collect();
        let e = Embedding::normalize_with_dim(&raw, 512).unwrap();
        assert_eq!(e.dim(), 512);
        assert_relative_eq!(norm(&e), 1.0, epsilon = 1e-5);
    }

    #[rstest]
    #[case::zero(vec![0.0, 0.0, 0.0], DegenerateEmbeddingError::ZeroNorm)]
    #[case::nan(vec![1.0, f32::NAN], DegenerateEmbeddingError::NonFinite)]
    #[case::inf(vec![f32::INFINITY, 1.0], DegenerateEmbeddingError::NonFinite)]
    #[case::neg_inf(vec![f32::NEG_INFINITY], DegenerateEmbeddingError::NonFinite)]
    #[case::empty(vec![], DegenerateEmbeddingError::Empty)]
    fn test_normalize_rejects_degenerate(
        #[case] raw: Vec<f32>,
        #[case] expected: DegenerateEmbeddingError,
    ) {
        assert_eq!(normalize(&raw), Err(expected));
    }

    #[test]
    fn test_normalize_with_dim_rejects_wrong_length() {
        let result = Embedding::normalize_with_dim(&[1.0, 2.0], 3);
        assert_eq!(
            result,
            Err(DegenerateEmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_dot_of_self_is_one() {
        let e = normalize(&[0.3, -1.2, 4.5, 0.7]).unwrap();
        assert_relative_eq!(e.dot(&e), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dot_orthogonal_is_zero() {
        let a = normalize(&[1.0, 0.0]).unwrap();
        let b = normalize(&[0.0, 2.0]).unwrap();
        assert_relative_eq!(a.dot(&b), 0.0);
    }
}
