use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_EMBEDDING_DIM, DEFAULT_SIMILARITY_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("similarity_threshold must be within [-1, 1], got {0}")]
    SimilarityThreshold(f64),
    #[error("detection_confidence_threshold must be within [0, 1], got {0}")]
    DetectionConfidence(f64),
    #[error("embedding_dim must be positive")]
    EmbeddingDim,
}

/// Tunables consumed by the attendance core.
///
/// Missing fields in a config file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    pub similarity_threshold: f64,
    pub detection_confidence_threshold: f64,
    pub embedding_dim: usize,
    pub extraction_timeout_ms: Option<u64>,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            detection_confidence_threshold: DEFAULT_DETECTION_CONFIDENCE,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            extraction_timeout_ms: None,
        }
    }
}

impl AttendanceConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::SimilarityThreshold(self.similarity_threshold));
        }
        if !(0.0..=1.0).contains(&self.detection_confidence_threshold) {
            return Err(ConfigError::DetectionConfidence(
                self.detection_confidence_threshold,
            ));
        }
        if self.embedding_dim == 0 {
            return Err(ConfigError::EmbeddingDim);
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> Option<Duration> {
        self.extraction_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AttendanceConfig::default();
        assert_eq!(config.similarity_threshold, 0.55);
        assert_eq!(config.detection_confidence_threshold, 0.0);
        assert_eq!(config.embedding_dim, 512);
        assert_eq!(config.extraction_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"similarity_threshold": 0.5, "extraction_timeout_ms": 250}"#)
            .unwrap();

        let config = AttendanceConfig::load(&path).unwrap();

        assert_eq!(config.similarity_threshold, 0.5);
        assert_eq!(config.embedding_dim, 512);
        assert_eq!(config.extraction_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = AttendanceConfig::load(&tmp.path().join("nope.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_malformed_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AttendanceConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_rejects_out_of_range_threshold() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"similarity_threshold": 1.5}"#).unwrap();
        assert!(matches!(
            AttendanceConfig::load(&path),
            Err(ConfigError::SimilarityThreshold(_))
        ));
    }

    #[rstest]
    #[case::lower_bound(-1.0, true)]
    #[case::upper_bound(1.0, true)]
    #[case::below(-1.01, false)]
    #[case::nan(f64::NAN, false)]
    fn test_validate_similarity_threshold(#[case] threshold: f64, #[case] ok: bool) {
        let config = AttendanceConfig {
            similarity_threshold: threshold,
            ..Default::default()
        };
        assert_eq!(config.validate().is_ok(), ok);
    }

    #[test]
    fn test_validate_zero_dim() {
        let config = AttendanceConfig {
            embedding_dim: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmbeddingDim)));
    }
}
