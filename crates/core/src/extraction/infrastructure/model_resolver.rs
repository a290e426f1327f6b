use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create model directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Locates the recognition model, downloading it into the user cache on
/// first use.
pub fn resolve(name: &str, url: &str) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, name, url)
}

/// Returns `dir/name` if present, otherwise downloads `url` there.
pub fn resolve_in(dir: &Path, name: &str, url: &str) -> Result<PathBuf, ModelResolveError> {
    let path = dir.join(name);
    if path.is_file() {
        log::debug!("Using cached model {}", path.display());
        return Ok(path);
    }

    fs::create_dir_all(dir).map_err(|e| ModelResolveError::CacheDir {
        path: dir.to_path_buf(),
        source: e,
    })?;
    log::info!("Downloading {name} from {url}");
    download(url, &path)?;
    Ok(path)
}

/// `<platform cache dir>/Attendance/models`.
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("Attendance").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let download_error = |e: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let bytes = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(download_error)?;

    // Stage to a sibling file so a failed write never leaves a truncated model.
    let staging = dest.with_extension("part");
    let write_error = |e: std::io::Error| ModelResolveError::Write {
        path: staging.clone(),
        source: e,
    };
    let mut file = fs::File::create(&staging).map_err(write_error)?;
    file.write_all(&bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    drop(file);

    fs::rename(&staging, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_in_returns_existing_model_without_download() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("arcface.onnx"), b"model").unwrap();

        let path = resolve_in(tmp.path(), "arcface.onnx", "http://invalid.invalid/m.onnx").unwrap();

        assert_eq!(path, tmp.path().join("arcface.onnx"));
    }

    #[test]
    fn test_resolve_in_failed_download_leaves_no_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("models");

        let result = resolve_in(&dir, "arcface.onnx", "http://invalid.invalid/m.onnx");

        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!dir.join("arcface.onnx").exists());
        assert!(!dir.join("arcface.part").exists());
    }

    #[test]
    fn test_model_cache_dir_is_namespaced() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with("Attendance/models"));
    }
}
