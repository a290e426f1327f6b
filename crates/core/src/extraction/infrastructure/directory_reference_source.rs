use std::fs;
use std::path::{Path, PathBuf};

use crate::extraction::domain::reference_image_source::{ReferenceImageSource, SourceError};
use crate::shared::roll_id::RollId;

/// Reads reference files laid out as `<root>/<roll_id>/<file>`.
///
/// Only files whose extension (case-insensitive) is in `extensions` are
/// returned, sorted by path so builds are reproducible. Folder names are
/// normalized like roll IDs, so `BT23ECI024_Pragyan/` serves
/// `bt23eci024_pragyan`. A roll ID without a folder has no reference images.
pub struct DirectoryReferenceSource {
    root: PathBuf,
    extensions: &'static [&'static str],
}

impl DirectoryReferenceSource {
    pub fn new(root: impl Into<PathBuf>, extensions: &'static [&'static str]) -> Self {
        Self {
            root: root.into(),
            extensions,
        }
    }

    /// Folders under the root whose name normalizes to `roll_id`.
    fn student_dirs(&self, roll_id: &RollId) -> std::io::Result<Vec<PathBuf>> {
        let mut dirs = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| RollId::new(n).ok())
                .is_some_and(|id| id == *roll_id);
            if matches && path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }
}

impl ReferenceImageSource for DirectoryReferenceSource {
    fn fetch_reference_images(&self, roll_id: &RollId) -> Result<Vec<Vec<u8>>, SourceError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let error = |path: &Path, e: std::io::Error| SourceError {
            roll_id: roll_id.clone(),
            message: format!("{}: {e}", path.display()),
        };

        let dirs = self.student_dirs(roll_id).map_err(|e| error(&self.root, e))?;
        let mut paths = Vec::new();
        for dir in &dirs {
            let entries = fs::read_dir(dir).map_err(|e| error(dir, e))?;
            paths.extend(
                entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && self.accepts(p)),
            );
        }
        paths.sort();

        paths
            .iter()
            .map(|p| fs::read(p).map_err(|e| error(p, e)))
            .collect()
    }
}
