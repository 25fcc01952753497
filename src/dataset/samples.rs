//! Labeled sample discovery from class-per-directory datasets
//!
//! A dataset root holds one directory per soil type (`<root>/Sand/...`).
//! The ground-truth label of a sample comes from that directory name,
//! never from the file name.

use crate::io::configuration::IGNORED_FILE_MARKER;
use crate::io::error::{Result, file_system_error};
use crate::io::image::has_image_extension;
use crate::model::SoilLabel;
use std::path::{Path, PathBuf};

/// An image path paired with its known soil type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabeledSample {
    /// Image file
    pub path: PathBuf,
    /// Ground-truth soil type
    pub label: SoilLabel,
}

impl LabeledSample {
    /// Pair `path` with `label`
    pub fn new(path: impl Into<PathBuf>, label: SoilLabel) -> Self {
        Self {
            path: path.into(),
            label,
        }
    }
}

/// Image files directly inside `dir`, sorted by path
///
/// Files whose name contains the desktop metadata marker are skipped.
///
/// # Errors
///
/// Returns a file system error if the directory cannot be listed
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| file_system_error(dir, "read directory", e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| file_system_error(dir, "read directory entry", e))?
            .path();
        let ignored = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(IGNORED_FILE_MARKER));
        if path.is_file() && !ignored && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Directory under `root` naming `label`, matched case-insensitively
///
/// # Errors
///
/// Returns a file system error if `root` cannot be listed
pub fn class_directory(root: &Path, label: SoilLabel) -> Result<Option<PathBuf>> {
    let exact = root.join(label.name());
    if exact.is_dir() {
        return Ok(Some(exact));
    }

    let entries =
        std::fs::read_dir(root).map_err(|e| file_system_error(root, "read directory", e))?;
    for entry in entries {
        let path = entry
            .map_err(|e| file_system_error(root, "read directory entry", e))?
            .path();
        let matches = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(label.name()));
        if matches && path.is_dir() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Collect every image under `<root>/<Label>/`, labeled by its directory
///
/// Directory names are matched case-insensitively; directories that do
/// not name a soil type are skipped with a warning.
///
/// # Errors
///
/// Returns a file system error if the root or a class directory cannot be listed
pub fn collect_samples(root: &Path) -> Result<Vec<LabeledSample>> {
    let entries =
        std::fs::read_dir(root).map_err(|e| file_system_error(root, "read directory", e))?;

    let mut class_dirs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| file_system_error(root, "read directory entry", e))?
            .path();
        if path.is_dir() {
            class_dirs.push(path);
        }
    }
    class_dirs.sort();

    let mut samples = Vec::new();
    for dir in class_dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Ok(label) = name.parse::<SoilLabel>() else {
            tracing::warn!(directory = %dir.display(), "Skipping directory that names no soil type");
            continue;
        };
        for path in list_images(&dir)? {
            samples.push(LabeledSample { path, label });
        }
    }

    tracing::debug!(root = %root.display(), samples = samples.len(), "Collected samples");
    Ok(samples)
}
