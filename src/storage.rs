// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for exported photos

use crate::constants::APP_DIR_NAME;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where downloads land when no save directory is configured
///
/// Downloads, then Pictures, then home, then the working directory.
pub fn default_save_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::picture_dir)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Directory holding encoded photos between `href` assignment and the link click
pub fn staging_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

/// First free path for `filename` in `dir`, browser download style
///
/// `mySelfie.jpg` becomes `mySelfie (1).jpg`, `mySelfie (2).jpg`, ... when taken.
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n = 1u32;
    loop {
        let name = match &extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(&name);
        if !candidate.exists() {
            debug!(original = filename, renamed = %name, "Download name taken");
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_name_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            unique_destination(dir.path(), "mySelfie.jpg"),
            dir.path().join("mySelfie.jpg")
        );
    }

    #[test]
    fn test_taken_names_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mySelfie.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join("mySelfie (1).jpg"), b"b").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "mySelfie.jpg"),
            dir.path().join("mySelfie (2).jpg")
        );
    }

    #[test]
    fn test_name_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("photo"), b"a").unwrap();
        assert_eq!(
            unique_destination(dir.path(), "photo"),
            dir.path().join("photo (1)")
        );
    }
}
