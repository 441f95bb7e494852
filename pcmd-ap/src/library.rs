//! Track library listing
//!
//! The daemon resolves relative PLAY names against its root folder; this
//! lists the names that folder offers so clients do not have to guess them.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Regular files directly inside `root`, as names relative to it, sorted
pub fn list_tracks(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|e| {
        Error::Config(format!("Failed to read library folder {:?}: {}", root, e))
    })?;

    let mut tracks = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            tracks.push(PathBuf::from(entry.file_name()));
        } else {
            debug!("Skipping non-file entry {:?}", entry.path());
        }
    }
    tracks.sort();
    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pcm"), [0u8; 4]).unwrap();
        fs::write(dir.path().join("a.pcm"), [0u8; 4]).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let tracks = list_tracks(dir.path()).unwrap();
        assert_eq!(tracks, vec![PathBuf::from("a.pcm"), PathBuf::from("b.pcm")]);
    }

    #[test]
    fn test_missing_folder_is_error() {
        assert!(matches!(
            list_tracks(Path::new("/nonexistent/pcmd/library")),
            Err(Error::Config(_))
        ));
    }
}
