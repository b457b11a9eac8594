use std::fs;
use std::path::Path;

use crate::entry::EntryKind;

/// Classify a path as file or folder
///
/// Returns `None` if the path cannot be stat'ed (missing, permission denied, ...).
pub fn classify(path: impl AsRef<Path>) -> Option<EntryKind> {
    let path = path.as_ref();
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => Some(EntryKind::Folder),
        Ok(_) => Some(EntryKind::File),
        Err(e) => {
            tracing::debug!(%e, path = %path.display(), "Failed to stat path");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classify() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("notes.md");
        std::fs::write(&file_path, "test").unwrap();

        assert_eq!(classify(&file_path), Some(EntryKind::File));
        assert_eq!(classify(temp_dir.path()), Some(EntryKind::Folder));
        assert_eq!(classify(temp_dir.path().join("missing.md")), None);
    }
}
