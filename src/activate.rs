use std::path::Path;

use crate::entry::{EntryKind, FavoriteEntry};

/// Open a favorite: files with the system handler, folders in the file manager
///
/// Failures are logged and suppressed. Returns `true` if a launcher was started.
pub fn activate(entry: &FavoriteEntry) -> bool {
    let Some(path) = entry.path() else {
        tracing::warn!(identifier = %entry.identifier, "Favorite has no filesystem location");
        return false;
    };

    if !path.exists() {
        tracing::warn!(path = %path.display(), "Favorite target no longer exists");
        return false;
    }

    match entry.kind {
        EntryKind::File => open_file(&path),
        EntryKind::Folder => reveal_folder(&path),
    }
}

fn open_file(path: &Path) -> bool {
    tracing::debug!(path = %path.display(), "Opening favorite file");
    match open::that(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(%e, ?path, "Failed to open file");
            false
        }
    }
}

/// Reveal a folder in Finder (macOS) or the platform file explorer
fn reveal_folder(path: &Path) -> bool {
    tracing::debug!(path = %path.display(), "Revealing favorite folder");

    #[cfg(target_os = "macos")]
    {
        // `open -R` selects the folder in its parent Finder window
        match std::process::Command::new("open").arg("-R").arg(path).spawn() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(%e, ?path, "Failed to reveal in Finder");
                false
            }
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        match open::that(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%e, ?path, "Failed to open folder");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::locator_for_path;
    use tempfile::TempDir;

    #[test]
    fn test_activate_missing_target_is_suppressed() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("deleted.md");
        let entry = FavoriteEntry::new(locator_for_path(&gone), EntryKind::File, 0);
        assert!(!activate(&entry));
    }

    #[test]
    fn test_activate_without_location_is_suppressed() {
        let entry = FavoriteEntry::new("untitled:Untitled-1", EntryKind::File, 0);
        assert!(!activate(&entry));
    }
}
