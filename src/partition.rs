use std::fmt;
use std::path::{Path, PathBuf};

use crate::entry::locator_path;

const KEY_PREFIX: &str = "favorites_";
const GLOBAL_KEY: &str = "favorites_global";

/// Scope a favorites list is persisted under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    /// List owned by an open workspace root folder
    Workspace(PathBuf),
    /// List used when no workspace folder is open
    Global,
}

impl PartitionKey {
    /// Key used in the key-value persistence layer
    pub fn storage_key(&self) -> String {
        match self {
            PartitionKey::Workspace(root) => format!("{KEY_PREFIX}{}", root.display()),
            PartitionKey::Global => GLOBAL_KEY.to_string(),
        }
    }

    /// Workspace root of this partition, if any
    pub fn root(&self) -> Option<&Path> {
        match self {
            PartitionKey::Workspace(root) => Some(root),
            PartitionKey::Global => None,
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionKey::Workspace(root) => write!(f, "{}", root.display()),
            PartitionKey::Global => f.write_str("global"),
        }
    }
}

/// Resolve the partition owning `identifier`
///
/// The deepest workspace root containing the locator wins. A locator outside
/// every root (or without a filesystem location) falls back to the first root,
/// and to the global partition when no roots are open.
pub fn partition_for(identifier: &str, roots: &[PathBuf]) -> PartitionKey {
    let containing = locator_path(identifier).and_then(|path| {
        roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    });

    match containing.or_else(|| roots.first().cloned()) {
        Some(root) => PartitionKey::Workspace(root),
        None => PartitionKey::Global,
    }
}

/// Partitions to load at startup, in root order
pub fn partitions_for_roots(roots: &[PathBuf]) -> Vec<PartitionKey> {
    if roots.is_empty() {
        vec![PartitionKey::Global]
    } else {
        roots
            .iter()
            .cloned()
            .map(PartitionKey::Workspace)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roots() -> Vec<PathBuf> {
        vec![PathBuf::from("/ws/app"), PathBuf::from("/ws/lib")]
    }

    #[test]
    fn test_partition_for_containing_root() {
        assert_eq!(
            partition_for("file:///ws/lib/src/lib.rs", &roots()),
            PartitionKey::Workspace(PathBuf::from("/ws/lib"))
        );
    }

    #[test]
    fn test_partition_for_prefers_deepest_root() {
        let roots = vec![PathBuf::from("/ws"), PathBuf::from("/ws/nested")];
        assert_eq!(
            partition_for("file:///ws/nested/a.rs", &roots),
            PartitionKey::Workspace(PathBuf::from("/ws/nested"))
        );
        assert_eq!(
            partition_for("file:///ws/other/a.rs", &roots),
            PartitionKey::Workspace(PathBuf::from("/ws"))
        );
    }

    #[test]
    fn test_partition_for_sibling_prefix_is_not_contained() {
        // `/ws/application` shares a string prefix with `/ws/app` but is not inside it
        let roots = vec![PathBuf::from("/ws/lib"), PathBuf::from("/ws/app")];
        assert_eq!(
            partition_for("file:///ws/application/x.rs", &roots),
            PartitionKey::Workspace(PathBuf::from("/ws/lib"))
        );
    }

    #[test]
    fn test_partition_for_falls_back_to_first_root() {
        assert_eq!(
            partition_for("file:///elsewhere/notes.md", &roots()),
            PartitionKey::Workspace(PathBuf::from("/ws/app"))
        );
        assert_eq!(
            partition_for("untitled:Untitled-1", &roots()),
            PartitionKey::Workspace(PathBuf::from("/ws/app"))
        );
    }

    #[test]
    fn test_partition_for_global_without_roots() {
        assert_eq!(partition_for("file:///a/b", &[]), PartitionKey::Global);
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(
            PartitionKey::Workspace(PathBuf::from("/ws/app")).storage_key(),
            "favorites_/ws/app"
        );
        assert_eq!(PartitionKey::Global.storage_key(), "favorites_global");
    }

    #[test]
    fn test_partitions_for_roots() {
        assert_eq!(partitions_for_roots(&[]), vec![PartitionKey::Global]);
        assert_eq!(
            partitions_for_roots(&roots()),
            vec![
                PartitionKey::Workspace(PathBuf::from("/ws/app")),
                PartitionKey::Workspace(PathBuf::from("/ws/lib")),
            ]
        );
    }
}
