//! Favorite entries and resource locators.
//!
//! This module provides:
//! - `EntryKind`: Whether a favorite points at a file or a folder
//! - `FavoriteEntry`: A single favorited resource with its display rank
//! - `locator_for_path` / `locator_path`: Conversion between paths and `file://` locators

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Component, Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Characters escaped in the path component of a `file://` locator
const PATH_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b']')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Kind of resource a favorite points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Folder => "folder",
        }
    }
}

/// A single favorite entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteEntry {
    /// Opaque resource locator (usually a `file://` URI)
    #[serde(rename = "uri")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Display rank; lower sorts first
    #[serde(default, deserialize_with = "deserialize_order")]
    pub order: u32,
}

/// Missing and `null` ranks both load as 0
fn deserialize_order<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

impl FavoriteEntry {
    pub fn new(identifier: impl Into<String>, kind: EntryKind, order: u32) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            order,
        }
    }

    /// Filesystem location of this entry, if the locator has one
    pub fn path(&self) -> Option<PathBuf> {
        locator_path(&self.identifier)
    }

    /// Last segment of the locator
    pub fn display_name(&self) -> String {
        match self.path() {
            Some(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => self
                .identifier
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(&self.identifier)
                .to_string(),
        }
    }

    /// Parent directory relative to `root`
    ///
    /// Returns `None` when the entry lies outside `root` or directly inside it.
    pub fn description(&self, root: &Path) -> Option<String> {
        let path = self.path()?;
        let relative = path.strip_prefix(root).ok()?;
        let parent = relative.parent()?;
        if parent.as_os_str().is_empty() || parent == Path::new(".") {
            return None;
        }
        Some(parent.display().to_string())
    }
}

/// Build a `file://` locator for an absolute path
pub fn locator_for_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded = utf8_percent_encode(&raw, PATH_ESCAPE).to_string();
    if encoded.starts_with('/') {
        format!("{FILE_SCHEME}{encoded}")
    } else {
        // Windows drive paths (C:/...) need the extra slash
        format!("{FILE_SCHEME}/{encoded}")
    }
}

/// Resolve a locator to a filesystem path
///
/// Accepts `file://` URIs and plain absolute paths. Anything else has no
/// filesystem location.
pub fn locator_path(identifier: &str) -> Option<PathBuf> {
    if let Some(rest) = identifier.strip_prefix(FILE_SCHEME) {
        // Skip an authority component such as `localhost`
        let path_part = match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => return None,
        };
        let decoded = percent_decode_str(path_part).decode_utf8().ok()?;
        let decoded = decoded.into_owned();
        #[cfg(windows)]
        let decoded = decoded
            .strip_prefix('/')
            .map(str::to_string)
            .unwrap_or(decoded);
        return Some(PathBuf::from(decoded));
    }

    let path = Path::new(identifier);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Lexically clean a path: drop `.`, resolve `..`, strip trailing separators
///
/// The filesystem is not consulted, so symlinks are left alone.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = normalized.components().next_back();
                if matches!(last, Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !matches!(last, Some(Component::RootDir | Component::Prefix(_))) {
                    // `..` directly under the root is dropped; relative paths keep it
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Resolve `path` against `base` and normalize it
pub fn absolute_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}

/// Normalize user input (a path or a locator) into a locator
///
/// Relative paths are resolved against `base`. `file://` locators are
/// normalized the same way; other schemes pass through untouched.
pub fn normalize_locator(input: &str, base: &Path) -> String {
    if input.contains("://") {
        return match input.starts_with(FILE_SCHEME).then(|| locator_path(input)).flatten() {
            Some(path) => locator_for_path(&normalize_path(&path)),
            None => input.to_string(),
        };
    }
    locator_for_path(&absolute_path(Path::new(input), base))
}
