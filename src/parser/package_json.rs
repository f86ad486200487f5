//! Reader and writer for npm package.json files.
//!
//! Reading produces the typed [`PackageJson`] used by the analyzer. Writing
//! goes through [`ManifestDocument`], which keeps the whole JSON document
//! (including fields the analyzer does not model) in its original key order.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use super::types::{DependencyScope, PackageJson};

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read or write the file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The package.json is not a JSON object.
    #[error("Invalid package.json: {0}")]
    InvalidPackage(String),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json file from a file path.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use ghost_imports::parser::package_json::parse_file;
///
/// let pkg = parse_file(Path::new("package.json")).unwrap();
/// println!("Package: {:?}", pkg.name);
/// ```
pub fn parse_file(path: &Path) -> ParseResult<PackageJson> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a package.json from a string.
///
/// # Example
///
/// ```
/// use ghost_imports::parser::package_json::parse_str;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg = parse_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
pub fn parse_str(content: &str) -> ParseResult<PackageJson> {
    let pkg: PackageJson = serde_json::from_str(content)?;
    Ok(pkg)
}

/// A package.json held as a generic JSON document for in-place edits.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    root: Map<String, Value>,
}

impl ManifestDocument {
    /// Reads a manifest from disk.
    pub fn read(path: &Path) -> ParseResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses a manifest document from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ParseResult<Self> {
        match serde_json::from_str(content)? {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(ParseError::InvalidPackage(
                "package.json is not a JSON object".to_string(),
            )),
        }
    }

    /// Returns the dependency range declared under `key` for `name`.
    pub fn get(&self, key: &str, name: &str) -> Option<&str> {
        self.root.get(key)?.as_object()?.get(name)?.as_str()
    }

    /// Removes `name` from the object stored under `key`.
    ///
    /// Returns true if an entry was removed.
    pub fn remove(&mut self, key: &str, name: &str) -> bool {
        self.root
            .get_mut(key)
            .and_then(Value::as_object_mut)
            .is_some_and(|deps| deps.shift_remove(name).is_some())
    }

    /// Declares `name` with `range` in the given scope.
    ///
    /// The scope object is created when missing and its entries are kept
    /// sorted by name.
    pub fn insert(&mut self, scope: DependencyScope, name: &str, range: &str) {
        let key = scope.manifest_key();
        let entry = self
            .root
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }

        if let Value::Object(deps) = entry {
            deps.insert(name.to_string(), Value::String(range.to_string()));

            let mut entries: Vec<(String, Value)> = std::mem::take(deps).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            *deps = entries.into_iter().collect();
        }
    }

    /// Serializes the document the way package managers write manifests:
    /// two-space indentation and a trailing newline.
    pub fn to_string_pretty(&self) -> ParseResult<String> {
        let mut content = serde_json::to_string_pretty(&self.root)?;
        content.push('\n');
        Ok(content)
    }

    /// Writes the document to `path`.
    ///
    /// The new content is fully serialized into a temporary file next to the
    /// target and then renamed over it, so a failure never leaves a
    /// truncated manifest behind.
    pub fn persist(&self, path: &Path) -> ParseResult<()> {
        let content = self.to_string_pretty()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(content.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| ParseError::IoError(e.error))?;
        Ok(())
    }
}
