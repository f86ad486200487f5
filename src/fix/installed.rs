//! Versions installed in `node_modules` directories.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::parser::{parse_file, MANIFEST_FILE};
use crate::project::NODE_MODULES;

use super::{FixError, FixResult};

/// Installed version of every package reachable from a directory.
///
/// Built by visiting `node_modules` in the directory and in each of its
/// ancestors, closest first; the first version seen for a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledVersions {
    versions: BTreeMap<String, String>,
}

impl InstalledVersions {
    /// Create an empty set of versions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Crawls `cwd` and its ancestors.
    pub fn crawl(cwd: &Path) -> FixResult<Self> {
        let mut installed = Self::new();

        for dir in cwd.ancestors() {
            let node_modules = dir.join(NODE_MODULES);
            if node_modules.is_dir() {
                installed.visit_node_modules(&node_modules)?;
            }
        }

        debug!(packages = installed.len(), cwd = %cwd.display(), "installed versions crawled");
        Ok(installed)
    }

    /// Records `version` for `name` unless a closer install was seen.
    pub fn record(&mut self, name: &str, version: &str) {
        self.versions
            .entry(name.to_string())
            .or_insert_with(|| version.to_string());
    }

    /// Installed version of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    /// Number of known packages.
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if no package is known.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn visit_node_modules(&mut self, node_modules: &Path) -> FixResult<()> {
        for entry in read_dir_sorted(node_modules)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }

            if name.starts_with('@') {
                for scoped in read_dir_sorted(&entry.path())? {
                    self.visit_package(&scoped.path());
                }
            } else {
                self.visit_package(&entry.path());
            }
        }
        Ok(())
    }

    fn visit_package(&mut self, dir: &Path) {
        let manifest_path = dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return;
        }

        // A broken install must not stop the fix.
        let manifest = match parse_file(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!(path = %manifest_path.display(), error = %e, "skipping unreadable installed manifest");
                return;
            }
        };

        if let (Some(name), Some(version)) = (manifest.name, manifest.version) {
            self.record(&name, &version);
        }
    }
}

fn read_dir_sorted(dir: &Path) -> FixResult<Vec<fs::DirEntry>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(FixError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut entries: Vec<fs::DirEntry> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(node_modules: &Path, dir: &str, name: &str, version: &str) {
        let path = node_modules.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(
            path.join(MANIFEST_FILE),
            format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_crawl_prefers_closest_install() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let nested = root.join("packages/a");
        fs::create_dir_all(&nested).unwrap();

        install(&root.join(NODE_MODULES), "lodash", "lodash", "4.17.21");
        install(&root.join(NODE_MODULES), "react", "react", "17.0.2");
        install(&nested.join(NODE_MODULES), "react", "react", "18.2.0");

        let installed = InstalledVersions::crawl(&nested).unwrap();

        assert_eq!(installed.get("react"), Some("18.2.0"));
        assert_eq!(installed.get("lodash"), Some("4.17.21"));
    }

    #[test]
    fn test_crawl_reads_scoped_packages() {
        let dir = TempDir::new().unwrap();
        install(
            &dir.path().join(NODE_MODULES),
            "@babel/core",
            "@babel/core",
            "7.24.0",
        );

        let installed = InstalledVersions::crawl(dir.path()).unwrap();
        assert_eq!(installed.get("@babel/core"), Some("7.24.0"));
    }

    #[test]
    fn test_crawl_skips_dot_dirs_and_broken_manifests() {
        let dir = TempDir::new().unwrap();
        let node_modules = dir.path().join(NODE_MODULES);
        install(&node_modules, ".bin", "not-a-package", "1.0.0");
        fs::create_dir_all(node_modules.join("broken")).unwrap();
        fs::write(node_modules.join("broken").join(MANIFEST_FILE), "{").unwrap();
        install(&node_modules, "ok", "ok", "1.0.0");

        let installed = InstalledVersions::crawl(dir.path()).unwrap();

        assert!(installed.get("not-a-package").is_none());
        assert!(installed.get("broken").is_none());
        assert_eq!(installed.get("ok"), Some("1.0.0"));
    }

    #[test]
    fn test_record_keeps_first() {
        let mut installed = InstalledVersions::new();
        installed.record("a", "1.0.0");
        installed.record("a", "2.0.0");

        assert_eq!(installed.get("a"), Some("1.0.0"));
        assert_eq!(installed.len(), 1);
    }
}
