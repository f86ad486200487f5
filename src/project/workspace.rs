//! Workspaces and installed packages.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::parser::{PackageJson, MANIFEST_FILE};

/// A package directory that belongs to the project.
///
/// Single-package projects have exactly one workspace, the top-level one.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Absolute directory holding the workspace's package.json.
    pub cwd: PathBuf,
    /// The parsed manifest.
    pub manifest: PackageJson,
}

impl Workspace {
    /// Creates a workspace rooted at `cwd`.
    pub fn new(cwd: PathBuf, manifest: PackageJson) -> Self {
        Self { cwd, manifest }
    }

    /// Returns the workspace identity (its package name), if declared.
    pub fn ident(&self) -> Option<&str> {
        self.manifest
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Returns the path of the workspace's package.json.
    pub fn manifest_path(&self) -> PathBuf {
        self.cwd.join(MANIFEST_FILE)
    }

    /// Returns true if `path` is located inside this workspace directory.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.cwd)
    }
}

/// A package found in a `node_modules` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    /// Name the package is installed under, which is the name declared by
    /// the dependent manifest.
    pub name: String,
    /// Installed version, if declared.
    pub version: Option<String>,
    /// Install directory; two resolutions to the same directory are the
    /// same package.
    pub dir: PathBuf,
    /// Peer dependencies declared by the package.
    pub peer_dependencies: BTreeSet<String>,
    /// Whether the package installs executables.
    pub has_bin: bool,
}

impl InstalledPackage {
    /// Builds an installed package from its manifest.
    ///
    /// `requested` is the name it was resolved under; aliased installs keep
    /// the alias rather than the manifest's own name.
    pub fn from_manifest(requested: &str, dir: PathBuf, manifest: &PackageJson) -> Self {
        Self {
            name: requested.to_string(),
            version: manifest.version.clone(),
            dir,
            peer_dependencies: manifest.peer_dependency_names(),
            has_bin: manifest.has_binaries(),
        }
    }
}
