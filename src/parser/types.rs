//! Shared types for manifest parsing.
//!
//! This module defines the data structures used to represent
//! package.json manifests and the dependency scopes they declare.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Represents the structure of a package.json file.
///
/// Only the fields relevant to dependency auditing are captured; every
/// other field is ignored on read. Writing goes through
/// [`ManifestDocument`](super::package_json::ManifestDocument) so that
/// unknown fields survive a fix.
///
/// # Example
///
/// ```ignore
/// use ghost_imports::parser::types::PackageJson;
/// use serde_json;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageJson {
    /// The name of the package, `@scope/name` or `name`.
    pub name: Option<String>,

    /// The version of the package (semver format).
    pub version: Option<String>,

    /// A brief description of the package.
    pub description: Option<String>,

    /// Production dependencies required at runtime.
    pub dependencies: Option<BTreeMap<String, String>>,

    /// Development-only dependencies (testing, building, etc.).
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<BTreeMap<String, String>>,

    /// Peer dependencies that the host package must provide.
    #[serde(rename = "peerDependencies")]
    pub peer_dependencies: Option<BTreeMap<String, String>>,

    /// Optional dependencies, installed like regular dependencies.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<BTreeMap<String, String>>,

    /// Workspace globs declared by a monorepo root.
    pub workspaces: Option<Workspaces>,

    /// Executables installed by this package.
    pub bin: Option<Binaries>,
}

/// The two shapes of the `workspaces` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    /// `"workspaces": ["packages/*"]`
    List(Vec<String>),
    /// `"workspaces": { "packages": ["packages/*"] }`
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    /// Returns the workspace glob patterns regardless of shape.
    pub fn patterns(&self) -> &[String] {
        match self {
            Workspaces::List(patterns) => patterns,
            Workspaces::Object { packages } => packages,
        }
    }
}

/// The two shapes of the `bin` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binaries {
    /// `"bin": "./cli.js"`, the executable is named after the package.
    Single(String),
    /// `"bin": { "tool": "./cli.js" }`
    Named(BTreeMap<String, String>),
}

impl Binaries {
    /// Returns true if no executable is exposed.
    pub fn is_empty(&self) -> bool {
        match self {
            Binaries::Single(path) => path.trim().is_empty(),
            Binaries::Named(entries) => entries.is_empty(),
        }
    }
}

impl PackageJson {
    /// Returns true if the package installs at least one executable.
    pub fn has_binaries(&self) -> bool {
        self.bin.as_ref().is_some_and(|bin| !bin.is_empty())
    }

    /// Returns the workspace globs declared by this manifest, if any.
    pub fn workspace_patterns(&self) -> &[String] {
        self.workspaces
            .as_ref()
            .map(|w| w.patterns())
            .unwrap_or_default()
    }

    /// Returns the names declared in the given scope.
    ///
    /// `optionalDependencies` are reported as part of
    /// [`DependencyScope::Dependencies`]: they are installed and imported
    /// exactly like regular dependencies.
    pub fn names_in_scope(&self, scope: DependencyScope) -> BTreeSet<String> {
        let maps = match scope {
            DependencyScope::Dependencies => {
                vec![&self.dependencies, &self.optional_dependencies]
            }
            DependencyScope::DevDependencies => vec![&self.dev_dependencies],
            DependencyScope::PeerDependencies => vec![&self.peer_dependencies],
        };

        maps.into_iter()
            .filter_map(|map| map.as_ref())
            .flat_map(|map| map.keys().cloned())
            .collect()
    }

    /// Returns the peer dependency names this package declares.
    pub fn peer_dependency_names(&self) -> BTreeSet<String> {
        self.names_in_scope(DependencyScope::PeerDependencies)
    }
}

/// The manifest scope a dependency is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyScope {
    /// `dependencies`, required at runtime.
    #[serde(rename = "dependencies")]
    Dependencies,

    /// `devDependencies`, only needed during development.
    #[serde(rename = "devDependencies")]
    DevDependencies,

    /// `peerDependencies`, expected to be provided by the consumer.
    #[serde(rename = "peerDependencies")]
    PeerDependencies,
}

impl DependencyScope {
    /// All scopes, in manifest order.
    pub const ALL: [DependencyScope; 3] = [
        DependencyScope::Dependencies,
        DependencyScope::DevDependencies,
        DependencyScope::PeerDependencies,
    ];

    /// Returns the package.json key of the scope.
    pub fn manifest_key(&self) -> &'static str {
        match self {
            DependencyScope::Dependencies => "dependencies",
            DependencyScope::DevDependencies => "devDependencies",
            DependencyScope::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.manifest_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_scope_display_matches_manifest_key() {
        for scope in DependencyScope::ALL {
            assert_eq!(format!("{}", scope), scope.manifest_key());
        }
    }

    #[test]
    fn test_dependency_scope_serde() {
        let json = serde_json::to_string(&DependencyScope::DevDependencies).unwrap();
        assert_eq!(json, "\"devDependencies\"");

        let scope: DependencyScope = serde_json::from_str("\"peerDependencies\"").unwrap();
        assert_eq!(scope, DependencyScope::PeerDependencies);
    }

    #[test]
    fn test_package_json_default() {
        let pkg = PackageJson::default();
        assert!(pkg.name.is_none());
        assert!(!pkg.has_binaries());
        assert!(pkg.workspace_patterns().is_empty());
    }

    #[test]
    fn test_optional_dependencies_fold_into_dependencies() {
        let json = r#"{
            "name": "app",
            "dependencies": {"react": "^18.0.0"},
            "optionalDependencies": {"fsevents": "^2.3.0"}
        }"#;
        let pkg: PackageJson = serde_json::from_str(json).unwrap();

        let deps = pkg.names_in_scope(DependencyScope::Dependencies);
        assert!(deps.contains("react"));
        assert!(deps.contains("fsevents"));
        assert!(pkg.names_in_scope(DependencyScope::DevDependencies).is_empty());
    }

    #[test]
    fn test_workspaces_both_shapes() {
        let list: PackageJson =
            serde_json::from_str(r#"{"workspaces": ["packages/*"]}"#).unwrap();
        assert_eq!(list.workspace_patterns(), ["packages/*".to_string()]);

        let object: PackageJson =
            serde_json::from_str(r#"{"workspaces": {"packages": ["apps/*"]}}"#).unwrap();
        assert_eq!(object.workspace_patterns(), ["apps/*".to_string()]);
    }

    #[test]
    fn test_binaries_both_shapes() {
        let single: PackageJson = serde_json::from_str(r#"{"bin": "./cli.js"}"#).unwrap();
        assert!(single.has_binaries());

        let named: PackageJson =
            serde_json::from_str(r#"{"bin": {"tool": "./cli.js"}}"#).unwrap();
        assert!(named.has_binaries());

        let empty: PackageJson = serde_json::from_str(r#"{"bin": {}}"#).unwrap();
        assert!(!empty.has_binaries());
    }
}
