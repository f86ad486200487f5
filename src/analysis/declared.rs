//! Declared dependencies of a workspace.

use std::collections::BTreeSet;

use crate::graph::DependencyGraph;
use crate::parser::DependencyScope;
use crate::project::{Project, Workspace};

/// What a workspace declares, plus the names that are implicitly needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredDependencies {
    /// `dependencies` (and `optionalDependencies`).
    pub dependencies: BTreeSet<String>,
    pub dev_dependencies: BTreeSet<String>,
    pub peer_dependencies: BTreeSet<String>,
    /// Peer dependencies of the installed direct dependencies.
    pub transitive_peer_dependencies: BTreeSet<String>,
    /// Direct non-peer dependencies that install executables; only collected
    /// for the top-level workspace.
    pub binaries: BTreeSet<String>,
}

impl DeclaredDependencies {
    /// Returns true if importing `name` from a file of the given kind is
    /// covered by a declaration.
    ///
    /// `dependencies` cover every file; `devDependencies` only dev files;
    /// `peerDependencies` only production files.
    pub fn covers(&self, name: &str, from_dev_file: bool) -> bool {
        self.dependencies.contains(name)
            || (from_dev_file && self.dev_dependencies.contains(name))
            || (!from_dev_file && self.peer_dependencies.contains(name))
    }
}

/// Collects what `workspace` declares and what its installed direct
/// dependencies need.
///
/// Transitive peers are gathered one level deep: only the peers declared by
/// direct dependencies count.
pub fn collect_declared(
    project: &Project,
    graph: &DependencyGraph,
    workspace: &Workspace,
) -> DeclaredDependencies {
    let manifest = &workspace.manifest;
    let mut declared = DeclaredDependencies {
        dependencies: manifest.names_in_scope(DependencyScope::Dependencies),
        dev_dependencies: manifest.names_in_scope(DependencyScope::DevDependencies),
        peer_dependencies: manifest.names_in_scope(DependencyScope::PeerDependencies),
        ..Default::default()
    };

    let is_top_level = project.is_top_level(workspace);

    for (scope, pkg) in graph.resolved_for(workspace) {
        declared
            .transitive_peer_dependencies
            .extend(pkg.peer_dependencies.iter().cloned());

        if is_top_level
            && pkg.has_bin
            && scope != DependencyScope::PeerDependencies
            && !declared.peer_dependencies.contains(&pkg.name)
        {
            declared.binaries.insert(pkg.name.clone());
        }
    }

    declared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::project::InstalledPackage;
    use std::path::{Path, PathBuf};

    fn installed(name: &str, peers: &[&str], has_bin: bool) -> InstalledPackage {
        InstalledPackage {
            name: name.to_string(),
            version: Some("1.0.0".to_string()),
            dir: PathBuf::from(format!("/repo/node_modules/{name}")),
            peer_dependencies: peers.iter().map(|p| p.to_string()).collect(),
            has_bin,
        }
    }

    fn project() -> Project {
        let root = Workspace::new(
            PathBuf::from("/repo"),
            parse_str(
                r#"{
                    "name": "root",
                    "dependencies": {"react-dom": "^18.0.0"},
                    "devDependencies": {"jest": "^29.0.0"},
                    "peerDependencies": {"eslint": "*"},
                    "optionalDependencies": {"fsevents": "*"}
                }"#,
            )
            .unwrap(),
        );
        let child = Workspace::new(
            PathBuf::from("/repo/packages/a"),
            parse_str(r#"{"name": "a", "devDependencies": {"jest": "^29.0.0"}}"#).unwrap(),
        );
        Project::from_workspaces(PathBuf::from("/repo"), vec![root, child])
    }

    fn graph() -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        let root = Path::new("/repo");
        graph.add_resolution(
            root,
            DependencyScope::Dependencies,
            installed("react-dom", &["react"], false),
        );
        graph.add_resolution(root, DependencyScope::DevDependencies, installed("jest", &[], true));
        graph.add_resolution(
            root,
            DependencyScope::PeerDependencies,
            installed("eslint", &[], true),
        );
        graph.add_resolution(
            Path::new("/repo/packages/a"),
            DependencyScope::DevDependencies,
            installed("jest", &[], true),
        );
        graph
    }

    #[test]
    fn test_collect_top_level() {
        let project = project();
        let declared = collect_declared(&project, &graph(), &project.workspaces()[0]);

        assert!(declared.dependencies.contains("react-dom"));
        assert!(declared.dependencies.contains("fsevents"));
        assert!(declared.dev_dependencies.contains("jest"));
        assert!(declared.peer_dependencies.contains("eslint"));
        assert_eq!(
            declared.transitive_peer_dependencies,
            BTreeSet::from(["react".to_string()])
        );
        // peers are never binaries
        assert_eq!(declared.binaries, BTreeSet::from(["jest".to_string()]));
    }

    #[test]
    fn test_binaries_only_for_top_level() {
        let project = project();
        let declared = collect_declared(&project, &graph(), &project.workspaces()[1]);

        assert!(declared.dev_dependencies.contains("jest"));
        assert!(declared.binaries.is_empty());
    }

    #[test]
    fn test_uninstalled_dependencies_contribute_nothing() {
        let project = project();
        let declared =
            collect_declared(&project, &DependencyGraph::new(), &project.workspaces()[0]);

        assert!(declared.transitive_peer_dependencies.is_empty());
        assert!(declared.binaries.is_empty());
        assert!(declared.dependencies.contains("react-dom"));
    }

    #[test]
    fn test_covers() {
        let declared = DeclaredDependencies {
            dependencies: BTreeSet::from(["a".to_string()]),
            dev_dependencies: BTreeSet::from(["d".to_string()]),
            peer_dependencies: BTreeSet::from(["p".to_string()]),
            ..Default::default()
        };

        assert!(declared.covers("a", true));
        assert!(declared.covers("a", false));
        assert!(declared.covers("d", true));
        assert!(!declared.covers("d", false));
        assert!(declared.covers("p", false));
        assert!(!declared.covers("p", true));
        assert!(!declared.covers("x", false));
    }
}
