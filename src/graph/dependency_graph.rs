//! Resolved dependency graph implementation using petgraph.
//!
//! Nodes are workspaces and the installed packages their declared
//! dependencies resolve to; edges point from a workspace to a package and
//! carry the manifest scope that declared the dependency.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::parser::DependencyScope;
use crate::project::{InstalledPackage, Project, ProjectResult, Workspace};

/// A node of the resolved graph.
#[derive(Debug, Clone)]
pub enum GraphNode {
    /// A workspace of the project, identified by its directory.
    Workspace(PathBuf),
    /// An installed package, identified by its install directory.
    Package(InstalledPackage),
}

impl GraphNode {
    /// Returns the directory identifying this node.
    pub fn locator(&self) -> &Path {
        match self {
            GraphNode::Workspace(dir) => dir,
            GraphNode::Package(pkg) => &pkg.dir,
        }
    }
}

/// The graph of what every workspace's declared dependencies resolve to.
///
/// # Example
///
/// ```ignore
/// use ghost_imports::graph::DependencyGraph;
/// use ghost_imports::project::Project;
///
/// let project = Project::discover(std::path::Path::new("."))?;
/// let graph = DependencyGraph::build(&project)?;
/// for (scope, pkg) in graph.resolved_dependencies(&project.workspaces()[0].cwd) {
///     println!("{} -> {}", scope, pkg.name);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<GraphNode, DependencyScope>,
    /// Maps locators to their node indices for O(1) lookup
    node_indices: HashMap<PathBuf, NodeIndex>,
}

impl DependencyGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every declared dependency of every workspace.
    ///
    /// Dependencies that are not installed are left out of the graph.
    pub fn build(project: &Project) -> ProjectResult<Self> {
        let mut graph = Self::new();

        for workspace in project.workspaces() {
            graph.add_workspace(&workspace.cwd);

            for scope in DependencyScope::ALL {
                for name in workspace.manifest.names_in_scope(scope) {
                    match project.resolve_installed(&workspace.cwd, &name)? {
                        Some(pkg) => graph.add_resolution(&workspace.cwd, scope, pkg),
                        None => debug!(
                            workspace = workspace.ident().unwrap_or("<unnamed>"),
                            dependency = %name,
                            %scope,
                            "dependency is not installed"
                        ),
                    }
                }
            }
        }

        Ok(graph)
    }

    /// Adds a workspace node, returning its index.
    pub fn add_workspace(&mut self, cwd: &Path) -> NodeIndex {
        self.add_node(GraphNode::Workspace(cwd.to_path_buf()))
    }

    /// Records that a dependency declared by the workspace at `cwd` in
    /// `scope` resolves to `pkg`.
    pub fn add_resolution(&mut self, cwd: &Path, scope: DependencyScope, pkg: InstalledPackage) {
        let from = self.add_workspace(cwd);
        let to = self.add_node(GraphNode::Package(pkg));
        self.graph.add_edge(from, to, scope);
    }

    /// Adds `node` unless a node with the same locator exists.
    fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(node.locator()) {
            return idx;
        }

        let locator = node.locator().to_path_buf();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(locator, idx);
        idx
    }

    /// Iterates the installed packages the workspace at `cwd` resolves,
    /// with the scope each was declared in.
    pub fn resolved_dependencies<'a>(
        &'a self,
        cwd: &Path,
    ) -> impl Iterator<Item = (DependencyScope, &'a InstalledPackage)> + 'a {
        let idx = self.node_indices.get(cwd).copied();

        idx.into_iter().flat_map(move |idx| {
            self.graph
                .edges_directed(idx, Direction::Outgoing)
                .filter_map(move |edge| match self.graph.node_weight(edge.target()) {
                    Some(GraphNode::Package(pkg)) => Some((*edge.weight(), pkg)),
                    _ => None,
                })
        })
    }

    /// Convenience wrapper over [`resolved_dependencies`](Self::resolved_dependencies).
    pub fn resolved_for<'a>(
        &'a self,
        workspace: &Workspace,
    ) -> impl Iterator<Item = (DependencyScope, &'a InstalledPackage)> + 'a {
        self.resolved_dependencies(&workspace.cwd)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
