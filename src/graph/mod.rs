//! Graph module for resolved dependency relationships.
//!
//! This module provides the [`DependencyGraph`] struct, linking every
//! workspace to the installed packages its declared dependencies resolve to.
//!
//! # Example
//!
//! ```rust
//! use std::path::{Path, PathBuf};
//! use ghost_imports::graph::DependencyGraph;
//! use ghost_imports::parser::DependencyScope;
//! use ghost_imports::project::InstalledPackage;
//!
//! let mut graph = DependencyGraph::new();
//! let react = InstalledPackage {
//!     name: "react".to_string(),
//!     version: Some("18.2.0".to_string()),
//!     dir: PathBuf::from("/repo/node_modules/react"),
//!     peer_dependencies: Default::default(),
//!     has_bin: false,
//! };
//! graph.add_resolution(Path::new("/repo"), DependencyScope::Dependencies, react);
//!
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

mod dependency_graph;

pub use dependency_graph::{DependencyGraph, GraphNode};
