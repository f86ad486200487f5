//! Analysis report.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::diff::{UndeclaredDependency, WorkspaceDiff};

/// Findings of one analysis run, keyed by workspace name.
///
/// Every analyzed workspace has an entry in both maps, empty when clean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Names of the analyzed workspaces.
    pub workspaces: BTreeSet<String>,
    /// Declared but never imported.
    pub unused_dependencies: BTreeMap<String, BTreeSet<String>>,
    /// The part of `unused_dependencies` declared in `dependencies` without
    /// a production import.
    #[serde(default)]
    pub unused_production_dependencies: BTreeMap<String, BTreeSet<String>>,
    /// Imported but never declared.
    pub undeclared_dependencies: BTreeMap<String, BTreeMap<String, UndeclaredDependency>>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the findings of a workspace.
    pub fn insert(&mut self, workspace: &str, diff: WorkspaceDiff) {
        self.workspaces.insert(workspace.to_string());
        self.unused_dependencies
            .insert(workspace.to_string(), diff.unused);
        self.unused_production_dependencies
            .insert(workspace.to_string(), diff.unused_production);
        self.undeclared_dependencies
            .insert(workspace.to_string(), diff.undeclared);
    }

    /// Unused dependencies of `workspace`.
    pub fn unused(&self, workspace: &str) -> Option<&BTreeSet<String>> {
        self.unused_dependencies.get(workspace)
    }

    /// Unused entries of the `dependencies` section of `workspace`.
    pub fn unused_production(&self, workspace: &str) -> Option<&BTreeSet<String>> {
        self.unused_production_dependencies.get(workspace)
    }

    /// Undeclared dependencies of `workspace`.
    pub fn undeclared(&self, workspace: &str) -> Option<&BTreeMap<String, UndeclaredDependency>> {
        self.undeclared_dependencies.get(workspace)
    }

    /// Total number of unused dependencies across workspaces.
    pub fn unused_count(&self) -> usize {
        self.unused_dependencies.values().map(|s| s.len()).sum()
    }

    /// Total number of undeclared dependencies across workspaces.
    pub fn undeclared_count(&self) -> usize {
        self.undeclared_dependencies.values().map(|m| m.len()).sum()
    }

    /// Returns true if any workspace has a finding.
    pub fn has_findings(&self) -> bool {
        self.unused_count() + self.undeclared_count() > 0
    }
}
