//! Diffing declared dependencies against actual imports.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::PackageMatcher;
use crate::parser::DependencyScope;

use super::declared::DeclaredDependencies;
use super::dev_files::DevFileClassifier;
use super::imports::ImportRecord;

/// An imported package missing from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndeclaredDependency {
    /// Scope the package should be added to.
    pub dependency_type: DependencyScope,
    /// A file importing it.
    pub imported_from: PathBuf,
}

/// The rules a diff is computed with.
#[derive(Debug, Clone, Copy)]
pub struct DiffPolicy<'a> {
    pub dev_files: &'a DevFileClassifier,
    /// Never reported as unused.
    pub excluded_packages: &'a PackageMatcher,
    /// Always inferred as peer dependencies.
    pub always_peer: &'a PackageMatcher,
}

/// Findings for one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceDiff {
    pub undeclared: BTreeMap<String, UndeclaredDependency>,
    /// Unused in any scope.
    pub unused: BTreeSet<String>,
    /// The subset of `unused` declared in `dependencies` without a
    /// production import. Only these may be removed from `dependencies`.
    pub unused_production: BTreeSet<String>,
}

/// Compares what a workspace declares with what it imports.
pub fn diff_workspace(
    declared: &DeclaredDependencies,
    imports: &BTreeSet<ImportRecord>,
    policy: &DiffPolicy<'_>,
) -> WorkspaceDiff {
    let (unused, unused_production) = unused_dependencies(declared, imports, policy);
    WorkspaceDiff {
        undeclared: undeclared_dependencies(declared, imports, policy),
        unused,
        unused_production,
    }
}

/// Folds the import records, in order, into one inferred scope per package.
///
/// A later record only replaces an earlier inference when it upgrades a
/// non-production scope to `dependencies`.
fn undeclared_dependencies(
    declared: &DeclaredDependencies,
    imports: &BTreeSet<ImportRecord>,
    policy: &DiffPolicy<'_>,
) -> BTreeMap<String, UndeclaredDependency> {
    imports
        .iter()
        .fold(BTreeMap::<String, UndeclaredDependency>::new(), |mut undeclared, record| {
            let from_dev_file = policy.dev_files.is_dev_file(&record.imported_from);
            if declared.covers(&record.imported, from_dev_file) {
                return undeclared;
            }

            let prior = undeclared.get(&record.imported).map(|u| u.dependency_type);
            let inferred = infer_scope(&record.imported, from_dev_file, prior, declared, policy);

            let replace = match prior {
                None => true,
                Some(prior) => {
                    prior != DependencyScope::Dependencies
                        && inferred == DependencyScope::Dependencies
                }
            };
            if replace {
                undeclared.insert(
                    record.imported.clone(),
                    UndeclaredDependency {
                        dependency_type: inferred,
                        imported_from: record.imported_from.clone(),
                    },
                );
            }

            undeclared
        })
}

fn infer_scope(
    name: &str,
    from_dev_file: bool,
    prior: Option<DependencyScope>,
    declared: &DeclaredDependencies,
    policy: &DiffPolicy<'_>,
) -> DependencyScope {
    if policy.always_peer.is_match(name) {
        DependencyScope::PeerDependencies
    } else if prior == Some(DependencyScope::Dependencies) {
        DependencyScope::Dependencies
    } else if from_dev_file {
        DependencyScope::DevDependencies
    } else if prior.is_none() && declared.transitive_peer_dependencies.contains(name) {
        DependencyScope::PeerDependencies
    } else {
        DependencyScope::Dependencies
    }
}

/// Declared packages without a matching import, as `(all, production)`.
///
/// Production dependencies need a production import; dev dependencies need a
/// dev import. Peer dependencies are never reported.
fn unused_dependencies(
    declared: &DeclaredDependencies,
    imports: &BTreeSet<ImportRecord>,
    policy: &DiffPolicy<'_>,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let (dev_use, prod_use): (BTreeSet<&str>, BTreeSet<&str>) = {
        let (dev, prod): (Vec<&ImportRecord>, Vec<&ImportRecord>) = imports
            .iter()
            .partition(|record| policy.dev_files.is_dev_file(&record.imported_from));
        (
            dev.into_iter().map(|r| r.imported.as_str()).collect(),
            prod.into_iter().map(|r| r.imported.as_str()).collect(),
        )
    };

    let exempt = |name: &str| {
        declared.transitive_peer_dependencies.contains(name)
            || declared.binaries.contains(name)
            || policy.excluded_packages.is_match(name)
    };

    let unused_prod: BTreeSet<String> = declared
        .dependencies
        .iter()
        .filter(|name| !prod_use.contains(name.as_str()) && !exempt(name.as_str()))
        .cloned()
        .collect();
    let unused_dev = declared
        .dev_dependencies
        .iter()
        .filter(|name| !dev_use.contains(name.as_str()) && !exempt(name.as_str()));

    let unused = unused_prod.iter().chain(unused_dev).cloned().collect();
    (unused, unused_prod)
}
