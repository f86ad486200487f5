//! Manifest fixing.
//!
//! Rewrites the manifests of the analyzed workspaces so that undeclared
//! packages are declared in their inferred scope and unused production
//! dependencies are removed. Versions come from what is installed in
//! `node_modules` when available, otherwise from the registry's `latest` tag.

mod installed;
mod registry;

use std::collections::BTreeSet;
use std::path::PathBuf;

use futures::future::try_join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::{Analysis, Report};
use crate::parser::{DependencyScope, ManifestDocument, ParseError};
use crate::project::Workspace;

pub use installed::InstalledVersions;
pub use registry::{
    encode_package_name, CachingRegistryClient, LatestVersion, NpmRegistryClient, RegistryCache,
    RegistryClient,
};

/// Manifest key of optional dependencies, which are removed along with
/// `dependencies` when unused.
const OPTIONAL_DEPENDENCIES: &str = "optionalDependencies";

/// Errors that can occur while fixing manifests.
#[derive(Error, Debug)]
pub enum FixError {
    #[error("Workspace at {} has no package name", cwd.display())]
    MissingIdent { cwd: PathBuf },

    #[error("Registry request for {package} failed: {source}")]
    Registry {
        package: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Registry returned status {status} for {package}")]
    RegistryStatus { package: String, status: u16 },

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to update manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Result type for fix operations.
pub type FixResult<T> = Result<T, FixError>;

/// A dependency added to a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedDependency {
    pub name: String,
    pub scope: DependencyScope,
    pub range: String,
}

/// Changes applied to one workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceFix {
    pub workspace: String,
    pub added: Vec<AddedDependency>,
    pub removed: BTreeSet<String>,
    /// Undeclared packages the registry does not know.
    pub skipped: BTreeSet<String>,
}

impl WorkspaceFix {
    /// Returns true if the manifest was left untouched.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Changes applied by a fix run, in workspace order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixSummary {
    pub workspaces: Vec<WorkspaceFix>,
}

impl FixSummary {
    /// Total number of dependencies added.
    pub fn added_count(&self) -> usize {
        self.workspaces.iter().map(|w| w.added.len()).sum()
    }

    /// Total number of dependencies removed.
    pub fn removed_count(&self) -> usize {
        self.workspaces.iter().map(|w| w.removed.len()).sum()
    }
}

/// Fixes every analyzed workspace concurrently.
///
/// A failure in any workspace fails the run; manifests already written by
/// other workspaces stay written.
pub async fn fix_workspaces<R>(
    analysis: &Analysis,
    installed: &InstalledVersions,
    registry: &R,
) -> FixResult<FixSummary>
where
    R: RegistryClient + ?Sized,
{
    let workspaces: Vec<&Workspace> = analysis.workspaces().collect();
    info!(count = workspaces.len(), "attempting to fix workspaces");

    let fixes = try_join_all(
        workspaces
            .into_iter()
            .map(|workspace| fix_workspace(workspace, &analysis.report, installed, registry)),
    )
    .await?;

    Ok(FixSummary { workspaces: fixes })
}

async fn fix_workspace<R>(
    workspace: &Workspace,
    report: &Report,
    installed: &InstalledVersions,
    registry: &R,
) -> FixResult<WorkspaceFix>
where
    R: RegistryClient + ?Sized,
{
    let ident = workspace.ident().ok_or_else(|| FixError::MissingIdent {
        cwd: workspace.cwd.clone(),
    })?;

    let mut fix = WorkspaceFix {
        workspace: ident.to_string(),
        ..Default::default()
    };

    for (name, undeclared) in report.undeclared(ident).into_iter().flatten() {
        match resolve_range(name, installed, registry).await? {
            Some(range) => fix.added.push(AddedDependency {
                name: name.clone(),
                scope: undeclared.dependency_type,
                range,
            }),
            None => {
                warn!(workspace = ident, package = %name, "package not found in the registry, skipping");
                fix.skipped.insert(name.clone());
            }
        }
    }

    let path = workspace.manifest_path();
    let manifest_error = |source: ParseError| FixError::Manifest {
        path: path.clone(),
        source,
    };
    let mut document = ManifestDocument::read(&path).map_err(manifest_error)?;

    for name in report.unused_production(ident).into_iter().flatten() {
        let from_dependencies = document.remove(DependencyScope::Dependencies.manifest_key(), name);
        let from_optional = document.remove(OPTIONAL_DEPENDENCIES, name);
        if from_dependencies || from_optional {
            fix.removed.insert(name.clone());
        }
    }

    for added in &fix.added {
        document.insert(added.scope, &added.name, &added.range);
    }

    if !fix.is_empty() {
        document.persist(&path).map_err(manifest_error)?;
    }

    info!(
        workspace = ident,
        added = fix.added.len(),
        removed = fix.removed.len(),
        "workspace fixed"
    );
    Ok(fix)
}

/// Range to declare for `name`: the installed version if any, otherwise
/// the registry's latest.
async fn resolve_range<R>(
    name: &str,
    installed: &InstalledVersions,
    registry: &R,
) -> FixResult<Option<String>>
where
    R: RegistryClient + ?Sized,
{
    if let Some(version) = installed.get(name) {
        return Ok(Some(format!("^{version}")));
    }

    Ok(registry.latest_version(name).await?.range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::config::AnalysisConfig;
    use crate::parser::parse_file;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    struct FakeRegistry {
        versions: HashMap<&'static str, LatestVersion>,
    }

    impl FakeRegistry {
        fn new() -> Self {
            Self {
                versions: HashMap::from([
                    ("chalk", LatestVersion::Version("5.3.0".to_string())),
                    ("vitest", LatestVersion::Untagged),
                    ("lodash", LatestVersion::Version("99.0.0".to_string())),
                ]),
            }
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn latest_version(&self, name: &str) -> FixResult<LatestVersion> {
            Ok(self
                .versions
                .get(name)
                .cloned()
                .unwrap_or(LatestVersion::NotFound))
        }
    }

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{
  "name": "app",
  "dependencies": {
    "left-pad": "^1.0.0",
    "react": "^18.0.0"
  },
  "optionalDependencies": {
    "fsevents": "^2.0.0"
  },
  "devDependencies": {
    "jest": "^29.0.0"
  }
}
"#,
        );
        write(
            root,
            "src/index.js",
            "import React from 'react';\nimport _ from 'lodash';\nimport chalk from 'chalk';\nrequire('ghost-pkg');\n",
        );
        write(root, "src/index.test.js", "import { test } from 'vitest';\n");
        write(
            root,
            "node_modules/lodash/package.json",
            r#"{"name": "lodash", "version": "4.17.21"}"#,
        );
        dir
    }

    #[tokio::test]
    async fn test_fix_workspaces() {
        let dir = project();
        let analysis = analyze(dir.path(), &AnalysisConfig::default())
            .await
            .unwrap();
        let installed = InstalledVersions::crawl(analysis.project.root()).unwrap();

        let summary = fix_workspaces(&analysis, &installed, &FakeRegistry::new())
            .await
            .unwrap();

        let fix = &summary.workspaces[0];
        assert_eq!(fix.workspace, "app");
        assert_eq!(
            fix.removed,
            BTreeSet::from(["fsevents".to_string(), "left-pad".to_string()])
        );
        assert_eq!(fix.skipped, BTreeSet::from(["ghost-pkg".to_string()]));
        assert_eq!(summary.added_count(), 3);

        let manifest = parse_file(&dir.path().join("package.json")).unwrap();
        let deps = manifest.dependencies.unwrap();
        assert_eq!(deps.get("lodash").map(String::as_str), Some("^4.17.21"));
        assert_eq!(deps.get("chalk").map(String::as_str), Some("^5.3.0"));
        assert!(deps.contains_key("react"));
        assert!(!deps.contains_key("left-pad"));
        assert!(manifest.optional_dependencies.unwrap().is_empty());

        // unused dev dependencies are reported but kept
        let dev = manifest.dev_dependencies.unwrap();
        assert!(dev.contains_key("jest"));
        assert_eq!(dev.get("vitest").map(String::as_str), Some("*"));
    }

    #[tokio::test]
    async fn test_clean_workspace_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let original = "{\"name\":\"clean\",\"dependencies\":{\"a\":\"1\"}}";
        write(dir.path(), "package.json", original);
        write(dir.path(), "index.js", "require('a');");

        let analysis = analyze(dir.path(), &AnalysisConfig::default())
            .await
            .unwrap();
        let summary = fix_workspaces(&analysis, &InstalledVersions::new(), &FakeRegistry::new())
            .await
            .unwrap();

        assert!(summary.workspaces[0].is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("package.json")).unwrap(),
            original
        );
    }

    #[tokio::test]
    async fn test_resolve_range_prefers_installed() {
        let mut installed = InstalledVersions::new();
        installed.record("lodash", "4.17.21");
        let registry = FakeRegistry::new();

        assert_eq!(
            resolve_range("lodash", &installed, &registry).await.unwrap(),
            Some("^4.17.21".to_string())
        );
        assert_eq!(
            resolve_range("chalk", &installed, &registry).await.unwrap(),
            Some("^5.3.0".to_string())
        );
        assert_eq!(
            resolve_range("nope", &installed, &registry).await.unwrap(),
            None
        );
    }
}
