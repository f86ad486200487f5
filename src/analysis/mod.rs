//! Dependency drift analysis.
//!
//! This module compares what each workspace declares in its package.json
//! with what its source files import, producing a [`Report`] of unused and
//! undeclared dependencies.
//!
//! # Features
//!
//! - Parse ES module `import`/`export ... from`, `import()`, `require()` and
//!   `require.resolve()` with tree-sitter
//! - Normalize specifiers to package roots, skipping paths and built-ins
//! - Split usage between production and development files
//! - Infer the scope an undeclared package should be added to
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ghost_imports::analysis::analyze;
//! use ghost_imports::config::AnalysisConfig;
//!
//! let analysis = analyze(Path::new("."), &AnalysisConfig::default()).await?;
//! for workspace in &analysis.report.workspaces {
//!     println!("{}: {:?}", workspace, analysis.report.unused(workspace));
//! }
//! ```

pub mod declared;
pub mod dev_files;
pub mod diff;
pub mod files;
pub mod imports;
pub mod report;
pub mod specifier;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, ConfigError};
use crate::graph::DependencyGraph;
use crate::project::{Project, ProjectError, Workspace};

pub use declared::{collect_declared, DeclaredDependencies};
pub use dev_files::DevFileClassifier;
pub use diff::{diff_workspace, DiffPolicy, UndeclaredDependency, WorkspaceDiff};
pub use files::SourceFileSelector;
pub use imports::{
    ImportExtractor, ImportKind, ImportRecord, ImportSite, ImportSites, ParsedSource,
    SourceLanguage, IGNORE_NEXT_LINE,
};
pub use report::Report;
pub use specifier::package_root;

/// Errors that can occur during analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Workspace at {} has no package name", cwd.display())]
    MissingIdent { cwd: PathBuf },

    #[error(
        "Workspaces at {} and {} are both named {ident}",
        first.display(),
        second.display()
    )]
    DuplicateIdent {
        ident: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to parse {}:{line}:{column}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("Failed to read file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tree-sitter language initialization failed")]
    LanguageInit,

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// The outcome of an analysis run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The analyzed project.
    pub project: Arc<Project>,
    /// Directories of the analyzed workspaces, in project order.
    pub selected: Vec<PathBuf>,
    /// The findings.
    pub report: Report,
}

impl Analysis {
    /// The analyzed workspaces, in project order.
    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.selected
            .iter()
            .filter_map(|cwd| self.project.workspace_by_cwd(cwd))
    }
}

/// Discovers the project containing `cwd` and analyzes it.
pub async fn analyze(cwd: &Path, config: &AnalysisConfig) -> AnalysisResult<Analysis> {
    let project = Project::discover(cwd)?;
    analyze_project(project, config).await
}

/// Analyzes the workspaces of an already loaded project.
///
/// Every workspace of the project must have a distinct name, selected or
/// not. Import extraction runs on the
/// blocking pool, one task per workspace; the first failure aborts the run.
pub async fn analyze_project(project: Project, config: &AnalysisConfig) -> AnalysisResult<Analysis> {
    let selected: Vec<Workspace> = project
        .selected_workspaces(config.skip_root)
        .into_iter()
        .cloned()
        .collect();

    check_idents(&project)?;
    let idents: Vec<String> = selected
        .iter()
        .filter_map(|workspace| workspace.ident().map(str::to_string))
        .collect();

    let graph = DependencyGraph::build(&project)?;
    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "dependency graph built"
    );

    let selector = Arc::new(SourceFileSelector::new(config)?);
    let dev_files = DevFileClassifier::new(project.root(), &config.dev_files)?;
    let excluded_packages = config.excluded_packages()?;
    let always_peer = config.always_peer()?;
    let policy = DiffPolicy {
        dev_files: &dev_files,
        excluded_packages: &excluded_packages,
        always_peer: &always_peer,
    };

    let project = Arc::new(project);
    let imports = try_join_all(selected.iter().zip(&idents).map(|(workspace, ident)| {
        collect_workspace_imports(
            Arc::clone(&project),
            Arc::clone(&selector),
            workspace.clone(),
            ident.clone(),
        )
    }))
    .await?;

    let mut report = Report::new();
    for ((workspace, ident), imports) in selected.iter().zip(&idents).zip(imports) {
        let declared = collect_declared(&project, &graph, workspace);
        let diff = diff_workspace(&declared, &imports, &policy);
        info!(
            workspace = %ident,
            imports = imports.len(),
            unused = diff.unused.len(),
            undeclared = diff.undeclared.len(),
            "workspace analyzed"
        );
        report.insert(ident, diff);
    }

    Ok(Analysis {
        project,
        selected: selected.into_iter().map(|ws| ws.cwd).collect(),
        report,
    })
}

/// Fails on the first workspace without a name, or whose name another
/// workspace already uses.
fn check_idents(project: &Project) -> AnalysisResult<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for workspace in project.workspaces() {
        let ident = workspace
            .ident()
            .ok_or_else(|| AnalysisError::MissingIdent {
                cwd: workspace.cwd.clone(),
            })?;
        if let Some(first) = seen.insert(ident, &workspace.cwd) {
            return Err(AnalysisError::DuplicateIdent {
                ident: ident.to_string(),
                first: first.to_path_buf(),
                second: workspace.cwd.clone(),
            });
        }
    }
    Ok(())
}

/// Extracts the import records of every selected file of a workspace.
///
/// Imports of the workspace's own name are self-references and dropped.
async fn collect_workspace_imports(
    project: Arc<Project>,
    selector: Arc<SourceFileSelector>,
    workspace: Workspace,
    ident: String,
) -> AnalysisResult<BTreeSet<ImportRecord>> {
    tokio::task::spawn_blocking(move || -> AnalysisResult<BTreeSet<ImportRecord>> {
        let files = selector.select(&project, &workspace)?;
        debug!(workspace = %ident, files = files.len(), "scanning source files");

        let mut extractor = ImportExtractor::new()?;
        let mut records = BTreeSet::new();

        for path in files {
            let Some(language) = SourceLanguage::from_path(&path) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(|source| AnalysisError::Io {
                path: path.clone(),
                source,
            })?;

            records.extend(
                extractor
                    .extract_imports(&path, &source, language, &ident)?
                    .into_iter()
                    .filter(|record| record.imported != ident),
            );
        }

        Ok(records)
    })
    .await
    .map_err(|e| AnalysisError::Task(e.to_string()))?
}
