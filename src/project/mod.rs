//! Project model: the workspaces of a package tree and what is installed
//! for them.
//!
//! A project is either a single package or a monorepo whose root manifest
//! lists workspace globs. The top-level workspace is always the first one.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ghost_imports::project::Project;
//!
//! let project = Project::discover(Path::new("."))?;
//! for workspace in project.workspaces() {
//!     println!("{:?} at {}", workspace.ident(), workspace.cwd.display());
//! }
//! ```

mod workspace;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::compile_globs;
use crate::parser::{parse_file, PackageJson, ParseError, MANIFEST_FILE};

pub use workspace::{InstalledPackage, Workspace};

/// Directory holding installed packages.
pub const NODE_MODULES: &str = "node_modules";

/// Errors that can occur while loading a project.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("No package.json found in {} or any parent directory", .0.display())]
    NoManifest(PathBuf),

    #[error("Failed to read manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Invalid workspace pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for project operations.
pub type ProjectResult<T> = Result<T, ProjectError>;

/// A loaded project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory the project was discovered from.
    cwd: PathBuf,
    /// Workspaces; index 0 is the top-level workspace.
    workspaces: Vec<Workspace>,
}

impl Project {
    /// Finds the project that `cwd` belongs to and loads all its workspaces.
    ///
    /// The closest package.json at or above `cwd` is a candidate workspace.
    /// If an ancestor manifest lists it among its workspaces, that ancestor
    /// is the project root; otherwise the candidate is.
    pub fn discover(cwd: &Path) -> ProjectResult<Self> {
        let cwd = fs::canonicalize(cwd).map_err(|source| ProjectError::Io {
            path: cwd.to_path_buf(),
            source,
        })?;

        let candidate = cwd
            .ancestors()
            .find(|dir| dir.join(MANIFEST_FILE).is_file())
            .ok_or_else(|| ProjectError::NoManifest(cwd.clone()))?
            .to_path_buf();

        let root = find_workspace_root(&candidate)?.unwrap_or(candidate);
        debug!(root = %root.display(), cwd = %cwd.display(), "project root resolved");

        let workspaces = load_workspaces(&root)?;
        Ok(Self { cwd, workspaces })
    }

    /// Builds a project from already loaded workspaces.
    ///
    /// The first workspace is treated as the top-level one.
    pub fn from_workspaces(cwd: PathBuf, workspaces: Vec<Workspace>) -> Self {
        Self { cwd, workspaces }
    }

    /// The directory the project was discovered from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Root directory of the project.
    pub fn root(&self) -> &Path {
        self.workspaces
            .first()
            .map_or(self.cwd.as_path(), |ws| ws.cwd.as_path())
    }

    /// All workspaces, top-level first.
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// The top-level workspace.
    pub fn top_level(&self) -> Option<&Workspace> {
        self.workspaces.first()
    }

    /// Returns true if `workspace` is the top-level workspace.
    pub fn is_top_level(&self, workspace: &Workspace) -> bool {
        self.top_level().is_some_and(|top| top.cwd == workspace.cwd)
    }

    /// Looks up the workspace rooted exactly at `cwd`.
    pub fn workspace_by_cwd(&self, cwd: &Path) -> Option<&Workspace> {
        self.workspaces.iter().find(|ws| ws.cwd == cwd)
    }

    /// Returns the workspace owning `path`: the one with the deepest
    /// directory containing it.
    pub fn owner_of(&self, path: &Path) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .filter(|ws| ws.contains(path))
            .max_by_key(|ws| ws.cwd.components().count())
    }

    /// Workspaces to analyze for the discovery directory.
    ///
    /// From the project root every workspace is selected (the root itself is
    /// left out when `skip_root` is set); from anywhere else only the
    /// workspace owning the directory.
    pub fn selected_workspaces(&self, skip_root: bool) -> Vec<&Workspace> {
        if self.cwd == self.root() {
            self.workspaces
                .iter()
                .enumerate()
                .filter(|(index, _)| !(skip_root && *index == 0))
                .map(|(_, ws)| ws)
                .collect()
        } else {
            self.owner_of(&self.cwd).into_iter().collect()
        }
    }

    /// Resolves `name` the way Node does from `from`: the first
    /// `node_modules/<name>` found walking up the directory tree.
    ///
    /// An installed manifest that cannot be read counts as not installed.
    pub fn resolve_installed(
        &self,
        from: &Path,
        name: &str,
    ) -> ProjectResult<Option<InstalledPackage>> {
        for dir in from.ancestors() {
            let package_dir = dir.join(NODE_MODULES).join(name);
            let manifest_path = package_dir.join(MANIFEST_FILE);
            if !manifest_path.is_file() {
                continue;
            }

            let manifest = match parse_file(&manifest_path) {
                Ok(manifest) => manifest,
                Err(e) => {
                    debug!(
                        path = %manifest_path.display(),
                        error = %e,
                        "skipping unreadable installed manifest"
                    );
                    return Ok(None);
                }
            };
            return Ok(Some(InstalledPackage::from_manifest(
                name,
                package_dir,
                &manifest,
            )));
        }

        Ok(None)
    }
}

/// Returns `path` relative to `base` with `/` separators, for glob matching.
pub fn relative_path(base: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits a traversal error into the offending path (or `fallback`) and an
/// io error.
pub(crate) fn walk_error(err: walkdir::Error, fallback: &Path) -> (PathBuf, std::io::Error) {
    let path = err
        .path()
        .map_or_else(|| fallback.to_path_buf(), Path::to_path_buf);
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other(message));
    (path, source)
}

fn read_manifest(path: &Path) -> ProjectResult<PackageJson> {
    parse_file(path).map_err(|source| ProjectError::Manifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Walks up from `candidate` looking for a manifest whose workspace globs
/// match it.
fn find_workspace_root(candidate: &Path) -> ProjectResult<Option<PathBuf>> {
    for ancestor in candidate.ancestors().skip(1) {
        let manifest_path = ancestor.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            continue;
        }

        // Unrelated manifests higher up the tree are not our concern.
        let manifest = match parse_file(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                debug!(path = %manifest_path.display(), error = %e, "skipping unreadable ancestor manifest");
                continue;
            }
        };

        let (include, exclude) = split_patterns(manifest.workspace_patterns());
        if include.is_empty() {
            continue;
        }

        let relative = relative_path(ancestor, candidate);
        if compile_globs(&include)?.is_match(&relative)
            && !compile_globs(&exclude)?.is_match(&relative)
        {
            return Ok(Some(ancestor.to_path_buf()));
        }
    }

    Ok(None)
}

/// Loads the root workspace and every workspace reachable through
/// `workspaces` globs, nested roots included.
fn load_workspaces(root: &Path) -> ProjectResult<Vec<Workspace>> {
    let manifest = read_manifest(&root.join(MANIFEST_FILE))?;
    let mut workspaces = vec![Workspace::new(root.to_path_buf(), manifest)];

    let mut index = 0;
    while index < workspaces.len() {
        let cwd = workspaces[index].cwd.clone();
        let patterns = workspaces[index].manifest.workspace_patterns().to_vec();

        for dir in expand_workspace_patterns(&cwd, &patterns)? {
            if workspaces.iter().any(|ws| ws.cwd == dir) {
                continue;
            }
            let manifest = read_manifest(&dir.join(MANIFEST_FILE))?;
            workspaces.push(Workspace::new(dir, manifest));
        }

        index += 1;
    }

    Ok(workspaces)
}

/// Finds the package directories under `base` matched by workspace globs.
fn expand_workspace_patterns(base: &Path, patterns: &[String]) -> ProjectResult<Vec<PathBuf>> {
    let (include, exclude) = split_patterns(patterns);
    if include.is_empty() {
        return Ok(Vec::new());
    }

    let include = compile_globs(&include)?;
    let exclude = compile_globs(&exclude)?;

    let mut dirs = Vec::new();
    for entry in WalkDir::new(base)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e))
    {
        let entry = entry.map_err(|e| {
            let (path, source) = walk_error(e, base);
            ProjectError::Io { path, source }
        })?;
        if !entry.file_type().is_dir() || !entry.path().join(MANIFEST_FILE).is_file() {
            continue;
        }

        let relative = relative_path(base, entry.path());
        if include.is_match(&relative) && !exclude.is_match(&relative) {
            dirs.push(entry.into_path());
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Splits workspace globs into positive and `!`-negated patterns.
fn split_patterns(patterns: &[String]) -> (Vec<String>, Vec<String>) {
    let mut include = Vec::new();
    let mut exclude = Vec::new();

    for pattern in patterns {
        let pattern = pattern.trim().trim_start_matches("./").trim_end_matches('/');
        if let Some(negated) = pattern.strip_prefix('!') {
            exclude.push(negated.trim_start_matches("./").to_string());
        } else if !pattern.is_empty() {
            include.push(pattern.to_string());
        }
    }

    (include, exclude)
}

/// Check if a directory should be skipped while looking for workspaces.
pub(crate) fn is_ignored_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    name == NODE_MODULES || name.starts_with('.')
}
