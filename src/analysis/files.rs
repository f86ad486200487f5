//! Source file selection.

use std::path::{Path, PathBuf};

use globset::GlobSet;
use walkdir::{DirEntry, WalkDir};

use crate::config::{compile_globs, AnalysisConfig, ConfigResult};
use crate::project::{relative_path, walk_error, Project, Workspace, NODE_MODULES};

use super::imports::SOURCE_EXTENSIONS;
use super::{AnalysisError, AnalysisResult};

/// Picks the source files of a workspace that are scanned for imports.
///
/// Globs are matched against the path relative to the project root, with
/// `/` separators. An empty include list selects every file; exclusion
/// always wins.
#[derive(Debug, Clone)]
pub struct SourceFileSelector {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

impl SourceFileSelector {
    /// Compiles the include and exclude globs of `config`.
    pub fn new(config: &AnalysisConfig) -> ConfigResult<Self> {
        Self::from_patterns(&config.include_files, &config.exclude_files)
    }

    /// Compiles the given include and exclude globs.
    pub fn from_patterns(include: &[String], exclude: &[String]) -> ConfigResult<Self> {
        let include = if include.is_empty() {
            None
        } else {
            Some(compile_globs(include)?)
        };

        Ok(Self {
            include,
            exclude: compile_globs(exclude)?,
        })
    }

    /// Returns true if the project-relative path passes the globs.
    pub fn is_selected(&self, relative: &str) -> bool {
        if self.exclude.is_match(relative) {
            return false;
        }
        self.include
            .as_ref()
            .map_or(true, |include| include.is_match(relative))
    }

    /// Lists the selected source files of `workspace`, sorted.
    ///
    /// Dot-prefixed entries, `node_modules` and directories owned by other
    /// workspaces are never descended into. Any traversal failure is an
    /// error.
    pub fn select(&self, project: &Project, workspace: &Workspace) -> AnalysisResult<Vec<PathBuf>> {
        let root = project.root();
        let mut files = Vec::new();

        for entry in WalkDir::new(&workspace.cwd)
            .into_iter()
            .filter_entry(|e| is_walkable(e, project, workspace))
        {
            let entry = entry.map_err(|e| {
                let (path, source) = walk_error(e, &workspace.cwd);
                AnalysisError::Io { path, source }
            })?;

            if entry.file_type().is_file()
                && has_source_extension(entry.path())
                && self.is_selected(&relative_path(root, entry.path()))
            {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }
}

impl Default for SourceFileSelector {
    fn default() -> Self {
        Self {
            include: None,
            exclude: GlobSet::empty(),
        }
    }
}

fn is_walkable(entry: &DirEntry, project: &Project, workspace: &Workspace) -> bool {
    if entry.depth() == 0 {
        return true;
    }

    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || name == NODE_MODULES {
        return false;
    }

    if entry.file_type().is_dir() {
        return project
            .owner_of(entry.path())
            .map_or(true, |owner| owner.cwd == workspace.cwd);
    }

    true
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn patterns(globs: &[&str]) -> Vec<String> {
        globs.iter().map(|g| g.to_string()).collect()
    }

    fn monorepo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(
            root,
            "package.json",
            r#"{"name": "root", "workspaces": ["packages/*"]}"#,
        );
        write(root, "index.js", "");
        write(root, "scripts/build.ts", "");
        write(root, "README.md", "");
        write(root, ".cache/skip.js", "");
        write(root, "node_modules/dep/index.js", "");
        write(root, "packages/a/package.json", r#"{"name": "a"}"#);
        write(root, "packages/a/src/index.tsx", "");
        write(root, "packages/a/src/util.test.js", "");
        dir
    }

    fn relative(project: &Project, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| relative_path(project.root(), f))
            .collect()
    }

    #[test]
    fn test_is_selected() {
        let selector =
            SourceFileSelector::from_patterns(&patterns(&["src/**"]), &patterns(&["**/*.d.ts"]))
                .unwrap();

        assert!(selector.is_selected("src/a.ts"));
        assert!(!selector.is_selected("src/types.d.ts"));
        assert!(!selector.is_selected("lib/a.ts"));
    }

    #[test]
    fn test_empty_include_selects_everything() {
        let selector = SourceFileSelector::default();
        assert!(selector.is_selected("anything/at/all.js"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let selector =
            SourceFileSelector::from_patterns(&patterns(&["**/*.js"]), &patterns(&["**/*.js"]))
                .unwrap();
        assert!(!selector.is_selected("index.js"));
    }

    #[test]
    fn test_select_root_skips_other_workspaces() {
        let dir = monorepo();
        let project = Project::discover(dir.path()).unwrap();
        let root = project.top_level().unwrap();

        let files = SourceFileSelector::default().select(&project, root).unwrap();

        assert_eq!(
            relative(&project, &files),
            vec!["index.js", "scripts/build.ts"]
        );
    }

    #[test]
    fn test_select_workspace_files() {
        let dir = monorepo();
        let project = Project::discover(dir.path()).unwrap();
        let a = &project.workspaces()[1];

        let files = SourceFileSelector::default().select(&project, a).unwrap();

        assert_eq!(
            relative(&project, &files),
            vec!["packages/a/src/index.tsx", "packages/a/src/util.test.js"]
        );
    }

    #[test]
    fn test_select_applies_globs_to_project_relative_paths() {
        let dir = monorepo();
        let project = Project::discover(dir.path()).unwrap();
        let a = &project.workspaces()[1];

        let selector =
            SourceFileSelector::from_patterns(&[], &patterns(&["packages/a/**/*.test.*"]))
                .unwrap();
        let files = selector.select(&project, a).unwrap();

        assert_eq!(relative(&project, &files), vec!["packages/a/src/index.tsx"]);
    }

    #[test]
    fn test_select_reports_unreadable_workspace() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone");
        let workspace = Workspace::new(missing.clone(), Default::default());
        let project = Project::from_workspaces(missing.clone(), vec![workspace.clone()]);

        let err = SourceFileSelector::default()
            .select(&project, &workspace)
            .unwrap_err();

        match err {
            AnalysisError::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }
}
