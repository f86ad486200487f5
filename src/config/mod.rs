//! Analysis configuration.
//!
//! Configuration is plain data: glob lists for files, glob lists for package
//! names, and a few switches. It can come from a project-local
//! `.ghostImports.json` file and from command-line flags, flags winning.

mod file;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use file::{discover_config, load_config_from_path, ConfigFile, CONFIG_FILENAME};

/// Default npm registry queried by the fixer.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Files considered development-only unless configured otherwise.
pub const DEFAULT_DEV_FILES: &[&str] = &["**/__tests__/**", "**/tests/**", "**/*.test.*"];

/// Errors raised while loading or compiling configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Json {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Effective configuration of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Source files to scan; empty means every file.
    pub include_files: Vec<String>,
    /// Source files never scanned. Wins over `include_files`.
    pub exclude_files: Vec<String>,
    /// Files whose imports count as development usage.
    pub dev_files: Vec<String>,
    /// Package names never reported as unused.
    pub exclude_packages: Vec<String>,
    /// Package names always added as peer dependencies when undeclared.
    pub always_peer_dependencies: Vec<String>,
    /// Rewrite manifests to fix the findings.
    pub fix: bool,
    /// Leave the top-level workspace out of a monorepo analysis.
    pub skip_root: bool,
    /// Registry used to look up versions while fixing.
    pub registry_url: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include_files: Vec::new(),
            exclude_files: Vec::new(),
            dev_files: DEFAULT_DEV_FILES.iter().map(|g| g.to_string()).collect(),
            exclude_packages: Vec::new(),
            always_peer_dependencies: Vec::new(),
            fix: false,
            skip_root: false,
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Builds the effective configuration from an optional config file and
    /// command-line overrides.
    ///
    /// Any list or value present in `overrides` replaces the file's; switches
    /// are enabled if either source enables them.
    pub fn resolve(file: Option<ConfigFile>, overrides: ConfigFile) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            include_files: overrides
                .include_files
                .or(file.include_files)
                .unwrap_or(defaults.include_files),
            exclude_files: overrides
                .exclude_files
                .or(file.exclude_files)
                .unwrap_or(defaults.exclude_files),
            dev_files: overrides
                .dev_files
                .or(file.dev_files)
                .unwrap_or(defaults.dev_files),
            exclude_packages: overrides
                .exclude_packages
                .or(file.exclude_packages)
                .unwrap_or(defaults.exclude_packages),
            always_peer_dependencies: overrides
                .always_peer_dependencies
                .or(file.always_peer_dependencies)
                .unwrap_or(defaults.always_peer_dependencies),
            fix: overrides.fix.unwrap_or(false) || file.fix.unwrap_or(false),
            skip_root: overrides.skip_root.unwrap_or(false) || file.skip_root.unwrap_or(false),
            registry_url: overrides
                .registry_url
                .or(file.registry_url)
                .unwrap_or(defaults.registry_url),
        }
    }

    /// Compiles `exclude_packages` into a predicate.
    pub fn excluded_packages(&self) -> ConfigResult<PackageMatcher> {
        PackageMatcher::new(&self.exclude_packages)
    }

    /// Compiles `always_peer_dependencies` into a predicate.
    pub fn always_peer(&self) -> ConfigResult<PackageMatcher> {
        PackageMatcher::new(&self.always_peer_dependencies)
    }
}

/// A predicate over package names built from name globs such as
/// `@types/*` or `eslint-plugin-*`.
#[derive(Debug, Clone)]
pub struct PackageMatcher {
    globs: GlobSet,
}

impl PackageMatcher {
    /// Compiles the given name patterns.
    pub fn new(patterns: &[String]) -> ConfigResult<Self> {
        Ok(Self {
            globs: compile_globs(patterns)?,
        })
    }

    /// A matcher that never matches.
    pub fn empty() -> Self {
        Self {
            globs: GlobSet::empty(),
        }
    }

    /// Returns true if `name` matches one of the patterns.
    pub fn is_match(&self, name: &str) -> bool {
        self.globs.is_match(name)
    }
}

impl Default for PackageMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Compiles glob patterns into a set where `*` does not cross `/`.
pub fn compile_globs<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern.as_ref())
                .literal_separator(true)
                .build()?,
        );
    }
    builder.build()
}
