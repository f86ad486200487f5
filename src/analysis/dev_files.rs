//! Development-only file classification.

use std::path::{Path, PathBuf};

use globset::GlobSet;

use crate::config::{compile_globs, ConfigResult, DEFAULT_DEV_FILES};
use crate::project::relative_path;

/// Decides whether imports in a file count as development usage.
///
/// Patterns are matched against the path relative to the project root.
#[derive(Debug, Clone)]
pub struct DevFileClassifier {
    root: PathBuf,
    globs: GlobSet,
}

impl DevFileClassifier {
    /// Compiles `patterns` for files under `root`.
    pub fn new<S: AsRef<str>>(root: &Path, patterns: &[S]) -> ConfigResult<Self> {
        Ok(Self {
            root: root.to_path_buf(),
            globs: compile_globs(patterns)?,
        })
    }

    /// Classifier using the built-in test file patterns.
    pub fn with_defaults(root: &Path) -> ConfigResult<Self> {
        Self::new(root, DEFAULT_DEV_FILES)
    }

    /// Returns true if `path` is a development-only file.
    pub fn is_dev_file(&self, path: &Path) -> bool {
        self.globs.is_match(relative_path(&self.root, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dev_files() {
        let classifier = DevFileClassifier::with_defaults(Path::new("/repo")).unwrap();

        assert!(classifier.is_dev_file(Path::new("/repo/src/__tests__/a.js")));
        assert!(classifier.is_dev_file(Path::new("/repo/tests/setup.ts")));
        assert!(classifier.is_dev_file(Path::new("/repo/packages/a/tests/e2e/x.js")));
        assert!(classifier.is_dev_file(Path::new("/repo/src/util.test.tsx")));

        assert!(!classifier.is_dev_file(Path::new("/repo/src/index.js")));
        assert!(!classifier.is_dev_file(Path::new("/repo/src/testsuite.js")));
        assert!(!classifier.is_dev_file(Path::new("/repo/src/latest.js")));
    }

    #[test]
    fn test_paths_above_root_are_not_matched_by_their_prefix() {
        let classifier = DevFileClassifier::with_defaults(Path::new("/home/tests/repo")).unwrap();
        assert!(!classifier.is_dev_file(Path::new("/home/tests/repo/src/index.js")));
    }

    #[test]
    fn test_custom_dev_files() {
        let classifier =
            DevFileClassifier::new(Path::new("/repo"), &["**/*.spec.ts", "scripts/**"]).unwrap();

        assert!(classifier.is_dev_file(Path::new("/repo/src/a.spec.ts")));
        assert!(classifier.is_dev_file(Path::new("/repo/scripts/release.js")));
        assert!(!classifier.is_dev_file(Path::new("/repo/src/a.test.ts")));
    }

    #[test]
    fn test_no_dev_files() {
        let classifier = DevFileClassifier::new::<&str>(Path::new("/repo"), &[]).unwrap();
        assert!(!classifier.is_dev_file(Path::new("/repo/tests/a.js")));
    }
}
