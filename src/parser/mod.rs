//! Parser module for package manifests.
//!
//! This module reads npm `package.json` files into typed structures and
//! writes fixed manifests back without losing unrelated fields.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ghost_imports::parser::{package_json, DependencyScope};
//!
//! let pkg = package_json::parse_file(Path::new("package.json")).unwrap();
//! let prod = pkg.names_in_scope(DependencyScope::Dependencies);
//!
//! println!("Found {} production dependencies", prod.len());
//! ```

pub mod package_json;
pub mod types;

pub use package_json::{
    parse_file, parse_str, ManifestDocument, ParseError, ParseResult, MANIFEST_FILE,
};

pub use types::{Binaries, DependencyScope, PackageJson, Workspaces};
