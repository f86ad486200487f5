//! ghost-imports - finds dependency drift in JavaScript/TypeScript projects
//!
//! This crate compares the dependencies each workspace declares in its
//! package.json with the packages its source files actually import, and can
//! rewrite manifests to fix the difference.

pub mod analysis;
pub mod config;
pub mod export;
pub mod fix;
pub mod graph;
pub mod parser;
pub mod project;
