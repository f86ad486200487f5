//! Import extraction using tree-sitter for JavaScript/TypeScript.
//!
//! Source files are parsed once; import sites are then read lazily from the
//! syntax tree. Recognized forms: `import ... from 'x'` (and
//! `export ... from 'x'`), `import('x')`, `require('x')` (and TypeScript's
//! `import x = require('x')`), and `require.resolve('x')`.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;
use tree_sitter::{Language, Node, Parser, Tree, TreeCursor};

use super::specifier::package_root;
use super::{AnalysisError, AnalysisResult};

/// Comment that suppresses import sites starting on the next line.
pub const IGNORE_NEXT_LINE: &str = "ghost-imports-ignore-next-line";

/// File extensions scanned for imports.
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// The syntactic form of an import site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import ... from 'module'`, `import 'module'` or `export ... from 'module'`
    Static,
    /// `import('module')`
    Dynamic,
    /// `require('module')`, including TypeScript's `import x = require('module')`
    Require,
    /// `require.resolve('module')`
    RequireResolve,
}

/// One import site in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSite {
    /// The literal module specifier, or `None` for a non-literal argument.
    pub specifier: Option<String>,
    /// The kind of import
    pub kind: ImportKind,
    /// Line number in the source file (1-indexed)
    pub line: usize,
    /// Column in the source file (1-indexed)
    pub column: usize,
}

/// A package imported by a file.
///
/// Ordered by importing file, then package name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    /// Absolute path of the importing file.
    pub imported_from: PathBuf,
    /// Package root, `@scope/name` or `name`.
    pub imported: String,
}

/// Language type for file analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// JavaScript, JSX included.
    JavaScript,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Determine language from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "jsx" | "mjs" | "cjs" => Some(SourceLanguage::JavaScript),
            "ts" | "mts" | "cts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    /// Determine language from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Get tree-sitter language for this source language.
    pub fn tree_sitter_language(&self) -> Language {
        match self {
            SourceLanguage::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

/// Extracts imports from JavaScript/TypeScript source files.
///
/// Holds one parser per grammar; reuse an extractor across files of the same
/// thread rather than creating one per file.
pub struct ImportExtractor {
    js_parser: Parser,
    ts_parser: Parser,
    tsx_parser: Parser,
}

impl ImportExtractor {
    /// Create a new extractor.
    pub fn new() -> AnalysisResult<Self> {
        Ok(Self {
            js_parser: parser_for(SourceLanguage::JavaScript)?,
            ts_parser: parser_for(SourceLanguage::TypeScript)?,
            tsx_parser: parser_for(SourceLanguage::Tsx)?,
        })
    }

    /// Parses `source`, failing on any syntax error.
    pub fn parse<'s>(
        &mut self,
        source: &'s str,
        language: SourceLanguage,
        path: &Path,
    ) -> AnalysisResult<ParsedSource<'s>> {
        let parser = match language {
            SourceLanguage::JavaScript => &mut self.js_parser,
            SourceLanguage::TypeScript => &mut self.ts_parser,
            SourceLanguage::Tsx => &mut self.tsx_parser,
        };

        let tree = parser.parse(source, None).ok_or_else(|| AnalysisError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = Preorder::new(root.walk())
                .find(|node| node.is_error() || node.is_missing())
                .map(|node| {
                    let pos = node.start_position();
                    (pos.row + 1, pos.column + 1)
                })
                .unwrap_or((1, 1));

            return Err(AnalysisError::Parse {
                path: path.to_path_buf(),
                line,
                column,
            });
        }

        let ignored_lines = suppressed_lines(&tree, source);
        Ok(ParsedSource {
            tree,
            source,
            ignored_lines,
        })
    }

    /// Collects the packages imported by one file.
    ///
    /// Sites under the ignore comment are dropped; non-literal sites are
    /// reported and dropped.
    pub fn extract_imports(
        &mut self,
        path: &Path,
        source: &str,
        language: SourceLanguage,
        workspace: &str,
    ) -> AnalysisResult<BTreeSet<ImportRecord>> {
        let parsed = self.parse(source, language, path)?;
        let mut records = BTreeSet::new();

        for site in parsed.import_sites() {
            if parsed.is_suppressed(site.line) {
                continue;
            }

            let Some(specifier) = site.specifier else {
                warn!(
                    workspace,
                    file = %path.display(),
                    line = site.line,
                    column = site.column,
                    "non-literal module specifier, unable to determine import"
                );
                continue;
            };

            if let Some(package) = package_root(&specifier) {
                records.insert(ImportRecord {
                    imported_from: path.to_path_buf(),
                    imported: package.to_string(),
                });
            }
        }

        Ok(records)
    }
}

fn parser_for(language: SourceLanguage) -> AnalysisResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&language.tree_sitter_language())
        .map_err(|_| AnalysisError::LanguageInit)?;
    Ok(parser)
}

/// A syntactically valid source file.
pub struct ParsedSource<'s> {
    tree: Tree,
    source: &'s str,
    ignored_lines: HashSet<usize>,
}

impl<'s> ParsedSource<'s> {
    /// Iterates the import sites in document order.
    ///
    /// Each call starts a fresh traversal.
    pub fn import_sites(&self) -> ImportSites<'_> {
        ImportSites {
            nodes: Preorder::new(self.tree.root_node().walk()),
            source: self.source,
        }
    }

    /// Returns true if sites starting on `line` (1-indexed) are suppressed.
    pub fn is_suppressed(&self, line: usize) -> bool {
        self.ignored_lines.contains(&line)
    }
}

/// Lazy iterator over the import sites of a [`ParsedSource`].
pub struct ImportSites<'t> {
    nodes: Preorder<'t>,
    source: &'t str,
}

impl<'t> Iterator for ImportSites<'t> {
    type Item = ImportSite;

    fn next(&mut self) -> Option<ImportSite> {
        let source = self.source;
        self.nodes.by_ref().find_map(|node| classify(node, source))
    }
}

/// Depth-first, pre-order walk over every node of a tree.
struct Preorder<'t> {
    cursor: TreeCursor<'t>,
    done: bool,
}

impl<'t> Preorder<'t> {
    fn new(cursor: TreeCursor<'t>) -> Self {
        Self {
            cursor,
            done: false,
        }
    }
}

impl<'t> Iterator for Preorder<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Node<'t>> {
        if self.done {
            return None;
        }

        let node = self.cursor.node();

        if !self.cursor.goto_first_child() {
            loop {
                if self.cursor.goto_next_sibling() {
                    break;
                }
                if !self.cursor.goto_parent() {
                    self.done = true;
                    break;
                }
            }
        }

        Some(node)
    }
}

/// Lines following an ignore comment.
fn suppressed_lines(tree: &Tree, source: &str) -> HashSet<usize> {
    Preorder::new(tree.root_node().walk())
        .filter(|node| node.kind() == "comment")
        .filter(|node| {
            node_text(node, source)
                .map(comment_body)
                .is_some_and(|body| body == IGNORE_NEXT_LINE)
        })
        // end row is 0-indexed; the next line is end row + 2 when 1-indexed
        .map(|node| node.end_position().row + 2)
        .collect()
}

fn comment_body(text: &str) -> &str {
    let body = if let Some(line) = text.strip_prefix("//") {
        line
    } else {
        text.strip_prefix("/*")
            .and_then(|t| t.strip_suffix("*/"))
            .unwrap_or(text)
    };
    body.trim()
}

/// Turns a node into an import site if it is one.
fn classify(node: Node<'_>, source: &str) -> Option<ImportSite> {
    let (kind, argument) = match node.kind() {
        "import_statement" => match find_child(node, "import_require_clause") {
            Some(clause) => (ImportKind::Require, module_source(clause)),
            None => (ImportKind::Static, Some(module_source(node)?)),
        },
        "export_statement" => (ImportKind::Static, Some(module_source(node)?)),
        "call_expression" => {
            let function = node.child_by_field_name("function")?;
            let kind = call_kind(function, source)?;
            (kind, first_argument(node))
        }
        _ => return None,
    };

    let specifier = argument
        .filter(|arg| arg.kind() == "string")
        .and_then(|arg| string_value(&arg, source))
        .map(str::to_string);

    let position = node.start_position();
    Some(ImportSite {
        specifier,
        kind,
        line: position.row + 1,
        column: position.column + 1,
    })
}

fn call_kind(function: Node<'_>, source: &str) -> Option<ImportKind> {
    match function.kind() {
        "import" => Some(ImportKind::Dynamic),
        "identifier" => match node_text(&function, source)? {
            "require" => Some(ImportKind::Require),
            "import" => Some(ImportKind::Dynamic),
            _ => None,
        },
        "member_expression" => {
            let object = function.child_by_field_name("object")?;
            let property = function.child_by_field_name("property")?;
            let is_require = object.kind() == "identifier"
                && node_text(&object, source) == Some("require");
            let is_resolve = node_text(&property, source) == Some("resolve");
            (is_require && is_resolve).then_some(ImportKind::RequireResolve)
        }
        _ => None,
    }
}

/// The `from 'x'` string of an import or export statement.
fn module_source(node: Node<'_>) -> Option<Node<'_>> {
    node.child_by_field_name("source")
}

fn first_argument(call: Node<'_>) -> Option<Node<'_>> {
    let arguments = call.child_by_field_name("arguments")?;
    if arguments.kind() != "arguments" {
        // tagged template: require`x`
        return Some(arguments);
    }

    let mut cursor = arguments.walk();
    let first = arguments
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment");
    first
}

fn find_child<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Extract the text content of a node.
fn node_text<'a>(node: &Node<'_>, source: &'a str) -> Option<&'a str> {
    source.get(node.start_byte()..node.end_byte())
}

/// Extract string value (removes quotes).
fn string_value<'a>(node: &Node<'_>, source: &'a str) -> Option<&'a str> {
    let text = node_text(node, source)?;
    if text.len() < 2 {
        return None;
    }
    text.get(1..text.len() - 1)
}
