//! Parser for WinDev-style 4GL source.
//!
//! This crate turns raw 4GL source text into a tree of [`Node`]s and
//! enriches every procedure with an inferred effective signature (global
//! reads/writes, return type, external calls, side effects).
//!
//! # Pipeline
//!
//! 1. The source is split into lines and walked by a line cursor.
//! 2. Each line is dispatched against a fixed set of syntactic forms
//!    (procedure headers, declarations, loops, conditionals, assignments,
//!    calls); expressions inside them are parsed by the shared expression
//!    parser in [`expr`].
//! 3. Procedure bodies are re-walked by the [`analyzer`] to produce the
//!    side-effect summary attached to the procedure node.
//!
//! The parser is deliberately permissive: a line that matches no known form
//! contributes nothing to the tree, and malformed constructs degrade to
//! partial nodes instead of errors. The only fallible entry point is
//! [`parse_file`], which can fail on unreadable input.

pub mod analyzer;
pub mod ast;
mod error;
pub mod expr;
mod parser;
mod scope;

pub use ast::{LiteralKind, Node};
pub use error::WindevError;
pub use parser::Parser;
pub use scope::ScopeStack;

use std::path::Path;

/// Parse 4GL source text into a program node.
pub fn parse_source(code: &str) -> Node {
    Parser::new(code).parse()
}

/// Parse 4GL source text and render the JSON tree.
pub fn parse_to_json(code: &str) -> serde_json::Value {
    parse_source(code).to_json()
}

/// Load a source file and parse it.
///
/// This is the crate's only I/O path; see [`WindevError`] for the failure
/// modes (unreadable file, non-UTF-8 encoding).
pub fn parse_file(path: &Path) -> Result<Node, WindevError> {
    let bytes = std::fs::read(path).map_err(|e| WindevError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let code = String::from_utf8(bytes).map_err(|e| WindevError::Encoding {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_source(&code))
}
