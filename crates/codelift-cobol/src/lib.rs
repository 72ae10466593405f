//! Business-logic-oriented COBOL parser.
//!
//! This crate turns raw COBOL source into a semantic AST centered on what
//! the program *does*: constants, data structures, paragraphs with nested
//! control flow, and heuristic business-logic classification — not a
//! literal syntax dump.
//!
//! # Pipeline
//!
//! 1. [`source`]: sequence-number detection (decided once, from the first
//!    line) and line cleaning.
//! 2. [`parser`]: independent section-bounded parsers for the DATA and
//!    PROCEDURE divisions produce the raw [`ast::RawProgram`] — data item
//!    trees and flat per-paragraph statement lists.
//! 3. [`flow`]: the canonical nesting pass converts flat statements into
//!    nested [`flow::ControlFlow`], force-closing unbalanced blocks.
//! 4. [`builder`]: semantic assembly — constants vs variables, paragraph
//!    filtering, name-based classification, version lookup.
//!
//! [`formula::FormulaExtractor`] runs over the raw layer independently to
//! pull COMPUTE formulas with complexity scores.
//!
//! The pipeline is permissive throughout: malformed constructs degrade to
//! partial nodes and never raise. Only [`parse_file`] can fail, on
//! unreadable input.

pub mod ast;
mod builder;
mod error;
pub mod flow;
pub mod formula;
pub mod parser;
mod source;

pub use builder::{build_semantic_ast, BusinessLogic, Paragraph, SemanticAst, Variable};
pub use error::CobolError;
pub use flow::{build_control_flow, ControlFlow, ControlFlowBuilder};
pub use formula::{Complexity, Formula, FormulaExtractor};
pub use parser::parse_raw;
pub use source::{is_comment, CobolSource, SourceLine};

use std::path::Path;

/// Parse COBOL source text into the semantic AST.
pub fn parse_source(code: &str) -> SemanticAst {
    build_semantic_ast(&parse_raw(code))
}

/// Parse COBOL source text and render the JSON document.
pub fn parse_to_json(code: &str) -> serde_json::Value {
    parse_source(code).to_json()
}

/// Load a source file and parse it.
pub fn parse_file(path: &Path) -> Result<SemanticAst, CobolError> {
    let bytes = std::fs::read(path).map_err(|e| CobolError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let code = String::from_utf8(bytes).map_err(|e| CobolError::Encoding {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(parse_source(&code))
}
