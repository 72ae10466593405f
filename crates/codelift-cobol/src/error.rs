//! Error types for the COBOL parser.
//!
//! The parsing pipeline is permissive end to end: malformed statements
//! degrade to partial nodes and unbalanced blocks are force-closed, never
//! reported. Only source loading can fail.

use miette::Diagnostic;
use thiserror::Error;

/// Errors returned when loading COBOL source.
#[derive(Debug, Error, Diagnostic)]
pub enum CobolError {
    /// The source file could not be read.
    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(codelift::cobol::io))]
    Io { path: String, message: String },

    /// The source file is not valid UTF-8.
    #[error("{path} is not valid UTF-8: {message}")]
    #[diagnostic(code(codelift::cobol::encoding))]
    Encoding { path: String, message: String },
}
