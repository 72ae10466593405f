//! Error types for the 4GL parser.
//!
//! Parsing itself never fails: unrecognized lines are dropped and malformed
//! constructs degrade to partial nodes. Only source loading can error.

use miette::Diagnostic;
use thiserror::Error;

/// Errors returned when loading 4GL source.
#[derive(Debug, Error, Diagnostic)]
pub enum WindevError {
    /// The source file could not be read.
    #[error("failed to read {path}: {message}")]
    #[diagnostic(code(codelift::windev::io))]
    Io { path: String, message: String },

    /// The source file is not valid UTF-8.
    #[error("{path} is not valid UTF-8: {message}")]
    #[diagnostic(code(codelift::windev::encoding))]
    Encoding { path: String, message: String },
}
