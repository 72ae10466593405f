//! Shared infrastructure for the codelift dialect parsers.
//!
//! Both language crates (`codelift-windev`, `codelift-cobol`) parse raw,
//! weakly structured source a line at a time. This crate provides the pieces
//! they share:
//!
//! - **Preprocessing**: [`normalize_line_endings`], [`split_lines`]
//! - **Line scanning**: [`LineCursor`], the stateful cursor every parser
//!   advances through the source
//! - **Text matching**: case-insensitive helpers in [`text`] that handle the
//!   accented keywords of the 4GL dialect
//!
//! # Design Principles
//!
//! - **Zero dependencies**: this crate contains only plain Rust types and
//!   functions. Dialect crates add `thiserror`/`miette`/`serde` on top.
//! - **Shared, not prescriptive**: nothing here knows about either dialect's
//!   grammar; it only knows about lines and case-insensitive text.

mod cursor;
mod preprocess;
pub mod text;

pub use cursor::LineCursor;
pub use preprocess::{normalize_line_endings, split_lines};
