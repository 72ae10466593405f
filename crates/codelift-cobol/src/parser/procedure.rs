//! PROCEDURE DIVISION parser.
//!
//! Locates the division header, accumulates its optional multi-line USING
//! clause up to the terminating period, then scans for paragraph labels
//! and accumulates each paragraph's statements. Statements span physical
//! lines until a terminating period, a bare scope terminator, or the line
//! that opens the next statement or numbered paragraph.

use crate::ast::{ProcedureDivision, RawParagraph, RawStatement};
use crate::source::{is_comment, CobolSource};

use super::is_division_header;
use super::statements::{classify, starts_statement_keyword};

pub struct ProcedureDivisionParser<'a> {
    src: &'a CobolSource,
}

impl<'a> ProcedureDivisionParser<'a> {
    pub fn new(src: &'a CobolSource) -> Self {
        Self { src }
    }

    /// Parse the whole division, or `None` when the source has none.
    pub fn parse(&self) -> Option<ProcedureDivision> {
        let start = self
            .src
            .lines()
            .iter()
            .position(|line| is_division_header(&line.content, "PROCEDURE"))?;
        let end = self.src.len();

        let (using, body_start) = self.parse_using_clause(start, end);
        let paragraphs = self.parse_paragraphs(body_start, end);

        Some(ProcedureDivision { using, paragraphs })
    }

    /// The USING clause can continue past the header line; accumulate
    /// until the sentence period. Returns the parameters and the index of
    /// the first body line.
    fn parse_using_clause(&self, start: usize, end: usize) -> (Vec<String>, usize) {
        let mut header = String::new();
        let mut body_start = start + 1;
        let mut i = start;

        while i < (start + 20).min(end) {
            let content = &self.src.lines()[i].content;
            if content.trim().is_empty() || is_comment(content) {
                i += 1;
                continue;
            }
            if is_division_header(content, "PROCEDURE") {
                header = content.trim().to_string();
                body_start = i + 1;

                let mut j = i + 1;
                while j < end && !header.trim_end().ends_with('.') {
                    let next = &self.src.lines()[j].content;
                    if !next.trim().is_empty() && !is_comment(next) {
                        header.push(' ');
                        header.push_str(next.trim());
                        body_start = j + 1;
                    }
                    j += 1;
                }
                break;
            }
            i += 1;
        }

        if header.is_empty() {
            return (Vec::new(), start + 1);
        }

        let bare = header.trim_end_matches('.').trim_end();
        let upper = bare.to_ascii_uppercase();
        let params = match upper.split_whitespace().position(|w| w == "USING") {
            Some(pos) => bare
                .split_whitespace()
                .skip(pos + 1)
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        (params, body_start)
    }

    fn parse_paragraphs(&self, start: usize, end: usize) -> Vec<RawParagraph> {
        let mut paragraphs = Vec::new();
        let mut current: Option<RawParagraph> = None;
        let mut i = start;

        while i < end {
            let line = &self.src.lines()[i];
            let trimmed = line.content.trim();

            if trimmed.is_empty() || is_comment(&line.content) {
                i += 1;
                continue;
            }

            if let Some(name) = paragraph_label(trimmed) {
                if let Some(done) = current.take() {
                    paragraphs.push(done);
                }
                current = Some(RawParagraph {
                    name,
                    sequence: line.sequence.clone(),
                    statements: Vec::new(),
                });
                i += 1;
                continue;
            }

            if let Some(paragraph) = current.as_mut() {
                let (statement, consumed) = self.parse_statement_multiline(i, end);
                if let Some(statement) = statement {
                    paragraph.statements.push(statement);
                }
                i += consumed;
            } else {
                i += 1;
            }
        }

        if let Some(done) = current {
            paragraphs.push(done);
        }

        paragraphs
    }

    /// Accumulate one statement across physical lines.
    fn parse_statement_multiline(
        &self,
        start_idx: usize,
        end_idx: usize,
    ) -> (Option<RawStatement>, usize) {
        let mut accumulated = String::new();
        let mut sequence = None;
        let mut consumed = 0;
        let mut idx = start_idx;

        while idx < end_idx {
            let line = &self.src.lines()[idx];
            if sequence.is_none() {
                sequence = Some(line.sequence.clone());
            }
            let trimmed = line.content.trim();

            if trimmed.is_empty() || is_comment(&line.content) {
                idx += 1;
                consumed += 1;
                continue;
            }

            // A numbered paragraph label or a new verb closes the current
            // statement without being merged into it.
            if !accumulated.is_empty()
                && (is_numbered_label(trimmed) || starts_statement_keyword(trimmed))
            {
                break;
            }

            if !accumulated.is_empty() {
                accumulated.push(' ');
            }
            accumulated.push_str(trimmed);
            consumed += 1;
            idx += 1;

            if trimmed.ends_with('.') {
                break;
            }
            let upper = trimmed.to_ascii_uppercase();
            if matches!(upper.as_str(), "END-IF" | "END-PERFORM" | "ELSE") {
                break;
            }
        }

        let accumulated = accumulated.trim();
        if accumulated.is_empty() {
            return (None, consumed.max(1));
        }

        let statement = RawStatement {
            sequence: sequence.unwrap_or_default(),
            statement: classify(accumulated),
        };
        (Some(statement), consumed.max(1))
    }
}

/// A paragraph label: `NNNN-NAME.` or a bare `NAME.` filling the whole
/// line. Returns the name without its terminating period.
fn paragraph_label(trimmed: &str) -> Option<String> {
    let name = trimmed.strip_suffix('.')?;
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }

    let bytes = name.as_bytes();
    let numbered = bytes.len() > 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-';
    let bare = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());

    (numbered || bare).then(|| name.to_string())
}

/// The numbered-paragraph form only; used as a hard stop while
/// accumulating statements.
fn is_numbered_label(trimmed: &str) -> bool {
    let Some(name) = trimmed.strip_suffix('.') else {
        return false;
    };
    let bytes = name.as_bytes();
    bytes.len() > 5
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}
