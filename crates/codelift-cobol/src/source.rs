//! COBOL source handling: sequence-number detection and line cleaning.
//!
//! Classic fixed-format COBOL carries a 6-character numeric sequence field
//! in columns 1-6. Whether a file uses it is decided once, from the first
//! source line, and applied uniformly; the decision is never re-evaluated
//! per line.

use codelift_lang_core::split_lines;

/// One cleaned source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// The sequence-number field (empty when the file carries none).
    pub sequence: String,
    /// The code content after the sequence field.
    pub content: String,
}

/// A COBOL source file split into cleaned lines.
#[derive(Debug, Clone)]
pub struct CobolSource {
    has_line_nums: bool,
    lines: Vec<SourceLine>,
}

impl CobolSource {
    /// Split and clean raw source text.
    pub fn from_text(code: &str) -> Self {
        let raw = split_lines(code);
        let has_line_nums = detect_line_numbers(&raw);
        let lines = raw
            .iter()
            .map(|line| clean_line(line, has_line_nums))
            .collect();
        Self {
            has_line_nums,
            lines,
        }
    }

    /// Whether the file carries a fixed sequence-number field.
    pub fn has_line_nums(&self) -> bool {
        self.has_line_nums
    }

    /// All cleaned lines.
    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// The format decision: the first line starts with six digits.
fn detect_line_numbers(lines: &[String]) -> bool {
    let Some(first) = lines.first() else {
        return false;
    };
    let prefix: Vec<char> = first.chars().take(6).collect();
    prefix.len() == 6 && prefix.iter().all(|c| c.is_ascii_digit())
}

/// Split a raw line into `(sequence, content)`.
fn clean_line(line: &str, has_line_nums: bool) -> SourceLine {
    if has_line_nums && line.chars().count() >= 6 {
        let split_at = line
            .char_indices()
            .nth(6)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        SourceLine {
            sequence: line[..split_at].trim().to_string(),
            content: line[split_at..].trim_end().to_string(),
        }
    } else {
        SourceLine {
            sequence: String::new(),
            content: line.trim_end().to_string(),
        }
    }
}

/// Comment lines start with `*` or `/` after leading whitespace.
pub fn is_comment(content: &str) -> bool {
    let stripped = content.trim_start();
    stripped.starts_with('*') || stripped.starts_with('/')
}
