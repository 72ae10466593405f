//! The line cursor every dialect parser advances through the source.
//!
//! Parsing is line-oriented: the cursor holds the full source split into
//! lines plus a mutable current-line index. Statement parsers advance it by
//! side effect after each recognized construct; multi-line parsers (a
//! procedure body, a FOR loop, an accumulated COBOL sentence) may advance
//! it further before returning. The index is allowed to reach one past the
//! last line; callers loop on [`LineCursor::at_end`].

use crate::preprocess::split_lines;

/// Stateful cursor over an ordered sequence of source lines.
#[derive(Debug, Clone)]
pub struct LineCursor {
    lines: Vec<String>,
    pos: usize,
}

impl LineCursor {
    /// Build a cursor from raw source text, normalizing line endings.
    pub fn new(source: &str) -> Self {
        Self {
            lines: split_lines(source),
            pos: 0,
        }
    }

    /// Total number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the source had no lines at all (never the case for a
    /// cursor built from text, which always has at least one line).
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Current line index (0-based). May equal `len()` once exhausted.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// True once the cursor has moved past the last line.
    pub fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// The current line, or `None` past the end.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    /// Advance by one line.
    pub fn advance(&mut self) {
        self.pos += 1;
    }

    /// Move back one line. Used when a lookahead loop overshoots a
    /// boundary the enclosing loop will re-advance past.
    pub fn retreat(&mut self) {
        self.pos = self.pos.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_all_lines() {
        let mut cur = LineCursor::new("a\nb\nc");
        let mut seen = Vec::new();
        while !cur.at_end() {
            seen.push(cur.current().unwrap().to_string());
            cur.advance();
        }
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[test]
    fn tolerates_one_past_end() {
        let mut cur = LineCursor::new("only");
        cur.advance();
        assert!(cur.at_end());
        assert_eq!(cur.current(), None);
        // Advancing again must not panic; consumers may overshoot by one.
        cur.advance();
        assert!(cur.at_end());
    }

    #[test]
    fn retreat_clamps_at_zero() {
        let mut cur = LineCursor::new("x");
        cur.retreat();
        assert_eq!(cur.pos(), 0);
    }

    #[test]
    fn empty_source_is_a_single_blank_line() {
        let cur = LineCursor::new("");
        assert_eq!(cur.len(), 1);
        assert_eq!(cur.current(), Some(""));
    }
}
