//! Source preprocessing shared by every dialect parser.
//!
//! Raw legacy source arrives with whatever line terminators the transfer
//! tooling left behind (`\r\n` from Windows exports, bare `\r` from old
//! archives). Every parser first normalizes to `\n` and then works on an
//! ordered line sequence; offsets never matter afterwards, only line
//! indices, so no byte-offset index is kept.

/// Normalize line endings to Unix style (`\n`).
///
/// Converts `\r\n` and bare `\r` to `\n`. Pure `\n` input is returned
/// unchanged via the fast path.
pub fn normalize_line_endings(text: &str) -> String {
    if !text.as_bytes().contains(&b'\r') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
        } else {
            out.push(ch);
        }
    }

    out
}

/// Split source text into owned lines after normalizing line endings.
///
/// `"".split('\n')` yields one empty line, matching the behavior the
/// dialect parsers expect: even empty source has a first line to inspect
/// (the COBOL parser reads line 0 to decide sequence-number format).
pub fn split_lines(text: &str) -> Vec<String> {
    normalize_line_endings(text)
        .split('\n')
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_unix_unchanged() {
        assert_eq!(normalize_line_endings("a\nb\nc"), "a\nb\nc");
    }

    #[test]
    fn normalize_windows_crlf() {
        assert_eq!(normalize_line_endings("a\r\nb\r\nc"), "a\nb\nc");
    }

    #[test]
    fn normalize_old_mac_cr() {
        assert_eq!(normalize_line_endings("a\rb\rc"), "a\nb\nc");
    }

    #[test]
    fn normalize_mixed() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\nd"), "a\nb\nc\nd");
    }

    #[test]
    fn normalize_preserves_accents() {
        assert_eq!(normalize_line_endings("é\r\nà"), "é\nà");
    }

    #[test]
    fn split_empty_source_has_one_line() {
        assert_eq!(split_lines(""), vec![String::new()]);
    }

    #[test]
    fn split_trailing_newline_yields_empty_last_line() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b", ""]);
    }

    #[test]
    fn split_crlf() {
        assert_eq!(split_lines("one\r\ntwo"), vec!["one", "two"]);
    }
}
