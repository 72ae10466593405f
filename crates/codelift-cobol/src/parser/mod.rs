//! Raw parsing: divisions located by header scan, then delegated to the
//! section-bounded sub-parsers.
//!
//! The two division parsers are independent; each scans the full line list
//! for its own header and never fails — a missing division simply yields
//! `None` for that part of the [`RawProgram`].

pub(crate) mod data;
pub(crate) mod procedure;
pub(crate) mod statements;

use tracing::debug;

use crate::ast::RawProgram;
use crate::source::CobolSource;

pub use data::DataDivisionParser;
pub use procedure::ProcedureDivisionParser;

/// `content` contains `NAME DIVISION` as adjacent words.
pub(crate) fn is_division_header(content: &str, name: &str) -> bool {
    let words: Vec<String> = content
        .split_whitespace()
        .map(|w| w.trim_end_matches('.').to_ascii_uppercase())
        .collect();
    words
        .windows(2)
        .any(|pair| pair[0] == name && pair[1] == "DIVISION")
}

/// Parse raw source into the three-part raw program.
pub fn parse_raw(code: &str) -> RawProgram {
    let src = CobolSource::from_text(code);
    debug!(
        lines = src.len(),
        has_line_nums = src.has_line_nums(),
        "parsing COBOL source"
    );

    RawProgram {
        program_id: extract_program_id(&src),
        data: DataDivisionParser::new(&src).parse(),
        procedure: ProcedureDivisionParser::new(&src).parse(),
    }
}

/// PROGRAM-ID, found by literal substring scan over the first 100 lines —
/// deliberately not a full identification-division grammar.
fn extract_program_id(src: &CobolSource) -> Option<String> {
    for line in src.lines().iter().take(100) {
        let content = line.content.trim();
        if !content.contains("PROGRAM-ID") {
            continue;
        }
        if let Some((_, after)) = content.split_once("PROGRAM-ID.") {
            let name = after.trim().trim_end_matches('.').trim_end();
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
        break;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_header_matching() {
        assert!(is_division_header("DATA DIVISION.", "DATA"));
        assert!(is_division_header("  procedure   division.", "PROCEDURE"));
        assert!(!is_division_header("DATA-DIVISION.", "DATA"));
        assert!(!is_division_header("MOVE DATA TO DIVISIONS.", "DATA"));
    }

    #[test]
    fn program_id_from_fixed_format() {
        let raw = parse_raw("000100 IDENTIFICATION DIVISION.\n000200 PROGRAM-ID. ESCAL130.\n");
        assert_eq!(raw.program_id.as_deref(), Some("ESCAL130"));
    }

    #[test]
    fn program_id_absent() {
        let raw = parse_raw("IDENTIFICATION DIVISION.\n");
        assert!(raw.program_id.is_none());
    }

    #[test]
    fn divisions_are_optional() {
        let raw = parse_raw("IDENTIFICATION DIVISION.\nPROGRAM-ID. X.\n");
        assert!(raw.data.is_none());
        assert!(raw.procedure.is_none());
    }
}
