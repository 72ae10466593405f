//! DATA DIVISION parser.
//!
//! Section-bounded: locates the division's line range, walks the FILE,
//! WORKING-STORAGE, and LINKAGE sections, accumulates multi-line data
//! items up to their terminating period, extracts the clauses from word
//! tokens, and finally folds each section's flat item list into a level
//! hierarchy with a monotonic stack.

use crate::ast::{DataDivision, DataItem, Value};
use crate::source::{is_comment, CobolSource};

use super::is_division_header;
use super::statements::is_ident;

/// Clause keywords that end a VALUE literal run.
const CLAUSE_KEYWORDS: [&str; 7] = [
    "PIC",
    "PICTURE",
    "USAGE",
    "VALUE",
    "OCCURS",
    "INDEXED",
    "REDEFINES",
];

pub struct DataDivisionParser<'a> {
    src: &'a CobolSource,
}

impl<'a> DataDivisionParser<'a> {
    pub fn new(src: &'a CobolSource) -> Self {
        Self { src }
    }

    /// Parse the whole division, or `None` when the source has none.
    pub fn parse(&self) -> Option<DataDivision> {
        let (start, end) = self.division_bounds()?;

        let mut division = DataDivision::default();
        let mut current_section: Option<Section> = None;
        let mut section_items: Vec<DataItem> = Vec::new();
        let mut i = start + 1;

        while i < end {
            let content = &self.src.lines()[i].content;
            if content.trim().is_empty() {
                i += 1;
                continue;
            }

            if let Some(section) = section_header(content) {
                if let Some(prev) = current_section.take() {
                    store_section(&mut division, prev, build_hierarchy(section_items));
                }
                current_section = Some(section);
                section_items = Vec::new();
                i += 1;
                continue;
            }

            if is_comment(content) {
                i += 1;
                continue;
            }

            if current_section.is_some() {
                let (item, consumed) = self.parse_item_multiline(i, end);
                if let Some(item) = item {
                    section_items.push(item);
                }
                i += consumed;
            } else {
                i += 1;
            }
        }

        if let Some(section) = current_section {
            store_section(&mut division, section, build_hierarchy(section_items));
        }

        Some(division)
    }

    /// `(start, end)` line indices of the division: its header line up to
    /// the PROCEDURE DIVISION header (or end of file).
    fn division_bounds(&self) -> Option<(usize, usize)> {
        let mut start = None;
        let mut end = self.src.len();

        for (i, line) in self.src.lines().iter().enumerate() {
            if is_division_header(&line.content, "DATA") {
                start = Some(i);
            } else if start.is_some() && is_division_header(&line.content, "PROCEDURE") {
                end = i;
                break;
            }
        }

        start.map(|s| (s, end))
    }

    /// Accumulate one data item across physical lines.
    ///
    /// Accumulation stops after a line whose content ends in `.`, or just
    /// before a line that begins a new level-numbered item.
    fn parse_item_multiline(&self, start_idx: usize, end_idx: usize) -> (Option<DataItem>, usize) {
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

            if !accumulated.is_empty() && starts_new_level(trimmed) {
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
        }

        let item = parse_data_item(accumulated.trim(), sequence.unwrap_or_default());
        (item, consumed.max(1))
    }
}

/// The sections this parser recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    File,
    WorkingStorage,
    Linkage,
}

fn store_section(division: &mut DataDivision, section: Section, items: Vec<DataItem>) {
    match section {
        Section::File => division.file_section = items,
        Section::WorkingStorage => division.working_storage = items,
        Section::Linkage => division.linkage = items,
    }
}

fn section_header(content: &str) -> Option<Section> {
    let words: Vec<String> = content
        .split_whitespace()
        .map(|w| w.trim_end_matches('.').to_ascii_uppercase())
        .collect();
    for pair in words.windows(2) {
        if pair[1] == "SECTION" {
            match pair[0].as_str() {
                "FILE" => return Some(Section::File),
                "WORKING-STORAGE" => return Some(Section::WorkingStorage),
                "LINKAGE" => return Some(Section::Linkage),
                _ => {}
            }
        }
    }
    None
}

/// A line that opens a new item: two digits then whitespace.
fn starts_new_level(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), Some(c))
            if a.is_ascii_digit() && b.is_ascii_digit() && c.is_whitespace()
    )
}

/// Parse one accumulated item declaration.
fn parse_data_item(text: &str, sequence: String) -> Option<DataItem> {
    let t = text.trim_start();
    let mut chars = t.chars();
    let (a, b) = (chars.next()?, chars.next()?);
    if !a.is_ascii_digit() || !b.is_ascii_digit() {
        return None;
    }
    let level: u8 = t[..2].parse().ok()?;
    let after_level = &t[2..];
    if !after_level.starts_with(char::is_whitespace) {
        return None;
    }

    let name_part = after_level.trim_start();
    let name_end = name_part
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-'))
        .map(|(i, _)| i)
        .unwrap_or(name_part.len());
    if name_end == 0 {
        return None;
    }
    let name = &name_part[..name_end];

    // Clause text: only meaningful when separated from the name by
    // whitespace; a bare trailing period leaves it empty.
    let remainder = &name_part[name_end..];
    let rest = if remainder.starts_with(char::is_whitespace) {
        remainder.trim().trim_end_matches('.').trim_end()
    } else {
        ""
    };

    let mut item = DataItem {
        level,
        name: name.to_string(),
        picture: None,
        usage: None,
        value: None,
        occurs: None,
        indexed_by: None,
        redefines: None,
        is_filler: name.eq_ignore_ascii_case("FILLER"),
        sequence,
        children: Vec::new(),
    };

    let words: Vec<&str> = rest.split_whitespace().collect();
    let position = |kw: &str| words.iter().position(|w| w.eq_ignore_ascii_case(kw));

    if let Some(p) = position("PIC").or_else(|| position("PICTURE")) {
        item.picture = words.get(p + 1).map(|w| (*w).to_string());
    }

    if let Some(p) = position("USAGE") {
        let mut v = p + 1;
        if words.get(v).is_some_and(|w| w.eq_ignore_ascii_case("IS")) {
            v += 1;
        }
        item.usage = words.get(v).map(|w| (*w).to_string());
    }

    if let Some(p) = position("VALUE") {
        let mut v = p + 1;
        if words.get(v).is_some_and(|w| w.eq_ignore_ascii_case("IS")) {
            v += 1;
        }
        let literal: Vec<&str> = words[v.min(words.len())..]
            .iter()
            .take_while(|w| {
                !CLAUSE_KEYWORDS
                    .iter()
                    .any(|kw| w.eq_ignore_ascii_case(kw))
            })
            .copied()
            .collect();
        if !literal.is_empty() {
            item.value = Some(parse_value(&literal.join(" ")));
        }
    }

    if let Some(p) = position("OCCURS") {
        item.occurs = words.get(p + 1).and_then(|w| w.parse().ok());
    }

    if let Some(p) = position("INDEXED") {
        let mut v = p + 1;
        if words.get(v).is_some_and(|w| w.eq_ignore_ascii_case("BY")) {
            v += 1;
        }
        item.indexed_by = words
            .get(v)
            .filter(|w| is_ident(w))
            .map(|w| (*w).to_string());
    }

    if let Some(p) = position("REDEFINES") {
        item.redefines = words
            .get(p + 1)
            .filter(|w| is_ident(w))
            .map(|w| (*w).to_string());
    }

    Some(item)
}

/// Coerce a VALUE literal: quoted → string, decimal point → float,
/// otherwise integer, with string fallback.
fn parse_value(raw: &str) -> Value {
    let s = raw.trim();

    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return Value::Str(s[1..s.len() - 1].to_string());
        }
    }

    if s.contains('.') {
        return match s.parse::<f64>() {
            Ok(f) => Value::Float(f),
            Err(_) => Value::Str(s.to_string()),
        };
    }

    match s.parse::<i64>() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::Str(s.to_string()),
    }
}

/// Fold a flat, source-ordered item list into a level hierarchy.
///
/// A monotonic stack of open ancestors: each new item pops ancestors with
/// level ≥ its own, attaches to the surviving top (or becomes a root),
/// and is pushed as the new innermost ancestor.
pub(crate) fn build_hierarchy(flat: Vec<DataItem>) -> Vec<DataItem> {
    let mut roots: Vec<DataItem> = Vec::new();
    let mut stack: Vec<DataItem> = Vec::new();

    fn close(stack: &mut Vec<DataItem>, roots: &mut Vec<DataItem>) {
        if let Some(item) = stack.pop() {
            match stack.last_mut() {
                Some(parent) => parent.children.push(item),
                None => roots.push(item),
            }
        }
    }

    for item in flat {
        while stack.last().is_some_and(|top| top.level >= item.level) {
            close(&mut stack, &mut roots);
        }
        stack.push(item);
    }
    while !stack.is_empty() {
        close(&mut stack, &mut roots);
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ws(source: &str) -> Vec<DataItem> {
        let src = CobolSource::from_text(source);
        DataDivisionParser::new(&src)
            .parse()
            .expect("data division")
            .working_storage
    }

    #[test]
    fn level_hierarchy_from_flat_levels() {
        // Levels 01, 05, 05, 10, 01: the second 05 owns the 10, both 05s
        // nest under the first 01, and the last 01 is a childless sibling.
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  HOLD-AREA.\n\
             05  H-NAME        PIC X(20).\n\
             05  H-DETAIL.\n\
             10  H-CODE        PIC 9(02).\n\
             01  OTHER-AREA    PIC X.\n",
        );

        assert_eq!(items.len(), 2);
        let hold = &items[0];
        assert_eq!(hold.name, "HOLD-AREA");
        assert_eq!(hold.children.len(), 2);
        assert_eq!(hold.children[0].name, "H-NAME");
        assert_eq!(hold.children[1].name, "H-DETAIL");
        assert_eq!(hold.children[1].children[0].name, "H-CODE");
        assert!(items[1].children.is_empty());
    }

    #[test]
    fn clause_extraction_is_order_independent() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  TB-RATES  OCCURS 12 INDEXED BY RT-IDX PIC 9(03) VALUE 7.\n",
        );
        let item = &items[0];
        assert_eq!(item.occurs, Some(12));
        assert_eq!(item.indexed_by.as_deref(), Some("RT-IDX"));
        assert_eq!(item.picture.as_deref(), Some("9(03)"));
        assert_eq!(item.value, Some(Value::Int(7)));
    }

    #[test]
    fn decimal_value_is_kept_whole() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  BASE-PAYMENT-RATE  PIC 9(04)V9(02) VALUE 145.20.\n",
        );
        assert_eq!(items[0].value, Some(Value::Float(145.20)));
    }

    #[test]
    fn usage_clause_with_optional_is() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  WS-COUNT  PIC S9(04) USAGE IS COMP-3.\n\
             01  WS-FLAG   PIC X USAGE DISPLAY.\n",
        );
        assert_eq!(items[0].usage.as_deref(), Some("COMP-3"));
        assert_eq!(items[1].usage.as_deref(), Some("DISPLAY"));
    }

    #[test]
    fn quoted_value_and_redefines() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  CAL-VERSION   PIC X(05) VALUE 'C2026'.\n\
             01  CAL-OVERLAY   REDEFINES CAL-VERSION PIC X(05).\n",
        );
        assert_eq!(items[0].value, Some(Value::Str("C2026".into())));
        assert_eq!(items[1].redefines.as_deref(), Some("CAL-VERSION"));
    }

    #[test]
    fn multi_line_item_accumulates_to_period() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  LONG-ITEM\n\
                 PIC X(10)\n\
                 VALUE 'ABC'.\n\
             01  NEXT-ITEM  PIC 9.\n",
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].picture.as_deref(), Some("X(10)"));
        assert_eq!(items[0].value, Some(Value::Str("ABC".into())));
    }

    #[test]
    fn filler_is_flagged() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
             01  FILLER  PIC X(10).\n",
        );
        assert!(items[0].is_filler);
    }

    #[test]
    fn linkage_and_file_sections_fill_their_own_lists() {
        let src = CobolSource::from_text(
            "DATA DIVISION.\n\
             FILE SECTION.\n\
             01  CLAIM-REC  PIC X(80).\n\
             WORKING-STORAGE SECTION.\n\
             01  WS-X  PIC 9.\n\
             LINKAGE SECTION.\n\
             01  LK-PARM  PIC X(10).\n",
        );
        let division = DataDivisionParser::new(&src).parse().unwrap();
        assert_eq!(division.file_section[0].name, "CLAIM-REC");
        assert_eq!(division.working_storage[0].name, "WS-X");
        assert_eq!(division.linkage[0].name, "LK-PARM");
    }

    #[test]
    fn missing_division_yields_none() {
        let src = CobolSource::from_text("PROCEDURE DIVISION.\nP1.\n    GOBACK.");
        assert!(DataDivisionParser::new(&src).parse().is_none());
    }

    #[test]
    fn comments_inside_items_are_skipped() {
        let items = parse_ws(
            "DATA DIVISION.\n\
             WORKING-STORAGE SECTION.\n\
            * layout comment\n\
             01  W-X  PIC 9.\n",
        );
        assert_eq!(items.len(), 1);
    }
}
