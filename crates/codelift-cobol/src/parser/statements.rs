//! Statement recognition over accumulated sentence text.
//!
//! Each accumulated statement (one or more physical lines joined up to its
//! terminating period) is matched against a fixed set of verb forms, in a
//! fixed trial order. Clauses are extracted from word tokens, so decimal
//! literals and identifiers survive intact regardless of the terminating
//! period.

use crate::ast::{ArithmeticStatement, ComputeStatement, PerformStatement, Statement};

/// Verbs that open a new statement. A continuation line never starts with
/// one of these; statement accumulation stops in front of them.
pub(crate) const STATEMENT_KEYWORDS: [&str; 20] = [
    "PERFORM",
    "IF",
    "ELSE",
    "END-IF",
    "END-PERFORM",
    "COMPUTE",
    "MOVE",
    "INITIALIZE",
    "CALL",
    "GOBACK",
    "STOP",
    "EXIT",
    "DISPLAY",
    "ACCEPT",
    "ADD",
    "SUBTRACT",
    "MULTIPLY",
    "DIVIDE",
    "COPY",
    "NEXT",
];

/// True when the line's first word is a statement-opening verb.
pub(crate) fn starts_statement_keyword(line: &str) -> bool {
    let Some(first) = line.split_whitespace().next() else {
        return false;
    };
    let word = first.trim_end_matches('.');
    STATEMENT_KEYWORDS
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}

/// Classify one accumulated statement.
pub(crate) fn classify(text: &str) -> Statement {
    let body = text.trim();
    let upper = body.to_ascii_uppercase();

    if upper.starts_with("PERFORM") {
        Statement::Perform(parse_perform(body))
    } else if upper.starts_with("IF ") {
        Statement::If {
            condition: parse_if_condition(body),
        }
    } else if upper.starts_with("ELSE") {
        Statement::Else
    } else if upper.starts_with("END-IF") {
        Statement::EndIf
    } else if upper.starts_with("END-PERFORM") {
        Statement::EndPerform
    } else if upper.starts_with("COMPUTE") {
        Statement::Compute(parse_compute(body))
    } else if upper.starts_with("MOVE") {
        parse_move(body)
    } else if upper.starts_with("INITIALIZE") {
        Statement::Initialize {
            targets: trailing_words(body, 1),
        }
    } else if upper.starts_with("CALL") {
        parse_call(body)
    } else if upper.starts_with("GOBACK") || upper.starts_with("STOP RUN") || upper.starts_with("EXIT")
    {
        Statement::Exit {
            keyword: first_word(body),
        }
    } else if upper.starts_with("DISPLAY") {
        Statement::Display {
            items: trailing_words(body, 1),
        }
    } else if upper.starts_with("ACCEPT") {
        let rest = bare(body)
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ");
        Statement::Accept {
            variable: if rest.is_empty() { None } else { Some(rest) },
        }
    } else if ["ADD", "SUBTRACT", "MULTIPLY", "DIVIDE"]
        .iter()
        .any(|kw| upper.starts_with(kw))
    {
        Statement::Arithmetic(parse_arithmetic(body))
    } else if upper.starts_with("COPY") {
        let copybook = bare(body)
            .split_whitespace()
            .nth(1)
            .filter(|w| is_ident(w))
            .map(str::to_string);
        Statement::Copy { copybook }
    } else if upper.contains("NEXT SENTENCE") {
        Statement::NextSentence
    } else {
        Statement::Other {
            keyword: first_word(body),
            content: bare(body).to_string(),
        }
    }
}

// ── Clause extraction ──────────────────────────────────────────────────

fn parse_perform(body: &str) -> PerformStatement {
    let stripped = bare(body);
    let words: Vec<&str> = stripped.split_whitespace().collect();
    let mut perform = PerformStatement::default();

    if let Some(word) = words.get(1) {
        if is_ident(word) {
            perform.target = Some((*word).to_string());
        }
    }

    // The loop form requires the full VARYING … FROM … BY … UNTIL chain.
    let varying = word_position(&words, "VARYING");
    let from = word_position(&words, "FROM");
    let by = word_position(&words, "BY");
    let until = word_position(&words, "UNTIL");
    if let (Some(v), Some(f), Some(b), Some(u)) = (varying, from, by, until) {
        if v + 1 < f && f + 1 < b && b + 1 < u {
            perform.varying = Some(words[v + 1].to_string());
            perform.from = Some(words[f + 1..b].join(" "));
            perform.by = Some(words[b + 1..u].join(" "));
        }
    }

    if let Some(u) = until {
        if u + 1 < words.len() {
            perform.until = Some(words[u + 1..].join(" "));
        }
    }

    if words.len() >= 3
        && words[1].chars().all(|c| c.is_ascii_digit())
        && words[2].eq_ignore_ascii_case("TIMES")
    {
        perform.times = words[1].parse().ok();
    }

    perform
}

fn parse_if_condition(body: &str) -> String {
    let rest = body[2..].trim_start();
    let end = find_word(rest, "THEN").map(|(start, _)| start).unwrap_or(rest.len());
    rest[..end].trim().trim_end_matches('.').trim_end().to_string()
}

fn parse_compute(body: &str) -> ComputeStatement {
    let Some(eq) = body.find('=') else {
        return ComputeStatement::default();
    };
    let head: Vec<&str> = body[..eq].split_whitespace().collect();

    // COMPUTE target [ROUNDED] = expression — anything else degrades to
    // an empty compute, never an error.
    let shape_ok = match head.len() {
        2 => is_ident(head[1]),
        3 => is_ident(head[1]) && head[2].eq_ignore_ascii_case("ROUNDED"),
        _ => false,
    };
    if !shape_ok {
        return ComputeStatement::default();
    }

    ComputeStatement {
        target: Some(head[1].to_string()),
        rounded: head.len() == 3,
        expression: Some(
            body[eq + 1..]
                .trim()
                .trim_end_matches('.')
                .trim_end()
                .to_string(),
        ),
    }
}

fn parse_move(body: &str) -> Statement {
    let rest = &body[4..];
    let Some((to_start, to_end)) = find_word(rest, "TO") else {
        return Statement::Move {
            source: None,
            targets: Vec::new(),
        };
    };
    let source = rest[..to_start].trim().to_string();
    let targets = rest[to_end..]
        .trim()
        .trim_end_matches('.')
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Statement::Move {
        source: Some(source),
        targets,
    }
}

fn parse_call(body: &str) -> Statement {
    let program = body
        .find(|c| c == '"' || c == '\'')
        .and_then(|open| {
            let tail = &body[open + 1..];
            tail.find(|c| c == '"' || c == '\'').map(|close| tail[..close].to_string())
        });

    let using = match find_word(body, "USING") {
        Some((_, end)) => body[end..]
            .trim()
            .trim_end_matches('.')
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };

    Statement::Call { program, using }
}

fn parse_arithmetic(body: &str) -> ArithmeticStatement {
    let operation = first_word(body);
    let separators: &[&str] = match operation.as_str() {
        "ADD" => &["TO"],
        "SUBTRACT" => &["FROM"],
        "MULTIPLY" => &["BY"],
        "DIVIDE" => &["INTO", "BY"],
        _ => &[],
    };

    let rest = &body[operation.len()..];
    let sep = separators
        .iter()
        .filter_map(|s| find_word(rest, s))
        .min_by_key(|(start, _)| *start);
    let Some((sep_start, sep_end)) = sep else {
        return ArithmeticStatement {
            operation,
            ..Default::default()
        };
    };

    let operand1 = rest[..sep_start].trim().to_string();
    let tail = rest[sep_end..].trim().trim_end_matches('.').trim_end();
    let tail_words: Vec<&str> = tail.split_whitespace().collect();

    let rounded = tail_words.iter().any(|w| w.eq_ignore_ascii_case("ROUNDED"));
    let giving_pos = tail_words
        .iter()
        .position(|w| w.eq_ignore_ascii_case("GIVING"));
    let giving = giving_pos
        .and_then(|i| tail_words.get(i + 1))
        .filter(|w| is_ident(w))
        .map(|w| (*w).to_string());

    let mut skip = vec![false; tail_words.len()];
    if let Some(i) = giving_pos {
        skip[i] = true;
        if i + 1 < skip.len() {
            skip[i + 1] = true;
        }
    }
    let operand2: String = tail_words
        .iter()
        .enumerate()
        .filter(|(i, w)| !skip[*i] && !w.eq_ignore_ascii_case("ROUNDED"))
        .map(|(_, w)| *w)
        .collect::<Vec<_>>()
        .join(" ");

    ArithmeticStatement {
        operation,
        operand1: Some(operand1),
        operand2: Some(operand2),
        rounded,
        giving,
    }
}

// ── Token helpers ──────────────────────────────────────────────────────

/// COBOL identifier shape: letters, digits, dashes.
pub(crate) fn is_ident(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn bare(body: &str) -> &str {
    body.trim().trim_end_matches('.').trim_end()
}

fn first_word(body: &str) -> String {
    bare(body)
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase()
}

fn trailing_words(body: &str, skip: usize) -> Vec<String> {
    bare(body)
        .split_whitespace()
        .skip(skip)
        .map(str::to_string)
        .collect()
}

fn word_position(words: &[&str], keyword: &str) -> Option<usize> {
    words.iter().position(|w| w.eq_ignore_ascii_case(keyword))
}

/// Byte range of the first whitespace-bounded occurrence of `word`.
fn find_word(haystack: &str, word: &str) -> Option<(usize, usize)> {
    let upper = haystack.to_ascii_uppercase();
    let needle = word.to_ascii_uppercase();
    let mut offset = 0;

    while let Some(found) = upper[offset..].find(&needle) {
        let start = offset + found;
        let end = start + needle.len();
        let before_ok = start == 0 || upper[..start].ends_with(|c: char| c.is_whitespace());
        let after_ok = end == upper.len() || upper[end..].starts_with(|c: char| c.is_whitespace());
        if before_ok && after_ok {
            return Some((start, end));
        }
        offset = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perform_call_form() {
        let stmt = classify("PERFORM 1000-VALIDATE.");
        match stmt {
            Statement::Perform(p) => {
                assert_eq!(p.target.as_deref(), Some("1000-VALIDATE"));
                assert!(!p.is_loop());
                assert!(p.until.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn perform_varying_chain() {
        let stmt = classify("PERFORM VARYING I FROM 1 BY 1 UNTIL I > 10");
        match stmt {
            Statement::Perform(p) => {
                assert!(p.is_loop());
                assert_eq!(p.varying.as_deref(), Some("I"));
                assert_eq!(p.from.as_deref(), Some("1"));
                assert_eq!(p.by.as_deref(), Some("1"));
                assert_eq!(p.until.as_deref(), Some("I > 10"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn perform_until_without_varying_is_a_call() {
        let stmt = classify("PERFORM 2000-LOOP UNTIL EOF-FLAG = 'Y'.");
        match stmt {
            Statement::Perform(p) => {
                assert!(!p.is_loop());
                assert_eq!(p.until.as_deref(), Some("EOF-FLAG = 'Y'"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn perform_times() {
        match classify("PERFORM 3 TIMES") {
            Statement::Perform(p) => assert_eq!(p.times, Some(3)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn if_condition_stops_at_then() {
        match classify("IF PPS-RTC = 00 THEN") {
            Statement::If { condition } => assert_eq!(condition, "PPS-RTC = 00"),
            other => panic!("unexpected: {other:?}"),
        }
        match classify("IF B-PATIENT-WGT = 0") {
            Statement::If { condition } => assert_eq!(condition, "B-PATIENT-WGT = 0"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn compute_keeps_decimal_expression() {
        match classify("COMPUTE H-PAYMENT ROUNDED = BASE-RATE * 1.14.") {
            Statement::Compute(c) => {
                assert_eq!(c.target.as_deref(), Some("H-PAYMENT"));
                assert!(c.rounded);
                assert_eq!(c.expression.as_deref(), Some("BASE-RATE * 1.14"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_compute_degrades() {
        match classify("COMPUTE") {
            Statement::Compute(c) => {
                assert!(c.target.is_none());
                assert!(c.expression.is_none());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn move_with_multiple_targets() {
        match classify("MOVE ZERO TO A B C.") {
            Statement::Move { source, targets } => {
                assert_eq!(source.as_deref(), Some("ZERO"));
                assert_eq!(targets, vec!["A", "B", "C"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn call_with_using() {
        match classify("CALL 'ESCAL9' USING WS-A WS-B.") {
            Statement::Call { program, using } => {
                assert_eq!(program.as_deref(), Some("ESCAL9"));
                assert_eq!(using, vec!["WS-A", "WS-B"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn arithmetic_with_giving_and_rounded() {
        match classify("ADD WS-A TO WS-B ROUNDED GIVING WS-C.") {
            Statement::Arithmetic(a) => {
                assert_eq!(a.operation, "ADD");
                assert_eq!(a.operand1.as_deref(), Some("WS-A"));
                assert_eq!(a.operand2.as_deref(), Some("WS-B"));
                assert!(a.rounded);
                assert_eq!(a.giving.as_deref(), Some("WS-C"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn divide_accepts_into_or_by() {
        match classify("DIVIDE WS-A INTO WS-B.") {
            Statement::Arithmetic(a) => {
                assert_eq!(a.operation, "DIVIDE");
                assert_eq!(a.operand2.as_deref(), Some("WS-B"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn scope_terminators_classify() {
        assert_eq!(classify("END-IF."), Statement::EndIf);
        assert_eq!(classify("END-PERFORM"), Statement::EndPerform);
        assert_eq!(classify("ELSE"), Statement::Else);
    }

    #[test]
    fn exit_forms() {
        for (text, kw) in [
            ("GOBACK.", "GOBACK"),
            ("STOP RUN.", "STOP"),
            ("EXIT.", "EXIT"),
        ] {
            match classify(text) {
                Statement::Exit { keyword } => assert_eq!(keyword, kw),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_verb_keeps_keyword_and_text() {
        match classify("OPEN INPUT CLAIM-FILE.") {
            Statement::Other { keyword, content } => {
                assert_eq!(keyword, "OPEN");
                assert_eq!(content, "OPEN INPUT CLAIM-FILE");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn next_sentence() {
        assert_eq!(classify("GO NEXT SENTENCE."), Statement::NextSentence);
    }
}
