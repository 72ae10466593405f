//! Expression text utilities.
//!
//! The 4GL expression grammar is recognized form by form over raw
//! substrings (see [`crate::Parser`] for the trial order). The helpers here
//! do the character-level work: depth- and quote-aware argument splitting,
//! top-level operator search, and literal shape tests. Quotes suspend all
//! depth counting; `(` and `[` increment their own depths; a separator only
//! fires when every depth is zero.

/// Split a call's argument string on top-level commas.
///
/// Commas inside double quotes, parentheses, or brackets do not split:
/// `a, "b,c", g(d,e)` yields `["a", "\"b,c\"", "g(d,e)"]`.
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut paren_depth = 0i32;
    let mut bracket_depth = 0i32;
    let mut in_string = false;

    for ch in args.chars() {
        if ch == '"' {
            in_string = !in_string;
            current.push(ch);
        } else if in_string {
            current.push(ch);
        } else {
            match ch {
                '(' => {
                    paren_depth += 1;
                    current.push(ch);
                }
                ')' => {
                    paren_depth -= 1;
                    current.push(ch);
                }
                '[' => {
                    bracket_depth += 1;
                    current.push(ch);
                }
                ']' => {
                    bracket_depth -= 1;
                    current.push(ch);
                }
                ',' if paren_depth == 0 && bracket_depth == 0 => {
                    out.push(current.trim().to_string());
                    current.clear();
                }
                _ => current.push(ch),
            }
        }
    }

    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }

    out
}

/// Byte index of the first occurrence of `op` outside double quotes.
pub fn find_top_level(expr: &str, op: &str) -> Option<usize> {
    let mut in_string = false;
    let bytes = expr.as_bytes();
    let needle = op.as_bytes();

    for (i, ch) in expr.char_indices() {
        if ch == '"' {
            in_string = !in_string;
            continue;
        }
        if !in_string && bytes[i..].starts_with(needle) {
            return Some(i);
        }
    }
    None
}

/// Split `expr` once at the first top-level occurrence of `op`.
///
/// Exactly one split: the right half keeps any further occurrences, so
/// repeated operators associate right-heavy when the caller recurses.
pub fn split_top_level_once<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    let idx = find_top_level(expr, op)?;
    Some((&expr[..idx], &expr[idx + op.len()..]))
}

/// Split on every top-level `+` outside quotes (string concatenation).
pub fn split_concatenation(expr: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for ch in expr.chars() {
        if ch == '"' {
            in_string = !in_string;
            current.push(ch);
        } else if ch == '+' && !in_string {
            if !current.trim().is_empty() {
                parts.push(current.trim().to_string());
            }
            current.clear();
        } else {
            current.push(ch);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// Pure numeric literal: optional single leading `-`, at most one `.`,
/// at least one digit, nothing else.
pub fn is_numeric_literal(expr: &str) -> bool {
    let body = expr.strip_prefix('-').unwrap_or(expr);
    !body.is_empty()
        && body.chars().any(|c| c.is_ascii_digit())
        && body.chars().all(|c| c.is_ascii_digit() || c == '.')
        && body.chars().filter(|&c| c == '.').count() <= 1
}

/// Word characters: what the dialect allows in identifiers.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Leading identifier of an expression, if it starts with one.
pub fn leading_ident(expr: &str) -> Option<&str> {
    let end = expr
        .char_indices()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, _)| i)
        .unwrap_or(expr.len());
    if end == 0 {
        None
    } else {
        Some(&expr[..end])
    }
}

/// Chained bracket access: two or more `[...]` groups where the first
/// bracket precedes any parenthesis.
pub fn is_chain_access(expr: &str) -> bool {
    if expr.matches('[').count() <= 1 {
        return false;
    }
    match (expr.find('('), expr.find('[')) {
        (Some(paren), Some(bracket)) => bracket < paren,
        _ => true,
    }
}

/// Raw text of each `[...]` group, in order. Nested brackets are not
/// balanced: each group runs to the next `]`.
pub fn bracket_groups(expr: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut rest = expr;
    while let Some(open) = rest.find('[') {
        let tail = &rest[open + 1..];
        match tail.find(']') {
            Some(close) => {
                if close > 0 {
                    groups.push(tail[..close].to_string());
                }
                rest = &tail[close + 1..];
            }
            None => break,
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_top_level_arguments_only() {
        assert_eq!(
            split_arguments(r#"a, "b,c", g(d,e)"#),
            vec!["a", r#""b,c""#, "g(d,e)"]
        );
    }

    #[test]
    fn splits_ignore_bracket_commas() {
        assert_eq!(split_arguments("t[i,j], x"), vec!["t[i,j]", "x"]);
    }

    #[test]
    fn empty_argument_string() {
        assert_eq!(split_arguments("   "), Vec::<String>::new());
    }

    #[test]
    fn find_skips_quoted_operators() {
        assert_eq!(find_top_level(r#""a=b" = c"#, "="), Some(6));
        assert_eq!(find_top_level(r#""a=b""#, "="), None);
    }

    #[test]
    fn single_split_is_right_heavy() {
        let (l, r) = split_top_level_once("a - b - c", "-").unwrap();
        assert_eq!(l.trim(), "a");
        assert_eq!(r.trim(), "b - c");
    }

    #[test]
    fn concatenation_respects_quotes() {
        assert_eq!(
            split_concatenation(r#""Bonjour " + nom + " !""#),
            vec![r#""Bonjour ""#, "nom", r#"" !""#]
        );
        assert_eq!(split_concatenation(r#""a+b""#), vec![r#""a+b""#]);
    }

    #[test]
    fn numeric_literal_shapes() {
        assert!(is_numeric_literal("42"));
        assert!(is_numeric_literal("-3.25"));
        assert!(!is_numeric_literal("1-2"));
        assert!(!is_numeric_literal("1.2.3"));
        assert!(!is_numeric_literal("."));
        assert!(!is_numeric_literal("abc"));
    }

    #[test]
    fn chain_access_detection() {
        assert!(is_chain_access(r#"gProduit[i]["IDProduit"]"#));
        assert!(!is_chain_access("tab[i]"));
        assert!(!is_chain_access("f(x)[0][1]"));
    }

    #[test]
    fn bracket_groups_in_order() {
        assert_eq!(
            bracket_groups(r#"g[i]["ID"]"#),
            vec!["i".to_string(), "\"ID\"".to_string()]
        );
    }
}
