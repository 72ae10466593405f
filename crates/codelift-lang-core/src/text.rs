//! Case-insensitive text matching over Unicode uppercase.
//!
//! The 4GL dialect's keywords carry accents (`PROCÉDURE`, `_À_`, `SI … ALORS`)
//! and legacy sources mix cases freely, so ASCII-only folding is not enough.
//! These helpers fold through `char::to_uppercase`, which maps `é` → `É`.
//! Multi-char expansions (e.g. `ß` → `SS`) are handled by comparing the
//! expanded streams character by character.

/// Uppercase an entire string through Unicode folding.
pub fn to_upper(s: &str) -> String {
    s.chars().flat_map(char::to_uppercase).collect()
}

/// Case-insensitive prefix test.
pub fn starts_with_ci(haystack: &str, prefix: &str) -> bool {
    let mut h = haystack.chars().flat_map(char::to_uppercase);
    let mut p = prefix.chars().flat_map(char::to_uppercase);
    loop {
        match (h.next(), p.next()) {
            (_, None) => return true,
            (None, Some(_)) => return false,
            (Some(a), Some(b)) if a == b => continue,
            _ => return false,
        }
    }
}

/// Case-insensitive substring test.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    to_upper(haystack).contains(&to_upper(needle))
}

/// Case-insensitive whole-string equality.
pub fn eq_ci(a: &str, b: &str) -> bool {
    to_upper(a) == to_upper(b)
}

/// Byte index of the first case-insensitive occurrence of `needle` in
/// `haystack`, in terms of the *original* haystack.
///
/// Scans every char boundary and prefix-tests from there, so the returned
/// index is always valid for slicing `haystack` even when folding changes
/// byte lengths.
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| starts_with_ci(&haystack[i..], needle))
}

/// Strip a case-insensitive prefix, returning the remainder.
///
/// The prefix is measured in characters of the original haystack: one
/// haystack character is consumed per fully matched uppercase expansion.
pub fn strip_prefix_ci<'a>(haystack: &'a str, prefix: &str) -> Option<&'a str> {
    let mut p = prefix.chars().flat_map(char::to_uppercase).peekable();
    for (idx, ch) in haystack.char_indices() {
        if p.peek().is_none() {
            return Some(&haystack[idx..]);
        }
        for up in ch.to_uppercase() {
            match p.next() {
                Some(expected) if expected == up => continue,
                _ => return None,
            }
        }
    }
    if p.peek().is_none() {
        Some("")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matches_across_case() {
        assert!(starts_with_ci("procédure Calcul()", "PROCÉDURE"));
        assert!(starts_with_ci("PROCEDURE x()", "procedure"));
        assert!(!starts_with_ci("PROC", "PROCEDURE"));
    }

    #[test]
    fn contains_folds_accents() {
        assert!(contains_ci("POUR i = 1 _à_ 10", "_À_"));
        assert!(contains_ci("si x alors", "ALORS"));
        assert!(!contains_ci("rien ici", "ALORS"));
    }

    #[test]
    fn eq_ignores_case() {
        assert!(eq_ci("Sortir", "SORTIR"));
        assert!(eq_ci("fin", "FIN"));
        assert!(!eq_ci("FIN", "SINON"));
    }

    #[test]
    fn find_returns_original_byte_index() {
        let s = "x = Dialogue(msg)";
        assert_eq!(find_ci(s, "dialogue("), Some(4));
        // Accented haystack before the needle: index still slices cleanly.
        let s = "été Dialogue(a)";
        let i = find_ci(s, "DIALOGUE").unwrap();
        assert!(s[i..].starts_with("Dialogue"));
    }

    #[test]
    fn strip_prefix_returns_remainder() {
        assert_eq!(strip_prefix_ci("RENVOYER x + 1", "renvoyer"), Some(" x + 1"));
        assert_eq!(strip_prefix_ci("SI cond ALORS", "si"), Some(" cond ALORS"));
        assert_eq!(strip_prefix_ci("SI", "si"), Some(""));
        assert_eq!(strip_prefix_ci("S", "si"), None);
    }

}
