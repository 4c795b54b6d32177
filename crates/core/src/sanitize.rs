/// Normalize free-form text into a single safe path segment.
///
/// Every char outside `[A-Za-z0-9_-]` becomes `_`, then leading and
/// trailing underscores are trimmed. The result may be empty.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if is_segment_char(c) { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Like `sanitize`, but substitutes `fallback` when nothing survives.
pub fn sanitize_or(text: &str, fallback: &str) -> String {
    Some(sanitize(text))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_disallowed_chars() {
        assert_eq!(sanitize("Beach Trip!"), "Beach_Trip");
        assert_eq!(sanitize("a/b\\c:d"), "a_b_c_d");
        assert_eq!(sanitize("jazz-fusion"), "jazz-fusion");
    }

    #[test]
    fn trims_edge_underscores() {
        assert_eq!(sanitize("  spaced  "), "spaced");
        assert_eq!(sanitize("__x__"), "x");
        assert_eq!(sanitize("..hidden"), "hidden");
    }

    #[test]
    fn non_ascii_becomes_underscore() {
        assert_eq!(sanitize("café au lait"), "caf__au_lait");
        assert_eq!(sanitize("日本"), "");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "",
            "plain",
            "Beach Trip!",
            "__x__",
            " - ",
            "café au lait",
            "../../etc/passwd",
            "a__b",
            "_-_",
        ];

        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {:?}", input);
        }
    }

    #[test]
    fn fallback_when_empty() {
        assert_eq!(sanitize_or("???", "Uncategorized"), "Uncategorized");
        assert_eq!(sanitize_or("Trip", "Uncategorized"), "Trip");
    }
}
