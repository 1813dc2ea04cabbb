//! Small text helpers shared by the collector and the normalizer.

/// Spellings older exports used for "no value".
const PLACEHOLDERS: &[&str] = &["n/a", "nan", "none", "null"];

/// True for empty/whitespace values and legacy placeholders like `N/A`.
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p))
}

/// Collapse every whitespace run into a single space and trim the ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive whole-word containment.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    contains_word_exact(&haystack.to_lowercase(), &needle.to_lowercase())
}

/// Case-sensitive whole-word containment: the match must not touch an
/// alphanumeric character on either side.
pub fn contains_word_exact(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        // advance past the first char of this hit
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}
