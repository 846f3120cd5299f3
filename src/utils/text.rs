//! Text normalization shared by the reranker and the archive writer

/// Lowercase `text` and strip ASCII punctuation.
///
/// Whitespace is left untouched; tokenization belongs to the vectorizer.
///
/// # Examples
/// ```
/// use abstractfeed_core::utils::text::preprocess;
///
/// assert_eq!(preprocess("Hello, World!"), "hello world");
/// assert_eq!(preprocess("CO₂-driven"), "co₂driven");
/// ```
pub fn preprocess(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect()
}

/// True when nothing but whitespace remains
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Truncate at a character boundary, appending an ellipsis when cut.
pub fn truncate_at_char_boundary(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_strips_all_ascii_punctuation() {
        let punctuation = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;
        assert_eq!(preprocess(punctuation), "");
        assert_eq!(preprocess("It's a (well-known) fact."), "its a wellknown fact");
    }

    #[test]
    fn test_preprocess_keeps_whitespace() {
        assert_eq!(preprocess("A\tB\nC  D"), "a\tb\nc  d");
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let once = preprocess("Quantum Dots; 3D-printed!");
        assert_eq!(preprocess(&once), once);
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("  \n\t"));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate_at_char_boundary("hello world", 5), "hello...");
        assert_eq!(truncate_at_char_boundary("hello", 10), "hello");
        assert_eq!(truncate_at_char_boundary("héllo", 2), "hé...");
    }
}
