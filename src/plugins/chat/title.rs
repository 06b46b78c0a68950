fn truncate_chars(source: &str, max_chars: usize) -> String {
    if source.chars().count() <= max_chars {
        return source.to_string();
    }
    source.chars().take(max_chars).collect::<String>() + "…"
}

/// Session title from the first line of the first user message.
pub fn derive_title(source: &str, max_chars: usize) -> String {
    let first_line = source.trim().lines().next().unwrap_or("").trim();
    truncate_chars(first_line, max_chars)
}

/// Single-line preview of the whole first user message.
pub fn derive_preview(source: &str, max_chars: usize) -> String {
    let collapsed = source.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_title_is_kept() {
        assert_eq!(derive_title("  Helmet fine?  ", 50), "Helmet fine?");
    }

    #[test]
    fn test_long_title_is_truncated_with_ellipsis() {
        let text = "What is the penalty for driving without a licence in Maharashtra?";
        let title = derive_title(text, 50);
        assert!(title.ends_with('…'));
        assert_eq!(title.chars().count() - 1, 50);
        assert!(text.starts_with(title.trim_end_matches('…')));
    }

    #[test]
    fn test_exactly_max_is_not_truncated() {
        let text = "a".repeat(50);
        assert_eq!(derive_title(&text, 50), text);
    }

    #[test]
    fn test_title_uses_first_line_and_preview_collapses() {
        let text = "Stopped by police\nthey asked for my RC and PUC";
        assert_eq!(derive_title(text, 50), "Stopped by police");
        assert_eq!(
            derive_preview(text, 50),
            "Stopped by police they asked for my RC and PUC"
        );
    }

    #[test]
    fn test_multibyte_truncation() {
        assert_eq!(derive_title("₹₹₹₹", 2), "₹₹…");
    }
}
