//! Text Utilities

/// Marker appended to truncated text.
pub const ELLIPSIS: &str = "...";

/// Truncate `text` to at most `max_chars` characters, appending an ellipsis
/// marker when anything was cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Remove a surrounding Markdown code fence (```json ... ```), if present.
///
/// A lone opening fence with nothing after its info string yields `""`.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let (body, closed) = match rest.strip_suffix("```") {
        Some(body) => (body, true),
        None => (rest, false),
    };
    // Drop the info string (e.g. `json`) on the opening line
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None if closed => body.trim(),
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdefghijk", 10), "abcdefghij...");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("日本語テキスト", 3), "日本語...");
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```inline```"), "inline");
        assert_eq!(strip_code_fences("```\nunterminated body"), "unterminated body");
    }

    #[test]
    fn test_bare_fence_is_empty() {
        assert_eq!(strip_code_fences("```"), "");
        assert_eq!(strip_code_fences("```x"), "");
        assert_eq!(strip_code_fences("  ```markdown \n"), "");
        assert_eq!(strip_code_fences("``````"), "");
    }
}
