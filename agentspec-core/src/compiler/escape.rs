//! String literals for the generated program.
//!
//! Every piece of user-supplied text (prompts, names, templates) enters the
//! generated source through [`string_literal`] or, inside `//` comments,
//! [`comment_text`]. A string literal is double-quoted and valid both as
//! JavaScript/TypeScript and as JSON.

use std::fmt::Write;

/// Quote and escape `s` as a double-quoted string literal.
pub fn string_literal(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            // Line and paragraph separators terminate lines in older JS engines
            '\u{2028}' => result.push_str("\\u2028"),
            '\u{2029}' => result.push_str("\\u2029"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(result, "\\u{:04x}", c as u32);
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Make `s` safe to place after `//` on a single line.
///
/// Every JavaScript line terminator (LF, CR, U+2028, U+2029) and any other
/// control character becomes a space.
pub fn comment_text(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2028}' | '\u{2029}' => ' ',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect()
}

/// Render a `{{name}}` template against a lookup.
///
/// Placeholders without a value are left untouched.
pub fn render_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(s: &str) -> String {
        serde_json::from_str::<String>(&string_literal(s)).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(string_literal("hello"), "\"hello\"");
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(string_literal("a\"b"), r#""a\"b""#);
        assert_eq!(string_literal("a\\b"), r#""a\\b""#);
        assert_eq!(string_literal("line\nbreak"), r#""line\nbreak""#);
        assert_eq!(string_literal("`${x}`"), "\"`${x}`\"");
        assert_eq!(string_literal("\u{0}"), r#""\u0000""#);
    }

    #[test]
    fn test_round_trip_preserves_text() {
        let samples = [
            "",
            "You are a helpful assistant.",
            "  leading and trailing whitespace  \n",
            "quotes \" and 'single' and `back`",
            "backslash \\ and \\n literal",
            "tabs\tand\r\ncarriage returns",
            "unicode: héllo 日本語 🚀",
            "separators \u{2028} \u{2029}",
            "control \u{1} \u{1f} \u{7f}",
            "</script><!-- -->",
        ];
        for sample in samples {
            assert_eq!(round_trip(sample), sample);
        }
    }

    #[test]
    fn test_literal_is_single_line() {
        let literal = string_literal("one\ntwo\u{2028}three");
        assert!(!literal.contains('\n'));
        assert!(!literal.contains('\u{2028}'));
    }

    #[test]
    fn test_comment_text_stays_on_one_line() {
        let text = comment_text("demo\u{2028}throw\u{2029}x\r\ny\u{85}z");
        assert_eq!(text, "demo throw x  y z");
        assert_eq!(comment_text("plain name"), "plain name");
    }

    #[test]
    fn test_render_template() {
        let rendered = render_template("Prompt: {{ currentPrompt }} / {{other}}", |key| {
            (key == "currentPrompt").then(|| "be brief".to_string())
        });
        assert_eq!(rendered, "Prompt: be brief / {{other}}");
    }

    #[test]
    fn test_render_template_unterminated() {
        let rendered = render_template("a {{b", |_| Some("x".into()));
        assert_eq!(rendered, "a {{b");
    }

    #[test]
    fn test_render_template_does_not_rescan_values() {
        let rendered = render_template("{{a}}", |_| Some("{{a}}".into()));
        assert_eq!(rendered, "{{a}}");
    }
}
