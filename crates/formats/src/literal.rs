//! Literal rendering for the renderer's script syntax.
//!
//! Numbers use Rust's shortest round-trip decimal form, which is also a
//! valid script number literal, so decoding recovers the exact bits.
//! Strings are single-quoted; every character that could end the literal,
//! end the statement, or break inline embedding is escaped.

use std::fmt::Write as _;

/// Formats `value` as a locale-independent script number literal.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{value}")
    }
}

/// Escapes `text` for use between single quotes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `</script>` and `<!--` must not appear verbatim if a script is
            // ever inlined into the page.
            '<' => out.push_str("\\u003c"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Wraps `text` in an escaped single-quoted literal.
pub fn quote(text: &str) -> String {
    format!("'{}'", escape(text))
}

#[cfg(test)]
mod tests {
    use super::{escape, format_number, quote};

    #[test]
    fn numbers_are_plain_decimals() {
        assert_eq!(format_number(20.0), "20");
        assert_eq!(format_number(22.904888), "22.904888");
        assert_eq!(format_number(-0.5), "-0.5");
        assert_eq!(format_number(1e-7), "0.0000001");
    }

    #[test]
    fn non_finite_numbers_use_script_names() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn escapes_quote_and_backslash() {
        assert_eq!(quote("O'Brien"), r"'O\'Brien'");
        assert_eq!(escape(r"a\b"), r"a\\b");
        assert_eq!(escape("say \"hi\""), r#"say \"hi\""#);
    }

    #[test]
    fn escapes_line_terminators_and_controls() {
        assert_eq!(escape("a\nb\rc"), r"a\nb\rc");
        assert_eq!(escape("\u{2028}\u{2029}"), r"\u2028\u2029");
        assert_eq!(escape("\u{0}\u{1b}"), r"\u0000\u001b");
        assert_eq!(escape("</script>"), r"\u003c/script>");
    }

    #[test]
    fn leaves_ordinary_text_alone() {
        assert_eq!(escape("Café WP3 ü"), "Café WP3 ü");
    }
}
