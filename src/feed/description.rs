//! Markup-stripped, length-bounded summary text.

use std::sync::OnceLock;

use regex::Regex;

const ELLIPSIS: &str = "...";

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn newline_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n+").unwrap())
}

/// Strips all markup tags, truncates to `max_len` characters (breaking at
/// a word boundary where possible, with an ellipsis marker), and collapses
/// newline runs to a single space. Never fails.
pub fn build_description(value: &str, max_len: usize) -> String {
    let stripped = tag_pattern().replace_all(value, "");
    let truncated = truncate_chars(stripped.trim(), max_len);
    newline_pattern().replace_all(&truncated, " ").into_owned()
}

fn truncate_chars(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let window: String = text.chars().take(max_len).collect();
    // Prefer cutting at the last space so words stay whole.
    let cut = match window.rfind(' ') {
        Some(idx) if idx > 0 => &window[..idx],
        _ => window.as_str(),
    };
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}
