//! Splits one utterance into independent sub-commands.
//!
//! `"kitchen on, then fan off and lamp 40%"` → `["kitchen on", "fan off", "lamp 40%"]`.
//! Entity names that contain the word "and" get split too; there is no
//! escaping.

use regex::Regex;
use std::sync::LazyLock;

static THEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+then\s+").expect("valid regex"));
static COMMA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid regex"));
static AND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+and\s+").expect("valid regex"));

/// Split on "then", commas and "and", preserving order.
pub fn split_commands(input: &str) -> Vec<String> {
    let text = input.trim();
    let text = THEN_RE.replace_all(text, " and ");
    let text = COMMA_RE.replace_all(&text, " and ");

    let parts: Vec<String> = AND_RE
        .split(&text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if parts.is_empty() {
        vec![input.trim().to_string()]
    } else {
        parts
    }
}
