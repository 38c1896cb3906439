//! Text refinement for native and OCR'd page text.
//!
//! Applied in order:
//!
//! 1. collapse every whitespace run (newlines included) to one space
//! 2. drop standalone numbers of three or more digits (page numbers, stray figures)
//! 3. drop characters outside letters, digits, whitespace and `, . - ' " ( ) [ ] %`
//! 4. collapse and trim again, since steps 2 and 3 leave gaps behind

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static LONG_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3,}\b").unwrap());

static NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^a-zA-Z0-9\s,.\-'"()\[\]%]"#).unwrap());

/// Collapse whitespace runs to single spaces and trim, nothing else.
///
/// The index page goes through this instead of [`refine_text`]: section page
/// numbers can have three digits and titles keep their punctuation.
pub fn collapse_whitespace(raw: &str) -> String {
    WHITESPACE.replace_all(raw, " ").trim().to_string()
}

/// Normalise raw page text.
pub fn refine_text(raw: &str) -> String {
    let text = WHITESPACE.replace_all(raw, " ");
    let text = LONG_NUMBER.replace_all(text.trim(), "");
    let text = NOISE.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}
