//! Post-processing: deterministic cleanup of generated summary text.
//!
//! Reasoning models (deepseek-r1 and friends) emit their chain of thought
//! between `<think>` and `</think>` before the answer, and chat-tuned models
//! like to open with "Sure! Here's a structured summary:" and close with a
//! sentence announcing that the summary is over. None of that belongs in the
//! document summary.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the blank-line rule sees only `\n`.
//! Reasoning spans go before boilerplate because the boilerplate often sits
//! right after `</think>`. Blank lines are collapsed last, since every earlier
//! rule can leave gaps.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to concatenated chunk summaries.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Remove `<think>…</think>` spans, across lines
/// 3. Remove stock assistant preambles
/// 4. Remove stock closing statements
/// 5. Collapse any run of blank lines to a single blank line
/// 6. Trim
pub fn clean_summary(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_reasoning(&s);
    let s = strip_preambles(&s);
    let s = strip_closings(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Reasoning spans ──────────────────────────────────────────────────

static RE_THINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").unwrap());

fn strip_reasoning(input: &str) -> String {
    RE_THINK.replace_all(input, "").to_string()
}

// ── Rule 3: Preambles ────────────────────────────────────────────────────────

const PREAMBLES: &[&str] = &[
    "Certainly! Here is a structured summary of the key points covered in the provided content:",
    "Sure! Here's a structured summary:",
    "Below is a structured overview of the document:",
    "Here's an organized summary:",
    "Here's a concise breakdown:",
    "Here's what I found:",
    "Based on the provided content, here is a summary:",
    "Let's break this down into key sections:",
    "Here’s an overview of the document's key points:",
    "This is a high-level overview of the provided content:",
];

static RE_PREAMBLE: Lazy<Regex> = Lazy::new(|| {
    let alternation = PREAMBLES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{alternation})")).unwrap()
});

fn strip_preambles(input: &str) -> String {
    RE_PREAMBLE.replace_all(input, "").to_string()
}

// ── Rule 4: Closing statements ───────────────────────────────────────────────

static RE_CLOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:This summary captures the main points from each relevant section, ",
        r"highlighting key initiatives, challenges, and goals for [^\n]*?\.",
        r"|This structured summary provides an overview of the key topics covered in the document\.",
        r"|This concludes the summary of the key insights presented in the content\.",
        r"|The above summary provides an outline of the document's primary sections and themes\.)",
    ))
    .unwrap()
});

fn strip_closings(input: &str) -> String {
    RE_CLOSING.replace_all(input, "").to_string()
}

// ── Rule 5: Collapse blank lines ─────────────────────────────────────────────

static RE_BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_RUN.replace_all(input, "\n\n").to_string()
}
