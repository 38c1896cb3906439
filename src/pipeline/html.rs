//! Summary markup to HTML.
//!
//! Line by line, after trimming: `### ` opens a level-3 heading, `- ` a
//! one-item list, anything else non-blank a paragraph. Blank lines emit
//! nothing. Consecutive bullets stay separate lists.
//!
//! Text content is escaped (`&`, `<`, `>`), so model output cannot inject
//! markup into the page that embeds the fragment.

/// Render cleaned summary text to concatenated HTML fragments.
pub fn render_html(summary: &str) -> String {
    let mut html = String::with_capacity(summary.len() + summary.len() / 2);
    for line in summary.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }
        if let Some(title) = line.strip_prefix("### ") {
            push_element(&mut html, "<h3>", title, "</h3>");
        } else if let Some(item) = line.strip_prefix("- ") {
            push_element(&mut html, "<ul><li>", item, "</li></ul>");
        } else {
            push_element(&mut html, "<p>", line, "</p>");
        }
    }
    html
}

fn push_element(out: &mut String, open: &str, text: &str, close: &str) {
    out.push_str(open);
    escape_into(out, text);
    out.push_str(close);
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
