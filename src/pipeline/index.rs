//! Table-of-contents parsing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// `<ordinal>. <title> <page>`; the title is the shortest run before the
/// trailing page number.
static SECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\.\s*(.+?)\s+(\d+)").unwrap());

/// Map page number → section title for every entry found in `text`.
///
/// Entries sharing a page number resolve to the last one in scan order.
/// Text with no entries gives an empty map.
pub fn parse_index_sections(text: &str) -> BTreeMap<usize, String> {
    let mut sections = BTreeMap::new();
    for caps in SECTION.captures_iter(text) {
        // Page numbers too large for usize cannot name a page.
        let Ok(page) = caps[3].parse::<usize>() else {
            continue;
        };
        sections.insert(page, caps[2].trim().to_string());
    }
    sections
}
