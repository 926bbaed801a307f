use std::sync::LazyLock;

use regex::Regex;

use super::text::{decode_link, merge, strip_scheme};
use super::{Extraction, ParsedPage};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern is valid")
});

/// Emails from the visible text, then `mailto:` anchors, then JSON-LD
pub fn extract(page: &ParsedPage) -> Extraction {
    let mut found: Vec<String> = EMAIL_PATTERN
        .find_iter(&page.text)
        .map(|m| m.as_str().to_string())
        .collect();

    let mut fault = None;
    for href in &page.hrefs {
        let Some(target) = strip_scheme(href, "mailto:") else {
            continue;
        };
        // Drop ?subject=... and friends
        let address = target.split('?').next().unwrap_or_default();

        match decode_link("mailto", href, address) {
            Ok(address) => found.push(address.trim().to_string()),
            Err(e) => {
                fault.get_or_insert(e);
            }
        }
    }

    Extraction::new(merge(found, &page.structured.emails), fault)
}
