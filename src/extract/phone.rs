use std::sync::LazyLock;

use regex::Regex;

use super::text::{decode_link, digits_only, merge, strip_scheme, uniq};
use super::{Extraction, ParsedPage};

/// Marker recorded when the page links to a WhatsApp chat
pub const WHATSAPP: &str = "WhatsApp";

/// Area code plus a landline or mobile number
const MIN_PHONE_DIGITS: usize = 10;

// (DD) NNNNN-NNNN and its looser spellings
static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(?[0-9]{2}\)?\s?[0-9]{4,5}[-\s]?[0-9]{4}").expect("phone pattern is valid")
});

/// Whether a candidate survives the shape filter
pub fn is_plausible(candidate: &str) -> bool {
    candidate == WHATSAPP || digits_only(candidate).len() >= MIN_PHONE_DIGITS
}

pub fn is_whatsapp_link(href: &str) -> bool {
    let lower = href.to_lowercase();
    lower.contains("wa.me/") || lower.contains("whatsapp.com/send")
}

/// Phones from `tel:` anchors, WhatsApp links and the visible text,
/// shape-filtered, then JSON-LD telephones
pub fn extract(page: &ParsedPage) -> Extraction {
    let mut candidates = Vec::new();
    let mut fault = None;

    for href in &page.hrefs {
        if let Some(number) = strip_scheme(href, "tel:") {
            match decode_link("tel", href, number) {
                Ok(number) => candidates.push(number.trim().to_string()),
                Err(e) => {
                    fault.get_or_insert(e);
                }
            }
        }
        if is_whatsapp_link(href) {
            candidates.push(WHATSAPP.to_string());
        }
    }

    candidates.extend(PHONE_PATTERN.find_iter(&page.text).map(|m| m.as_str().to_string()));

    Extraction::new(merge(plausible(candidates), &page.structured.telephones), fault)
}

fn plausible(candidates: Vec<String>) -> Vec<String> {
    uniq(candidates.into_iter().filter(|candidate| is_plausible(candidate)))
}
