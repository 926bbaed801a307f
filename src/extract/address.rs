use std::sync::LazyLock;

use regex::Regex;

use super::text::merge;
use super::{Extraction, ParsedPage};

// A street-type prefix, or a highway code such as BR-116, followed by up to
// 120 characters before the next comma or line break
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:(?:Rua|Avenida|Av\.|Travessa|Praça|Rodovia|Estrada|Alameda|Largo)\s+|(?:BR|SP|RJ)-\s*)[^\n,]{3,120}",
    )
    .expect("address pattern is valid")
});

/// Brazilian street addresses from the visible text, then JSON-LD addresses
pub fn extract(page: &ParsedPage) -> Extraction {
    let found = ADDRESS_PATTERN
        .find_iter(&page.text)
        .map(|m| m.as_str().trim().to_string())
        .collect();

    Extraction::complete(merge(found, &page.structured.addresses))
}
