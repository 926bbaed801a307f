use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;

use super::text::uniq;

static LD_JSON_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("JSON-LD selector is valid")
});

/// Address sub-fields, in the order they are joined
const ADDRESS_FIELDS: &[&str] = &[
    "streetAddress",
    "addressLocality",
    "addressRegion",
    "postalCode",
    "addressCountry",
];

/// Contact fields published as JSON-LD metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredData {
    pub telephones: Vec<String>,
    pub emails: Vec<String>,
    pub addresses: Vec<String>,
    pub social_links: Vec<String>,
}

impl StructuredData {
    /// Scan every JSON-LD block of the document. Blocks that are not valid
    /// JSON are skipped.
    pub fn from_document(document: &Html) -> Self {
        let mut data = Self::default();

        for script in document.select(&LD_JSON_SELECTOR) {
            let payload: String = script.text().collect();

            match Self::from_json(payload.trim()) {
                Ok(block) => data.absorb(block),
                Err(e) => debug!("Skipping malformed JSON-LD block: {}", e),
            }
        }

        data.dedup()
    }

    /// Parse one JSON-LD payload
    pub fn from_json(payload: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(payload)?;
        let mut data = Self::default();
        data.collect_blocks(&value);
        Ok(data.dedup())
    }

    fn absorb(&mut self, block: Self) {
        self.telephones.extend(block.telephones);
        self.emails.extend(block.emails);
        self.addresses.extend(block.addresses);
        self.social_links.extend(block.social_links);
    }

    /// A block is either one object or a list of objects
    fn collect_blocks(&mut self, value: &Value) {
        match value {
            Value::Object(object) => self.collect_object(object),
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(object) = item {
                        self.collect_object(object);
                    }
                }
            }
            _ => {}
        }
    }

    fn collect_object(&mut self, object: &Map<String, Value>) {
        self.telephones.extend(strings(object.get("telephone")));
        self.emails.extend(strings(object.get("email")));
        self.social_links.extend(strings(object.get("sameAs")));

        match object.get("address") {
            Some(Value::Object(address)) => self.push_address(address),
            Some(Value::Array(addresses)) => {
                for address in addresses {
                    if let Value::Object(address) = address {
                        self.push_address(address);
                    }
                }
            }
            _ => {}
        }

        if let Some(Value::Array(graph)) = object.get("@graph") {
            for node in graph {
                if let Value::Object(node) = node {
                    self.collect_object(node);
                }
            }
        }
    }

    fn push_address(&mut self, address: &Map<String, Value>) {
        let line = address_line(address);
        if !line.is_empty() {
            self.addresses.push(line);
        }
    }

    fn dedup(self) -> Self {
        Self {
            telephones: uniq(self.telephones),
            emails: uniq(self.emails),
            addresses: uniq(self.addresses),
            social_links: uniq(self.social_links),
        }
    }
}

/// Join the non-empty address sub-fields with single spaces
fn address_line(address: &Map<String, Value>) -> String {
    let parts = ADDRESS_FIELDS.iter().filter_map(|field| match address.get(*field) {
        Some(Value::String(part)) => Some(part.trim().to_string()),
        // addressCountry is sometimes a Country object
        Some(Value::Object(country)) => country
            .get("name")
            .and_then(Value::as_str)
            .map(|name| name.trim().to_string()),
        _ => None,
    });

    uniq(parts).join(" ")
}

/// A string, or the strings of a list; anything else yields nothing
fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(single)) => vec![single.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(|item| item.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}
