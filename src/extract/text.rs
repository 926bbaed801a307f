use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::structured::StructuredData;
use super::ExtractionFault;

/// Elements whose text never reaches the reader
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// A fetched page reduced to what the extractors look at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    /// Visible text, one space between text nodes
    pub text: String,

    /// Non-empty anchor hrefs in document order
    pub hrefs: Vec<String>,

    /// Findings from embedded JSON-LD blocks
    pub structured: StructuredData,
}

impl ParsedPage {
    /// Parse raw markup. The DOM is dropped before returning.
    pub fn parse(html: &str) -> Self {
        let document = Html::parse_document(html);

        Self {
            text: visible_text(&document),
            hrefs: anchor_hrefs(&document),
            structured: StructuredData::from_document(&document),
        }
    }
}

/// Collect the document's visible text, trimming every text node and
/// joining the non-empty ones with a single space
pub fn visible_text(document: &Html) -> String {
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    text
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(node_text) = child.value().as_text() {
            let trimmed = node_text.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(trimmed);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !HIDDEN_ELEMENTS.contains(&child_element.value().name()) {
                collect_text(child_element, out);
            }
        }
    }
}

/// All anchor hrefs, trimmed. Anchors without a usable href are skipped.
pub fn anchor_hrefs(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Drop empty strings and repeats, keeping first-seen order
pub fn uniq<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for item in items {
        let item = item.into();
        if item.is_empty() || seen.contains(&item) {
            continue;
        }
        seen.insert(item.clone());
        unique.push(item);
    }

    unique
}

/// `uniq` over `found` followed by `extra`
pub fn merge(found: Vec<String>, extra: &[String]) -> Vec<String> {
    uniq(found.into_iter().chain(extra.iter().cloned()))
}

/// Keep only ASCII digits
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Return what follows `scheme` when `href` starts with it, ignoring case
pub fn strip_scheme<'a>(href: &'a str, scheme: &str) -> Option<&'a str> {
    let prefix = href.get(..scheme.len())?;
    if prefix.eq_ignore_ascii_case(scheme) {
        Some(&href[scheme.len()..])
    } else {
        None
    }
}

/// Percent-decode the target of a `mailto:`/`tel:` href
pub fn decode_link(scheme: &'static str, href: &str, target: &str) -> Result<String, ExtractionFault> {
    urlencoding::decode(target)
        .map(Cow::into_owned)
        .map_err(|e| ExtractionFault::UndecodableLink {
            scheme,
            href: href.to_string(),
            reason: e.to_string(),
        })
}
