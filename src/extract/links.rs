use url::Url;

use super::text::{merge, uniq};
use super::ParsedPage;

/// Social and messaging platforms, matched against the link host
pub const SOCIAL_DOMAINS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "wa.me",
    "whatsapp.com",
];

/// Where an anchor href ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Social,
    Outbound,
    Ignored,
}

/// Both link categories come out of one pass over the anchors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkScan {
    pub outbound: Vec<String>,
    pub social: Vec<String>,
}

/// Classify an href. Only absolute http(s) links count; a social link is
/// never outbound.
pub fn classify(href: &str) -> LinkKind {
    let lower = href.to_lowercase();
    if !lower.starts_with("http") {
        return LinkKind::Ignored;
    }

    if is_social(&lower) {
        LinkKind::Social
    } else {
        LinkKind::Outbound
    }
}

fn is_social(lower: &str) -> bool {
    match Url::parse(lower) {
        Ok(url) => url.host_str().is_some_and(|host| {
            SOCIAL_DOMAINS.iter().any(|domain| {
                host == *domain
                    || host
                        .strip_suffix(domain)
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
        }),
        Err(_) => SOCIAL_DOMAINS.iter().any(|domain| lower.contains(domain)),
    }
}

pub fn extract(page: &ParsedPage) -> LinkScan {
    let mut outbound = Vec::new();
    let mut social = Vec::new();

    for href in &page.hrefs {
        match classify(href) {
            LinkKind::Social => social.push(href.clone()),
            LinkKind::Outbound => outbound.push(href.clone()),
            LinkKind::Ignored => {}
        }
    }

    LinkScan {
        outbound: uniq(outbound),
        social: merge(social, &page.structured.social_links),
    }
}
