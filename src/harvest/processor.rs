use tracing::{debug, warn};
use url::Url;

use super::context::RunContext;
use super::flags::{Category, ExtractionFlags};
use super::result::PageResult;
use crate::extract::{address, email, links, phone, Extraction, ParsedPage};
use crate::net::PageFetcher;
use crate::utils::{FetchStats, RequestTimer};

/// How processing of one site ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteOutcome {
    Done(PageResult),
    /// Cancellation was observed; nothing from this site is kept
    Cancelled,
}

/// Host (and port) of a site, for progress display
pub fn site_domain(site: &str) -> String {
    match Url::parse(site) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => site.to_string(),
        },
        Err(_) => site.to_string(),
    }
}

/// Fetch, parse and extract one site, one progress step per stage
pub struct PageProcessor<'a> {
    fetcher: &'a dyn PageFetcher,
    flags: ExtractionFlags,
}

impl<'a> PageProcessor<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, flags: ExtractionFlags) -> Self {
        Self { fetcher, flags }
    }

    pub async fn process(&self, site: &str, ctx: &mut RunContext, stats: &mut FetchStats) -> SiteOutcome {
        let domain = site_domain(site);

        let timer = RequestTimer::start();
        let fetched = self.fetcher.fetch(site).await;
        match &fetched {
            Ok(page) => {
                stats.record_request(site, true, timer.end(), Some(page.status), page.body.len())
            }
            Err(e) => stats.record_request(site, false, timer.end(), e.status(), 0),
        }

        ctx.advance(&domain);
        if ctx.is_cancelled() {
            return SiteOutcome::Cancelled;
        }

        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                warn!("Skipping {}: {}", site, e);
                return SiteOutcome::Done(PageResult::empty(site));
            }
        };

        let parsed = ParsedPage::parse(&page.body);
        ctx.advance(&domain);
        if ctx.is_cancelled() {
            return SiteOutcome::Cancelled;
        }

        self.extract(site, &domain, &parsed, ctx)
    }

    /// Run the enabled categories in order: email, phone, address, links
    fn extract(&self, site: &str, domain: &str, page: &ParsedPage, ctx: &mut RunContext) -> SiteOutcome {
        let mut result = PageResult::empty(site);

        if self.flags.email {
            let found = checked(site, Category::Email, email::extract(page));
            ctx.advance(domain);
            if ctx.is_cancelled() {
                return SiteOutcome::Cancelled;
            }
            result.emails = found;
        }

        if self.flags.phone {
            let found = checked(site, Category::Phone, phone::extract(page));
            ctx.advance(domain);
            if ctx.is_cancelled() {
                return SiteOutcome::Cancelled;
            }
            result.phones = found;
        }

        if self.flags.address {
            let found = checked(site, Category::Address, address::extract(page));
            ctx.advance(domain);
            if ctx.is_cancelled() {
                return SiteOutcome::Cancelled;
            }
            result.addresses = found;
        }

        if self.flags.scans_links() {
            let scan = links::extract(page);
            ctx.advance(domain);
            if ctx.is_cancelled() {
                return SiteOutcome::Cancelled;
            }
            if self.flags.outbound_links {
                result.outbound_links = scan.outbound;
            }
            if self.flags.social_links {
                result.social_links = scan.social;
            }
        }

        debug!(
            "{}: {} emails, {} phones, {} addresses, {} outbound, {} social",
            site,
            result.emails.len(),
            result.phones.len(),
            result.addresses.len(),
            result.outbound_links.len(),
            result.social_links.len()
        );

        SiteOutcome::Done(result)
    }
}

/// Log a skipped link and keep the values
fn checked(site: &str, category: Category, extraction: Extraction) -> Vec<String> {
    if let Some(fault) = &extraction.fault {
        warn!("{} extraction on {} skipped a link: {}", category, site, fault);
    }
    extraction.values
}
