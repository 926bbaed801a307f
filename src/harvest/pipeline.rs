use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::context::{CancelHandle, RunContext, RunEvent};
use super::error::HarvestError;
use super::flags::ExtractionFlags;
use super::processor::{PageProcessor, SiteOutcome};
use super::result::{RunOutcome, RunStatus};
use crate::net::{find_state, PageFetcher, SearchProvider};
use crate::utils::FetchStats;

/// Candidate sites taken from the search collaborator
pub const DEFAULT_MAX_SITES: usize = 10;

/// What the user asked for
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,

    /// Free-text neighbourhood or locality
    pub locality: Option<String>,

    /// Two-letter state code
    pub state: Option<String>,

    /// Municipality, only used together with `state`
    pub city: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Reject the request before anything is sent
    pub fn validate(&self, flags: ExtractionFlags) -> Result<(), HarvestError> {
        if !flags.any() {
            return Err(HarvestError::NoCategory);
        }
        if self.query.trim().is_empty() {
            return Err(HarvestError::NoQuery);
        }
        if let Some(state) = non_blank(&self.state) {
            if find_state(state).is_none() {
                return Err(HarvestError::UnknownState(state.to_string()));
            }
        }
        Ok(())
    }

    /// `"<city> - <UF>"`, `"<UF>"`, or nothing
    pub fn locality_label(&self) -> Option<String> {
        let state = non_blank(&self.state)?;
        let code = find_state(state).map_or_else(|| state.to_uppercase(), |(code, _)| code.to_string());

        match non_blank(&self.city) {
            Some(city) => Some(format!("{} - {}", city, code)),
            None => Some(code),
        }
    }

    /// Query text, locality text and locality label, space separated
    pub fn compose_query(&self) -> String {
        let label = self.locality_label();
        [Some(self.query.trim()), non_blank(&self.locality), label.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A run in flight on the background worker
pub struct RunHandle {
    pub events: UnboundedReceiver<RunEvent>,
    pub cancel: CancelHandle,
    pub task: JoinHandle<RunOutcome>,
}

/// Search, then process every candidate site in order
#[derive(Clone)]
pub struct Pipeline {
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    max_sites: usize,
}

impl Pipeline {
    pub fn new(search: Arc<dyn SearchProvider>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            search,
            fetcher,
            max_sites: DEFAULT_MAX_SITES,
        }
    }

    pub fn with_max_sites(mut self, max_sites: usize) -> Self {
        self.max_sites = max_sites;
        self
    }

    /// Validate, then run on a background task. Progress arrives on the
    /// returned event channel; the task resolves to the outcome.
    pub fn spawn(&self, request: SearchRequest, flags: ExtractionFlags) -> Result<RunHandle, HarvestError> {
        request.validate(flags)?;

        let (tx, events) = mpsc::unbounded_channel();
        let mut ctx = RunContext::new(CancelHandle::new(), tx);
        let cancel = ctx.cancel_handle().clone();
        let pipeline = self.clone();

        let task = tokio::spawn(async move {
            let query = request.compose_query();
            pipeline.run(&query, flags, &mut ctx).await
        });

        Ok(RunHandle { events, cancel, task })
    }

    /// Drive one run to completion or cancellation
    pub async fn run(&self, query: &str, flags: ExtractionFlags, ctx: &mut RunContext) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);

        async move {
            let started_at = Utc::now();
            let mut stats = FetchStats::new();
            let mut results = Vec::new();

            ctx.searching(query);
            info!("Searching for '{}'", query);

            let sites = match self.search.search(query, self.max_sites).await {
                Ok(mut sites) => {
                    sites.truncate(self.max_sites);
                    sites
                }
                Err(e) => {
                    warn!("Search failed, treating as no sites: {:#}", e);
                    Vec::new()
                }
            };

            let status = if ctx.is_cancelled() {
                RunStatus::Cancelled
            } else if sites.is_empty() {
                info!("No sites found");
                RunStatus::NoSitesFound
            } else {
                let total_steps = flags.total_steps(sites.len());
                info!(
                    "Processing {} sites ({} steps, categories: {:?})",
                    sites.len(),
                    total_steps,
                    flags.enabled()
                );
                ctx.begin(sites.len(), total_steps);

                let processor = PageProcessor::new(self.fetcher.as_ref(), flags);
                let mut status = RunStatus::Completed;

                for site in &sites {
                    if ctx.is_cancelled() {
                        status = RunStatus::Cancelled;
                        break;
                    }
                    match processor.process(site, ctx, &mut stats).await {
                        SiteOutcome::Done(result) => results.push(result),
                        SiteOutcome::Cancelled => {
                            status = RunStatus::Cancelled;
                            break;
                        }
                    }
                }
                status
            };

            info!(
                "Run finished: {:?}, {} results, {}/{} requests ok, {} bytes",
                status,
                results.len(),
                stats.successful_requests,
                stats.total_requests,
                stats.bytes_downloaded
            );

            RunOutcome {
                run_id,
                status,
                results,
                progress: ctx.progress().clone(),
                stats,
                started_at,
                finished_at: Utc::now(),
            }
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::result::PageResult;
    use crate::net::fetch::{FetchError, FetchedPage, MockPageFetcher};
    use crate::net::search::MockSearchProvider;
    use crate::net::{http_client, DuckDuckGoSearch, HttpFetcher};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<p>contato@loja.com.br (11) 3333-4444</p><a href="https://instagram.com/loja">ig</a>"#;

    fn sites(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("https://site{}.example/", i)).collect()
    }

    fn searching(found: Vec<String>) -> MockSearchProvider {
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .times(1)
            .returning(move |_, _| Ok(found.clone()));
        search
    }

    fn ok_page(url: &str) -> Result<FetchedPage, FetchError> {
        Ok(FetchedPage {
            url: url.to_string(),
            status: 200,
            body: PAGE.to_string(),
        })
    }

    fn unobserved(cancel: CancelHandle) -> RunContext {
        let (tx, _rx) = mpsc::unbounded_channel();
        RunContext::new(cancel, tx)
    }

    fn drain(rx: &mut UnboundedReceiver<RunEvent>) -> Vec<RunEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn test_compose_query() {
        let mut request = SearchRequest::new(" padaria ");
        assert_eq!(request.compose_query(), "padaria");

        request.locality = Some("Centro".to_string());
        request.state = Some("sp".to_string());
        assert_eq!(request.compose_query(), "padaria Centro SP");

        request.city = Some("Campinas".to_string());
        assert_eq!(request.compose_query(), "padaria Centro Campinas - SP");

        // A city without a state is ignored
        request.state = None;
        request.locality = Some("  ".to_string());
        assert_eq!(request.compose_query(), "padaria");
    }

    #[test]
    fn test_validate() {
        let flags = ExtractionFlags::all();
        assert_eq!(SearchRequest::new("  ").validate(flags), Err(HarvestError::NoQuery));
        assert_eq!(
            SearchRequest::new("padaria").validate(ExtractionFlags::default()),
            Err(HarvestError::NoCategory)
        );

        let mut request = SearchRequest::new("padaria");
        request.state = Some("XX".to_string());
        assert_eq!(request.validate(flags), Err(HarvestError::UnknownState("XX".to_string())));

        request.state = Some("rj".to_string());
        assert_eq!(request.validate(flags), Ok(()));
    }

    #[tokio::test]
    async fn test_spawn_rejects_invalid_request_without_searching() {
        let mut search = MockSearchProvider::new();
        search.expect_search().never();
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().never();
        let pipeline = Pipeline::new(Arc::new(search), Arc::new(fetcher));

        assert!(matches!(
            pipeline.spawn(SearchRequest::new(""), ExtractionFlags::all()),
            Err(HarvestError::NoQuery)
        ));
        assert!(matches!(
            pipeline.spawn(SearchRequest::new("padaria"), ExtractionFlags::default()),
            Err(HarvestError::NoCategory)
        ));
    }

    #[tokio::test]
    async fn test_zero_sites_found() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().never();
        let pipeline = Pipeline::new(Arc::new(searching(Vec::new())), Arc::new(fetcher));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctx = RunContext::new(CancelHandle::new(), tx);
        let outcome = pipeline.run("padaria", ExtractionFlags::all(), &mut ctx).await;

        assert_eq!(outcome.status, RunStatus::NoSitesFound);
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.progress.completed_steps, 0);
        assert_eq!(outcome.progress.total_steps, 0);
        assert_eq!(
            drain(&mut rx),
            vec![RunEvent::Searching { query: "padaria".to_string() }]
        );
    }

    #[tokio::test]
    async fn test_failing_search_is_no_sites() {
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .returning(|_, _| Err(anyhow::anyhow!("blocked")));
        let pipeline = Pipeline::new(Arc::new(search), Arc::new(MockPageFetcher::new()));

        let mut ctx = unobserved(CancelHandle::new());
        let outcome = pipeline.run("padaria", ExtractionFlags::all(), &mut ctx).await;
        assert_eq!(outcome.status, RunStatus::NoSitesFound);
    }

    #[tokio::test]
    async fn test_results_follow_candidate_order_and_failures_are_kept() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(3).returning(|url| {
            if url.contains("site2") {
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 500,
                })
            } else {
                ok_page(url)
            }
        });
        let pipeline = Pipeline::new(Arc::new(searching(sites(3))), Arc::new(fetcher));
        let flags = ExtractionFlags {
            email: true,
            phone: true,
            ..Default::default()
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ctx = RunContext::new(CancelHandle::new(), tx);
        let outcome = pipeline.run("loja", flags, &mut ctx).await;

        assert_eq!(outcome.status, RunStatus::Completed);
        let visited: Vec<_> = outcome.results.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(visited, sites(3));
        assert_eq!(outcome.results[1], PageResult::empty("https://site2.example/"));
        assert_eq!(outcome.results[0].emails, vec!["contato@loja.com.br"]);
        assert_eq!(outcome.results[0].phones, vec!["(11) 3333-4444"]);
        assert!(outcome.results[0].social_links.is_empty());

        // 4 steps for each loaded site, 1 for the failed one
        assert_eq!(outcome.progress.total_steps, 12);
        assert_eq!(outcome.progress.completed_steps, 9);
        assert_eq!(outcome.stats.failed_requests, 1);

        let events = drain(&mut rx);
        assert_eq!(events[1], RunEvent::Started { sites: 3, total_steps: 12 });
        let counts: Vec<usize> = events
            .iter()
            .filter_map(|event| match event {
                RunEvent::Step(progress) => Some(progress.completed_steps),
                _ => None,
            })
            .collect();
        assert_eq!(counts, (1..=9).collect::<Vec<_>>());
        assert!(events.iter().all(|event| match event {
            RunEvent::Step(progress) => progress.total_steps == 12,
            _ => true,
        }));
    }

    #[tokio::test]
    async fn test_cancel_after_second_fetch() {
        let cancel = CancelHandle::new();
        let trigger = cancel.clone();

        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(2).returning(move |url| {
            if url.contains("site2") {
                trigger.cancel();
            }
            ok_page(url)
        });
        let pipeline = Pipeline::new(Arc::new(searching(sites(5))), Arc::new(fetcher));
        let flags = ExtractionFlags::all();

        let mut ctx = unobserved(cancel);
        let outcome = pipeline.run("loja", flags, &mut ctx).await;

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].site, "https://site1.example/");
        assert_eq!(outcome.progress.total_steps, flags.total_steps(5));
        assert_eq!(outcome.progress.completed_steps, flags.steps_per_site() + 1);
        assert!(outcome.progress.completed_steps <= outcome.progress.total_steps);
    }

    #[tokio::test]
    async fn test_cancel_during_search() {
        let cancel = CancelHandle::new();
        let trigger = cancel.clone();

        let mut search = MockSearchProvider::new();
        search.expect_search().returning(move |_, _| {
            trigger.cancel();
            Ok(sites(3))
        });
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().never();
        let pipeline = Pipeline::new(Arc::new(search), Arc::new(fetcher));

        let mut ctx = unobserved(cancel);
        let outcome = pipeline.run("loja", ExtractionFlags::all(), &mut ctx).await;

        assert_eq!(outcome.status, RunStatus::Cancelled);
        assert!(outcome.results.is_empty());
    }

    #[tokio::test]
    async fn test_search_results_are_capped() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(2).returning(ok_page);
        let pipeline = Pipeline::new(Arc::new(searching(sites(4))), Arc::new(fetcher)).with_max_sites(2);

        let mut ctx = unobserved(CancelHandle::new());
        let outcome = pipeline
            .run("loja", ExtractionFlags { email: true, ..Default::default() }, &mut ctx)
            .await;

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.progress.total_steps, 6);
    }

    #[tokio::test]
    async fn test_spawned_run_over_http() {
        let server = MockServer::start().await;
        let page_url = format!("{}/contato", server.uri());
        let results_page = format!(
            r#"<div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg={}">Loja</a></div>"#,
            urlencoding::encode(&page_url)
        );

        Mock::given(method("GET"))
            .and(path("/html/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/contato"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let client = http_client("test-agent", Duration::from_secs(5)).unwrap();
        let pipeline = Pipeline::new(
            Arc::new(DuckDuckGoSearch::new(client.clone(), format!("{}/html/", server.uri()))),
            Arc::new(HttpFetcher::new(client)),
        );

        let flags = ExtractionFlags {
            email: true,
            social_links: true,
            ..Default::default()
        };
        let mut handle = pipeline.spawn(SearchRequest::new("loja"), flags).unwrap();

        let mut last_step = 0;
        while let Some(event) = handle.events.recv().await {
            if let RunEvent::Step(progress) = event {
                assert!(progress.completed_steps > last_step);
                last_step = progress.completed_steps;
            }
        }
        let outcome = handle.task.await.unwrap();

        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(last_step, 4);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].site, page_url);
        assert_eq!(outcome.results[0].emails, vec!["contato@loja.com.br"]);
        assert_eq!(outcome.results[0].social_links, vec!["https://instagram.com/loja"]);
        assert!(outcome.results[0].phones.is_empty());
    }
}
