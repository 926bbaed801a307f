use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// DuckDuckGo's script-free results page
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

static RESULT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("result selector is valid"));
static RESULT_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.result__a").expect("result link selector is valid"));

/// Turns a query into a ranked list of candidate site URLs
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// `SearchProvider` backed by the DuckDuckGo HTML endpoint
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        debug!("Searching {} for '{}'", self.endpoint, query);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await
            .context("Failed to send search request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Search endpoint answered with HTTP {}", status);
        }

        let html = response
            .text()
            .await
            .context("Failed to read search response")?;

        let sites = parse_results(&html, limit);
        debug!("Search returned {} candidate sites", sites.len());

        Ok(sites)
    }
}

/// Pull organic result links out of a results page, in rank order
pub fn parse_results(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_SELECTOR)
        .filter(|result| {
            !result
                .value()
                .attr("class")
                .is_some_and(|class| class.contains("result--ad"))
        })
        .filter_map(|result| result.select(&RESULT_LINK_SELECTOR).next())
        .filter_map(|link| link.value().attr("href"))
        .filter_map(resolve_result_link)
        .take(limit)
        .collect()
}

/// Result links go through a redirect carrying the target in `uddg`
fn resolve_result_link(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    let target = url
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
        .unwrap_or(absolute);

    if target.starts_with("http://") || target.starts_with("https://") {
        Some(target)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS_PAGE: &str = r#"
        <div class="result results_links result--ad">
            <a class="result__a" href="https://ads.example/click">Anúncio</a>
        </div>
        <div class="result results_links">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fpadaria.com.br%2Fcontato&amp;rut=abc">Padaria</a>
        </div>
        <div class="result results_links">
            <a class="result__a" href="https://direto.example/">Direto</a>
        </div>
        <div class="result results_links">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=ftp%3A%2F%2Farquivos.example">FTP</a>
        </div>
        <div class="result results_links">
            <a class="result__a" href="/l/?uddg=https%3A%2F%2Fterceiro.example%2F">Terceiro</a>
        </div>
    "#;

    #[test]
    fn test_parse_results_unwraps_redirects_and_skips_ads() {
        assert_eq!(
            parse_results(RESULTS_PAGE, 10),
            vec![
                "https://padaria.com.br/contato",
                "https://direto.example/",
                "https://terceiro.example/",
            ]
        );
    }

    #[test]
    fn test_parse_results_respects_limit() {
        assert_eq!(parse_results(RESULTS_PAGE, 1), vec!["https://padaria.com.br/contato"]);
        assert!(parse_results("<html></html>", 10).is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "padaria Campinas - SP"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(Client::new(), format!("{}/html/", server.uri()));
        let sites = search.search("padaria Campinas - SP", 2).await.unwrap();

        assert_eq!(sites, vec!["https://padaria.com.br/contato", "https://direto.example/"]);
    }

    #[tokio::test]
    async fn test_search_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let search = DuckDuckGoSearch::new(Client::new(), server.uri());
        assert!(search.search("padaria", 10).await.is_err());
    }
}
