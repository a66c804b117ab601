//! Google web search via the HTML results page

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

use crate::error::{ToolError, ToolResult};
use crate::http_logger::{self, HttpExchangeLog};

/// Browser-like UA; the results page serves a stripped variant to unknown agents
pub const SEARCH_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Seam over the web-search provider
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Result URLs in provider order
    async fn search(&self, query: &str) -> ToolResult<Vec<String>>;
}

pub struct GoogleSearch {
    client: Client,
    base_url: String,
    num_results: usize,
    language: String,
}

impl GoogleSearch {
    pub fn new(client: Client, base_url: &str, num_results: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            num_results,
            language: "en".to_string(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.base_url)
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str) -> ToolResult<Vec<String>> {
        let url = self.search_url();
        let num = self.num_results.to_string();
        let start_time = Instant::now();

        info!("Searching Google for: {}", query);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", SEARCH_USER_AGENT)
            .query(&[("q", query), ("num", num.as_str()), ("hl", self.language.as_str())])
            .send()
            .await;

        let duration_ms = start_time.elapsed().as_millis() as u64;

        let response = match response {
            Ok(resp) => resp,
            Err(e) => {
                http_logger::log_exchange(&HttpExchangeLog::failed("GET", &url, duration_ms, &e));
                return Err(ToolError::UpstreamUnavailable(format!(
                    "search request failed: {}",
                    e
                )));
            }
        };

        let status = response.status();
        let headers = http_logger::extract_response_headers(&response);
        let body = response.text().await?;

        http_logger::log_exchange(&HttpExchangeLog::completed(
            "GET",
            &url,
            duration_ms,
            status.as_u16(),
            headers,
            &body,
        ));

        if !status.is_success() {
            warn!("Search provider returned {}", status);
            return Err(ToolError::UpstreamUnavailable(format!(
                "search provider returned {}",
                status
            )));
        }

        let mut urls = extract_result_urls(&body);
        urls.truncate(self.num_results);
        debug!("Search returned {} results in {}ms", urls.len(), duration_ms);
        Ok(urls)
    }
}

/// Result links from a results page, in document order.
///
/// Accepts direct `http(s)` hrefs and `/url?q=` redirect hrefs (unwrapped);
/// anything pointing back at the search engine itself is skipped.
pub fn extract_result_urls(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&anchor)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(result_target)
        .collect()
}

fn result_target(href: &str) -> Option<String> {
    let target = if let Some(query) = href.strip_prefix("/url?") {
        let parsed = Url::parse(&format!("https://redirect.invalid/url?{}", query)).ok()?;
        parsed
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?
    } else {
        href.to_string()
    };

    let url = Url::parse(&target).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    let host = url.host_str().unwrap_or_default();
    if is_search_engine_host(host) {
        return None;
    }

    Some(target)
}

fn is_search_engine_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.");
    host.starts_with("google.")
        || host.ends_with(".google.com")
        || host == "webcache.googleusercontent.com"
}
