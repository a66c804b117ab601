//! Fetch a page and extract its visible text

use std::time::{Duration, Instant};

use reqwest::Client;
use scraper::{Html, Node};
use tracing::{info, warn};

use crate::error::ToolResult;
use crate::http_logger::{self, HttpExchangeLog};
use crate::service::google::SEARCH_USER_AGENT;

/// Elements whose text is never rendered
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// GET `url` once and return its visible text.
    ///
    /// Transport failures (including the timeout) are returned as errors.
    /// A non-2xx status is not: its body is extracted like any other page.
    pub async fn fetch_text(&self, url: &str) -> ToolResult<String> {
        let start_time = Instant::now();
        info!("Fetching page: {}", url);

        let result = self
            .client
            .get(url)
            .header("User-Agent", SEARCH_USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                let duration_ms = start_time.elapsed().as_millis() as u64;
                http_logger::log_exchange(&HttpExchangeLog::failed("GET", url, duration_ms, &e));
                return Err(e.into());
            }
        };

        let status = response.status();
        let headers = http_logger::extract_response_headers(&response);
        let body = response.text().await?;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        http_logger::log_exchange(&HttpExchangeLog::completed(
            "GET",
            url,
            duration_ms,
            status.as_u16(),
            headers,
            &body,
        ));

        if !status.is_success() {
            warn!("{} returned {}, extracting body anyway", url, status);
        }

        Ok(extract_visible_text(&body))
    }
}

/// Text nodes of `html`, each trimmed, empty ones dropped, joined by `\n`
pub fn extract_visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    // Iterative walk, nesting depth is unbounded
    let mut stack = vec![*document.root_element()];
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            Node::Element(element) => {
                if !HIDDEN_TAGS.contains(&element.name()) {
                    stack.extend(node.children().rev());
                }
            }
            _ => {}
        }
    }

    parts.join("\n")
}
