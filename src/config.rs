//! Configuration module - CLI arguments and settings

use anyhow::{anyhow, Result};
use std::sync::Arc;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://www.google.com";
pub const DEFAULT_SEARCH_RESULTS: usize = 10;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Which tool groups the server exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Toolset {
    Cost,
    Search,
    #[default]
    All,
}

impl Toolset {
    pub fn includes_cost(&self) -> bool {
        matches!(self, Self::Cost | Self::All)
    }

    pub fn includes_search(&self) -> bool {
        matches!(self, Self::Search | Self::All)
    }

    /// Server name reported during `initialize`
    pub fn server_name(&self) -> &'static str {
        match self {
            Self::Cost => "aws_cost_explorer",
            Self::Search => "google_search",
            Self::All => "spyglass",
        }
    }
}

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub toolset: Toolset,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub search_base_url: Option<String>,
    pub search_results: Option<usize>,
    pub fetch_timeout: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub toolset: Toolset,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub search_base_url: String,
    pub search_results: usize,
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn new(options: ConfigOptions) -> Result<Arc<Self>> {
        let search_base_url = options
            .search_base_url
            .unwrap_or_else(|| DEFAULT_SEARCH_BASE_URL.to_string());
        let search_base_url = search_base_url.trim().trim_end_matches('/').to_string();

        if search_base_url.is_empty() {
            return Err(anyhow!("search_base_url cannot be empty"));
        }

        if !search_base_url.starts_with("http://") && !search_base_url.starts_with("https://") {
            return Err(anyhow!(
                "search_base_url must start with http:// or https://: {}",
                search_base_url
            ));
        }

        let search_results = options.search_results.unwrap_or(DEFAULT_SEARCH_RESULTS);
        if search_results == 0 {
            return Err(anyhow!("search_results must be at least 1"));
        }

        let fetch_timeout_secs = options.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if fetch_timeout_secs == 0 {
            return Err(anyhow!("fetch_timeout must be at least 1 second"));
        }

        Ok(Arc::new(Self {
            toolset: options.toolset,
            aws_region: non_empty(options.aws_region),
            aws_profile: non_empty(options.aws_profile),
            search_base_url,
            search_results,
            fetch_timeout_secs,
        }))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
