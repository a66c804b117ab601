//! Error types shared by the tool handlers and upstream clients

use thiserror::Error;

/// Failure of a single upstream Cost Explorer call
#[derive(Debug, Clone, Error)]
pub enum CostExplorerError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("{0}")]
    Service(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Failure of a tool invocation, rendered once at the MCP boundary
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl From<CostExplorerError> for ToolError {
    fn from(e: CostExplorerError) -> Self {
        ToolError::UpstreamUnavailable(e.to_string())
    }
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;
