//! spyglass library - MCP tools for AWS cost breakdowns and Google search

pub mod config;
pub mod error;
pub mod http_logger;
pub mod mcp;
pub mod report;
pub mod service;
pub mod tools;

// Re-export commonly used types
pub use config::{Config, ConfigOptions, Toolset};
pub use error::{CostExplorerError, ToolError};
pub use tools::{ToolHandler, ToolOutput, ToolRegistry};
