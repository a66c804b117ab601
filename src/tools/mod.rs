//! MCP tool handlers and the name → handler table

pub mod ec2_spend;
pub mod google_search;
pub mod page_text;
pub mod spend_breakdown;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ToolError, ToolResult};
use crate::mcp::types::Tool;

pub use ec2_spend::Ec2SpendTool;
pub use google_search::GoogleSearchTool;
pub use page_text::PageTextTool;
pub use spend_breakdown::SpendBreakdownTool;

/// Text blocks returned by a successful call, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub blocks: Vec<String>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            blocks: vec![text.into()],
        }
    }

    pub fn blocks(blocks: Vec<String>) -> Self {
        Self { blocks }
    }
}

/// One callable operation
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> Tool;

    async fn call(&self, arguments: Option<Value>) -> ToolResult<ToolOutput>;
}

/// Deserialize tool arguments, treating absent arguments as the defaults
pub fn parse_arguments<T: DeserializeOwned + Default>(arguments: Option<Value>) -> ToolResult<T> {
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        Some(args) => serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidArguments(e.to_string())),
    }
}

/// Handlers keyed by tool name, built once at startup
#[derive(Default, Clone)]
pub struct ToolRegistry {
    handlers: BTreeMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ToolHandler>) {
        let name = handler.definition().name;
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    pub fn definitions(&self) -> Vec<Tool> {
        self.handlers.values().map(|h| h.definition()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}
