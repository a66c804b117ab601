//! query_google_top_results tool implementation

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{parse_arguments, ToolHandler, ToolOutput};
use crate::error::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::service::SearchProvider;

/// Tool definition for MCP
pub struct GoogleSearchToolDef {
    pub name: &'static str,
    pub description: &'static str,
}

pub static GOOGLE_SEARCH_TOOL: GoogleSearchToolDef = GoogleSearchToolDef {
    name: "query_google_top_results",
    description: "Perform a Google Search query and return the top result URLs, one per content block, in the order Google ranks them.",
};

impl GoogleSearchToolDef {
    pub fn get_input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "params": {
                    "type": "string",
                    "description": "The query string to search for"
                }
            },
            "required": ["params"]
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSearchArgs {
    #[serde(alias = "query")]
    pub params: Option<String>,
}

pub struct GoogleSearchTool {
    provider: Arc<dyn SearchProvider>,
}

impl GoogleSearchTool {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, args: GoogleSearchArgs) -> ToolResult<Vec<String>> {
        let query = match args.params {
            Some(q) if !q.trim().is_empty() => q,
            _ => {
                return Err(ToolError::InvalidArguments(
                    "params (query string) is required".to_string(),
                ))
            }
        };

        info!("Executing query_google_top_results");
        self.provider.search(&query).await
    }
}

#[async_trait]
impl ToolHandler for GoogleSearchTool {
    fn definition(&self) -> Tool {
        Tool {
            name: GOOGLE_SEARCH_TOOL.name.to_string(),
            description: GOOGLE_SEARCH_TOOL.description.to_string(),
            input_schema: GoogleSearchToolDef::get_input_schema(),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> ToolResult<ToolOutput> {
        let args: GoogleSearchArgs = parse_arguments(arguments)?;
        let urls = self.execute(args).await?;
        Ok(ToolOutput::blocks(urls))
    }
}
