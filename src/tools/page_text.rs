//! parse_google_html tool implementation

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{parse_arguments, ToolHandler, ToolOutput};
use crate::error::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::service::PageFetcher;

/// Tool definition for MCP
pub struct PageTextToolDef {
    pub name: &'static str,
    pub description: &'static str,
}

pub static PAGE_TEXT_TOOL: PageTextToolDef = PageTextToolDef {
    name: "parse_google_html",
    description: "Retrieve the visible text of a web page, typically one of the URLs returned by query_google_top_results. Text nodes are returned one per line.",
};

impl PageTextToolDef {
    pub fn get_input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "params": {
                    "type": "string",
                    "description": "The URL of the Google search result"
                }
            },
            "required": ["params"]
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageTextArgs {
    #[serde(alias = "url")]
    pub params: Option<String>,
}

pub struct PageTextTool {
    fetcher: Arc<PageFetcher>,
}

impl PageTextTool {
    pub fn new(fetcher: Arc<PageFetcher>) -> Self {
        Self { fetcher }
    }

    pub async fn execute(&self, args: PageTextArgs) -> ToolResult<String> {
        let url = match args.params {
            Some(u) if !u.trim().is_empty() => u.trim().to_string(),
            _ => {
                return Err(ToolError::InvalidArguments(
                    "params (URL) is required".to_string(),
                ))
            }
        };

        info!("Executing parse_google_html for: {}", url);
        self.fetcher.fetch_text(&url).await
    }
}

#[async_trait]
impl ToolHandler for PageTextTool {
    fn definition(&self) -> Tool {
        Tool {
            name: PAGE_TEXT_TOOL.name.to_string(),
            description: PAGE_TEXT_TOOL.description.to_string(),
            input_schema: PageTextToolDef::get_input_schema(),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> ToolResult<ToolOutput> {
        let args: PageTextArgs = parse_arguments(arguments)?;
        let text = self.execute(args).await?;
        Ok(ToolOutput::text(text))
    }
}
