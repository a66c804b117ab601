//! get_detailed_breakdown_by_day tool implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::{parse_arguments, ToolHandler, ToolOutput};
use crate::error::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::report::{detailed_breakdown_by_day, DEFAULT_DAYS};
use crate::service::CostExplorer;

/// Tool definition for MCP
pub struct SpendBreakdownToolDef {
    pub name: &'static str,
    pub description: &'static str,
}

pub static SPEND_BREAKDOWN_TOOL: SpendBreakdownToolDef = SpendBreakdownToolDef {
    name: "get_detailed_breakdown_by_day",
    description: r#"Retrieve daily AWS spend broken down by region, service, and instance type.

For every day in the window the report lists each region (alphabetically) with its five most expensive services; remaining services are summarized on one line. Regions with EC2 spend get an instance type breakdown, and regions with SageMaker spend get instance type and usage type breakdowns."#,
};

impl SpendBreakdownToolDef {
    pub fn get_input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "days": {
                    "type": "integer",
                    "minimum": 1,
                    "default": DEFAULT_DAYS,
                    "description": "Number of days to look back for cost data"
                }
            }
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaysParam {
    pub days: Option<i64>,
}

/// Tool arguments. `{"days": N}` and the wrapped `{"params": {"days": N}}` are both accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpendBreakdownArgs {
    pub days: Option<i64>,
    pub params: Option<DaysParam>,
}

impl SpendBreakdownArgs {
    /// Lookback window, defaulting to a week
    pub fn days(&self) -> ToolResult<u32> {
        let days = self
            .days
            .or_else(|| self.params.as_ref().and_then(|p| p.days))
            .unwrap_or(i64::from(DEFAULT_DAYS));

        if days < 1 {
            return Err(ToolError::InvalidArguments(format!(
                "days must be a positive integer, got {}",
                days
            )));
        }

        u32::try_from(days)
            .map_err(|_| ToolError::InvalidArguments(format!("days is too large: {}", days)))
    }
}

pub struct SpendBreakdownTool {
    explorer: Arc<dyn CostExplorer>,
}

impl SpendBreakdownTool {
    pub fn new(explorer: Arc<dyn CostExplorer>) -> Self {
        Self { explorer }
    }

    pub async fn execute(&self, args: SpendBreakdownArgs) -> ToolResult<ToolOutput> {
        let days = args.days()?;
        info!("Executing get_detailed_breakdown_by_day for {} days", days);

        let today = Local::now().date_naive();
        let report = detailed_breakdown_by_day(self.explorer.as_ref(), today, days).await;
        Ok(ToolOutput::text(report))
    }
}

#[async_trait]
impl ToolHandler for SpendBreakdownTool {
    fn definition(&self) -> Tool {
        Tool {
            name: SPEND_BREAKDOWN_TOOL.name.to_string(),
            description: SPEND_BREAKDOWN_TOOL.description.to_string(),
            input_schema: SpendBreakdownToolDef::get_input_schema(),
        }
    }

    async fn call(&self, arguments: Option<Value>) -> ToolResult<ToolOutput> {
        let args: SpendBreakdownArgs = parse_arguments(arguments)?;
        self.execute(args).await
    }
}
