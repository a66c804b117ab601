//! get_ec2_spend_last_day tool implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ToolHandler, ToolOutput};
use crate::error::{ToolError, ToolResult};
use crate::mcp::types::Tool;
use crate::report::ec2_spend_last_day;
use crate::service::CostExplorer;

/// Tool definition for MCP
pub struct Ec2SpendToolDef {
    pub name: &'static str,
    pub description: &'static str,
}

pub static EC2_SPEND_TOOL: Ec2SpendToolDef = Ec2SpendToolDef {
    name: "get_ec2_spend_last_day",
    description: r#"Retrieve EC2 spend for the last day using the AWS Cost Explorer API.

Returns a per-instance-type summary (cost and usage) followed by the raw Cost Explorer response as JSON.
If the cost data cannot be retrieved, the summary explains why and the raw response is `null`: treat that as "unavailable", not as zero spend."#,
};

impl Ec2SpendToolDef {
    pub fn get_input_schema() -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }
}

pub struct Ec2SpendTool {
    explorer: Arc<dyn CostExplorer>,
}

impl Ec2SpendTool {
    pub fn new(explorer: Arc<dyn CostExplorer>) -> Self {
        Self { explorer }
    }
}

#[async_trait]
impl ToolHandler for Ec2SpendTool {
    fn definition(&self) -> Tool {
        Tool {
            name: EC2_SPEND_TOOL.name.to_string(),
            description: EC2_SPEND_TOOL.description.to_string(),
            input_schema: Ec2SpendToolDef::get_input_schema(),
        }
    }

    async fn call(&self, _arguments: Option<Value>) -> ToolResult<ToolOutput> {
        info!("Executing get_ec2_spend_last_day");

        let today = Local::now().date_naive();
        let snapshot = ec2_spend_last_day(self.explorer.as_ref(), today).await;

        if !snapshot.is_available() {
            warn!("EC2 spend unavailable");
        }

        let raw = serde_json::to_string_pretty(&snapshot.response)
            .map_err(|e| ToolError::Decode(e.to_string()))?;

        Ok(ToolOutput::blocks(vec![snapshot.summary, raw]))
    }
}
