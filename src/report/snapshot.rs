//! Yesterday's EC2 spend, grouped by instance type

use chrono::NaiveDate;
use tracing::{error, info};

use crate::error::CostExplorerError;
use crate::service::cost_explorer::{
    CostAndUsageResponse, CostExplorer, CostFilter, CostQuery, Dimension, TimeRange,
    EC2_COMPUTE_SERVICE, METRIC_UNBLENDED_COST, METRIC_USAGE_QUANTITY,
};

const DEFAULT_CURRENCY: &str = "USD";

/// Result of one snapshot call.
///
/// `response` is `None` when the upstream call failed; that means the spend
/// is unknown, not zero.
#[derive(Debug, Clone)]
pub struct SpendSnapshot {
    pub summary: String,
    pub response: Option<CostAndUsageResponse>,
}

impl SpendSnapshot {
    pub fn is_available(&self) -> bool {
        self.response.is_some()
    }
}

pub fn ec2_spend_query(range: TimeRange) -> CostQuery {
    CostQuery::new(range)
        .with_filter(CostFilter::dimension(Dimension::Service, EC2_COMPUTE_SERVICE))
        .with_metrics(&[METRIC_UNBLENDED_COST, METRIC_USAGE_QUANTITY])
        .group_by(Dimension::InstanceType)
}

/// Human-readable summary of the first period of an EC2 spend response
pub fn summarize_ec2_spend(
    range: &TimeRange,
    response: &CostAndUsageResponse,
) -> Result<String, CostExplorerError> {
    let mut lines = vec![
        format!("EC2 Spend from {} to {}:", range.start, range.end),
        "-".repeat(50),
    ];

    let Some(period) = response.results_by_time.first() else {
        return Ok(lines.join("\n"));
    };

    let mut total_cost = 0.0;
    let mut currency: Option<&str> = None;

    for group in &period.groups {
        let instance_type = group.key(0).unwrap_or("unknown");
        let cost = group.metric(METRIC_UNBLENDED_COST)?;
        let usage = group.metric(METRIC_USAGE_QUANTITY)?.amount_f64()?;
        let amount = cost.amount_f64()?;

        lines.push(format!("Instance Type: {}", instance_type));
        lines.push(format!("Cost: {:.4} {}", amount, cost.unit));
        lines.push(format!("Usage: {:.2}", usage));
        lines.push("-".repeat(30));

        total_cost += amount;
        currency = Some(cost.unit.as_str());
    }

    if period.groups.is_empty() {
        match period.total_metric(METRIC_UNBLENDED_COST) {
            Some(total) => lines.push(format!(
                "Total EC2 Cost: {:.4} {}",
                total.amount_f64()?,
                total.unit
            )),
            None => lines.push("No EC2 costs found for this period".to_string()),
        }
    } else {
        lines.push(format!(
            "Total EC2 Cost: {:.4} {}",
            total_cost,
            currency.unwrap_or(DEFAULT_CURRENCY)
        ));
    }

    lines.push(format!(
        "Note: These results are {}",
        if period.estimated { "estimated" } else { "final" }
    ));

    Ok(lines.join("\n"))
}

/// Query yesterday's EC2 spend. Never fails: upstream errors yield an
/// unavailable snapshot carrying the diagnostic.
pub async fn ec2_spend_last_day(explorer: &dyn CostExplorer, today: NaiveDate) -> SpendSnapshot {
    let outcome = async {
        let range = TimeRange::trailing_days(today, 1)?;
        let response = explorer.get_cost_and_usage(&ec2_spend_query(range)).await?;
        let summary = summarize_ec2_spend(&range, &response)?;
        Ok::<_, CostExplorerError>((summary, response))
    }
    .await;

    match outcome {
        Ok((summary, response)) => {
            info!("EC2 spend snapshot ready ({} periods)", response.results_by_time.len());
            SpendSnapshot {
                summary,
                response: Some(response),
            }
        }
        Err(e) => {
            error!("Error retrieving EC2 cost data: {}", e);
            SpendSnapshot {
                summary: format!("Error retrieving EC2 cost data: {}", e),
                response: None,
            }
        }
    }
}
