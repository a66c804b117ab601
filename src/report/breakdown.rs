//! Multi-day cost report by region, service and instance type
//!
//! One top-level query grouped by (region, service) drives the report. For
//! regions with EC2 or SageMaker spend, follow-up queries scoped to that
//! single day add finer-grained tables. A failed follow-up only replaces its
//! own sub-table with a note.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::table::BreakdownTable;
use crate::error::CostExplorerError;
use crate::service::cost_explorer::{
    CostExplorer, CostFilter, CostQuery, Dimension, ResultByTime, TimeRange, EC2_COMPUTE_SERVICE,
    EC2_SERVICE_PREFIX, METRIC_UNBLENDED_COST, SAGEMAKER_SERVICE,
};

/// Services shown per region before the rest is rolled up
pub const TOP_SERVICES: usize = 5;

pub const DEFAULT_DAYS: u32 = 7;

const WIDE_RULE: usize = 75;
const DATE_RULE: usize = 50;
const REGION_RULE: usize = 40;
const INDENT: &str = "  ";

/// Costs of one region on one day
#[derive(Debug, Default)]
struct RegionCosts {
    services: Vec<(String, f64)>,
    currency: String,
}

impl RegionCosts {
    fn insert(&mut self, service: &str, cost: f64, currency: &str) {
        match self.services.iter_mut().find(|(s, _)| s == service) {
            Some(entry) => entry.1 = cost,
            None => self.services.push((service.to_string(), cost)),
        }
        self.currency = currency.to_string();
    }

    fn has_ec2(&self) -> bool {
        self.services
            .iter()
            .any(|(s, _)| s.starts_with(EC2_SERVICE_PREFIX))
    }

    fn has_sagemaker(&self) -> bool {
        self.services.iter().any(|(s, _)| s == SAGEMAKER_SERVICE)
    }
}

pub struct BreakdownReport<'a> {
    explorer: &'a dyn CostExplorer,
    lines: Vec<String>,
}

impl<'a> BreakdownReport<'a> {
    pub fn new(explorer: &'a dyn CostExplorer) -> Self {
        Self {
            explorer,
            lines: Vec::new(),
        }
    }

    /// Build the report for `[today - days, today)`.
    ///
    /// Errors only when the top-level query fails or returns data that cannot
    /// be read; nested failures are written into the report.
    pub async fn build(mut self, today: NaiveDate, days: u32) -> Result<String, CostExplorerError> {
        if days == 0 {
            return Err(CostExplorerError::InvalidQuery(
                "days must be a positive integer".to_string(),
            ));
        }

        let range = TimeRange::trailing_days(today, days)?;

        self.push(String::new());
        self.push(format!(
            "Detailed Cost Breakdown by Region, Service, and Instance Type ({} days):",
            days
        ));
        self.push("-".repeat(WIDE_RULE));

        let query = CostQuery::new(range)
            .group_by(Dimension::Region)
            .group_by(Dimension::Service);
        let response = self.explorer.get_cost_and_usage(&query).await?;

        debug!(
            "Breakdown query returned {} periods",
            response.results_by_time.len()
        );

        for period in &response.results_by_time {
            self.add_period(period).await?;
        }

        Ok(self.lines.join("\n"))
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    async fn add_period(&mut self, period: &ResultByTime) -> Result<(), CostExplorerError> {
        let date = period.time_period.start.as_str();

        self.push(String::new());
        self.push(format!("Date: {}", date));
        self.push("=".repeat(DATE_RULE));

        if period.groups.is_empty() {
            self.push("No data found for this date".to_string());
        } else {
            let regions = group_by_region(period)?;
            for (region, costs) in &regions {
                self.add_region(date, region, costs).await;
            }
        }

        self.push(String::new());
        self.push("-".repeat(WIDE_RULE));
        Ok(())
    }

    async fn add_region(&mut self, date: &str, region: &str, costs: &RegionCosts) {
        self.push(String::new());
        self.push(format!("Region: {}", region));
        self.push("-".repeat(REGION_RULE));

        let table = BreakdownTable::new(
            Dimension::Service.column_label(),
            costs.services.iter().map(|(s, c)| (s.as_str(), *c)),
        );
        let (top, rollup) = table.truncate(TOP_SERVICES);
        self.lines.extend(top.render());

        if let Some(rollup) = rollup {
            self.push(format!(
                "... and {} more services totaling {:.2} {}",
                rollup.count, rollup.total, costs.currency
            ));
        }

        if costs.has_ec2() {
            if let Err(e) = self.add_ec2_breakdown(date, region).await {
                warn!("EC2 breakdown for {} on {} failed: {}", region, date, e);
                self.push(format!(
                    "{}Note: Could not retrieve EC2 instance type breakdown: {}",
                    INDENT, e
                ));
            }
        }

        if costs.has_sagemaker() {
            if let Err(e) = self.add_sagemaker_breakdown(date, region).await {
                warn!("SageMaker breakdown for {} on {} failed: {}", region, date, e);
                self.push(format!(
                    "{}Note: Could not retrieve SageMaker breakdown: {}",
                    INDENT, e
                ));
            }
        }
    }

    async fn add_ec2_breakdown(
        &mut self,
        date: &str,
        region: &str,
    ) -> Result<(), CostExplorerError> {
        let table = nested_breakdown(
            self.explorer,
            date,
            region,
            EC2_COMPUTE_SERVICE,
            Dimension::InstanceType,
        )
        .await?;

        if let Some(table) = table {
            self.push_sub_table("EC2 Instance Type Breakdown:", &table);
        }
        Ok(())
    }

    async fn add_sagemaker_breakdown(
        &mut self,
        date: &str,
        region: &str,
    ) -> Result<(), CostExplorerError> {
        let by_instance = nested_breakdown(
            self.explorer,
            date,
            region,
            SAGEMAKER_SERVICE,
            Dimension::InstanceType,
        )
        .await?;
        if let Some(table) = by_instance {
            self.push_sub_table("SageMaker Instance Type Breakdown:", &table);
        }

        let by_usage = nested_breakdown(
            self.explorer,
            date,
            region,
            SAGEMAKER_SERVICE,
            Dimension::UsageType,
        )
        .await?;
        if let Some(table) = by_usage {
            self.push_sub_table("SageMaker Usage Type Breakdown:", &table);
        }
        Ok(())
    }

    fn push_sub_table(&mut self, title: &str, table: &BreakdownTable) {
        self.push(String::new());
        self.push(format!("{}{}", INDENT, title));
        self.push(format!("{}{}", INDENT, "-".repeat(REGION_RULE - 2)));
        for line in table.render() {
            self.push(format!("{}{}", INDENT, line));
        }
    }
}

/// Build the report, rendering a top-level failure as the report text
pub async fn detailed_breakdown_by_day(
    explorer: &dyn CostExplorer,
    today: NaiveDate,
    days: u32,
) -> String {
    match BreakdownReport::new(explorer).build(today, days).await {
        Ok(report) => report,
        Err(e) => {
            warn!("Detailed breakdown failed: {}", e);
            format!("Error retrieving detailed breakdown: {}", e)
        }
    }
}

/// Regions in lexicographic order, each with its services in upstream order
fn group_by_region(
    period: &ResultByTime,
) -> Result<BTreeMap<String, RegionCosts>, CostExplorerError> {
    let mut regions: BTreeMap<String, RegionCosts> = BTreeMap::new();

    for group in &period.groups {
        let (Some(region), Some(service)) = (group.key(0), group.key(1)) else {
            return Err(CostExplorerError::Malformed(format!(
                "expected (region, service) keys, got {:?}",
                group.keys
            )));
        };
        let cost = group.metric(METRIC_UNBLENDED_COST)?;
        regions
            .entry(region.to_string())
            .or_default()
            .insert(service, cost.amount_f64()?, &cost.unit);
    }

    Ok(regions)
}

/// Costs of one service in one region on one day, grouped by `dimension`.
/// `None` when the upstream has no groups for it.
pub async fn nested_breakdown(
    explorer: &dyn CostExplorer,
    date: &str,
    region: &str,
    service: &str,
    dimension: Dimension,
) -> Result<Option<BreakdownTable>, CostExplorerError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| {
            CostExplorerError::Malformed(format!("invalid period start {:?}: {}", date, e))
        })?;

    let query = CostQuery::new(TimeRange::single_day(day)?)
        .with_filter(CostFilter::And(vec![
            CostFilter::dimension(Dimension::Region, region),
            CostFilter::dimension(Dimension::Service, service),
        ]))
        .group_by(dimension);

    let response = explorer.get_cost_and_usage(&query).await?;

    let Some(period) = response.results_by_time.first() else {
        return Ok(None);
    };
    if period.groups.is_empty() {
        return Ok(None);
    }

    let rows = period
        .groups
        .iter()
        .map(|group| {
            let label = group.key(0).unwrap_or_default().to_string();
            let cost = group.metric(METRIC_UNBLENDED_COST)?.amount_f64()?;
            Ok((label, cost))
        })
        .collect::<Result<Vec<_>, CostExplorerError>>()?;

    Ok(Some(BreakdownTable::new(dimension.column_label(), rows)))
}
