//! Typed model of the Cost Explorer `GetCostAndUsage` call
//!
//! Requests and responses are plain Rust types; the AWS SDK adapter in
//! [`super::aws`] converts to and from the SDK representation so everything
//! downstream works against compile-checked fields instead of open maps.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CostExplorerError;

/// Service name Cost Explorer uses for EC2 instance usage
pub const EC2_COMPUTE_SERVICE: &str = "Amazon Elastic Compute Cloud - Compute";

/// Prefix that identifies any EC2 compute line item in a service breakdown
pub const EC2_SERVICE_PREFIX: &str = "Amazon Elastic Compute";

/// Service name Cost Explorer uses for SageMaker
pub const SAGEMAKER_SERVICE: &str = "Amazon SageMaker";

pub const METRIC_UNBLENDED_COST: &str = "UnblendedCost";
pub const METRIC_USAGE_QUANTITY: &str = "UsageQuantity";

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    /// `[today - days, today)`
    pub fn trailing_days(today: NaiveDate, days: u32) -> Result<Self, CostExplorerError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or_else(|| {
                CostExplorerError::InvalidQuery(format!("{} days is out of range", days))
            })?;
        Ok(Self { start, end: today })
    }

    /// The single day starting at `date`
    pub fn single_day(date: NaiveDate) -> Result<Self, CostExplorerError> {
        let end = date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| CostExplorerError::InvalidQuery(format!("no day after {}", date)))?;
        Ok(Self { start: date, end })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Grouping dimensions used by the cost tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Region,
    Service,
    InstanceType,
    UsageType,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Region => "REGION",
            Self::Service => "SERVICE",
            Self::InstanceType => "INSTANCE_TYPE",
            Self::UsageType => "USAGE_TYPE",
        }
    }

    /// Column header used when this dimension labels a breakdown table
    pub fn column_label(&self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Service => "Service",
            Self::InstanceType => "Instance Type",
            Self::UsageType => "Usage Type",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostFilter {
    Dimension { key: Dimension, values: Vec<String> },
    And(Vec<CostFilter>),
}

impl CostFilter {
    pub fn dimension(key: Dimension, value: impl Into<String>) -> Self {
        Self::Dimension {
            key,
            values: vec![value.into()],
        }
    }
}

/// One `GetCostAndUsage` request. Granularity is always daily for these tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub time_period: TimeRange,
    pub filter: Option<CostFilter>,
    pub metrics: Vec<String>,
    pub group_by: Vec<Dimension>,
}

impl CostQuery {
    pub fn new(time_period: TimeRange) -> Self {
        Self {
            time_period,
            filter: None,
            metrics: vec![METRIC_UNBLENDED_COST.to_string()],
            group_by: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: CostFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_metrics(mut self, metrics: &[&str]) -> Self {
        self.metrics = metrics.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn group_by(mut self, dimension: Dimension) -> Self {
        self.group_by.push(dimension);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostAndUsageResponse {
    #[serde(default)]
    pub results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResultByTime {
    pub time_period: DateInterval,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub total: BTreeMap<String, MetricValue>,
    #[serde(default)]
    pub groups: Vec<CostGroup>,
    #[serde(default)]
    pub estimated: bool,
}

impl ResultByTime {
    pub fn total_metric(&self, metric: &str) -> Option<&MetricValue> {
        self.total.get(metric)
    }
}

/// Dates as the API returns them (`YYYY-MM-DD`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DateInterval {
    pub start: String,
    pub end: String,
}

/// Cost for one grouping key, e.g. one instance type or one (region, service) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostGroup {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
}

impl CostGroup {
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn metric(&self, name: &str) -> Result<&MetricValue, CostExplorerError> {
        self.metrics.get(name).ok_or_else(|| {
            CostExplorerError::Malformed(format!(
                "group {:?} is missing metric {}",
                self.keys, name
            ))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    pub amount: String,
    pub unit: String,
}

impl MetricValue {
    pub fn amount_f64(&self) -> Result<f64, CostExplorerError> {
        self.amount.trim().parse::<f64>().map_err(|e| {
            CostExplorerError::Malformed(format!("invalid amount {:?}: {}", self.amount, e))
        })
    }
}

/// Seam over the billing API so reports can be built against a fake in tests
#[async_trait]
pub trait CostExplorer: Send + Sync {
    async fn get_cost_and_usage(
        &self,
        query: &CostQuery,
    ) -> Result<CostAndUsageResponse, CostExplorerError>;
}
