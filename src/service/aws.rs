//! AWS SDK backed [`CostExplorer`]

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_costexplorer::config::Region;
use aws_sdk_costexplorer::error::DisplayErrorContext;
use aws_sdk_costexplorer::types as ce;
use aws_sdk_costexplorer::Client;
use tracing::{debug, info};

use super::cost_explorer::{
    CostAndUsageResponse, CostExplorer, CostFilter, CostGroup, CostQuery, DateInterval,
    MetricValue, ResultByTime,
};
use crate::error::CostExplorerError;

/// Cost Explorer is a global service whose API lives in us-east-1
pub const DEFAULT_COST_EXPLORER_REGION: &str = "us-east-1";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct AwsCostExplorer {
    client: Client,
}

impl AwsCostExplorer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain, optionally pinned to a
    /// profile and region.
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let region_provider = RegionProviderChain::first_try(region.map(Region::new))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_COST_EXPLORER_REGION));

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

fn to_expression(filter: &CostFilter) -> ce::Expression {
    match filter {
        CostFilter::Dimension { key, values } => {
            let mut dimension =
                ce::DimensionValues::builder().key(ce::Dimension::from(key.as_str()));
            for value in values {
                dimension = dimension.values(value);
            }
            ce::Expression::builder().dimensions(dimension.build()).build()
        }
        CostFilter::And(filters) => {
            let mut expression = ce::Expression::builder();
            for inner in filters {
                expression = expression.and(to_expression(inner));
            }
            expression.build()
        }
    }
}

fn to_metric_map(
    metrics: Option<&HashMap<String, ce::MetricValue>>,
) -> Result<BTreeMap<String, MetricValue>, CostExplorerError> {
    metrics
        .into_iter()
        .flatten()
        .map(|(name, value)| {
            let amount = value.amount().ok_or_else(|| {
                CostExplorerError::Malformed(format!("metric {} has no Amount", name))
            })?;
            Ok::<_, CostExplorerError>((
                name.clone(),
                MetricValue {
                    amount: amount.to_string(),
                    unit: value.unit().unwrap_or_default().to_string(),
                },
            ))
        })
        .collect()
}

fn to_result_by_time(result: &ce::ResultByTime) -> Result<ResultByTime, CostExplorerError> {
    let period = result
        .time_period()
        .ok_or_else(|| CostExplorerError::Malformed("result without TimePeriod".to_string()))?;

    Ok(ResultByTime {
        time_period: DateInterval {
            start: period.start().to_string(),
            end: period.end().to_string(),
        },
        total: to_metric_map(result.total())?,
        groups: result
            .groups()
            .iter()
            .map(|group| {
                Ok::<_, CostExplorerError>(CostGroup {
                    keys: group.keys().to_vec(),
                    metrics: to_metric_map(group.metrics())?,
                })
            })
            .collect::<Result<_, _>>()?,
        estimated: result.estimated(),
    })
}

#[async_trait]
impl CostExplorer for AwsCostExplorer {
    async fn get_cost_and_usage(
        &self,
        query: &CostQuery,
    ) -> Result<CostAndUsageResponse, CostExplorerError> {
        let time_period = ce::DateInterval::builder()
            .start(query.time_period.start.format(DATE_FORMAT).to_string())
            .end(query.time_period.end.format(DATE_FORMAT).to_string())
            .build()
            .map_err(|e| CostExplorerError::InvalidQuery(e.to_string()))?;

        let mut request = self
            .client
            .get_cost_and_usage()
            .time_period(time_period)
            .granularity(ce::Granularity::Daily);

        for metric in &query.metrics {
            request = request.metrics(metric);
        }

        for dimension in &query.group_by {
            request = request.group_by(
                ce::GroupDefinition::builder()
                    .r#type(ce::GroupDefinitionType::Dimension)
                    .key(dimension.as_str())
                    .build(),
            );
        }

        if let Some(filter) = &query.filter {
            request = request.filter(to_expression(filter));
        }

        debug!("GetCostAndUsage request: {:?}", query);
        let start_time = Instant::now();

        let output = request
            .send()
            .await
            .map_err(|e| CostExplorerError::Service(DisplayErrorContext(&e).to_string()))?;

        info!(
            "GetCostAndUsage for {} completed in {}ms",
            query.time_period,
            start_time.elapsed().as_millis()
        );

        let results_by_time = output
            .results_by_time()
            .iter()
            .map(to_result_by_time)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CostAndUsageResponse { results_by_time })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC: &str = "UnblendedCost";

    fn day_with_group(metric: ce::MetricValue) -> ce::ResultByTime {
        ce::ResultByTime::builder()
            .time_period(
                ce::DateInterval::builder()
                    .start("2024-06-09")
                    .end("2024-06-10")
                    .build()
                    .unwrap(),
            )
            .groups(
                ce::Group::builder()
                    .keys("t3.micro")
                    .metrics(METRIC, metric)
                    .build(),
            )
            .estimated(true)
            .build()
    }

    #[test]
    fn test_result_by_time_keeps_amounts() {
        let metric = ce::MetricValue::builder().amount("1.25").unit("USD").build();

        let result = to_result_by_time(&day_with_group(metric)).unwrap();

        assert_eq!(result.time_period.start, "2024-06-09");
        assert!(result.estimated);
        assert_eq!(result.groups[0].keys, vec!["t3.micro"]);
        let value = result.groups[0].metric(METRIC).unwrap();
        assert_eq!(value.amount, "1.25");
        assert_eq!(value.unit, "USD");
    }

    #[test]
    fn test_missing_amount_is_malformed_not_zero() {
        let metric = ce::MetricValue::builder().unit("USD").build();

        let result = to_result_by_time(&day_with_group(metric));

        match result {
            Err(CostExplorerError::Malformed(msg)) => assert!(msg.contains(METRIC)),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }
}
