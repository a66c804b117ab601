//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use spyglass::error::CostExplorerError;
use spyglass::service::{CostAndUsageResponse, CostExplorer, CostQuery, Dimension};

type Responder =
    Box<dyn Fn(&CostQuery) -> Result<CostAndUsageResponse, CostExplorerError> + Send + Sync>;

/// CostExplorer fake that answers through a closure and records every query
pub struct MockCostExplorer {
    responder: Responder,
    queries: Mutex<Vec<CostQuery>>,
}

impl MockCostExplorer {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CostQuery) -> Result<CostAndUsageResponse, CostExplorerError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `response`
    pub fn fixed(response: CostAndUsageResponse) -> Self {
        Self::new(move |_| Ok(response.clone()))
    }

    /// Always fail with a service error
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(CostExplorerError::Service(message.clone())))
    }

    pub fn queries(&self) -> Vec<CostQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CostExplorer for MockCostExplorer {
    async fn get_cost_and_usage(
        &self,
        query: &CostQuery,
    ) -> Result<CostAndUsageResponse, CostExplorerError> {
        self.queries.lock().unwrap().push(query.clone());
        (self.responder)(query)
    }
}

pub fn response(value: Value) -> CostAndUsageResponse {
    serde_json::from_value(value).unwrap()
}

pub fn cost(amount: f64) -> Value {
    json!({"UnblendedCost": {"Amount": amount.to_string(), "Unit": "USD"}})
}

/// One day of (region, service, cost) groups
pub fn region_service_day(date: &str, groups: &[(&str, &str, f64)]) -> Value {
    let end = next_day(date);
    json!({
        "TimePeriod": {"Start": date, "End": end},
        "Groups": groups
            .iter()
            .map(|(region, service, amount)| json!({
                "Keys": [region, service],
                "Metrics": cost(*amount)
            }))
            .collect::<Vec<_>>(),
        "Estimated": false
    })
}

/// One day grouped by a single key
pub fn single_key_day(date: &str, groups: &[(&str, f64)]) -> Value {
    json!({
        "TimePeriod": {"Start": date, "End": next_day(date)},
        "Groups": groups
            .iter()
            .map(|(key, amount)| json!({"Keys": [key], "Metrics": cost(*amount)}))
            .collect::<Vec<_>>(),
        "Estimated": false
    })
}

pub fn next_day(date: &str) -> String {
    let day = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
    (day + chrono::Days::new(1)).format("%Y-%m-%d").to_string()
}

pub fn is_top_level(query: &CostQuery) -> bool {
    query.group_by == vec![Dimension::Region, Dimension::Service]
}
