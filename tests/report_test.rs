//! Tests for the cost report builders

mod common;

use chrono::NaiveDate;
use serde_json::json;
use spyglass::error::CostExplorerError;
use spyglass::report::{detailed_breakdown_by_day, ec2_spend_last_day, BreakdownReport};
use spyglass::service::{CostFilter, Dimension, TimeRange};

use common::{
    is_top_level, region_service_day, response, single_key_day, MockCostExplorer,
};

const EC2: &str = "Amazon Elastic Compute Cloud - Compute";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Daily EC2 snapshot
// ============================================================================

#[tokio::test]
async fn test_snapshot_total_matches_group_sum() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2024-06-09", "End": "2024-06-10"},
            "Groups": [
                {"Keys": ["t3.micro"], "Metrics": {
                    "UnblendedCost": {"Amount": "1.23456", "Unit": "USD"},
                    "UsageQuantity": {"Amount": "24", "Unit": "Hrs"}}},
                {"Keys": ["m5.large"], "Metrics": {
                    "UnblendedCost": {"Amount": "2.5", "Unit": "USD"},
                    "UsageQuantity": {"Amount": "12.5", "Unit": "Hrs"}}},
                {"Keys": ["c5.xlarge"], "Metrics": {
                    "UnblendedCost": {"Amount": "0.1", "Unit": "USD"},
                    "UsageQuantity": {"Amount": "1", "Unit": "Hrs"}}}
            ],
            "Estimated": true
        }]
    })));

    let snapshot = ec2_spend_last_day(&explorer, today()).await;

    assert!(snapshot.is_available());
    assert!(snapshot
        .summary
        .starts_with("EC2 Spend from 2024-06-09 to 2024-06-10:"));
    assert!(snapshot.summary.contains("Instance Type: t3.micro"));
    assert!(snapshot.summary.contains("Cost: 1.2346 USD"));
    assert!(snapshot.summary.contains("Usage: 12.50"));
    assert!(snapshot.summary.contains("Total EC2 Cost: 3.8346 USD"));
    assert!(snapshot
        .summary
        .ends_with("Note: These results are estimated"));
}

#[tokio::test]
async fn test_snapshot_query_shape() {
    let explorer = MockCostExplorer::fixed(response(json!({"ResultsByTime": []})));

    ec2_spend_last_day(&explorer, today()).await;

    let queries = explorer.queries();
    assert_eq!(queries.len(), 1);
    let query = &queries[0];
    assert_eq!(
        query.time_period,
        TimeRange {
            start: date("2024-06-09"),
            end: date("2024-06-10")
        }
    );
    assert_eq!(query.group_by, vec![Dimension::InstanceType]);
    assert_eq!(query.metrics, vec!["UnblendedCost", "UsageQuantity"]);
    assert_eq!(
        query.filter,
        Some(CostFilter::dimension(Dimension::Service, EC2))
    );
}

#[tokio::test]
async fn test_snapshot_falls_back_to_period_total() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2024-06-09", "End": "2024-06-10"},
            "Total": {"UnblendedCost": {"Amount": "4.2", "Unit": "USD"}},
            "Groups": [],
            "Estimated": false
        }]
    })));

    let snapshot = ec2_spend_last_day(&explorer, today()).await;

    assert!(snapshot.summary.contains("Total EC2 Cost: 4.2000 USD"));
    assert!(snapshot.summary.contains("Note: These results are final"));
}

#[tokio::test]
async fn test_snapshot_reports_no_costs() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2024-06-09", "End": "2024-06-10"},
            "Groups": []
        }]
    })));

    let snapshot = ec2_spend_last_day(&explorer, today()).await;

    assert!(snapshot.is_available());
    assert!(snapshot
        .summary
        .contains("No EC2 costs found for this period"));
    assert!(!snapshot.summary.contains("Total EC2 Cost"));
}

#[tokio::test]
async fn test_snapshot_upstream_failure_is_unavailable() {
    let explorer = MockCostExplorer::failing("AccessDeniedException: not authorized");

    let snapshot = ec2_spend_last_day(&explorer, today()).await;

    assert!(!snapshot.is_available());
    assert!(snapshot.response.is_none());
    assert_eq!(
        snapshot.summary,
        "Error retrieving EC2 cost data: AccessDeniedException: not authorized"
    );
}

#[tokio::test]
async fn test_snapshot_missing_metric_is_unavailable() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [{
            "TimePeriod": {"Start": "2024-06-09", "End": "2024-06-10"},
            "Groups": [{"Keys": ["t3.micro"], "Metrics": {
                "UnblendedCost": {"Amount": "1", "Unit": "USD"}}}]
        }]
    })));

    let snapshot = ec2_spend_last_day(&explorer, today()).await;

    assert!(!snapshot.is_available());
    assert!(snapshot.summary.contains("UsageQuantity"));
}

// ============================================================================
// Detailed breakdown
// ============================================================================

#[tokio::test]
async fn test_breakdown_one_section_per_day() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [
            region_service_day("2024-06-07", &[("us-east-1", "Amazon S3", 1.0)]),
            region_service_day("2024-06-08", &[]),
            region_service_day("2024-06-09", &[("us-east-1", "AWS Lambda", 0.5)]),
        ]
    })));

    let report = detailed_breakdown_by_day(&explorer, today(), 3).await;

    let sections = report.lines().filter(|l| l.starts_with("Date: ")).count();
    assert_eq!(sections, 3);
    assert!(report.contains(
        "Detailed Cost Breakdown by Region, Service, and Instance Type (3 days):"
    ));
    assert!(report.contains(
        "Date: 2024-06-08\n==================================================\nNo data found for this date"
    ));
}

#[tokio::test]
async fn test_breakdown_top_level_query() {
    let explorer = MockCostExplorer::fixed(response(json!({"ResultsByTime": []})));

    detailed_breakdown_by_day(&explorer, today(), 7).await;

    let queries = explorer.queries();
    assert_eq!(queries.len(), 1);
    assert!(is_top_level(&queries[0]));
    assert_eq!(queries[0].time_period.start, date("2024-06-03"));
    assert_eq!(queries[0].time_period.end, date("2024-06-10"));
    assert_eq!(queries[0].metrics, vec!["UnblendedCost"]);
    assert!(queries[0].filter.is_none());
}

#[tokio::test]
async fn test_breakdown_regions_sorted() {
    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [region_service_day("2024-06-09", &[
            ("us-west-2", "Amazon S3", 1.0),
            ("eu-west-1", "Amazon S3", 2.0),
            ("us-east-1", "Amazon S3", 3.0),
        ])]
    })));

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    let regions: Vec<&str> = report
        .lines()
        .filter_map(|l| l.strip_prefix("Region: "))
        .collect();
    assert_eq!(regions, vec!["eu-west-1", "us-east-1", "us-west-2"]);
}

#[tokio::test]
async fn test_breakdown_top_five_with_rollup() {
    let costs = [50.0, 40.0, 30.0, 20.0, 10.0, 5.0, 3.0, 1.0];
    let names: Vec<String> = (0..costs.len()).map(|i| format!("Service {}", i)).collect();
    let groups: Vec<(&str, &str, f64)> = names
        .iter()
        .zip(costs)
        .map(|(n, c)| ("us-east-1", n.as_str(), c))
        .collect();

    let explorer = MockCostExplorer::fixed(response(json!({
        "ResultsByTime": [region_service_day("2024-06-09", &groups)]
    })));

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    for shown in &names[..5] {
        assert!(report.contains(shown.as_str()), "missing {}", shown);
    }
    for hidden in &names[5..] {
        assert!(!report.contains(hidden.as_str()), "unexpected {}", hidden);
    }
    assert!(report.contains("... and 3 more services totaling 9.00 USD"));

    let rows: Vec<&str> = report.lines().filter(|l| l.starts_with("| Service ")).collect();
    assert_eq!(rows.len(), 5);
    assert!(rows[0].contains("50.00"));
    assert!(rows[4].contains("10.00"));
}

#[tokio::test]
async fn test_breakdown_ec2_instance_breakdown() {
    let explorer = MockCostExplorer::new(|query| {
        if is_top_level(query) {
            Ok(response(json!({
                "ResultsByTime": [region_service_day("2024-06-09", &[
                    ("us-east-1", EC2, 12.0),
                    ("us-east-1", "Amazon S3", 1.0),
                ])]
            })))
        } else {
            Ok(response(json!({
                "ResultsByTime": [single_key_day("2024-06-09", &[
                    ("t3.micro", 2.0),
                    ("m5.large", 10.0),
                ])]
            })))
        }
    });

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    assert!(report
        .contains("\n  EC2 Instance Type Breakdown:\n  --------------------------------------\n"));
    assert!(report.contains("  | Instance Type | Cost  |"));
    let m5 = report.find("| m5.large").unwrap();
    let t3 = report.find("| t3.micro").unwrap();
    assert!(m5 < t3, "instance types sorted by cost");

    let queries = explorer.queries();
    assert_eq!(queries.len(), 2);
    let nested = &queries[1];
    assert_eq!(nested.group_by, vec![Dimension::InstanceType]);
    assert_eq!(nested.time_period.start, date("2024-06-09"));
    assert_eq!(nested.time_period.end, date("2024-06-10"));
    assert_eq!(
        nested.filter,
        Some(CostFilter::And(vec![
            CostFilter::dimension(Dimension::Region, "us-east-1"),
            CostFilter::dimension(Dimension::Service, EC2),
        ]))
    );
}

#[tokio::test]
async fn test_breakdown_nested_failure_is_isolated() {
    let explorer = MockCostExplorer::new(|query| {
        if is_top_level(query) {
            Ok(response(json!({
                "ResultsByTime": [region_service_day("2024-06-09", &[
                    ("eu-west-1", EC2, 12.0),
                    ("us-east-1", "Amazon S3", 1.0),
                ])]
            })))
        } else {
            Err(CostExplorerError::Service("ThrottlingException".to_string()))
        }
    });

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    assert!(!report.starts_with("Error retrieving detailed breakdown"));
    assert!(report.contains("Region: eu-west-1"));
    assert!(report.contains(EC2));
    assert!(report.contains(
        "  Note: Could not retrieve EC2 instance type breakdown: ThrottlingException"
    ));
    assert!(!report.contains("EC2 Instance Type Breakdown:"));
    // The next region still renders
    assert!(report.contains("Region: us-east-1"));
    assert!(report.contains("Amazon S3"));
}

#[tokio::test]
async fn test_breakdown_sagemaker_instance_and_usage() {
    let explorer = MockCostExplorer::new(|query| {
        if is_top_level(query) {
            return Ok(response(json!({
                "ResultsByTime": [region_service_day("2024-06-09", &[
                    ("us-west-2", "Amazon SageMaker", 7.0),
                ])]
            })));
        }
        match query.group_by.as_slice() {
            [Dimension::InstanceType] => Ok(response(json!({
                "ResultsByTime": [single_key_day("2024-06-09", &[("ml.t3.medium", 7.0)])]
            }))),
            [Dimension::UsageType] => Ok(response(json!({
                "ResultsByTime": [single_key_day("2024-06-09", &[
                    ("USW2-Notebk:ml.t3.medium", 4.0),
                    ("USW2-Host:ml.t3.medium", 3.0),
                ])]
            }))),
            other => panic!("unexpected grouping {:?}", other),
        }
    });

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    assert!(report.contains("  SageMaker Instance Type Breakdown:"));
    assert!(report.contains("  SageMaker Usage Type Breakdown:"));
    assert!(report.contains("USW2-Notebk:ml.t3.medium"));
    assert!(report.contains("USW2-Host:ml.t3.medium"));
    assert!(!report.contains("EC2 Instance Type Breakdown"));
    assert_eq!(explorer.queries().len(), 3);
}

#[tokio::test]
async fn test_breakdown_sagemaker_failure_note() {
    let explorer = MockCostExplorer::new(|query| {
        if is_top_level(query) {
            Ok(response(json!({
                "ResultsByTime": [region_service_day("2024-06-09", &[
                    ("us-west-2", "Amazon SageMaker", 7.0),
                ])]
            })))
        } else {
            Err(CostExplorerError::Service("boom".to_string()))
        }
    });

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    assert!(report.contains("  Note: Could not retrieve SageMaker breakdown: boom"));
    assert!(report.contains("Amazon SageMaker"));
}

#[tokio::test]
async fn test_breakdown_empty_nested_result_renders_nothing() {
    let explorer = MockCostExplorer::new(|query| {
        if is_top_level(query) {
            Ok(response(json!({
                "ResultsByTime": [region_service_day("2024-06-09", &[("us-east-1", EC2, 1.0)])]
            })))
        } else {
            Ok(response(json!({
                "ResultsByTime": [single_key_day("2024-06-09", &[])]
            })))
        }
    });

    let report = detailed_breakdown_by_day(&explorer, today(), 1).await;

    assert!(!report.contains("EC2 Instance Type Breakdown"));
    assert!(!report.contains("Note:"));
}

#[tokio::test]
async fn test_breakdown_top_level_failure_returns_error_text() {
    let explorer = MockCostExplorer::failing("ExpiredTokenException");

    let report = detailed_breakdown_by_day(&explorer, today(), 7).await;

    assert_eq!(
        report,
        "Error retrieving detailed breakdown: ExpiredTokenException"
    );
}

#[tokio::test]
async fn test_breakdown_rejects_zero_days() {
    let explorer = MockCostExplorer::fixed(response(json!({"ResultsByTime": []})));

    let result = BreakdownReport::new(&explorer).build(today(), 0).await;

    assert!(matches!(result, Err(CostExplorerError::InvalidQuery(_))));
    assert!(explorer.queries().is_empty());
}
