//! Upstream clients: AWS Cost Explorer, Google search, page fetching

pub mod aws;
pub mod cost_explorer;
pub mod google;
pub mod page;

pub use aws::AwsCostExplorer;
pub use cost_explorer::{
    CostAndUsageResponse, CostExplorer, CostFilter, CostGroup, CostQuery, DateInterval, Dimension,
    MetricValue, ResultByTime, TimeRange,
};
pub use google::{GoogleSearch, SearchProvider};
pub use page::PageFetcher;
