//! Cost report builders

pub mod breakdown;
pub mod snapshot;
pub mod table;

pub use breakdown::{detailed_breakdown_by_day, BreakdownReport, DEFAULT_DAYS, TOP_SERVICES};
pub use snapshot::{ec2_spend_last_day, summarize_ec2_spend, SpendSnapshot};
pub use table::{BreakdownTable, Rollup};
