mod client;
mod extract;
mod query;

pub use client::HeronMetricsClient;
pub use extract::{extract_table, table_from_response, FromDataPoint};
pub use query::{Aggregation, MetricKind};
