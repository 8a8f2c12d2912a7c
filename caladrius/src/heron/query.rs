use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Aggregation applied by Cuckoo across the instances matched by a query within each bucket.
#[derive(Debug, Display, AsRefStr, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Avg,
    Sum,
}

/// The Heron metric families gathered into tables.
#[derive(
    Debug, Display, AsRefStr, EnumString, EnumIter, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    ServiceTime,
    ExecuteCount,
    EmitCount,
    ReceiveCount,
    CompleteLatency,
    ArrivalRate,
}

struct QueryTemplate {
    aggregation: Option<Aggregation>,
    metric_pattern: &'static str,
    query_name: &'static str,
}

impl MetricKind {
    const fn template(&self) -> QueryTemplate {
        match self {
            Self::ServiceTime => QueryTemplate {
                aggregation: Some(Aggregation::Avg),
                metric_pattern: "__execute-latency/*/*",
                query_name: "execute latency",
            },
            Self::ExecuteCount => QueryTemplate {
                aggregation: Some(Aggregation::Sum),
                metric_pattern: "__execute-count/*/*",
                query_name: "execute count",
            },
            Self::EmitCount => QueryTemplate {
                aggregation: Some(Aggregation::Sum),
                metric_pattern: "__emit-count/*",
                query_name: "emit counts",
            },
            Self::ReceiveCount => QueryTemplate {
                aggregation: None,
                metric_pattern: "receive-count/*/*/*",
                query_name: "receive-counts",
            },
            Self::CompleteLatency => QueryTemplate {
                aggregation: Some(Aggregation::Avg),
                metric_pattern: "__complete-latency/*",
                query_name: "complete latency",
            },
            Self::ArrivalRate => QueryTemplate {
                aggregation: Some(Aggregation::Sum),
                metric_pattern: "__gateway-received-packets-count",
                query_name: "instance arrival counts",
            },
        }
    }

    /// Latency kinds average, count kinds sum; receive count is queried as a raw timeseries.
    pub const fn aggregation(&self) -> Option<Aggregation> {
        self.template().aggregation
    }

    pub const fn query_name(&self) -> &'static str {
        self.template().query_name
    }

    /// Formats the Cuckoo query for this kind over every instance of the topology.
    pub fn query_for(&self, topology_id: &str) -> String {
        let template = self.template();
        match template.aggregation {
            Some(agg) => format!(
                "ts({agg}, heron/{topology_id}, /*/*, {pattern})",
                pattern = template.metric_pattern
            ),
            None => format!(
                "ts(heron/{topology_id}, /*/*, {pattern})",
                pattern = template.metric_pattern
            ),
        }
    }
}
