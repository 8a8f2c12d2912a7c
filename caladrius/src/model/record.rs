use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::InstanceRef;

/// Execute latency of an instance for tuples from one source component and stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTime {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub source_component: String,
    pub stream: String,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteCount {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub source_component: String,
    pub stream: String,
    pub execute_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitCount {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub stream: String,
    pub emit_count: i64,
}

/// Tuples received by an instance from a specific source task. This is not a default Heron
/// metric; topologies must register a custom metric to supply it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveCount {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub source_component: String,
    pub source_task: i64,
    pub stream: String,
    pub receive_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteLatency {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub stream: String,
    pub complete_latency_ms: f64,
}

/// Tuple arrival rate at an instance's gateway thread, in tuples per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalRate {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub instance: InstanceRef,
    pub arrival_rate_tps: f64,
}
