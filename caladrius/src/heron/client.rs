use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::extract::extract_table;
use crate::cuckoo::{CuckooContext, CuckooError};
use crate::model::{ArrivalRate, CompleteLatency, EmitCount, ExecuteCount, ReceiveCount, ServiceTime};

/// Retrieves normalized Heron metric tables for a topology. Every table accepts an optional
/// window: `start` and `end` bound it, and `granularity` is one of `m`, `h` or `d` (default `m`).
#[async_trait]
pub trait HeronMetricsClient: Send + Sync {
    /// Average execute latency, in milliseconds, per instance, source component and stream.
    async fn get_service_times(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ServiceTime>, CuckooError>;

    async fn get_execute_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ExecuteCount>, CuckooError>;

    /// Tuples emitted per instance and stream. Entries without data points are dropped.
    async fn get_emit_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<EmitCount>, CuckooError>;

    async fn get_receive_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ReceiveCount>, CuckooError>;

    /// Average spout complete latency, in milliseconds, per instance and stream.
    async fn get_complete_latencies(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<CompleteLatency>, CuckooError>;

    /// Gateway arrivals per instance, in tuples per second over the granularity period.
    async fn get_arrival_rates(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ArrivalRate>, CuckooError>;
}

#[async_trait]
impl HeronMetricsClient for CuckooContext {
    async fn get_service_times(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ServiceTime>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }

    async fn get_execute_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ExecuteCount>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }

    async fn get_emit_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<EmitCount>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }

    async fn get_receive_counts(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ReceiveCount>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }

    async fn get_complete_latencies(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<CompleteLatency>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }

    async fn get_arrival_rates(
        &self, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
        granularity: Option<&str>,
    ) -> Result<Vec<ArrivalRate>, CuckooError> {
        extract_table(self, topology_id, start, end, granularity).await
    }
}
