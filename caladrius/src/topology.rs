use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cuckoo::CuckooError;
use crate::heron::HeronMetricsClient;
use crate::model::{ArrivalRate, CompleteLatency, EmitCount, ExecuteCount, ReceiveCount, ServiceTime};

/// Reference to the version of a topology's logical and physical plan held in the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyRef(String);

impl TopologyRef {
    pub fn new(rep: impl Into<String>) -> Self {
        Self(rep.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TopologyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for TopologyRef {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("topology {topology_id} not found in graph store for cluster {cluster}, environ {environ}")]
    NotFound {
        cluster: String,
        environ: String,
        topology_id: String,
    },

    #[error("graph store failure: {0}")]
    Graph(#[source] anyhow::Error),
}

/// Handle on the topology graph store. Only consulted to confirm a topology is known before its
/// metrics are gathered.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TopologyGraph: Send + Sync {
    async fn check_topology(&self, cluster: &str, environ: &str, topology_id: &str) -> Result<TopologyRef, TopologyError>;
}

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("{0}")]
    Topology(#[from] TopologyError),

    #[error("failed to retrieve topology metrics: {0}")]
    Metrics(#[from] CuckooError),
}

impl PerformanceError {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Topology(TopologyError::NotFound { .. }) => "topology::not_found",
            Self::Topology(TopologyError::Graph(_)) => "topology::graph",
            Self::Metrics(err) => err.label(),
        }
    }
}

/// Identifies the topology and window of a performance gathering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformanceRequest {
    pub cluster: String,
    pub environ: String,
    pub topology_id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub granularity: Option<String>,
}

/// Every metric table of a topology over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyPerformance {
    pub topology_id: String,
    pub topology_ref: TopologyRef,
    pub service_times: Vec<ServiceTime>,
    pub execute_counts: Vec<ExecuteCount>,
    pub emit_counts: Vec<EmitCount>,
    pub receive_counts: Vec<ReceiveCount>,
    pub complete_latencies: Vec<CompleteLatency>,
    pub arrival_rates: Vec<ArrivalRate>,
}

impl TopologyPerformance {
    /// Confirms the topology with the graph store, then retrieves all six metric tables
    /// concurrently. The first failure aborts the gathering.
    #[tracing::instrument(level = "info", skip(graph, metrics))]
    pub async fn gather<G, M>(graph: &G, metrics: &M, request: &PerformanceRequest) -> Result<Self, PerformanceError>
    where
        G: TopologyGraph + ?Sized,
        M: HeronMetricsClient + ?Sized,
    {
        let topology_id = request.topology_id.as_str();
        let topology_ref = graph
            .check_topology(request.cluster.as_str(), request.environ.as_str(), topology_id)
            .await
            .map_err(|err| {
                tracing::warn!(error=?err, %topology_id, "topology check failed");
                err
            })?;
        tracing::debug!(%topology_ref, "topology confirmed in graph store - gathering metrics");

        let (start, end, granularity) = (request.start, request.end, request.granularity.as_deref());
        let (service_times, execute_counts, emit_counts, receive_counts, complete_latencies, arrival_rates) = tokio::try_join!(
            metrics.get_service_times(topology_id, start, end, granularity),
            metrics.get_execute_counts(topology_id, start, end, granularity),
            metrics.get_emit_counts(topology_id, start, end, granularity),
            metrics.get_receive_counts(topology_id, start, end, granularity),
            metrics.get_complete_latencies(topology_id, start, end, granularity),
            metrics.get_arrival_rates(topology_id, start, end, granularity),
        )?;

        tracing::info!(
            nr_service_times=%service_times.len(), nr_execute_counts=%execute_counts.len(),
            nr_emit_counts=%emit_counts.len(), nr_receive_counts=%receive_counts.len(),
            nr_complete_latencies=%complete_latencies.len(), nr_arrival_rates=%arrival_rates.len(),
            "gathered topology performance"
        );

        Ok(Self {
            topology_id: topology_id.to_string(),
            topology_ref,
            service_times,
            execute_counts,
            emit_counts,
            receive_counts,
            complete_latencies,
            arrival_rates,
        })
    }
}
