mod context;
mod error;
mod model;

pub use context::CuckooContext;
pub use error::CuckooError;
pub use model::{DataPoint, QueryResponse, SourceDescriptor, TimeseriesEntry, STATUS_SUCCESS};

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramTimer, HistogramVec, IntCounterVec, Opts};

pub(crate) const SERVICES: &str = "services";
pub(crate) const SOURCES: &str = "sources";
pub(crate) const METRICS: &str = "metrics";
pub(crate) const QUERY: &str = "query";

#[allow(clippy::cognitive_complexity)]
pub(crate) fn log_response(label: &str, endpoint: &url::Url, response: &reqwest::Response) {
    const PREAMBLE: &str = "cuckoo response received";
    let status = response.status();
    if status.is_success() || status.is_informational() {
        tracing::debug!(%endpoint, ?response, "{PREAMBLE}: {label}");
    } else if status.is_client_error() {
        tracing::warn!(%endpoint, ?response, "{PREAMBLE}: {label}");
    } else {
        tracing::error!(%endpoint, ?response, "{PREAMBLE}: {label}");
    }
}

pub static CUCKOO_QUERY_TIME: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("cuckoo_query_time", "Time spent querying the Cuckoo database in seconds")
            .buckets(vec![0.1, 0.15, 0.2, 0.3, 0.4, 0.5, 1.0, 2.5, 5.0, 7.5, 10.0]),
        &["action"],
    )
    .expect("failed creating cuckoo_query_time metric")
});

#[inline]
pub(crate) fn start_cuckoo_query_timer(label: &str) -> HistogramTimer {
    CUCKOO_QUERY_TIME.with_label_values(&[label]).start_timer()
}

pub static CUCKOO_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cuckoo_errors", "Number of errors calling the Cuckoo API"),
        &["action", "error_type"],
    )
    .expect("failed creating cuckoo_errors metric")
});

pub static CUCKOO_SKIPPED_ENTRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cuckoo_skipped_entries",
            "Number of Cuckoo timeseries entries contributing no records",
        ),
        &["metric_kind", "reason"],
    )
    .expect("failed creating cuckoo_skipped_entries metric")
});

#[inline]
pub(crate) fn track_result<T>(label: &str, result: Result<T, CuckooError>, error_message: &str) -> Result<T, CuckooError> {
    if let Err(ref err) = result {
        tracing::error!(error=?err, "{}", error_message);
        track_cuckoo_errors(label, err);
    }

    result
}

#[inline]
pub(crate) fn track_cuckoo_errors(action: &str, error: &CuckooError) {
    CUCKOO_ERRORS.with_label_values(&[action, error.label()]).inc()
}

#[inline]
pub(crate) fn track_skipped_entry(metric_kind: &str, reason: &str) {
    CUCKOO_SKIPPED_ENTRIES.with_label_values(&[metric_kind, reason]).inc()
}
