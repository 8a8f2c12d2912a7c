use chrono::{DateTime, Utc};

use super::MetricKind;
use crate::cuckoo::{self, CuckooContext, CuckooError, QueryResponse, TimeseriesEntry};
use crate::model::{
    is_system_instance, ArrivalRate, CompleteLatency, EmitCount, ExecuteCount, MetricDetail, ReceiveCount,
    ServiceTime, TimeWindow,
};

const NANOS_PER_MILLI: f64 = 1_000_000.0;

const SKIP_SYSTEM: &str = "system";
const SKIP_EMPTY: &str = "empty";
const SKIP_MALFORMED: &str = "malformed";

/// A table row built from one data point of a decoded timeseries entry.
pub trait FromDataPoint: Sized {
    const KIND: MetricKind;

    /// Entries without data points are skipped before their paths are decoded.
    const SKIP_EMPTY_ENTRIES: bool = false;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, window: &TimeWindow,
    ) -> Result<Self, CuckooError>;
}

/// Resolves the window, runs the kind's query and converts the response into a table. Transport
/// and query failures abort the call; individual entries that cannot be decoded are skipped.
#[tracing::instrument(level = "info", skip(context), fields(metric_kind=%R::KIND))]
pub async fn extract_table<R>(
    context: &CuckooContext, topology_id: &str, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>,
    granularity: Option<&str>,
) -> Result<Vec<R>, CuckooError>
where
    R: FromDataPoint,
{
    let window = TimeWindow::resolve(start, end, granularity)?;
    let query = R::KIND.query_for(topology_id);
    let body = context.query(query.as_str(), R::KIND.query_name(), &window).await?;
    let response = QueryResponse::from_json(body)?;
    let table = table_from_response(response, &window);
    tracing::info!(nr_records=%table.len(), %topology_id, "extracted {} table", R::KIND);
    Ok(table)
}

/// Converts every usable entry of the response into records, preserving arrival order.
pub fn table_from_response<R>(response: QueryResponse, window: &TimeWindow) -> Vec<R>
where
    R: FromDataPoint,
{
    let mut table = Vec::new();

    for raw_entry in response.timeseries {
        match records_from_entry(raw_entry, window) {
            Ok(Some(records)) => table.extend(records),
            Ok(None) => {},
            Err(error) => {
                tracing::warn!(?error, metric_kind=%R::KIND, "skipping malformed timeseries entry");
                cuckoo::track_skipped_entry(R::KIND.as_ref(), SKIP_MALFORMED);
            },
        }
    }

    table
}

fn records_from_entry<R>(raw_entry: serde_json::Value, window: &TimeWindow) -> Result<Option<Vec<R>>, CuckooError>
where
    R: FromDataPoint,
{
    let entry: TimeseriesEntry = serde_json::from_value(raw_entry)?;

    let instance_tag = entry
        .source
        .primary_source()
        .ok_or_else(|| CuckooError::malformed("", "timeseries entry has no sources"))?;

    if is_system_instance(instance_tag) {
        tracing::debug!(%instance_tag, metric_kind=%R::KIND, "skipping metrics for system element");
        cuckoo::track_skipped_entry(R::KIND.as_ref(), SKIP_SYSTEM);
        return Ok(None);
    }

    if R::SKIP_EMPTY_ENTRIES && entry.data.is_empty() {
        tracing::debug!(
            %instance_tag, metric=?entry.source.primary_metric(), metric_kind=%R::KIND,
            "skipping empty metric for element"
        );
        cuckoo::track_skipped_entry(R::KIND.as_ref(), SKIP_EMPTY);
        return Ok(None);
    }

    let detail = MetricDetail::decode(&entry.source)?;
    tracing::trace!(?detail, nr_points=%entry.data.len(), "processing {} metrics for instance", R::KIND);

    entry
        .data
        .iter()
        .map(|point| R::from_data_point(point.timestamp()?, &detail, point.value(), window))
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn required<T>(field: Option<T>, name: &str, detail: &MetricDetail) -> Result<T, CuckooError> {
    field.ok_or_else(|| {
        CuckooError::malformed(
            format!("{:?}", detail.path),
            format!("metric path does not carry a {name}"),
        )
    })
}

#[inline]
fn as_count(value: f64) -> i64 {
    value as i64
}

impl FromDataPoint for ServiceTime {
    const KIND: MetricKind = MetricKind::ServiceTime;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, _window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            source_component: required(detail.source_component(), "source component", detail)?.to_string(),
            stream: required(detail.stream(), "stream", detail)?.to_string(),
            latency_ms: value / NANOS_PER_MILLI,
        })
    }
}

impl FromDataPoint for ExecuteCount {
    const KIND: MetricKind = MetricKind::ExecuteCount;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, _window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            source_component: required(detail.source_component(), "source component", detail)?.to_string(),
            stream: required(detail.stream(), "stream", detail)?.to_string(),
            execute_count: as_count(value),
        })
    }
}

impl FromDataPoint for EmitCount {
    // some emit count entries refer to emissions onto incoming streams and carry no data
    const SKIP_EMPTY_ENTRIES: bool = true;
    const KIND: MetricKind = MetricKind::EmitCount;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, _window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            stream: required(detail.stream(), "stream", detail)?.to_string(),
            emit_count: as_count(value),
        })
    }
}

impl FromDataPoint for ReceiveCount {
    const KIND: MetricKind = MetricKind::ReceiveCount;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, _window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            source_component: required(detail.source_component(), "source component", detail)?.to_string(),
            source_task: required(detail.source_task(), "source task", detail)?,
            stream: required(detail.stream(), "stream", detail)?.to_string(),
            receive_count: as_count(value),
        })
    }
}

impl FromDataPoint for CompleteLatency {
    const KIND: MetricKind = MetricKind::CompleteLatency;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, _window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            stream: required(detail.stream(), "stream", detail)?.to_string(),
            complete_latency_ms: value / NANOS_PER_MILLI,
        })
    }
}

impl FromDataPoint for ArrivalRate {
    const KIND: MetricKind = MetricKind::ArrivalRate;

    fn from_data_point(
        timestamp: DateTime<Utc>, detail: &MetricDetail, value: f64, window: &TimeWindow,
    ) -> Result<Self, CuckooError> {
        Ok(Self {
            timestamp,
            instance: detail.instance.clone(),
            arrival_rate_tps: value / window.granularity().period_secs() as f64,
        })
    }
}
