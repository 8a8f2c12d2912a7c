use serde::{Deserialize, Serialize};

use crate::cuckoo::{CuckooError, SourceDescriptor};

/// Marks the source paths of infrastructure-managed instances, e.g., `__stmgr__`.
pub const SYSTEM_INSTANCE_MARKER: &str = "__";

const RECEIVED_PACKETS_COUNT: &str = "received-packets-count";
const RECEIVE_COUNT: &str = "receive-count";
const EMIT_COUNT: &str = "emit-count";
const COMPLETE_LATENCY: &str = "complete-latency";

pub fn is_system_instance(source_path: &str) -> bool {
    source_path.contains(SYSTEM_INSTANCE_MARKER)
}

/// One running instance of one logical topology component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceRef {
    pub component: String,
    pub task: i64,
    pub container: i64,
}

impl InstanceRef {
    /// Decodes a source path such as `topology/split/container_1_split_5`: the component is the
    /// second segment and the third segment carries the container and task ids at underscore
    /// positions 1 and 3.
    pub fn from_source_path(path: &str) -> Result<Self, CuckooError> {
        let segments: Vec<&str> = path.split('/').collect();
        let (component, instance) = match segments.as_slice() {
            [_, component, instance, ..] => (*component, *instance),
            _ => return Err(CuckooError::malformed(path, "expected at least 3 '/' delimited segments")),
        };

        let parts: Vec<&str> = instance.split('_').collect();
        let (container, task) = match parts.as_slice() {
            [_, container, _, task, ..] => (*container, *task),
            _ => {
                return Err(CuckooError::malformed(
                    path,
                    "expected at least 4 '_' delimited instance segments",
                ))
            },
        };

        Ok(Self {
            component: component.to_string(),
            container: parse_id(path, "container", container)?,
            task: parse_id(path, "task", task)?,
        })
    }
}

/// Kind dependent meaning of the segments trailing a metric name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricPath {
    /// `__gateway-received-packets-count`
    Instance,

    /// `receive-count/<source component>/<source task>/<stream>`
    Receive {
        source_component: String,
        source_task: i64,
        stream: String,
    },

    /// `__emit-count/<stream>` and `__complete-latency/<stream>`
    Stream { stream: String },

    /// `__execute-count/<source component>/<stream>` and `__execute-latency/...`
    Execute { source_component: String, stream: String },
}

impl MetricPath {
    pub fn parse(path: &str) -> Result<Self, CuckooError> {
        let segments: Vec<&str> = path.split('/').collect();
        let name = segments.first().copied().unwrap_or_default();

        if name.contains(RECEIVED_PACKETS_COUNT) {
            return Ok(Self::Instance);
        }

        let too_short = |expected: usize| {
            CuckooError::malformed(
                path,
                format!("expected at least {expected} '/' delimited segments for {name} metric"),
            )
        };

        if name.contains(RECEIVE_COUNT) {
            match segments.as_slice() {
                [_, source_component, source_task, stream, ..] => Ok(Self::Receive {
                    source_component: source_component.to_string(),
                    source_task: parse_id(path, "source task", source_task)?,
                    stream: stream.to_string(),
                }),
                _ => Err(too_short(4)),
            }
        } else if name.contains(EMIT_COUNT) || name.contains(COMPLETE_LATENCY) {
            match segments.as_slice() {
                [_, stream, ..] => Ok(Self::Stream { stream: stream.to_string() }),
                _ => Err(too_short(2)),
            }
        } else {
            match segments.as_slice() {
                [_, source_component, stream, ..] => Ok(Self::Execute {
                    source_component: source_component.to_string(),
                    stream: stream.to_string(),
                }),
                _ => Err(too_short(3)),
            }
        }
    }
}

/// Decoded identity of a single timeseries entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDetail {
    pub instance: InstanceRef,
    pub path: MetricPath,
}

impl MetricDetail {
    /// Decodes the first source and first metric path of a timeseries entry's source descriptor.
    /// System instances are expected to have been filtered out before decoding.
    pub fn decode(descriptor: &SourceDescriptor) -> Result<Self, CuckooError> {
        let source = descriptor
            .primary_source()
            .ok_or_else(|| CuckooError::malformed("", "timeseries entry has no sources"))?;
        let metric = descriptor
            .primary_metric()
            .ok_or_else(|| CuckooError::malformed(source, "timeseries entry has no metrics"))?;

        Ok(Self {
            instance: InstanceRef::from_source_path(source)?,
            path: MetricPath::parse(metric)?,
        })
    }

    pub fn source_component(&self) -> Option<&str> {
        match &self.path {
            MetricPath::Receive { source_component, .. } | MetricPath::Execute { source_component, .. } => {
                Some(source_component.as_str())
            },
            MetricPath::Instance | MetricPath::Stream { .. } => None,
        }
    }

    pub const fn source_task(&self) -> Option<i64> {
        match &self.path {
            MetricPath::Receive { source_task, .. } => Some(*source_task),
            _ => None,
        }
    }

    pub fn stream(&self) -> Option<&str> {
        match &self.path {
            MetricPath::Receive { stream, .. } | MetricPath::Stream { stream } | MetricPath::Execute { stream, .. } => {
                Some(stream.as_str())
            },
            MetricPath::Instance => None,
        }
    }
}

fn parse_id(path: &str, field: &str, rep: &str) -> Result<i64, CuckooError> {
    rep.parse()
        .map_err(|err| CuckooError::malformed(path, format!("{field} id {rep:?} is not an integer: {err}")))
}
