mod instance;
mod record;
mod window;

pub use instance::{is_system_instance, InstanceRef, MetricDetail, MetricPath, SYSTEM_INSTANCE_MARKER};
pub use record::{ArrivalRate, CompleteLatency, EmitCount, ExecuteCount, ReceiveCount, ServiceTime};
pub use window::{Granularity, TimeWindow};
