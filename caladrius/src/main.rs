use std::future::Future;

use caladrius::cuckoo::CuckooContext;
use caladrius::heron::{HeronMetricsClient, MetricKind};
use caladrius::logging::{get_subscriber, init_subscriber};
use caladrius::settings::{CliOptions, Command, Settings};
use caladrius::Result;
use clap::Parser;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;

static METRICS_REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("caladrius".to_string()), None).expect("failed to create prometheus registry")
});

fn main() -> Result<()> {
    // stdout carries command output
    let subscriber = get_subscriber("caladrius", "warn", std::io::stderr);
    init_subscriber(subscriber);

    let main_span = tracing::trace_span!("main");
    let _main_span_guard = main_span.enter();

    let options = CliOptions::parse();
    let settings = Settings::load(&options)?;
    caladrius::metrics::register_metrics(&METRICS_REGISTRY)?;

    let context = CuckooContext::from_settings(&settings.cuckoo)?;
    let outcome = start_runtime(run_command(context, options.command.clone()));

    if options.emit_metrics {
        emit_metrics()?;
    }

    let output = outcome?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tracing::instrument(level = "info", skip(context))]
async fn run_command(context: CuckooContext, command: Command) -> Result<serde_json::Value> {
    let output = match command {
        Command::Services => serde_json::to_value(context.get_services().await?)?,
        Command::Topologies => serde_json::to_value(context.get_heron_topology_names().await?)?,
        Command::Sources { service } => serde_json::to_value(context.get_sources(service.as_str()).await?)?,
        Command::Metrics { service, source } => {
            serde_json::to_value(context.get_metrics(service.as_str(), source.as_str()).await?)?
        },
        Command::Table { kind, topology, start, end, granularity } => {
            let topology_id = topology.as_str();
            let granularity = granularity.as_deref();
            match kind {
                MetricKind::ServiceTime => {
                    table_json(context.get_service_times(topology_id, start, end, granularity).await?)?
                },
                MetricKind::ExecuteCount => {
                    table_json(context.get_execute_counts(topology_id, start, end, granularity).await?)?
                },
                MetricKind::EmitCount => {
                    table_json(context.get_emit_counts(topology_id, start, end, granularity).await?)?
                },
                MetricKind::ReceiveCount => {
                    table_json(context.get_receive_counts(topology_id, start, end, granularity).await?)?
                },
                MetricKind::CompleteLatency => {
                    table_json(context.get_complete_latencies(topology_id, start, end, granularity).await?)?
                },
                MetricKind::ArrivalRate => {
                    table_json(context.get_arrival_rates(topology_id, start, end, granularity).await?)?
                },
            }
        },
    };

    Ok(output)
}

fn table_json<T: Serialize>(table: Vec<T>) -> Result<serde_json::Value> {
    tracing::info!(nr_records=%table.len(), "metric table retrieved");
    Ok(serde_json::to_value(table)?)
}

fn emit_metrics() -> Result<()> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&METRICS_REGISTRY.gather(), &mut buffer)?;
    eprintln!("{}", String::from_utf8_lossy(&buffer));
    Ok(())
}

#[tracing::instrument(level = "trace", skip(future))]
fn start_runtime<F>(future: F) -> Result<serde_json::Value>
where
    F: Future<Output = Result<serde_json::Value>>,
{
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
