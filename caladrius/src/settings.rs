use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::heron::MetricKind;

mod cuckoo_settings;

pub use cuckoo_settings::CuckooSettings;

pub const APP_ENVIRONMENT: &str = "APP_ENVIRONMENT";
const ENV_PREFIX: &str = "APP";
const ENV_SEPARATOR: &str = "__";
const APPLICATION_CONFIG: &str = "application.ron";
const DEFAULT_RESOURCES: &str = "resources";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub cuckoo: CuckooSettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("unrecognized {APP_ENVIRONMENT}, {0:?}")]
    UnknownEnvironment(String),
}

/// Deployment environment selecting the `<environment>.ron` resource layered over
/// `application.ron`.
#[derive(Debug, Display, AsRefStr, EnumString, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

#[derive(Parser, Clone, Debug, PartialEq, Eq)]
#[clap(author, version, about)]
pub struct CliOptions {
    /// Explicit settings file layered over the resource files.
    #[clap(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding `application.ron` and the environment files.
    #[clap(short, long, global = true)]
    pub resources: Option<PathBuf>,

    #[clap(short, long, global = true)]
    pub environment: Option<Environment>,

    /// Write the prometheus metrics gathered during the run to stderr.
    #[clap(long, global = true)]
    pub emit_metrics: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the services known to the Cuckoo database.
    Services,

    /// List the Heron topology services.
    Topologies,

    /// List the sources registered under a service.
    Sources {
        #[clap(long)]
        service: String,
    },

    /// List the metric names recorded for a source.
    Metrics {
        #[clap(long)]
        service: String,
        #[clap(long)]
        source: String,
    },

    /// Print a normalized metric table for a topology as JSON.
    Table {
        /// service_time, execute_count, emit_count, receive_count, complete_latency or arrival_rate
        kind: MetricKind,

        #[clap(short, long)]
        topology: String,

        /// RFC 3339 timestamp
        #[clap(long)]
        start: Option<DateTime<Utc>>,

        /// RFC 3339 timestamp; ignored without a start
        #[clap(long)]
        end: Option<DateTime<Utc>>,

        /// m, h or d
        #[clap(short, long)]
        granularity: Option<String>,
    },
}

impl Settings {
    /// Loads settings from `application.ron`, then the environment's resource file, then the
    /// explicit config file, then `APP__` prefixed environment variables, e.g.,
    /// `APP__CUCKOO__SERVER_URL`.
    #[tracing::instrument(level = "info")]
    pub fn load(options: &CliOptions) -> Result<Self, SettingsError> {
        let environment = match options.environment {
            Some(env) => Some(env),
            None => environment_from_var()?,
        };

        let resources = options.resources.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCES));
        let builder = Self::builder_for(resources.as_path(), environment, options.config.as_deref());

        let settings: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()?
            .try_deserialize()?;

        tracing::info!(?settings, ?environment, "settings loaded");
        Ok(settings)
    }

    fn builder_for(
        resources: &Path, environment: Option<Environment>, config_path: Option<&Path>,
    ) -> ConfigBuilder<DefaultState> {
        let builder = Config::builder().add_source(File::from(resources.join(APPLICATION_CONFIG)).required(false));

        let builder = match environment {
            Some(env) => builder.add_source(File::from(resources.join(format!("{env}.ron"))).required(false)),
            None => builder,
        };

        match config_path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder,
        }
    }
}

fn environment_from_var() -> Result<Option<Environment>, SettingsError> {
    match std::env::var(APP_ENVIRONMENT) {
        Ok(rep) => rep.parse().map(Some).map_err(|_| SettingsError::UnknownEnvironment(rep)),
        Err(_) => Ok(None),
    }
}
