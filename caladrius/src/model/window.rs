use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::cuckoo::CuckooError;

/// Aggregation bucket size of a Cuckoo timeseries query.
#[derive(
    Debug, Display, AsRefStr, EnumString, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Granularity {
    #[default]
    #[strum(serialize = "m")]
    #[serde(rename = "m")]
    Minute,

    #[strum(serialize = "h")]
    #[serde(rename = "h")]
    Hour,

    #[strum(serialize = "d")]
    #[serde(rename = "d")]
    Day,
}

impl Granularity {
    /// Parses a granularity token; only `m`, `h` and `d` are accepted.
    pub fn from_token(token: &str) -> Result<Self, CuckooError> {
        Self::from_str(token).map_err(|_err| CuckooError::InvalidArgument {
            argument: "granularity",
            value: token.to_string(),
            reason: "please choose either 'm', 'h' or 'd'".to_string(),
        })
    }

    pub const fn period_secs(&self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
        }
    }
}

/// The query window handed to the backend. An `end` is only ever held alongside a `start`;
/// absence of both means the backend's default window (e.g., the last 2 hours).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TimeWindow {
    granularity: Granularity,
    start: Option<i64>,
    end: Option<i64>,
}

impl TimeWindow {
    pub const fn new(granularity: Granularity, start: Option<i64>, end: Option<i64>) -> Self {
        let end = match start {
            Some(_) => end,
            None => None,
        };

        Self { granularity, start, end }
    }

    /// Resolves caller supplied window arguments into a validated window. A lone `end` is
    /// discarded in favor of the backend default window.
    #[tracing::instrument(level = "trace")]
    pub fn resolve(
        start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, granularity: Option<&str>,
    ) -> Result<Self, CuckooError> {
        let granularity = match granularity {
            None => Granularity::default(),
            Some(token) => Granularity::from_token(token).map_err(|err| {
                tracing::error!(error=?err, "bad granularity supplied for query window");
                err
            })?,
        };

        match (start, end) {
            (Some(s), Some(e)) => {
                tracing::info!(
                    period_secs=%(e - s).num_seconds(), start=%s.to_rfc3339(), end=%e.to_rfc3339(),
                    "querying over a period of {} seconds", (e - s).num_seconds()
                );
                Ok(Self::new(granularity, Some(s.timestamp()), Some(e.timestamp())))
            },
            (Some(s), None) => {
                tracing::info!(
                    start=%s.to_rfc3339(),
                    "start time supplied with no corresponding end time - period will be from the start time to now"
                );
                Ok(Self::new(granularity, Some(s.timestamp()), None))
            },
            (None, Some(e)) => {
                tracing::warn!(
                    end=%e.to_rfc3339(),
                    "end time supplied without corresponding start time - ignoring it and using the default window"
                );
                Ok(Self::new(granularity, None, None))
            },
            (None, None) => {
                tracing::info!("no start or end time supplied so the default window is used");
                Ok(Self::new(granularity, None, None))
            },
        }
    }

    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub const fn start(&self) -> Option<i64> {
        self.start
    }

    pub const fn end(&self) -> Option<i64> {
        self.end
    }
}
