use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CuckooError {
    #[error("invalid {argument}: '{value}' ({reason})")]
    InvalidArgument {
        argument: &'static str,
        value: String,
        reason: String,
    },

    #[error("Cuckoo backend unreachable at {endpoint}: {reason}")]
    BackendUnreachable {
        endpoint: String,
        status: Option<StatusCode>,
        reason: String,
    },

    #[error("Cuckoo backend rejected request to {endpoint} with status {status}")]
    BackendRejected { endpoint: String, status: StatusCode },

    #[error("query {query} returned non-successful status: '{status}'")]
    QueryFailed { status: String, query: String },

    #[error("malformed metric path {path:?}: {reason}")]
    MalformedMetricPath { path: String, reason: String },

    #[error("failed to parse Cuckoo url: {0}")]
    Url(#[from] url::ParseError),

    #[error("supplied Cuckoo url cannot be a base to query: {0}")]
    NotABaseUrl(url::Url),

    #[error("Cuckoo REST API call failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("invalid Cuckoo request header: {0}")]
    InvalidRequestHeader(String),

    #[error("failed processing JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CuckooError {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMetricPath { path: path.into(), reason: reason.into() }
    }

    /// The HTTP status the backend answered with, if the failure was status-bearing.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::BackendUnreachable { status, .. } => *status,
            Self::BackendRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "argument",
            Self::BackendUnreachable { .. } => "http::unreachable",
            Self::BackendRejected { .. } => "http::rejected",
            Self::QueryFailed { .. } => "query",
            Self::MalformedMetricPath { .. } => "metric_path",
            Self::Url(_) => "http::url",
            Self::NotABaseUrl(_) => "http::url::NotABaseUrl",
            Self::HttpRequest(_) => "http::request",
            Self::InvalidRequestHeader(_) => "http::header",
            Self::Json(_) => "http::json",
        }
    }
}

impl From<reqwest::header::InvalidHeaderName> for CuckooError {
    fn from(error: reqwest::header::InvalidHeaderName) -> Self {
        Self::InvalidRequestHeader(error.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for CuckooError {
    fn from(error: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidRequestHeader(error.to_string())
    }
}
