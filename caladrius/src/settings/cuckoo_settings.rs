use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use url::Url;

use crate::cuckoo::CuckooError;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuckooSettings {
    /// Identity stamped on every query as its `client_source`.
    #[serde(default = "CuckooSettings::default_client_name")]
    pub client_name: String,

    #[serde(default = "CuckooSettings::default_server_url")]
    pub server_url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,

    #[serde(default, rename = "timeout_secs", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DurationSeconds>")]
    pub timeout: Option<Duration>,

    #[serde(default, rename = "pool_idle_timeout_secs", skip_serializing_if = "Option::is_none")]
    #[serde_as(as = "Option<DurationSeconds>")]
    pub pool_idle_timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for CuckooSettings {
    fn default() -> Self {
        Self {
            client_name: Self::DEFAULT_CLIENT_NAME.to_string(),
            server_url: Self::DEFAULT_SERVER_URL.to_string(),
            headers: Vec::default(),
            timeout: None,
            pool_idle_timeout: None,
            pool_max_idle_per_host: None,
        }
    }
}

impl CuckooSettings {
    const DEFAULT_CLIENT_NAME: &'static str = "caladrius";
    const DEFAULT_SERVER_URL: &'static str = "http://localhost:8080/";

    pub fn default_client_name() -> String {
        Self::DEFAULT_CLIENT_NAME.to_string()
    }

    pub fn default_server_url() -> String {
        Self::DEFAULT_SERVER_URL.to_string()
    }

    pub fn header_map(&self) -> Result<HeaderMap, CuckooError> {
        let mut result = HeaderMap::with_capacity(self.headers.len());

        for (k, v) in self.headers.iter() {
            let name = HeaderName::from_str(k.as_str())?;
            let value = HeaderValue::from_str(v.as_str())?;
            result.insert(name, value);
        }

        Ok(result)
    }

    pub fn base_url(&self) -> Result<Url, CuckooError> {
        let url = Url::parse(self.server_url.as_str())?;

        if url.cannot_be_a_base() {
            return Err(CuckooError::NotABaseUrl(url));
        }

        Ok(url)
    }
}
