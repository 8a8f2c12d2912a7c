use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use futures_util::TryFutureExt;
use reqwest::Response;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde::de::DeserializeOwned;
use tracing::Instrument;
use url::Url;

use super::{CuckooError, STATUS_SUCCESS};
use crate::model::TimeWindow;
use crate::settings::CuckooSettings;

const HERON_SERVICE_MARKER: &str = "heron";

/// Connection to a Cuckoo timeseries database. The client identity (name and base url) is fixed
/// at construction; two contexts are equal iff their client name and base url match.
#[derive(Debug, Clone)]
pub struct CuckooContext {
    inner: Arc<CuckooContextRef>,
}

impl CuckooContext {
    pub fn new(client_name: impl Into<String>, client: ClientWithMiddleware, base_url: Url) -> Result<Self, CuckooError> {
        let services_endpoint = endpoint_for(&base_url, super::SERVICES)?;
        let sources_endpoint = endpoint_for(&base_url, super::SOURCES)?;
        let metrics_endpoint = endpoint_for(&base_url, super::METRICS)?;
        let query_endpoint = endpoint_for(&base_url, super::QUERY)?;

        Ok(Self {
            inner: Arc::new(CuckooContextRef {
                client_name: client_name.into(),
                client,
                base_url,
                services_endpoint,
                sources_endpoint,
                metrics_endpoint,
                query_endpoint,
            }),
        })
    }

    pub fn from_settings(settings: &CuckooSettings) -> Result<Self, CuckooError> {
        let client = make_http_client(settings)?;
        let base_url = settings.base_url()?;
        Self::new(settings.client_name.as_str(), client, base_url)
    }

    pub fn client_name(&self) -> &str {
        self.inner.client_name.as_str()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Lists every service name held in the database.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_services(&self) -> Result<Vec<String>, CuckooError> {
        let result = self
            .inner
            .get_json(super::SERVICES, self.inner.services_endpoint.clone(), &[])
            .await;
        super::track_result(super::SERVICES, result, "failed to list Cuckoo services")
    }

    /// Lists the service names that belong to Heron topologies.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_heron_topology_names(&self) -> Result<Vec<String>, CuckooError> {
        let services = self.get_services().await?;
        Ok(services
            .into_iter()
            .filter(|service| service.contains(HERON_SERVICE_MARKER))
            .collect())
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_sources(&self, service: &str) -> Result<Vec<String>, CuckooError> {
        let params = [("service", service.to_string())];
        let result = self
            .inner
            .get_json(super::SOURCES, self.inner.sources_endpoint.clone(), &params)
            .await;
        super::track_result(super::SOURCES, result, "failed to list Cuckoo sources")
    }

    #[tracing::instrument(level = "info", skip(self))]
    pub async fn get_metrics(&self, service: &str, source: &str) -> Result<Vec<String>, CuckooError> {
        let params = [("service", service.to_string()), ("source", source.to_string())];
        let result = self
            .inner
            .get_json(super::METRICS, self.inner.metrics_endpoint.clone(), &params)
            .await;
        super::track_result(super::METRICS, result, "failed to list Cuckoo metrics")
    }

    /// Runs the query over the window and returns the decoded response body unmodified. Fails
    /// on a non-2xx response or when the body's `status` is not `Success`. Never retries.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn query(
        &self, query: &str, query_name: &str, window: &TimeWindow,
    ) -> Result<serde_json::Value, CuckooError> {
        let result = self.inner.query(query, query_name, window).await;
        super::track_result(super::QUERY, result, "failed to query Cuckoo database")
    }
}

impl PartialEq for CuckooContext {
    fn eq(&self, other: &Self) -> bool {
        self.inner.client_name == other.inner.client_name && self.inner.base_url == other.inner.base_url
    }
}

impl Eq for CuckooContext {}

impl Hash for CuckooContext {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.client_name.hash(state);
        self.inner.base_url.hash(state);
    }
}

fn endpoint_for(base_url: &Url, resource: &str) -> Result<Url, CuckooError> {
    let mut endpoint = base_url.clone();
    endpoint
        .path_segments_mut()
        .map_err(|_| CuckooError::NotABaseUrl(base_url.clone()))?
        .pop_if_empty()
        .push(resource);
    Ok(endpoint)
}

fn make_http_client(settings: &CuckooSettings) -> Result<ClientWithMiddleware, CuckooError> {
    let headers = settings.header_map()?;

    let client_builder = reqwest::Client::builder()
        .pool_idle_timeout(settings.pool_idle_timeout)
        .default_headers(headers);

    let client_builder = match settings.timeout {
        Some(timeout) => client_builder.timeout(timeout),
        None => client_builder,
    };

    let client_builder = if let Some(pool_max_idle_per_host) = settings.pool_max_idle_per_host {
        client_builder.pool_max_idle_per_host(pool_max_idle_per_host)
    } else {
        client_builder
    };

    let client = client_builder.build()?;
    Ok(ClientBuilder::new(client).build())
}

fn check_status(endpoint: &Url, response: Response) -> Result<Response, CuckooError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status.is_server_error() {
        Err(CuckooError::BackendUnreachable {
            endpoint: endpoint.to_string(),
            status: Some(status),
            reason: status.canonical_reason().unwrap_or("server error").to_string(),
        })
    } else {
        Err(CuckooError::BackendRejected { endpoint: endpoint.to_string(), status })
    }
}

struct CuckooContextRef {
    client_name: String,
    client: ClientWithMiddleware,
    base_url: Url,
    services_endpoint: Url,
    sources_endpoint: Url,
    metrics_endpoint: Url,
    query_endpoint: Url,
}

impl fmt::Debug for CuckooContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CuckooContextRef")
            .field("client_name", &self.client_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CuckooContextRef {
    async fn get_json<T>(&self, label: &str, endpoint: Url, params: &[(&str, String)]) -> Result<T, CuckooError>
    where
        T: DeserializeOwned,
    {
        let _timer = super::start_cuckoo_query_timer(label);
        let span = tracing::info_span!("query Cuckoo", %label, %endpoint);

        self.client
            .get(endpoint.clone())
            .query(params)
            .send()
            .map_err(|error| {
                tracing::error!(?error, "failed Cuckoo API {label} response");
                CuckooError::BackendUnreachable {
                    endpoint: endpoint.to_string(),
                    status: None,
                    reason: error.to_string(),
                }
            })
            .and_then(|response| async {
                super::log_response(label, &endpoint, &response);
                let response = check_status(&endpoint, response)?;
                tracing::debug!(url=%response.url(), "successfully sent GET request to Cuckoo database");
                response.text().await.map_err(|err| err.into())
            })
            .instrument(span)
            .await
            .and_then(|body| {
                tracing::trace!(%body, "Cuckoo {label} response body");
                serde_json::from_str(body.as_str()).map_err(|err| err.into())
            })
    }

    async fn query(&self, query: &str, query_name: &str, window: &TimeWindow) -> Result<serde_json::Value, CuckooError> {
        tracing::debug!(%query, %query_name, ?window, "querying Cuckoo database");

        let mut params = vec![
            ("query", query.to_string()),
            ("client_source", self.client_name.clone()),
            ("granularity", window.granularity().to_string()),
            ("name", query_name.to_string()),
        ];

        if let Some(start) = window.start() {
            params.push(("start", start.to_string()));
        }

        if let Some(end) = window.end() {
            params.push(("end", end.to_string()));
        }

        let body: serde_json::Value = self.get_json(super::QUERY, self.query_endpoint.clone(), &params).await?;

        match body.get("status").and_then(|status| status.as_str()) {
            Some(STATUS_SUCCESS) => Ok(body),
            status => Err(CuckooError::QueryFailed {
                status: status.unwrap_or("<missing>").to_string(),
                query: query.to_string(),
            }),
        }
    }
}
