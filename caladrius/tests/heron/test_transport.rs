use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use caladrius::cuckoo::CuckooError;
use caladrius::heron::HeronMetricsClient;
use claims::*;
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

use crate::fixtures::{self, TOPOLOGY};

pub struct FlakyResponder(Arc<AtomicU32>, u32, ResponseTemplate, u16);

impl FlakyResponder {
    fn new(failures: u32, fail_status_code: u16, success_template: ResponseTemplate) -> Self {
        Self(Arc::new(AtomicU32::new(0)), failures, success_template, fail_status_code)
    }
}

impl Respond for FlakyResponder {
    #[tracing::instrument(level = "info", skip(self))]
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let attempts = self.0.fetch_add(1, Ordering::SeqCst) + 1;

        if self.1 < attempts {
            tracing::info!(%attempts, failures=%(self.1), "enough attempts returning response");
            self.2.clone()
        } else {
            tracing::info!(%attempts, failures=%(self.1), "not enough attempts");
            ResponseTemplate::new(self.3)
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_server_error_is_unreachable() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_server_error_is_unreachable");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let actual = assert_err!(context.get_execute_counts(TOPOLOGY, None, None, None).await);
    assert!(matches!(actual, CuckooError::BackendUnreachable { .. }));
    assert_eq!(actual.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(assert_some!(server.received_requests().await).len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_query_status() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_failed_query_status");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Failure", "timeseries": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    match assert_err!(context.get_complete_latencies(TOPOLOGY, None, None, None).await) {
        CuckooError::QueryFailed { status, query } => {
            assert_eq!(status, "Failure");
            assert_eq!(query, "ts(avg, heron/topoA, /*/*, __complete-latency/*)");
        },
        err => panic!("unexpected error: {err:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transient_failure_is_not_retried() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_transient_failure_is_not_retried");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    let success = ResponseTemplate::new(200).set_body_json(fixtures::success(vec![fixtures::entry(
        "topoA/count/container_2_count_8",
        "__gateway-received-packets-count",
        json!([[1530000000, 60.0]]),
    )]));
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(FlakyResponder::new(1, 503, success))
        .expect(2)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let actual = assert_err!(context.get_arrival_rates(TOPOLOGY, None, None, None).await);
    assert_eq!(actual.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

    // the caller decides whether to run the extraction again
    let actual = assert_ok!(context.get_arrival_rates(TOPOLOGY, None, None, None).await);
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].arrival_rate_tps, 1.0);
}
