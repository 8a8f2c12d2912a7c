use caladrius::cuckoo::CuckooError;
use caladrius::heron::HeronMetricsClient;
use caladrius::model::{ExecuteCount, InstanceRef};
use chrono::{TimeZone, Utc};
use claims::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use crate::fixtures::{self, TOPOLOGY};

struct WithoutQueryParam(&'static str);

impl Match for WithoutQueryParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

async fn mount_query(server: &MockServer, query: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("query", query))
        .and(query_param("client_source", "caladrius-it"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_execute_counts_end_to_end() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_execute_counts_end_to_end");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    let body = fixtures::success(vec![
        fixtures::entry(
            "topoA/split/container_1_split_5",
            "__execute-count/spout/sentences",
            json!([[1530000000, 10.0], [1530000060, 12.0]]),
        ),
        fixtures::entry(
            "topoA/count/container_2_count_8",
            "__execute-count/split/words",
            json!([[1530000000, 40.0]]),
        ),
        fixtures::stmgr_entry("__execute-count/split/words"),
    ]);

    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("query", "ts(sum, heron/topoA, /*/*, __execute-count/*/*)"))
        .and(query_param("client_source", "caladrius-it"))
        .and(query_param("name", "execute count"))
        .and(query_param("granularity", "m"))
        .and(query_param("start", "1530000000"))
        .and(query_param("end", "1530003600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let start = Utc.timestamp_opt(1_530_000_000, 0).single();
    let end = Utc.timestamp_opt(1_530_003_600, 0).single();
    let actual = assert_ok!(context.get_execute_counts(TOPOLOGY, start, end, None).await);

    let split_5 = InstanceRef { component: "split".to_string(), task: 5, container: 1 };
    assert_eq!(
        actual,
        vec![
            ExecuteCount {
                timestamp: Utc.timestamp_opt(1_530_000_000, 0).unwrap(),
                instance: split_5.clone(),
                source_component: "spout".to_string(),
                stream: "sentences".to_string(),
                execute_count: 10,
            },
            ExecuteCount {
                timestamp: Utc.timestamp_opt(1_530_000_060, 0).unwrap(),
                instance: split_5,
                source_component: "spout".to_string(),
                stream: "sentences".to_string(),
                execute_count: 12,
            },
            ExecuteCount {
                timestamp: Utc.timestamp_opt(1_530_000_000, 0).unwrap(),
                instance: InstanceRef { component: "count".to_string(), task: 8, container: 2 },
                source_component: "split".to_string(),
                stream: "words".to_string(),
                execute_count: 40,
            },
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_system_entries_excluded_for_every_kind() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_system_entries_excluded_for_every_kind");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    let kinds = [
        ("ts(avg, heron/topoA, /*/*, __execute-latency/*/*)", "__execute-latency/split/words"),
        ("ts(sum, heron/topoA, /*/*, __execute-count/*/*)", "__execute-count/split/words"),
        ("ts(sum, heron/topoA, /*/*, __emit-count/*)", "__emit-count/words"),
        ("ts(heron/topoA, /*/*, receive-count/*/*/*)", "receive-count/split/3/words"),
        ("ts(avg, heron/topoA, /*/*, __complete-latency/*)", "__complete-latency/words"),
        ("ts(sum, heron/topoA, /*/*, __gateway-received-packets-count)", "__gateway-received-packets-count"),
    ];

    for (query, metric) in kinds {
        mount_query(&server, query, fixtures::success(vec![fixtures::stmgr_entry(metric)])).await;
    }

    let context = fixtures::context_for(&server);
    assert!(assert_ok!(context.get_service_times(TOPOLOGY, None, None, None).await).is_empty());
    assert!(assert_ok!(context.get_execute_counts(TOPOLOGY, None, None, None).await).is_empty());
    assert!(assert_ok!(context.get_emit_counts(TOPOLOGY, None, None, None).await).is_empty());
    assert!(assert_ok!(context.get_receive_counts(TOPOLOGY, None, None, None).await).is_empty());
    assert!(assert_ok!(context.get_complete_latencies(TOPOLOGY, None, None, None).await).is_empty());
    assert!(assert_ok!(context.get_arrival_rates(TOPOLOGY, None, None, None).await).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_emit_counts_skip_empty_entries() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_emit_counts_skip_empty_entries");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    mount_query(
        &server,
        "ts(sum, heron/topoA, /*/*, __emit-count/*)",
        fixtures::success(vec![
            fixtures::entry("topoA/split/container_1_split_5", "__emit-count/sentences", json!([])),
            fixtures::entry(
                "topoA/split/container_1_split_5",
                "__emit-count/words",
                json!([[1530000000, 300.0]]),
            ),
        ]),
    )
    .await;

    let context = fixtures::context_for(&server);
    let actual = assert_ok!(context.get_emit_counts(TOPOLOGY, None, None, None).await);
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].stream, "words");
    assert_eq!(actual[0].emit_count, 300);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_arrival_rates_per_hour() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_arrival_rates_per_hour");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("name", "instance arrival counts"))
        .and(query_param("granularity", "h"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::success(vec![fixtures::entry(
            "topoA/count/container_2_count_8",
            "__gateway-received-packets-count",
            json!([[1530000000, 7200.0]]),
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let actual = assert_ok!(context.get_arrival_rates(TOPOLOGY, None, None, Some("h")).await);
    assert_eq!(actual.len(), 1);
    assert_eq!(actual[0].arrival_rate_tps, 2.0);
    assert_eq!(actual[0].instance.component, "count");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bad_granularity_sends_no_request() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_bad_granularity_sends_no_request");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(fixtures::success(vec![])))
        .expect(0)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let actual = assert_err!(context.get_service_times(TOPOLOGY, None, None, Some("w")).await);
    assert!(matches!(actual, CuckooError::InvalidArgument { argument: "granularity", .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_execute_counts_over_default_window() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_execute_counts_over_default_window");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    let body = fixtures::success(vec![
        fixtures::entry(
            "topoA/split/container_1_split_5",
            "__execute-count/spout/sentences",
            json!([[1530000000, 10.0]]),
        ),
        fixtures::entry(
            "topoA/count/container_2_count_8",
            "__execute-count/split/words",
            json!([[1530000000, 40.0]]),
        ),
        fixtures::stmgr_entry("__execute-count/split/words"),
    ]);

    Mock::given(method("GET"))
        .and(path("/query"))
        .and(query_param("query", "ts(sum, heron/topoA, /*/*, __execute-count/*/*)"))
        .and(query_param("granularity", "m"))
        .and(WithoutQueryParam("start"))
        .and(WithoutQueryParam("end"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let context = fixtures::context_for(&server);
    let actual = assert_ok!(context.get_execute_counts(TOPOLOGY, None, None, None).await);
    let counts: Vec<(String, i64)> = actual.iter().map(|r| (r.instance.component.clone(), r.execute_count)).collect();
    assert_eq!(counts, vec![("split".to_string(), 10), ("count".to_string(), 40)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_execute_counts_accept_float_timestamps() {
    once_cell::sync::Lazy::force(&caladrius::logging::TEST_TRACING);
    let main_span = tracing::info_span!("test_execute_counts_accept_float_timestamps");
    let _ = main_span.enter();

    let server = MockServer::start().await;
    mount_query(
        &server,
        "ts(sum, heron/topoA, /*/*, __execute-count/*/*)",
        fixtures::success(vec![
            fixtures::entry(
                "topoA/split/container_1_split_5",
                "__execute-count/spout/sentences",
                json!([[1530000000.0, 5.0], [1530000060, 6.0]]),
            ),
            fixtures::entry(
                "topoA/count/container_2_count_8",
                "__execute-count/split/words",
                json!([[1530000000, null], [1530000060, 7.0]]),
            ),
        ]),
    )
    .await;

    let context = fixtures::context_for(&server);
    let actual = assert_ok!(context.get_execute_counts(TOPOLOGY, None, None, None).await);
    let rows: Vec<(i64, i64)> = actual.iter().map(|r| (r.timestamp.timestamp(), r.execute_count)).collect();
    assert_eq!(rows, vec![(1_530_000_000, 5), (1_530_000_060, 6)]);
    assert!(actual.iter().all(|r| r.instance.component == "split"));
}
