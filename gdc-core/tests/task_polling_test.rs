use std::time::Duration;

use gdc_core::ApiError;
use gdc_core::config::ConfigStorage;
use gdc_core::polling::{PolledUri, PollingOptions, poll_for_headers, poll_for_result};
use gdc_core::transport::Transport;
use gdc_stub_service::{StubResponse, StubServer};
use http::StatusCode;
use serde_json::json;

const STATUS_PATH: &str = "/gdc/task/status";

fn transport_for(server: &StubServer) -> Transport {
    let config = ConfigStorage::new();
    config.set_custom_domain(Some(&server.url())).unwrap();
    Transport::new(config).unwrap()
}

fn fast_options() -> PollingOptions {
    PollingOptions::default().poll_step(Duration::from_millis(10))
}

#[tokio::test]
async fn body_poller_fetches_until_the_predicate_accepts() {
    let running = StubResponse::json(200, r#"{"taskState":{"status":"RUNNING"}}"#);
    let server = StubServer::builder()
        .route(
            STATUS_PATH,
            [
                running.clone(),
                running,
                StubResponse::json(200, r#"{"taskState":{"status":"OK"}}"#),
            ],
        )
        .spawn()
        .await;
    let transport = transport_for(&server);

    let result = poll_for_result(
        &transport,
        STATUS_PATH,
        |data| data["taskState"]["status"] == "OK",
        fast_options(),
    )
    .await
    .unwrap();

    assert_eq!(result, json!({"taskState": {"status": "OK"}}));
    assert_eq!(server.hits(STATUS_PATH), 3);
}

#[tokio::test]
async fn body_poller_times_out_after_max_attempts() {
    let server = StubServer::builder()
        .route(
            STATUS_PATH,
            [StubResponse::json(200, r#"{"taskState":{"status":"RUNNING"}}"#)],
        )
        .spawn()
        .await;
    let transport = transport_for(&server);

    let error = poll_for_result(
        &transport,
        STATUS_PATH,
        |data| data["taskState"]["status"] == "OK",
        fast_options().max_attempts(2),
    )
    .await
    .unwrap_err();

    match error {
        ApiError::PollTimeout { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.is_some());
        }
        other => panic!("Expected a poll timeout, got {other:?}"),
    }
    assert_eq!(server.hits(STATUS_PATH), 4);
}

#[tokio::test]
async fn body_poller_propagates_transport_errors() {
    let server = StubServer::builder()
        .route(STATUS_PATH, [StubResponse::status(500)])
        .spawn()
        .await;
    let transport = transport_for(&server);

    let error = poll_for_result(&transport, STATUS_PATH, |_| true, fast_options())
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Response { .. }));
}

#[tokio::test]
async fn head_poller_resolves_with_the_uri_on_a_final_200() {
    let server = StubServer::builder()
        .route(
            "/gdc/exporter/result/abc",
            [
                StubResponse::status(202),
                StubResponse::status(202),
                StubResponse::status(200),
            ],
        )
        .spawn()
        .await;
    let transport = transport_for(&server);

    let location = poll_for_headers(
        &transport,
        "/gdc/exporter/result/abc",
        |status, _| status == StatusCode::OK || status.as_u16() >= 400,
        fast_options(),
    )
    .await
    .unwrap();

    assert_eq!(
        location,
        PolledUri {
            uri: "/gdc/exporter/result/abc".to_string()
        }
    );
    // the poller saw both intermediate 202s itself
    assert_eq!(server.hits("/gdc/exporter/result/abc"), 3);
}

#[tokio::test]
async fn head_poller_maps_a_final_non_200_to_an_error() {
    let server = StubServer::builder()
        .route(
            "/gdc/exporter/result/abc",
            [StubResponse::status(202), StubResponse::status(204)],
        )
        .spawn()
        .await;
    let transport = transport_for(&server);

    let error = poll_for_headers(
        &transport,
        "/gdc/exporter/result/abc",
        |status, _| status != StatusCode::ACCEPTED,
        fast_options(),
    )
    .await
    .unwrap_err();

    match error {
        ApiError::Response { response, .. } => assert_eq!(response.status().as_u16(), 204),
        other => panic!("Expected a response error, got {other:?}"),
    }
}

#[tokio::test]
async fn head_poller_times_out_after_max_attempts() {
    let server = StubServer::builder()
        .route("/gdc/exporter/result/abc", [StubResponse::status(202)])
        .spawn()
        .await;
    let transport = transport_for(&server);

    let error = poll_for_headers(
        &transport,
        "/gdc/exporter/result/abc",
        |status, _| status == StatusCode::OK,
        fast_options().max_attempts(1),
    )
    .await
    .unwrap_err();

    assert!(matches!(error, ApiError::PollTimeout { .. }));
}
