//! Integration tests for `ScanSubmissionClient` using wiremock HTTP mocks.

use chrono::Utc;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fairlo_analysis::{normalize_outcome, ScanSubmissionClient, SubmissionError};
use fairlo_core::{CapturedFrame, Coordinate, FRAME_MIME};

fn test_client(base_url: &str) -> ScanSubmissionClient {
    ScanSubmissionClient::new(base_url, 30, "fairlo-test/0.1")
        .expect("client construction should not fail")
}

fn test_frame() -> CapturedFrame {
    CapturedFrame {
        scan_id: Uuid::new_v4(),
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10],
        mime: FRAME_MIME,
        width: 640,
        height: 480,
        captured_at: Utc::now(),
    }
}

fn test_coordinate() -> Coordinate {
    Coordinate {
        lat: 26.9124,
        lng: 75.7873,
    }
}

#[tokio::test]
async fn submit_posts_multipart_and_returns_raw_response() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "detected_item": "Wooden Elephant",
        "local_price_estimate": "₹150",
        "currency_symbol": "₹",
        "location_name": "Jaipur",
    });

    Mock::given(method("POST"))
        .and(path("/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&format!("{}/scan", server.uri()));
    let raw = client
        .submit(test_frame(), test_coordinate())
        .await
        .expect("submission should succeed");

    assert_eq!(
        raw.field(["item_name", "detected_item"]),
        Some(&serde_json::json!("Wooden Elephant"))
    );

    // The multipart body carried both fields and the wire-format coordinate.
    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"image\""), "image part missing: {body}");
    assert!(body.contains("name=\"location\""), "location part missing: {body}");
    assert!(body.contains("26.912400,75.787300"), "coordinate missing: {body}");
    assert!(body.contains("filename=\"scan.jpg\""), "filename missing: {body}");
}

#[tokio::test]
async fn non_2xx_status_is_a_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .submit(test_frame(), test_coordinate())
        .await
        .err()
        .expect("submission should fail");
    assert!(matches!(err, SubmissionError::ServerError { status: 500 }));
}

#[tokio::test]
async fn unparseable_body_is_a_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>definitely not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .submit(test_frame(), test_coordinate())
        .await
        .err()
        .expect("submission should fail");
    assert!(matches!(err, SubmissionError::MalformedResponse { .. }));
}

#[tokio::test]
async fn unreachable_service_is_a_network_error_and_still_yields_a_card() {
    // A server that is immediately shut down leaves nothing listening on
    // the port, so the connect fails at the transport level.
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = test_client(&uri);
    let outcome = client.submit(test_frame(), test_coordinate()).await;
    assert!(matches!(
        outcome,
        Err(SubmissionError::NetworkUnreachable(_))
    ));

    let result = normalize_outcome(outcome);
    assert_eq!(result.name, "Analysis Failed");
    assert!((result.detected_price - 0.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn exactly_one_request_per_submission() {
    let server = MockServer::start().await;

    // Even a failing response triggers no retry: single-attempt semantics.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .submit(test_frame(), test_coordinate())
        .await
        .err()
        .expect("submission should fail");
    assert!(matches!(err, SubmissionError::ServerError { status: 429 }));
}

#[test]
fn invalid_endpoint_is_rejected_at_construction() {
    let err = ScanSubmissionClient::new("not a url", 30, "fairlo-test/0.1")
        .err()
        .expect("construction should fail");
    assert!(matches!(err, SubmissionError::InvalidEndpoint { .. }));
}
