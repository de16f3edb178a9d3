//! Default HTTP reader against mock servers

use crate::support::http_date_in;
use sumi_ebb::reader::{FetchResult, HttpReader, Reader};
use sumi_ebb::FetchError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn expect_failure(result: FetchResult) -> (FetchError, u64) {
    match result {
        FetchResult::Failure {
            error,
            retry_after_secs,
        } => (error, retry_after_secs),
        FetchResult::Success { body } => panic!("expected failure, got {} bytes", body.len()),
    }
}

#[tokio::test]
async fn test_success_returns_body() {
    let server = MockServer::start().await;
    mount(&server, "/data1", ResponseTemplate::new(200).set_body_string("hello")).await;

    let reader = HttpReader::new().unwrap();
    match reader.fetch(&format!("{}/data1", server.uri())).await {
        FetchResult::Success { body } => assert_eq!(body, b"hello"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_integer_retry_hint() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/data1",
        ResponseTemplate::new(503).insert_header("Retry-After", "5"),
    )
    .await;

    let reader = HttpReader::new().unwrap();
    let (error, retry_after) = expect_failure(reader.fetch(&format!("{}/data1", server.uri())).await);

    assert_eq!(retry_after, 5);
    assert!(matches!(error, FetchError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_http_date_retry_hint() {
    let server = MockServer::start().await;
    let date = http_date_in(5);
    mount(
        &server,
        "/data1",
        ResponseTemplate::new(429).insert_header("Retry-After", date.as_str()),
    )
    .await;

    let reader = HttpReader::new().unwrap();
    let (error, retry_after) = expect_failure(reader.fetch(&format!("{}/data1", server.uri())).await);

    assert!(
        retry_after == 4 || retry_after == 5,
        "expected 4 or 5 seconds, got {}",
        retry_after
    );
    assert!(matches!(error, FetchError::Status { status: 429, .. }));
}

#[tokio::test]
async fn test_past_http_date_floors_to_zero() {
    let server = MockServer::start().await;
    let date = http_date_in(-60);
    mount(
        &server,
        "/data1",
        ResponseTemplate::new(429).insert_header("Retry-After", date.as_str()),
    )
    .await;

    let reader = HttpReader::new().unwrap();
    let (_, retry_after) = expect_failure(reader.fetch(&format!("{}/data1", server.uri())).await);

    assert_eq!(retry_after, 0);
}

#[tokio::test]
async fn test_failure_without_hint() {
    let server = MockServer::start().await;
    mount(&server, "/missing", ResponseTemplate::new(404)).await;
    mount(
        &server,
        "/garbled",
        ResponseTemplate::new(500).insert_header("Retry-After", "whenever"),
    )
    .await;

    let reader = HttpReader::new().unwrap();

    let (error, retry_after) =
        expect_failure(reader.fetch(&format!("{}/missing", server.uri())).await);
    assert_eq!(retry_after, 0);
    assert!(matches!(error, FetchError::Status { status: 404, .. }));

    let (_, retry_after) = expect_failure(reader.fetch(&format!("{}/garbled", server.uri())).await);
    assert_eq!(retry_after, 0);
}

#[tokio::test]
async fn test_transport_failure() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let reader = HttpReader::new().unwrap();
    let url = format!("http://127.0.0.1:{}/data1", port);
    let (error, retry_after) = expect_failure(reader.fetch(&url).await);

    assert_eq!(retry_after, 0);
    match error {
        FetchError::Transport { url: failed, .. } => assert_eq!(failed, url),
        other => panic!("expected transport error, got {:?}", other),
    }
}
