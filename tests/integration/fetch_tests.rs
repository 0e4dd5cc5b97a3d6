//! Integration tests for the HTTP fetcher against a mock server

use std::net::TcpListener;
use std::time::Duration;
use sumi_sieve::config::FetchConfig;
use sumi_sieve::crawler::{Fetcher, HttpFetcher};
use sumi_sieve::FetchError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&FetchConfig::default()).expect("Failed to build fetcher")
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Hello</h1>"))
        .mount(&mock_server)
        .await;

    let body = fetcher()
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, b"<h1>Hello</h1>");
}

#[tokio::test]
async fn test_fetch_text_decodes_lossily() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bytes"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'o', b'k', 0xff]))
        .mount(&mock_server)
        .await;

    let text = fetcher()
        .fetch_text(&format!("{}/bytes", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(text, "ok\u{fffd}");
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let err = fetcher().fetch(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert_eq!(err.url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_fetch_follows_redirect() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("location", format!("{}/new", mock_server.uri()).as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
        .mount(&mock_server)
        .await;

    let body = fetcher()
        .fetch(&format!("{}/old", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(body, b"moved");
}

#[tokio::test]
async fn test_fetch_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = FetchConfig {
        request_timeout_secs: 1,
        ..FetchConfig::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();

    let err = fetcher
        .fetch(&format!("{}/slow", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }));
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Reserve a free port, then release it so nothing is listening there
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
        listener.local_addr().expect("Failed to read local address")
    };

    let url = format!("http://{}/", addr);
    let err = fetcher().fetch(&url).await.unwrap_err();

    assert!(matches!(err, FetchError::Connect { .. }), "got {:?}", err);
    assert_eq!(err.url(), Some(url.as_str()));
}

#[tokio::test]
async fn test_fetch_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"items": [1, 2, 3]}"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;

    let fetcher = fetcher();
    let value = fetcher
        .fetch_json(&format!("{}/api", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(value["items"][2], 3);

    let err = fetcher
        .fetch_json(&format!("{}/broken", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Json { .. }));
}
