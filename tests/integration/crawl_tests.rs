//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sumi_sieve::config::{Config, CrawlerConfig, FetchConfig};
use sumi_sieve::crawler::{crawl_url, Crawler, HttpFetcher};
use sumi_sieve::SieveError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page that must be fetched exactly once
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn test_config(max_depth: u32, workers: u32) -> Config {
    Config {
        crawler: CrawlerConfig { max_depth, workers },
        fetch: FetchConfig {
            user_agent: "TestBot".to_string(),
            version: "1.0.0".to_string(),
            ..FetchConfig::default()
        },
        ..Config::default()
    }
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="mailto:owner@example.com">Mail</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body>Content 1 <a href="/">Home</a> <a href="/page2">2</a></body></html>"#,
    )
    .await;
    mount_page(&mock_server, "/page2", "<html><body>Content 2</body></html>").await;

    let seed = format!("{}/", base_url);
    let result = crawl_url(&test_config(2, 3), &seed)
        .await
        .expect("Crawl failed");

    let mut urls = result.urls().to_vec();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url)
        ]
    );
    assert!(result.failed.is_empty());
    // Each page is fetched exactly once; verified when the server drops
}

#[tokio::test]
async fn test_crawl_respects_max_depth() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", r#"<a href="/level1">1</a>"#).await;
    mount_page(&mock_server, "/level1", r#"<a href="/level2">2</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/level2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deep"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = crawl_url(&test_config(1, 2), &format!("{}/", base_url))
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert!(result.contains(&format!("{}/level1", base_url)));
    assert!(!result.contains(&format!("{}/level2", base_url)));
}

#[tokio::test]
async fn test_crawl_records_http_errors() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">gone</a><a href="/error">boom</a><a href="/ok">ok</a>"#,
    )
    .await;
    mount_page(&mock_server, "/ok", "fine").await;
    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    // "/missing" has no mock: wiremock answers 404

    let result = crawl_url(&test_config(1, 2), &format!("{}/", base_url))
        .await
        .unwrap();

    let mut crawled = result.urls().to_vec();
    crawled.sort();
    assert_eq!(crawled, vec![format!("{}/", base_url), format!("{}/ok", base_url)]);

    let mut failed: Vec<&str> = result.failed.iter().map(|f| f.url.as_str()).collect();
    failed.sort_unstable();
    let error_url = format!("{}/error", base_url);
    let missing_url = format!("{}/missing", base_url);
    assert_eq!(failed, vec![error_url.as_str(), missing_url.as_str()]);
}

#[tokio::test]
async fn test_crawl_sends_configured_user_agent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(wiremock::matchers::header("user-agent", "TestBot/1.0.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>hi</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = crawl_url(&test_config(0, 1), &format!("{}/", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_crawl_rejects_invalid_seed() {
    let result = crawl_url(&test_config(1, 1), "not a url").await;
    assert!(matches!(result, Err(SieveError::UrlParse(_))));
}

#[tokio::test]
async fn test_crawler_with_http_fetcher_and_stop_handle() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<p>seed</p>").await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let crawler = Crawler::new(fetcher, CrawlerConfig { max_depth: 3, workers: 2 });

    let result = crawler.run(&format!("{}/", mock_server.uri())).await;
    assert_eq!(result.len(), 1);

    // A stopped crawler starts no new fetches
    crawler.stop_handle().stop();
    let again = crawler.run(&format!("{}/other", mock_server.uri())).await;
    assert!(again.is_empty());
    assert!(again.failed.is_empty());
}
