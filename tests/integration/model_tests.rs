//! Integration tests for the page models over HTTP

use std::collections::BTreeMap;
use sumi_sieve::config::FetchConfig;
use sumi_sieve::crawler::{Fetcher, HttpFetcher};
use sumi_sieve::models::{NewsSite, WebStore};
use sumi_sieve::output::write_csv_record;
use sumi_sieve::selector::{attribute_value, extract, fragment_text};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_news_site_scrapes_articles() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/",
        r#"<html><body>
            <article><h2>Rates rise</h2><a href="/rates">more</a></article>
            <aside>Weather</aside>
            <article><h2>Team wins</h2><a href="/sport">more</a></article>
        </body></html>"#,
    )
    .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let mut site = NewsSite::new("Daily", format!("{}/", mock_server.uri()));

    let count = site.scrape_articles(&fetcher, "<article>").await.unwrap();
    assert_eq!(count, 2);

    let headlines: Vec<String> = site
        .articles
        .iter()
        .flat_map(|a| extract(&a.page.html, "//h2"))
        .map(fragment_text)
        .collect();
    assert_eq!(headlines, vec!["Rates rise", "Team wins"]);

    let links: Vec<String> = site
        .articles
        .iter()
        .filter_map(|a| attribute_value(&a.page.html, "href"))
        .collect();
    assert_eq!(links, vec!["/rates", "/sport"]);
}

#[tokio::test]
async fn test_web_store_products_and_descriptions() {
    let mock_server = MockServer::start().await;
    serve(
        &mock_server,
        "/",
        r#"<div class="grid">
            <div class="product-item" data-sku="1"><a href="/p/1">Lamp</a></div>
            <div class="product-item" data-sku="2"><a href="/p/2">Desk</a></div>
        </div>"#,
    )
    .await;
    serve(
        &mock_server,
        "/p/1",
        r#"<div class="product-description">Warm &amp; bright.</div>"#,
    )
    .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let mut store = WebStore::new("Shop", format!("{}/", mock_server.uri()));

    let count = store
        .scrape_products(&fetcher, ".grid .product-item")
        .await
        .unwrap();
    assert_eq!(count, 2);

    let first = &mut store.products[0];
    assert_eq!(attribute_value(&first.page.html, "data-sku").as_deref(), Some("1"));

    let product_page = fetcher
        .fetch_text(&format!("{}/p/1", mock_server.uri()))
        .await
        .unwrap();
    first.scrape_description(&product_page, None);
    assert_eq!(first.description.as_deref(), Some("Warm & bright."));

    // Export the product as a single CSV record
    let dir = tempfile::TempDir::new().unwrap();
    let csv_path = dir.path().join("product.csv");
    let record = BTreeMap::from([
        ("name".to_string(), first.page.name.clone()),
        (
            "description".to_string(),
            first.description.clone().unwrap_or_default(),
        ),
    ]);
    write_csv_record(&csv_path, &["name", "description"], &record).unwrap();
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "name,description\r\nProduct,Warm & bright.\r\n"
    );
}
