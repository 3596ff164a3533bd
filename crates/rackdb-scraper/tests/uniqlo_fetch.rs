//! Integration tests for `UniqloAdapter::fetch`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rackdb_scraper::{AdapterError, FetchOptions, UniqloAdapter, VendorAdapter};

fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .user_agent("rackdb-test/0.1")
        .build()
        .expect("failed to build test client")
}

fn ranked_products_body(product_id: &str) -> serde_json::Value {
    json!({
        "result": {
            "items": [{
                "productId": product_id,
                "name": "Test Product",
                "genderName": "MEN",
                "prices": {
                    "base": { "currency": { "code": "USD", "symbol": "$" }, "value": 12.9 },
                    "promo": null
                },
                "colors": [{ "name": "WHITE" }],
                "sizes": [{ "name": "S" }],
                "images": { "main": { "00": { "image": "https://img.example.com/0.jpg" } } }
            }]
        }
    })
}

#[tokio::test]
async fn fetch_collects_one_batch_per_category() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ranked_products_body("E1")))
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    let raw = adapter
        .fetch(&test_client(), FetchOptions::default())
        .await
        .expect("fetch failed");

    // One batch per (gender, category) scope, each with the mocked item.
    assert_eq!(raw.batches.len(), 6);
    assert_eq!(raw.item_count(), 6);
    assert!(raw.batches.iter().all(|b| !b.category.is_empty()));
}

#[tokio::test]
async fn fetch_sends_the_ranking_query_parameters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .and(query_param("schema", "general"))
        .and(query_param("limit", "62"))
        .and(query_param("isDiscount", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ranked_products_body("E1")))
        .expect(6)
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    adapter
        .fetch(&test_client(), FetchOptions::default())
        .await
        .expect("fetch failed");
}

#[tokio::test]
async fn fetch_surfaces_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    let err = adapter
        .fetch(&test_client(), FetchOptions::default())
        .await
        .unwrap_err();

    assert!(
        matches!(err, AdapterError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus, got: {err:?}"
    );
}

#[tokio::test]
async fn fetch_surfaces_malformed_body_as_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    let err = adapter
        .fetch(&test_client(), FetchOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Deserialize { .. }));
}

#[tokio::test]
async fn fetch_retries_a_transient_server_error() {
    let server = MockServer::start().await;

    // First request 503s; everything after succeeds.
    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ranked_products_body("E1")))
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    let options = FetchOptions {
        max_retries: 1,
        ..FetchOptions::default()
    };
    let raw = adapter
        .fetch(&test_client(), options)
        .await
        .expect("retry should recover from a single 503");

    assert_eq!(raw.batches.len(), 6);
}

#[tokio::test]
async fn fetch_round_trips_items_into_parse() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recommendations/ranked-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&ranked_products_body("E1")))
        .mount(&server)
        .await;

    let adapter = UniqloAdapter::with_api_base(server.uri());
    let raw = adapter
        .fetch(&test_client(), FetchOptions::default())
        .await
        .expect("fetch failed");
    let products = adapter.parse(&raw).expect("parse failed");

    // The same product ranks in every mocked category; dedupe keeps one.
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].store_product_id, "E1");
    assert_eq!(products[0].brand, "Uniqlo");
}
