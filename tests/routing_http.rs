//! Route resolution behavior observed through the HTTP server.

use reqwest::StatusCode;
use serde_json::Value;
use storefront::config::AppConfig;

mod common;

#[tokio::test]
async fn test_unknown_path_is_404_page() {
    let app = common::spawn_app().await;
    let res = common::client().get(app.url("/definitely/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.text().await.unwrap().contains("404 Not Found"));
}

#[tokio::test]
async fn test_pattern_rejects_non_numeric_id() {
    let app = common::spawn_app().await;
    let client = common::client();
    assert_eq!(
        client.get(app.url("/product/abc")).send().await.unwrap().status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        client.get(app.url("/product/1/")).send().await.unwrap().status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_head_matches_get_without_body() {
    let app = common::spawn_app().await;
    let res = common::client().head(app.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_wrong_method_is_404() {
    let app = common::spawn_app().await;
    let res = common::client().get(app.url("/cart/add")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = common::spawn_app().await;
    let res = common::client()
        .get(app.url("/"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me");

    let res = common::client().get(app.url("/")).send().await.unwrap();
    assert!(!res.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn test_base_path_mount() {
    let mut config = AppConfig::default();
    config.catalog = common::catalog();
    config.routing.base_path = "/shop".into();
    let app = common::spawn_with(config).await;
    let client = common::client();

    let res = client.get(app.url("")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.text().await.unwrap().contains(r#"href="/shop/products""#));

    let res = client.get(app.url("/orders")).send().await.unwrap();
    assert_eq!(res.headers()[reqwest::header::LOCATION], "/shop/login");

    let res = client.get(format!("http://{}/shopping", app.addr)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_store_outage_is_503() {
    let mut config = AppConfig::default();
    config.catalog.connected = false;
    let app = common::spawn_with(config).await;
    let client = common::client();

    let res = client.get(app.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client.get(app.url("/api/products/search?q=x")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_search_api_requires_query() {
    let app = common::spawn_app().await;
    let client = common::client();
    let res = client.get(app.url("/api/products/search")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = client
        .get(app.url("/api/products/search?q=rust"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["name"], "Rust Book");
}
