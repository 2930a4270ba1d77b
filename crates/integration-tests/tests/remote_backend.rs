//! The storefront API over the record API backend.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Map, Value, json};
use shopflow_integration_tests::{TestApp, names, record_api_config, valid_checkout};
use shopflow_storefront::records::{MemoryRecords, RecordClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Two products; the shirt has two variants.
fn seeded() -> (MemoryRecords, i64) {
    let records = MemoryRecords::new();
    let shirt = records
        .seed(
            "product",
            fields(json!({
                "Name": "Classic Cotton Shirt", "price": "10.00", "images": ["shirt.png"],
                "category": {"Id": 3, "Name": "Clothing"}, "description": "Soft cotton",
                "in_stock": true, "featured": true, "Tags": ["cotton"]
            })),
        )
        .map(|id| id.get())
        .unwrap_or_default();
    let _ = records.seed(
        "product",
        fields(json!({
            "Name": "Ceramic Mug", "price": 14, "images": ["mug.png"],
            "category": "Home & Garden", "in_stock": true
        })),
    );
    for (size, color, stock) in [("M", "Red", 8), ("M", "Blue", 3)] {
        let _ = records.seed(
            "product_variant",
            fields(json!({"product_id": shirt, "size": size, "color": color, "stock": stock})),
        );
    }
    (records, shirt)
}

#[tokio::test]
async fn test_catalog_from_records() {
    let (records, shirt) = seeded();
    let app = TestApp::remote(Arc::new(records));

    let (status, body) = app.get("/api/products?sort=name").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Ceramic Mug", "Classic Cotton Shirt"]);

    let (_, body) = app.get("/api/products?category=clothing").await;
    assert_eq!(names(&body), ["Classic Cotton Shirt"]);

    let (status, body) = app.get(&format!("/api/products/{shirt}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["colors"], json!(["Red", "Blue"]));

    let (_, body) = app.get("/api/categories").await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_cart_lines_are_records() {
    let (records, shirt) = seeded();
    let app = TestApp::remote(Arc::new(records.clone()));

    for _ in 0..2 {
        let (status, _) = app
            .post(
                "/api/cart/items",
                json!({"productId": shirt, "size": "M", "color": "Blue"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    assert_eq!(records.count("cart_item"), 1);

    let (_, body) = app.get("/api/cart").await;
    assert_eq!(body["items"][0]["quantity"], 2);
    assert_eq!(body["items"][0]["variant"]["color"], "Blue");
    let id = body["items"][0]["id"].as_i64().unwrap_or_default();

    let (_, body) = app
        .patch(&format!("/api/cart/items/{id}"), json!({"quantity": 5}))
        .await;
    assert_eq!(body["itemCount"], 5);

    let (status, _) = app.post("/api/checkout", valid_checkout()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(records.count("cart_item"), 0);
}

#[tokio::test]
async fn test_unavailable_records_surface_as_bad_gateway() {
    let (records, _) = seeded();
    let app = TestApp::remote(Arc::new(records.clone()));
    records.set_unavailable(true);

    let (status, body) = app.get("/api/cart").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "External service error");
}

// =============================================================================
// HTTP record client
// =============================================================================

async fn client_app(server: &MockServer) -> TestApp {
    let config = record_api_config(&format!("{}/v1", server.uri()));
    let client = RecordClient::new(&config).unwrap_or_else(|e| panic!("client: {e}"));
    TestApp::remote(Arc::new(client))
}

#[tokio::test]
async fn test_catalog_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tables/product/records/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"Id": 1, "Name": "Smart Phone X", "price": "599.00", "images": ["p.png"],
                 "category": "Electronics", "in_stock": true, "featured": true}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/tables/product_variant/records/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": []
        })))
        .mount(&server)
        .await;

    let app = client_app(&server).await;
    let (status, body) = app.get("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["Smart Phone X"]);
}

#[tokio::test]
async fn test_rate_limit_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tables/product/records/query"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let app = client_app(&server).await;
    let (status, _) = app.get("/api/products").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
