//! Catalog API tests against the demo catalog.

use axum::http::StatusCode;
use rust_decimal::Decimal;
use shopflow_integration_tests::{TestApp, decimal, names};

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::local();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_default_listing_puts_featured_first() {
    let app = TestApp::local();
    let (status, body) = app.get("/api/products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 8);
    assert_eq!(body["sort"], "featured");
    assert_eq!(
        names(&body),
        [
            "Wireless Headphones",
            "Smart Phone X",
            "Classic Cotton Shirt",
            "Garden Hose",
            "Laptop Stand",
            "Denim Jacket",
            "Ceramic Mug",
            "Yoga Mat",
        ]
    );
}

#[tokio::test]
async fn test_category_filter_ignores_case() {
    let app = TestApp::local();
    let (_, body) = app.get("/api/products?category=electronics").await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_price_range_is_inclusive() {
    let app = TestApp::local();
    let (_, body) = app
        .get("/api/products?min_price=25.00&max_price=79.50&sort=price-low")
        .await;
    assert_eq!(
        names(&body),
        ["Yoga Mat", "Garden Hose", "Laptop Stand", "Denim Jacket"]
    );
}

#[tokio::test]
async fn test_in_stock_filter() {
    let app = TestApp::local();
    let (_, body) = app.get("/api/products?in_stock=true").await;
    assert_eq!(body["count"], 7);
    assert!(!names(&body).contains(&"Denim Jacket".to_string()));
}

#[tokio::test]
async fn test_sort_orders() {
    let app = TestApp::local();

    let (_, body) = app.get("/api/products?sort=price-high").await;
    let prices: Vec<Decimal> = body["products"]
        .as_array()
        .unwrap_or(&Vec::new())
        .iter()
        .map(|p| decimal(&p["price"]))
        .collect();
    assert!(prices.windows(2).all(|w| w.first() >= w.get(1)));

    let (_, body) = app.get("/api/products?sort=name").await;
    assert_eq!(names(&body).first().map(String::as_str), Some("Ceramic Mug"));
}

#[tokio::test]
async fn test_unknown_sort_is_rejected() {
    let app = TestApp::local();
    let (status, body) = app.get("/api/products?sort=random").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("random"));
}

#[tokio::test]
async fn test_featured_endpoint() {
    let app = TestApp::local();
    let (_, body) = app.get("/api/products/featured").await;
    assert_eq!(body["count"], 4);
    assert!(
        body["products"]
            .as_array()
            .unwrap_or(&Vec::new())
            .iter()
            .all(|p| p["featured"] == true)
    );
}

// =============================================================================
// Detail
// =============================================================================

#[tokio::test]
async fn test_product_detail_lists_choices() {
    let app = TestApp::local();
    let (status, body) = app.get("/api/products/4").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Classic Cotton Shirt");
    assert_eq!(decimal(&body["price"]), Decimal::new(1000, 2));
    assert_eq!(body["sizes"], serde_json::json!(["S", "M", "L"]));
    assert_eq!(body["colors"], serde_json::json!(["Red", "Blue"]));
    assert_eq!(body["defaultSelection"]["size"], "S");
    assert_eq!(body["defaultStock"], 5);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::local();
    let (status, body) = app.get("/api/products/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found: 999");
}

#[tokio::test]
async fn test_malformed_product_id_is_bad_request() {
    let app = TestApp::local();
    let (status, _) = app.get("/api/products/shirt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Categories and search
// =============================================================================

#[tokio::test]
async fn test_categories_with_counts() {
    let app = TestApp::local();
    let (status, body) = app.get("/api/categories").await;

    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().cloned().unwrap_or_default();
    assert_eq!(categories.len(), 4);

    let home = categories
        .iter()
        .find(|c| c["name"] == "Home & Garden")
        .cloned()
        .unwrap_or_default();
    assert_eq!(home["slug"], "home-garden");
    assert_eq!(home["count"], 2);
}

#[tokio::test]
async fn test_search_matches_name_and_category() {
    let app = TestApp::local();
    let (_, body) = app.get("/api/search?q=GARDEN&sort=name").await;
    assert_eq!(names(&body), ["Ceramic Mug", "Garden Hose"]);
}

#[tokio::test]
async fn test_blank_search_returns_everything() {
    let app = TestApp::local();
    let (_, body) = app.get("/api/search?q=%20%20").await;
    assert_eq!(body["count"], 8);
}
