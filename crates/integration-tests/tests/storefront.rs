//! Browsing: health, slug resolution, catalog, search, and wishlist.

#![allow(clippy::unwrap_used)]

use fernleaf_integration_tests::{TestContext, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, _) = ctx.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let ctx = TestContext::new().await;
    let response = ctx.client.get(ctx.url("/shop")).send().await.unwrap();

    let headers = response.headers();
    let csp = headers
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(csp.contains(&ctx.cms.url()));
    assert!(csp.contains("'nonce-"));
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_product_category_wins_over_product_with_same_slug() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/linen").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Linen Collection</h1>"));
    assert!(body.contains("Washed linen for every room."));
}

#[tokio::test]
async fn test_path_falls_through_to_page_uri() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/about/team").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Our Team</h1>"));
    assert!(body.contains("Hello from the team."));
}

#[tokio::test]
async fn test_post_resolves_at_its_slug() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/spring-notes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Spring Notes</h1>"));
    assert!(body.contains("March 5, 2024"));
    assert!(body.contains("/blog/category/news"));
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404"));

    let (status, _) = ctx.get("/products/no-such-product").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/product-category/no-such-category").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_detail_page() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/products/linen-throw").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>Linen Throw</h1>"));
    assert!(body.contains("$45.00"));
    assert!(body.contains("SKU-1"));
    // Related: same category, excluding itself
    assert!(body.contains("Linen Sample"));
}

#[tokio::test]
async fn test_shop_sorts_by_price() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/shop?sort=price").await;
    assert_eq!(status, StatusCode::OK);

    let sample = body.find("Linen Sample").unwrap();
    let mug = body.find("Sold Out Mug").unwrap();
    let throw = body.find("Linen Throw").unwrap();
    assert!(sample < mug && mug < throw);
}

#[tokio::test]
async fn test_shop_in_stock_filter() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/shop?in_stock=1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Linen Throw"));
    assert!(!body.contains("Sold Out Mug"));
    assert!(body.contains("Clear filters"));
}

#[tokio::test]
async fn test_search() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/search?q=throw").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Linen Throw"));
    assert!(!body.contains("Sold Out Mug"));

    let (status, body) = ctx.get("/search?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Nothing matched"));
}

#[tokio::test]
async fn test_wishlist_toggle() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_form(
            "/wishlist/toggle",
            &[("product_id", "1"), ("return_to", "/products/linen-throw")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/products/linen-throw"));

    let (_, body) = ctx.get("/wishlist").await;
    assert!(body.contains("Linen Throw"));
    assert!(body.contains("Remove from wishlist"));

    // Toggling again removes it; off-site return targets are ignored
    let response = ctx
        .post_form(
            "/wishlist/toggle",
            &[("product_id", "1"), ("return_to", "https://evil.example/")],
        )
        .await;
    assert_eq!(location(&response).as_deref(), Some("/wishlist"));

    let (_, body) = ctx.get("/wishlist").await;
    assert!(body.contains("Your wishlist is empty"));
}

#[tokio::test]
async fn test_listing_follows_upstream_pages_up_to_cap() {
    use fernleaf_core::CurrencyCode;
    use fernleaf_integration_tests::{MockData, product, test_config};
    use fernleaf_storefront::cms::{CmsClient, ProductQuery};

    let data = MockData {
        products: (1..=300)
            .map(|id| product(id, &format!("item-{id}"), &format!("Item {id}"), "10", &[]))
            .collect(),
        ..MockData::default()
    };
    let ctx = TestContext::with_config(data, |config| config.cms.max_products = 250).await;

    let mut config = test_config(&ctx.cms.url(), &ctx.base_url);
    config.cms.max_products = 250;
    let cms = CmsClient::new(&config.cms, CurrencyCode::USD).unwrap();
    let products = cms.rest().products(&ProductQuery::default()).await.unwrap();

    let ids: Vec<i64> = products.iter().map(|p| p.id.as_i64()).collect();
    assert_eq!(ids, (1..=250).collect::<Vec<_>>());

    let (status, body) = ctx.get("/shop").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("250 products"));
}
