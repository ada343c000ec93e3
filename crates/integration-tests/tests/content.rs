//! Home page, blog listings, and blog category resolution.

#![allow(clippy::unwrap_used)]

use fernleaf_integration_tests::{MockData, TestContext, blog_category, post_node, rest_post};
use reqwest::StatusCode;

fn entries(count: i64) -> Vec<serde_json::Value> {
    (1..=count)
        .map(|n| rest_post(100 + n, &format!("entry-{n:02}"), &format!("Entry {n:02}")))
        .collect()
}

#[tokio::test]
async fn test_home_shows_featured_categories_and_posts() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h2>Featured</h2>"));
    assert!(body.contains("/products/linen-throw"));
    assert!(body.contains("Linen Collection"));
    assert!(body.contains("/product-category/linen"));
    assert!(body.contains("Caring for Linen"));
}

#[tokio::test]
async fn test_home_without_content_still_renders() {
    let data = MockData {
        rest_posts: Vec::new(),
        featured: Vec::new(),
        categories: Vec::new(),
        ..MockData::default()
    };
    let ctx = TestContext::with_data(data).await;

    let (status, body) = ctx.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("From the journal"));
    assert!(!body.contains("Shop by category"));
}

#[tokio::test]
async fn test_blog_index_lists_posts() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Caring for Linen"));
    assert!(body.contains("Spring Notes"));
    assert!(!body.contains("rel=\"next\""));
}

#[tokio::test]
async fn test_blog_index_pages_through_posts() {
    let data = MockData {
        rest_posts: entries(12),
        ..MockData::default()
    };
    let ctx = TestContext::with_data(data).await;

    let (status, body) = ctx.get("/blog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Entry 01"));
    assert!(body.contains("Entry 09"));
    assert!(!body.contains("Entry 10"));
    assert!(body.contains("Page 1 of 2"));
    assert!(body.contains("href=\"/blog?page=2\""));

    let (status, body) = ctx.get("/blog?page=2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Entry 10"));
    assert!(body.contains("Entry 12"));
    assert!(!body.contains("Entry 09"));
    assert!(body.contains("href=\"/blog\""));

    // Past the last page WordPress answers 400; the listing is just empty
    let (status, body) = ctx.get("/blog?page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No posts yet."));
}

#[tokio::test]
async fn test_blog_category_page() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/blog/category/news").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>News</h1>"));
    assert!(body.contains("Spring Notes"));
    assert!(!body.contains("Older posts"));

    let (status, _) = ctx.get("/blog/category/recipes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_category_follows_cursor() {
    let mut data = MockData::default();
    let nodes = (1..=10)
        .map(|n| post_node(200 + n, &format!("note-{n:02}"), &format!("Note {n:02}")))
        .collect();
    data.blog_categories
        .insert("notes".to_string(), blog_category(31, "notes", "Notes", nodes));
    let ctx = TestContext::with_data(data).await;

    let (status, body) = ctx.get("/blog/category/notes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Note 09"));
    assert!(!body.contains("Note 10"));
    assert!(body.contains("href=\"/blog/category/notes?after=cursor%3A9\""));
    assert!(!body.contains("First page"));

    let (status, body) = ctx.get("/blog/category/notes?after=cursor%3A9").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Note 10"));
    assert!(!body.contains("Note 09"));
    assert!(body.contains("First page"));
    assert!(!body.contains("Older posts"));
}

#[tokio::test]
async fn test_catch_all_resolves_blog_category() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/news").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>News</h1>"));
    assert!(body.contains("Spring Notes"));
}
