//! Cache types for CMS responses.

use super::types::{BlogCategory, Page, Post, PostConnection, Product, ProductCategory};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Category(Box<ProductCategory>),
    Categories(Vec<ProductCategory>),
    Post(Box<Post>),
    Page(Box<Page>),
    BlogCategory(Box<(BlogCategory, PostConnection)>),
}

/// Cache key helpers so producers and invalidation agree on formats.
pub mod keys {
    pub fn product(slug: &str) -> String {
        format!("product:{slug}")
    }

    pub fn products(query: &str) -> String {
        format!("products:{query}")
    }

    pub fn category(slug: &str) -> String {
        format!("category:{slug}")
    }

    pub const CATEGORIES: &str = "categories";

    pub fn post(slug: &str) -> String {
        format!("post:{slug}")
    }

    pub fn page(uri: &str) -> String {
        format!("page:{uri}")
    }

    pub fn blog_category(slug: &str, after: Option<&str>) -> String {
        format!("blog-category:{slug}:{}", after.unwrap_or(""))
    }

    pub fn featured(first: i64) -> String {
        format!("featured:{first}")
    }
}
