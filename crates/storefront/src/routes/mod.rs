//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness check
//! GET  /health/ready              - Readiness check (CMS reachable)
//!
//! # Catalog
//! GET  /shop                      - All products (filters, sort, pagination)
//! GET  /products/{slug}           - Product detail
//! GET  /product-category/{slug}   - Category listing
//! GET  /search?q=                 - Product and post search
//!
//! # Content
//! GET  /blog                      - Post listing (?page=)
//! GET  /blog/category/{slug}      - Blog category listing (?after=)
//!
//! # Cart
//! GET  /cart                      - Cart page
//! POST /cart/add                  - Add to cart (badge fragment for HTMX, else 303)
//! POST /cart/update               - Update quantity
//! POST /cart/remove               - Remove line
//! POST /cart/coupon               - Apply coupon
//! POST /cart/coupon/remove        - Remove coupon
//! GET  /cart/count                - Cart count badge (fragment)
//!
//! # Wishlist
//! GET  /wishlist                  - Wishlist page
//! POST /wishlist/toggle           - Add or remove a product
//!
//! # Checkout
//! GET  /checkout                  - Billing form and order summary
//! POST /checkout                  - Place order
//! GET  /checkout/complete/{id}    - Order confirmation (?key=)
//!
//! # Everything else
//! GET  /{*path}                   - Slug resolution: product category, blog
//!                                   category, product, post, then page
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod pages;
pub mod products;
pub mod search;
pub mod shop;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Whether the request was sent by HTMX (or the storefront script).
pub(crate) fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Only allow same-site relative redirect targets.
pub(crate) fn safe_return_path(raw: Option<&str>, fallback: &str) -> String {
    match raw {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    let writes = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(writes)
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new().route("/", get(wishlist::show)).merge(
        Router::new()
            .route("/toggle", post(wishlist::toggle))
            .layer(cart_rate_limiter()),
    )
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).merge(post(checkout::submit).layer(checkout_rate_limiter())),
        )
        .route("/complete/{id}", get(checkout::complete))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/category/{slug}", get(blog::category))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/shop", get(shop::index))
        .route("/products/{slug}", get(products::show))
        .route("/product-category/{slug}", get(shop::category))
        .route("/search", get(search::search))
        .nest("/blog", blog_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .route("/{*path}", get(pages::resolve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/products/a"), "/"), "/products/a");
        assert_eq!(safe_return_path(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_return_path(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_return_path(None, "/wishlist"), "/wishlist");
    }
}
