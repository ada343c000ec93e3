//! WooCommerce v3 and WordPress v2 REST client.
//!
//! WooCommerce routes authenticate with the consumer key/secret over HTTP
//! basic auth. WordPress content routes are public. Product and category
//! reads are cached; coupons, orders, searches, and post listings are not.

pub mod wire;

use std::sync::Arc;

use fernleaf_core::{CategoryId, CurrencyCode, ProductId};
use moka::future::Cache;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheValue, keys};
use super::conversions::rest::{
    convert_coupon, convert_order, convert_post, convert_product, convert_product_category,
    convert_variation,
};
use super::types::{Coupon, NewOrder, Order, PostConnection, Product, ProductCategory};
use super::{CmsError, build_cache};
use crate::config::CmsConfig;
use wire::{
    RestCoupon, RestOrder, RestPost, RestProduct, RestProductCategory, RestVariation, WpError,
};

/// WooCommerce's maximum `per_page`.
const MAX_PER_PAGE: usize = 100;

/// Filters for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<CategoryId>,
    pub search: Option<String>,
    /// Restrict to these products (wishlist, related lookups).
    pub include: Vec<ProductId>,
    pub featured: bool,
}

impl ProductQuery {
    /// All products in a category.
    #[must_use]
    pub fn in_category(category: CategoryId) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    fn cache_key(&self) -> String {
        let include = self
            .include
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        keys::products(&format!(
            "c={}&i={include}&f={}",
            self.category.map(|c| c.as_i64()).unwrap_or_default(),
            self.featured
        ))
    }
}

/// Filters for post listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub category: Option<CategoryId>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
            search: None,
            category: None,
        }
    }
}

// =============================================================================
// RestClient
// =============================================================================

/// Client for the WooCommerce and WordPress REST APIs.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<RestClientInner>,
}

struct RestClientInner {
    client: reqwest::Client,
    config: CmsConfig,
    currency: CurrencyCode,
    cache: Cache<String, CacheValue>,
}

impl RestClient {
    /// Create a REST client sharing the given HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST root URL is invalid.
    pub fn new(
        client: reqwest::Client,
        config: &CmsConfig,
        currency: CurrencyCode,
    ) -> Result<Self, CmsError> {
        // Fail at startup rather than on the first request
        config.rest_url("")?;

        Ok(Self {
            inner: Arc::new(RestClientInner {
                client,
                config: config.clone(),
                currency,
                cache: build_cache(config.cache_ttl),
            }),
        })
    }

    /// Currency prices are reported in.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.inner.currency
    }

    /// Drop all cached responses.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    fn url(&self, route: &str, params: &[(&str, String)]) -> Result<Url, CmsError> {
        let mut url = self.inner.config.rest_url(route)?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a request and decode the JSON body.
    ///
    /// WooCommerce routes (`wc/...`) are sent with basic auth.
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        route: &str,
        params: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<(T, HeaderMap), CmsError> {
        let url = self.url(route, params)?;
        let mut request = self.inner.client.request(method, url);

        if route.starts_with("wc/") {
            request = request.basic_auth(
                self.inner.config.consumer_key.expose_secret(),
                Some(self.inner.config.consumer_secret.expose_secret()),
            );
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = headers
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CmsError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_from_response(status, route, &text));
        }

        let parsed = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                route = %route,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse CMS REST response"
            );
            CmsError::Parse(e)
        })?;

        Ok((parsed, headers))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        params: &[(&str, String)],
    ) -> Result<(T, HeaderMap), CmsError> {
        self.send(Method::GET, route, params, None).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by slug, with its variations attached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no published product has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, CmsError> {
        let cache_key = keys::product(slug);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let (mut found, _): (Vec<RestProduct>, _) = self
            .get(
                "wc/v3/products",
                &[("slug", slug.to_string()), ("status", "publish".to_string())],
            )
            .await?;

        if found.is_empty() {
            return Err(CmsError::NotFound(format!("product {slug}")));
        }
        let raw = found.swap_remove(0);
        let has_variations = !raw.variations.is_empty();
        let mut product = convert_product(raw, self.inner.currency);

        if has_variations {
            let route = format!("wc/v3/products/{}/variations", product.id);
            let (variations, _): (Vec<RestVariation>, _) = self
                .get(&route, &[("per_page", MAX_PER_PAGE.to_string())])
                .await?;
            product.variations = variations
                .into_iter()
                .map(|v| convert_variation(v, self.inner.currency))
                .collect();
        }

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// List products, following pagination up to the configured cap.
    ///
    /// Returns the full unpaginated array in upstream order (menu order).
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>, CmsError> {
        let cache_key = query.cache_key();
        let cacheable = query.search.is_none();

        if cacheable
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let cap = self.inner.config.max_products.max(1);
        let mut products = Vec::new();
        let mut page = 1_usize;

        loop {
            // WooCommerce offsets by (page - 1) * per_page, so per_page stays fixed
            let mut params = vec![
                ("status", "publish".to_string()),
                ("per_page", MAX_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(category) = query.category {
                params.push(("category", category.to_string()));
            }
            if let Some(search) = &query.search {
                params.push(("search", search.clone()));
            }
            if !query.include.is_empty() {
                let ids = query
                    .include
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                params.push(("include", ids));
            }
            if query.featured {
                params.push(("featured", "true".to_string()));
            }

            let (batch, _): (Vec<RestProduct>, _) = self.get("wc/v3/products", &params).await?;
            let short_page = batch.len() < MAX_PER_PAGE;
            products.extend(
                batch
                    .into_iter()
                    .map(|p| convert_product(p, self.inner.currency)),
            );

            if short_page || products.len() >= cap {
                break;
            }
            page += 1;
        }
        products.truncate(cap);

        debug!(count = products.len(), pages = page, "Fetched product listing");

        if cacheable {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(products.clone()))
                .await;
        }

        Ok(products)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get a product category by slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no category has this slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn product_category_by_slug(&self, slug: &str) -> Result<ProductCategory, CmsError> {
        let cache_key = keys::category(slug);

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let (mut found, _): (Vec<RestProductCategory>, _) = self
            .get("wc/v3/products/categories", &[("slug", slug.to_string())])
            .await?;

        if found.is_empty() {
            return Err(CmsError::NotFound(format!("product category {slug}")));
        }
        let category = convert_product_category(found.swap_remove(0));

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// List non-empty product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_categories(&self) -> Result<Vec<ProductCategory>, CmsError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(keys::CATEGORIES).await
        {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let (found, _): (Vec<RestProductCategory>, _) = self
            .get(
                "wc/v3/products/categories",
                &[
                    ("hide_empty", "true".to_string()),
                    ("per_page", MAX_PER_PAGE.to_string()),
                ],
            )
            .await?;

        let categories: Vec<ProductCategory> =
            found.into_iter().map(convert_product_category).collect();

        self.inner
            .cache
            .insert(
                keys::CATEGORIES.to_string(),
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Commerce Methods
    // =========================================================================

    /// Look up a coupon by code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the code does not exist.
    #[instrument(skip(self))]
    pub async fn coupon_by_code(&self, code: &str) -> Result<Coupon, CmsError> {
        let (mut found, _): (Vec<RestCoupon>, _) = self
            .get("wc/v3/coupons", &[("code", code.trim().to_lowercase())])
            .await?;

        if found.is_empty() {
            return Err(CmsError::NotFound(format!("coupon {code}")));
        }

        Ok(convert_coupon(found.swap_remove(0), self.inner.currency))
    }

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns `Api` when WooCommerce rejects the order (for example an
    /// invalid coupon or an out-of-stock line).
    #[instrument(skip(self, order), fields(lines = order.line_items.len()))]
    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, CmsError> {
        let body = serde_json::to_value(order)?;
        let (created, _): (RestOrder, _) = self
            .send(Method::POST, "wc/v3/orders", &[], Some(&body))
            .await?;

        let order = convert_order(created, self.inner.currency);
        tracing::info!(order_id = %order.id, "Created order");
        Ok(order)
    }

    // =========================================================================
    // Content Methods
    // =========================================================================

    /// List posts with embedded author, media, and terms.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn posts(&self, query: &PostQuery) -> Result<PostConnection, CmsError> {
        let page = query.page.max(1);
        let mut params = vec![
            ("_embed", "1".to_string()),
            ("page", page.to_string()),
            ("per_page", query.per_page.clamp(1, 100).to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = query.category {
            params.push(("categories", category.to_string()));
        }

        let (posts, headers): (Vec<RestPost>, _) = match self.get("wp/v2/posts", &params).await {
            Ok(found) => found,
            // WordPress answers 400 rest_post_invalid_page_number past the last page
            Err(CmsError::Api { code, .. }) if code == "rest_post_invalid_page_number" => {
                (Vec::new(), HeaderMap::new())
            }
            Err(e) => return Err(e),
        };

        let total_pages = headers
            .get("X-WP-TotalPages")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(page);

        Ok(PostConnection {
            posts: posts.into_iter().map(convert_post).collect(),
            page,
            total_pages,
            end_cursor: None,
            has_next_page: page < total_pages,
        })
    }

    /// Check that the REST root answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS is unreachable or answers with an error.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), CmsError> {
        let _: (serde_json::Value, _) = self.get("", &[]).await?;
        Ok(())
    }
}

/// Map a non-success REST response to an error.
fn error_from_response(status: StatusCode, route: &str, body: &str) -> CmsError {
    let parsed: Option<WpError> = serde_json::from_str(body).ok();

    if status == StatusCode::NOT_FOUND {
        return CmsError::NotFound(
            parsed.map_or_else(|| route.to_string(), |e| format!("{route}: {}", e.message)),
        );
    }

    tracing::error!(
        status = %status,
        route = %route,
        body = %body.chars().take(500).collect::<String>(),
        "CMS REST API returned non-success status"
    );

    match parsed {
        Some(e) => CmsError::Api {
            status: status.as_u16(),
            code: e.code,
            message: e.message,
        },
        None => CmsError::Api {
            status: status.as_u16(),
            code: "http_error".to_string(),
            message: body.chars().take(200).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_wordpress_body() {
        let err = error_from_response(
            StatusCode::UNAUTHORIZED,
            "wc/v3/orders",
            r#"{"code":"woocommerce_rest_cannot_create","message":"Sorry, you are not allowed to create resources.","data":{"status":401}}"#,
        );
        match err {
            CmsError::Api { status, code, .. } => {
                assert_eq!(status, 401);
                assert_eq!(code, "woocommerce_rest_cannot_create");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_404_is_not_found() {
        let err = error_from_response(
            StatusCode::NOT_FOUND,
            "wc/v3/products/9",
            r#"{"code":"woocommerce_rest_product_invalid_id","message":"Invalid ID.","data":{"status":404}}"#,
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_error_non_json_body() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "", "<html>Bad gateway</html>");
        match err {
            CmsError::Api { status, code, message } => {
                assert_eq!(status, 502);
                assert_eq!(code, "http_error");
                assert!(message.contains("Bad gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_product_query_cache_key_ignores_search() {
        let a = ProductQuery::in_category(CategoryId::new(9));
        let mut b = a.clone();
        b.search = Some("linen".to_string());
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), ProductQuery::default().cache_key());
    }
}
