//! Integration test harness for Fernleaf.
//!
//! Each test gets its own mock WordPress/WooCommerce server and its own
//! storefront instance, both bound to ephemeral ports, plus a cookie-enabled
//! client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fernleaf-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fernleaf_core::CurrencyCode;
use fernleaf_storefront::config::{
    AnalyticsConfig, CheckoutConfig, CmsConfig, StoreConfig, StorefrontConfig,
};
use fernleaf_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};

// =============================================================================
// Fixtures
// =============================================================================

/// Everything the mock CMS serves, plus what it received.
#[derive(Debug, Clone)]
pub struct MockData {
    pub products: Vec<Value>,
    /// Variations keyed by parent product ID.
    pub variations: HashMap<i64, Vec<Value>>,
    pub categories: Vec<Value>,
    pub coupons: Vec<Value>,
    /// WPGraphQL post nodes keyed by slug.
    pub posts: HashMap<String, Value>,
    /// WPGraphQL page nodes keyed by URI (`/about/team/`).
    pub pages: HashMap<String, Value>,
    /// WordPress REST posts, newest first.
    pub rest_posts: Vec<Value>,
    /// WPGraphQL blog categories keyed by slug. Each carries every post
    /// node under `posts`; the mock pages them by cursor.
    pub blog_categories: HashMap<String, Value>,
    /// WooGraphQL product nodes returned for featured products.
    pub featured: Vec<Value>,
    /// `payment_url` returned for created orders.
    pub payment_url: String,
    /// Order payloads received on `POST wc/v3/orders`.
    pub orders: Vec<Value>,
}

/// A WooCommerce product as the REST API returns it.
#[must_use]
pub fn product(id: i64, slug: &str, name: &str, price: &str, category_ids: &[i64]) -> Value {
    let categories: Vec<Value> = category_ids
        .iter()
        .map(|id| json!({ "id": id, "slug": format!("cat-{id}"), "name": format!("Category {id}") }))
        .collect();
    json!({
        "id": id,
        "slug": slug,
        "name": name,
        "description": format!("<p>{name} description</p>"),
        "short_description": "",
        "sku": format!("SKU-{id}"),
        "price": price,
        "regular_price": price,
        "on_sale": false,
        "featured": false,
        "stock_status": "instock",
        "stock_quantity": null,
        "images": [],
        "categories": categories,
        "attributes": [],
        "variations": [],
        "average_rating": "0.00",
        "rating_count": 0,
        "total_sales": 0,
        "date_created": "2024-01-10T08:00:00"
    })
}

/// A WordPress post as the REST API returns it with `_embed`.
#[must_use]
pub fn rest_post(id: i64, slug: &str, title: &str) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "title": { "rendered": title },
        "excerpt": { "rendered": format!("<p>{title} excerpt</p>") },
        "content": { "rendered": format!("<p>{title} body</p>") },
        "date": "2024-04-01T09:00:00",
        "_embedded": {
            "author": [{ "name": "Sam" }],
            "wp:term": [[{ "slug": "news", "name": "News" }]]
        }
    })
}

/// A WPGraphQL post node.
#[must_use]
pub fn post_node(id: i64, slug: &str, title: &str) -> Value {
    json!({
        "databaseId": id,
        "slug": slug,
        "title": title,
        "excerpt": format!("<p>{title} excerpt</p>"),
        "content": format!("<p>{title} body</p>"),
        "date": "2024-03-05T09:00:00",
        "author": { "node": { "name": "Sam" } },
        "categories": { "nodes": [{ "slug": "news", "name": "News" }] },
        "tags": { "nodes": [] }
    })
}

/// A WPGraphQL blog category holding `posts`.
#[must_use]
pub fn blog_category(id: i64, slug: &str, name: &str, posts: Vec<Value>) -> Value {
    let count = posts.len();
    json!({
        "databaseId": id,
        "slug": slug,
        "name": name,
        "description": format!("<p>Posts filed under {name}.</p>"),
        "count": count,
        "posts": posts
    })
}

impl Default for MockData {
    fn default() -> Self {
        let mut throw = product(1, "linen-throw", "Linen Throw", "45", &[10]);
        throw["categories"] = json!([{ "id": 10, "slug": "linen", "name": "Linen Collection" }]);

        // Shares its slug with the category to exercise resolution order
        let mut sample = product(2, "linen", "Linen Sample", "5", &[10]);
        sample["categories"] = json!([{ "id": 10, "slug": "linen", "name": "Linen Collection" }]);

        let mut mug = product(3, "sold-out-mug", "Sold Out Mug", "12", &[]);
        mug["stock_status"] = json!("outofstock");

        let spring = post_node(77, "spring-notes", "Spring Notes");
        let mut posts = HashMap::new();
        posts.insert("spring-notes".to_string(), spring.clone());

        let mut blog_categories = HashMap::new();
        blog_categories.insert(
            "news".to_string(),
            blog_category(30, "news", "News", vec![spring]),
        );

        let mut pages = HashMap::new();
        pages.insert(
            "/about/team/".to_string(),
            json!({
                "databaseId": 9,
                "slug": "team",
                "uri": "/about/team/",
                "title": "Our Team",
                "content": "<p>Hello from the team.</p>",
                "modified": "2024-02-01T10:00:00"
            }),
        );

        Self {
            products: vec![throw, sample, mug],
            variations: HashMap::new(),
            categories: vec![json!({
                "id": 10,
                "slug": "linen",
                "name": "Linen Collection",
                "description": "<p>Washed linen for every room.</p>",
                "parent": 0,
                "count": 2,
                "image": null
            })],
            coupons: vec![json!({
                "code": "save10",
                "discount_type": "percent",
                "amount": "10.00",
                "date_expires": null,
                "usage_count": 0,
                "usage_limit": null,
                "individual_use": false,
                "minimum_amount": "0.00",
                "maximum_amount": "0.00",
                "free_shipping": false
            })],
            posts,
            pages,
            rest_posts: vec![
                rest_post(78, "linen-care", "Caring for Linen"),
                rest_post(77, "spring-notes", "Spring Notes"),
            ],
            blog_categories,
            featured: vec![json!({
                "databaseId": 1,
                "slug": "linen-throw",
                "name": "Linen Throw",
                "price": "$45.00",
                "regularPrice": "$45.00",
                "stockStatus": "IN_STOCK",
                "featured": true,
                "onSale": false,
                "productCategories": { "nodes": [{ "databaseId": 10, "slug": "linen", "name": "Linen Collection" }] }
            })],
            payment_url: String::new(),
            orders: Vec::new(),
        }
    }
}

// =============================================================================
// Mock CMS
// =============================================================================

/// Shared handle to the mock's data.
#[derive(Clone)]
pub struct MockCms {
    data: Arc<Mutex<MockData>>,
    pub addr: SocketAddr,
}

impl MockCms {
    /// Lock the mock data for inspection or modification.
    ///
    /// # Panics
    ///
    /// Panics if a mock handler panicked while holding the lock.
    pub fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().expect("mock data lock poisoned")
    }

    /// Base URL of the mock WordPress site.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

type Shared = Arc<Mutex<MockData>>;

fn lock(data: &Shared) -> MutexGuard<'_, MockData> {
    data.lock().expect("mock data lock poisoned")
}

fn wc_unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "code": "woocommerce_rest_cannot_view",
            "message": "Sorry, you cannot list resources.",
            "data": { "status": 401 }
        })),
    )
        .into_response()
}

/// `page` and `per_page` as WordPress reads them.
fn paging(params: &HashMap<String, String>, default_per_page: usize) -> (usize, usize) {
    let page = params
        .get("page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(1_usize)
        .max(1);
    let per_page = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(default_per_page)
        .clamp(1, 100);
    (page, per_page)
}

fn has_basic_auth(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "))
}

async fn rest_root() -> Json<Value> {
    Json(json!({ "name": "Mock Fernleaf", "namespaces": ["wc/v3", "wp/v2"] }))
}

async fn products(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_basic_auth(&headers) {
        return wc_unauthorized();
    }

    let include: Vec<i64> = params
        .get("include")
        .map(|raw| raw.split(',').filter_map(|id| id.parse().ok()).collect())
        .unwrap_or_default();
    let category: Option<i64> = params.get("category").and_then(|c| c.parse().ok());
    let search = params.get("search").map(|s| s.to_lowercase());
    let (page, per_page) = paging(&params, 10);

    let found: Vec<Value> = lock(&data)
        .products
        .iter()
        .filter(|p| params.get("slug").is_none_or(|slug| p["slug"] == slug.as_str()))
        .filter(|p| include.is_empty() || p["id"].as_i64().is_some_and(|id| include.contains(&id)))
        .filter(|p| {
            category.is_none_or(|c| {
                p["categories"]
                    .as_array()
                    .is_some_and(|cats| cats.iter().any(|cat| cat["id"] == c))
            })
        })
        .filter(|p| {
            search.as_ref().is_none_or(|needle| {
                p["name"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(needle))
            })
        })
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    Json(Value::Array(found)).into_response()
}

async fn variations(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !has_basic_auth(&headers) {
        return wc_unauthorized();
    }
    let found = lock(&data).variations.get(&id).cloned().unwrap_or_default();
    Json(Value::Array(found)).into_response()
}

async fn categories(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_basic_auth(&headers) {
        return wc_unauthorized();
    }
    let found: Vec<Value> = lock(&data)
        .categories
        .iter()
        .filter(|c| params.get("slug").is_none_or(|slug| c["slug"] == slug.as_str()))
        .cloned()
        .collect();
    Json(Value::Array(found)).into_response()
}

async fn coupons(
    State(data): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !has_basic_auth(&headers) {
        return wc_unauthorized();
    }
    let found: Vec<Value> = lock(&data)
        .coupons
        .iter()
        .filter(|c| params.get("code").is_none_or(|code| c["code"] == code.as_str()))
        .cloned()
        .collect();
    Json(Value::Array(found)).into_response()
}

async fn create_order(
    State(data): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !has_basic_auth(&headers) {
        return wc_unauthorized();
    }

    let mut data = lock(&data);
    if body["line_items"].as_array().is_none_or(Vec::is_empty) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "woocommerce_rest_invalid_order",
                "message": "Order has no line items.",
                "data": { "status": 400 }
            })),
        )
            .into_response();
    }

    data.orders.push(body);
    let id = 500 + i64::try_from(data.orders.len()).unwrap_or(0);
    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "order_key": format!("wc_order_{id}"),
            "status": "pending",
            "total": "0.00",
            "payment_url": data.payment_url
        })),
    )
        .into_response()
}

async fn posts(
    State(data): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let search = params.get("search").map(|s| s.to_lowercase());
    let (page, per_page) = paging(&params, 10);

    let matching: Vec<Value> = lock(&data)
        .rest_posts
        .iter()
        .filter(|p| {
            search.as_ref().is_none_or(|needle| {
                p["title"]["rendered"]
                    .as_str()
                    .is_some_and(|title| title.to_lowercase().contains(needle))
            })
        })
        .cloned()
        .collect();

    let total = matching.len();
    let total_pages = total.div_ceil(per_page).max(1);
    if page > total_pages {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "code": "rest_post_invalid_page_number",
                "message": "The page number requested is larger than the number of pages available.",
                "data": { "status": 400 }
            })),
        )
            .into_response();
    }

    let found: Vec<Value> = matching
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();
    (
        [
            ("X-WP-TotalPages", total_pages.to_string()),
            ("X-WP-Total", total.to_string()),
        ],
        Json(Value::Array(found)),
    )
        .into_response()
}

/// One cursor page of a blog category. Cursors are `cursor:{offset}`.
fn blog_category_page(category: &Value, first: usize, after: Option<&str>) -> Value {
    let all = category["posts"].as_array().cloned().unwrap_or_default();
    let offset = after
        .and_then(|a| a.strip_prefix("cursor:"))
        .and_then(|o| o.parse().ok())
        .unwrap_or(0_usize);
    let nodes: Vec<Value> = all.iter().skip(offset).take(first).cloned().collect();
    let end = offset + nodes.len();

    let mut page = category.clone();
    page["posts"] = json!({
        "nodes": nodes,
        "pageInfo": {
            "hasNextPage": end < all.len(),
            "endCursor": format!("cursor:{end}")
        }
    });
    page
}

async fn graphql(State(data): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let data = lock(&data);
    let vars = &body["variables"];
    let response = match body["operationName"].as_str().unwrap_or_default() {
        "Ping" => json!({ "generalSettings": { "title": "Mock Fernleaf" } }),
        "GetPostBySlug" => {
            let post = vars["slug"].as_str().and_then(|slug| data.posts.get(slug));
            json!({ "post": post })
        }
        "GetPageByUri" => {
            let page = vars["uri"].as_str().and_then(|uri| data.pages.get(uri));
            json!({ "page": page })
        }
        "GetBlogCategory" => {
            let category = vars["slug"]
                .as_str()
                .and_then(|slug| data.blog_categories.get(slug))
                .map(|c| {
                    let first = vars["first"]
                        .as_u64()
                        .and_then(|f| usize::try_from(f).ok())
                        .unwrap_or(10);
                    blog_category_page(c, first, vars["after"].as_str())
                });
            json!({ "category": category })
        }
        "GetFeaturedProducts" => json!({ "products": { "nodes": data.featured } }),
        other => {
            return Json(json!({
                "errors": [{ "message": format!("Unknown operation {other}") }]
            }));
        }
    };
    Json(json!({ "data": response }))
}

fn mock_router(data: Shared) -> Router {
    Router::new()
        .route("/wp-json/", get(rest_root))
        .route("/wp-json/wc/v3/products", get(products))
        .route("/wp-json/wc/v3/products/categories", get(categories))
        .route("/wp-json/wc/v3/products/{id}/variations", get(variations))
        .route("/wp-json/wc/v3/coupons", get(coupons))
        .route("/wp-json/wc/v3/orders", post(create_order))
        .route("/wp-json/wp/v2/posts", get(posts))
        .route("/graphql", post(graphql))
        .with_state(data)
}

/// Start a mock CMS on an ephemeral port.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn spawn_mock_cms(data: MockData) -> MockCms {
    let data = Arc::new(Mutex::new(data));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock CMS");
    let addr = listener.local_addr().expect("Mock CMS has no local address");

    let router = mock_router(data.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    MockCms { data, addr }
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront configuration pointing at `cms_url`.
///
/// # Panics
///
/// Panics if `cms_url` is not a valid URL.
#[must_use]
pub fn test_config(cms_url: &str, base_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: base_url.to_string(),
        store: StoreConfig {
            name: "Fernleaf Test".to_string(),
            currency: CurrencyCode::USD,
        },
        cms: CmsConfig {
            base_url: url::Url::parse(cms_url).expect("Invalid mock CMS URL"),
            rest_prefix: "/wp-json".to_string(),
            graphql_path: "/graphql".to_string(),
            consumer_key: SecretString::from("ck_test_8f3kd93ndk2mzq".to_string()),
            consumer_secret: SecretString::from("cs_test_q9w8e7r6t5y4u3".to_string()),
            cache_ttl: Duration::from_secs(60),
            max_products: 500,
        },
        checkout: CheckoutConfig {
            payment_method: "bacs".to_string(),
            payment_method_title: "Direct bank transfer".to_string(),
        },
        analytics: AnalyticsConfig {
            ga4_measurement_id: None,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// A running storefront and the mock CMS behind it.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub cms: MockCms,
}

impl TestContext {
    /// Start a storefront against the default fixtures.
    pub async fn new() -> Self {
        Self::with_data(MockData::default()).await
    }

    /// Start a storefront against custom fixtures.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot start.
    pub async fn with_data(data: MockData) -> Self {
        Self::with_config(data, |_| {}).await
    }

    /// Start a storefront against custom fixtures with adjusted settings.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot start.
    pub async fn with_config(data: MockData, configure: impl FnOnce(&mut StorefrontConfig)) -> Self {
        let cms = spawn_mock_cms(data).await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind storefront");
        let addr = listener
            .local_addr()
            .expect("Storefront has no local address");
        let base_url = format!("http://{addr}");

        let mut config = test_config(&cms.url(), &base_url);
        configure(&mut config);
        let state = AppState::new(config).expect("Failed to build storefront state");
        let app = fernleaf_storefront::app(state);
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            cms,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path and return status and body.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, response.text().await.unwrap_or_default())
    }

    /// POST a form and return the raw response.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
