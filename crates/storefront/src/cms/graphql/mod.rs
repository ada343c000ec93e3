//! WPGraphQL client.
//!
//! Uses `graphql_client` envelopes with `reqwest` 0.13 for HTTP. Single posts,
//! pages, and blog categories are cached using `moka`.

pub mod queries;

use std::sync::Arc;

use fernleaf_core::CurrencyCode;
use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{CacheValue, keys};
use super::conversions::graphql::{
    convert_blog_category, convert_page, convert_post, convert_product,
};
use super::types::{BlogCategory, Page, Post, PostConnection, Product};
use super::{CmsError, GraphQLError, GraphQLErrorLocation, build_cache};
use crate::config::CmsConfig;
use queries::{
    BlogCategoryVariables, FirstVariables, GetBlogCategory, GetFeaturedProducts, GetPageByUri,
    GetPostBySlug, NoVariables, Ping, SlugVariables, UriVariables,
};

// =============================================================================
// GraphqlClient
// =============================================================================

/// Client for the WPGraphQL endpoint.
#[derive(Clone)]
pub struct GraphqlClient {
    inner: Arc<GraphqlClientInner>,
}

struct GraphqlClientInner {
    client: reqwest::Client,
    endpoint: Url,
    currency: CurrencyCode,
    cache: Cache<String, CacheValue>,
}

impl GraphqlClient {
    /// Create a GraphQL client sharing the given HTTP connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is invalid.
    pub fn new(
        client: reqwest::Client,
        config: &CmsConfig,
        currency: CurrencyCode,
    ) -> Result<Self, CmsError> {
        Ok(Self {
            inner: Arc::new(GraphqlClientInner {
                client,
                endpoint: config.graphql_url()?,
                currency,
                cache: build_cache(config.cache_ttl),
            }),
        })
    }

    /// Drop all cached responses.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, CmsError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(self.inner.endpoint.clone())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CmsError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                operation = request_body.operation_name,
                body = %response_text.chars().take(500).collect::<String>(),
                "WPGraphQL returned non-success status"
            );
            return Err(CmsError::GraphQL(vec![GraphQLError {
                message: format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
                locations: vec![],
                path: vec![],
            }]));
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    operation = request_body.operation_name,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse WPGraphQL response"
                );
                return Err(CmsError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(CmsError::GraphQL(
                errors.into_iter().map(convert_error).collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                operation = request_body.operation_name,
                "WPGraphQL response has no data and no errors"
            );
            CmsError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                locations: vec![],
                path: vec![],
            }])
        })
    }

    // =========================================================================
    // Content Methods
    // =========================================================================

    /// Get a published post by slug.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the post does not exist.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn post_by_slug(&self, slug: &str) -> Result<Post, CmsError> {
        let cache_key = keys::post(slug);

        if let Some(CacheValue::Post(post)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for post");
            return Ok(*post);
        }

        let data = self
            .execute::<GetPostBySlug>(SlugVariables {
                slug: slug.to_string(),
            })
            .await?;

        let post = data
            .post
            .map(convert_post)
            .ok_or_else(|| CmsError::NotFound(format!("post {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Post(Box::new(post.clone())))
            .await;

        Ok(post)
    }

    /// Get a blog category and one page of its posts.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn blog_category_by_slug(
        &self,
        slug: &str,
        first: i64,
        after: Option<String>,
    ) -> Result<(BlogCategory, PostConnection), CmsError> {
        let cache_key = keys::blog_category(slug, after.as_deref());

        if let Some(CacheValue::BlogCategory(found)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for blog category");
            return Ok(*found);
        }

        let data = self
            .execute::<GetBlogCategory>(BlogCategoryVariables {
                slug: slug.to_string(),
                first,
                after,
            })
            .await?;

        let found = data
            .category
            .map(convert_blog_category)
            .ok_or_else(|| CmsError::NotFound(format!("blog category {slug}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::BlogCategory(Box::new(found.clone())))
            .await;

        Ok(found)
    }

    /// Get a page by its hierarchical URI (`/about/team/`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no page has this URI.
    #[instrument(skip(self), fields(uri = %uri))]
    pub async fn page_by_uri(&self, uri: &str) -> Result<Page, CmsError> {
        let cache_key = keys::page(uri);

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for page");
            return Ok(*page);
        }

        let data = self
            .execute::<GetPageByUri>(UriVariables {
                uri: uri.to_string(),
            })
            .await?;

        let page = data
            .page
            .map(convert_page)
            .ok_or_else(|| CmsError::NotFound(format!("page {uri}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get featured products (WooGraphQL).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn featured_products(&self, first: i64) -> Result<Vec<Product>, CmsError> {
        let cache_key = keys::featured(first);

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let data = self
            .execute::<GetFeaturedProducts>(FirstVariables { first })
            .await?;

        let products: Vec<Product> = data
            .products
            .map(|p| p.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|p| convert_product(p, self.inner.currency))
            .collect();

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Check that the endpoint answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is unreachable or returns errors.
    #[instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), CmsError> {
        self.execute::<Ping>(NoVariables {}).await.map(|_| ())
    }
}

fn convert_error(e: graphql_client::Error) -> GraphQLError {
    GraphQLError {
        message: e.message,
        locations: e.locations.map_or_else(Vec::new, |locs| {
            locs.into_iter()
                .map(|l| GraphQLErrorLocation {
                    line: i64::from(l.line),
                    column: i64::from(l.column),
                })
                .collect()
        }),
        path: e.path.map_or_else(Vec::new, |p| {
            p.into_iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(s) => serde_json::Value::String(s),
                    graphql_client::PathFragment::Index(i) => serde_json::Value::Number(i.into()),
                })
                .collect()
        }),
    }
}
