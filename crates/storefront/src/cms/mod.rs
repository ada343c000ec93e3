//! WordPress/WooCommerce REST and GraphQL API clients.
//!
//! # Architecture
//!
//! - The CMS is source of truth - NO local sync, direct API calls
//! - WooCommerce REST (`wc/v3`) for products, categories, coupons, and orders
//! - WordPress REST (`wp/v2`) for post listings and search
//! - WPGraphQL for single posts, pages, blog categories, and featured products
//! - Both response shapes convert into the types in [`types`]
//! - In-memory caching via `moka` for read-only responses
//!
//! # Example
//!
//! ```rust,ignore
//! use fernleaf_storefront::cms::CmsClient;
//!
//! let cms = CmsClient::new(&config.cms, config.store.currency)?;
//!
//! let product = cms.rest().product_by_slug("linen-shirt").await?;
//! let post = cms.graphql().post_by_slug("spring-lookbook").await?;
//! ```

mod cache;
pub mod conversions;
pub mod graphql;
pub mod rest;
pub mod types;

use std::time::Duration;

use fernleaf_core::CurrencyCode;
use moka::future::Cache;
use thiserror::Error;

use crate::config::CmsConfig;

pub use graphql::GraphqlClient;
pub use rest::{PostQuery, ProductQuery, RestClient};
pub use types::*;

use cache::CacheValue;

/// Errors that can occur when talking to the CMS.
#[derive(Debug, Error)]
pub enum CmsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the CMS host.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// WordPress REST error response.
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CmsError {
    /// Whether the error means the entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// A GraphQL error returned by WPGraphQL.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the shared response cache.
fn build_cache(ttl: Duration) -> Cache<String, CacheValue> {
    Cache::builder().max_capacity(1000).time_to_live(ttl).build()
}

// =============================================================================
// CmsClient
// =============================================================================

/// Facade over both CMS APIs.
///
/// Cheap to clone; both clients share one HTTP connection pool.
#[derive(Clone)]
pub struct CmsClient {
    rest: RestClient,
    graphql: GraphqlClient,
}

impl CmsClient {
    /// Create clients for the configured CMS.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URLs cannot be built or the HTTP
    /// client fails to initialize.
    pub fn new(config: &CmsConfig, currency: CurrencyCode) -> Result<Self, CmsError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("fernleaf-storefront/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            rest: RestClient::new(http.clone(), config, currency)?,
            graphql: GraphqlClient::new(http, config, currency)?,
        })
    }

    /// The REST client.
    #[must_use]
    pub const fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// The GraphQL client.
    #[must_use]
    pub const fn graphql(&self) -> &GraphqlClient {
        &self.graphql
    }

    /// Drop all cached responses from both clients.
    pub async fn invalidate_all(&self) {
        self.rest.invalidate_all().await;
        self.graphql.invalidate_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cms_error_display() {
        let err = CmsError::NotFound("product linen-shirt".to_string());
        assert_eq!(err.to_string(), "Not found: product linen-shirt");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_api_error_display() {
        let err = CmsError::Api {
            status: 401,
            code: "woocommerce_rest_cannot_view".to_string(),
            message: "Sorry, you cannot list resources.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error 401 (woocommerce_rest_cannot_view): Sorry, you cannot list resources."
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Cannot query field \"foo\"".to_string(),
                locations: vec![],
                path: vec![],
            },
            GraphQLError {
                message: "Internal server error".to_string(),
                locations: vec![],
                path: vec![],
            },
        ];
        let err = CmsError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Cannot query field \"foo\"; Internal server error"
        );
    }

    #[test]
    fn test_graphql_error_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 3, column: 7 }],
            path: vec![
                serde_json::Value::String("posts".to_string()),
                serde_json::Value::Number(0.into()),
                serde_json::Value::String("author".to_string()),
            ],
        }];
        let err = CmsError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: posts.0.author at line 3:7"
        );
    }

    #[test]
    fn test_graphql_error_no_details() {
        let err = CmsError::GraphQL(vec![GraphQLError {
            message: String::new(),
            locations: vec![],
            path: vec![],
        }]);
        assert_eq!(err.to_string(), "GraphQL errors: [error 1]: (no details)");

        let err = CmsError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = CmsError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }
}
