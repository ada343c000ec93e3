//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `CMS_URL` - WordPress site URL (e.g., `https://cms.example.com`)
//! - `WC_CONSUMER_KEY` - WooCommerce REST API consumer key
//! - `WC_CONSUMER_SECRET` - WooCommerce REST API consumer secret
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CMS_REST_PREFIX` - REST API root path (default: `/wp-json`)
//! - `CMS_GRAPHQL_PATH` - WPGraphQL endpoint path (default: `/graphql`)
//! - `CMS_CACHE_TTL_SECS` - Response cache TTL (default: 300)
//! - `CATALOG_MAX_PRODUCTS` - Cap on products fetched for a listing (default: 500)
//! - `STORE_NAME` - Display name (default: Fernleaf)
//! - `STORE_CURRENCY` - ISO currency code (default: USD)
//! - `CHECKOUT_PAYMENT_METHOD` - WooCommerce gateway ID (default: bacs)
//! - `CHECKOUT_PAYMENT_TITLE` - Gateway title (default: Direct bank transfer)
//! - `GA4_MEASUREMENT_ID` - Google Analytics 4 measurement ID
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.1)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use fernleaf_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Store display settings
    pub store: StoreConfig,
    /// Headless CMS connection settings
    pub cms: CmsConfig,
    /// Checkout settings
    pub checkout: CheckoutConfig,
    /// Analytics tracking configuration
    pub analytics: AnalyticsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Store display settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store name shown in page titles and the header
    pub name: String,
    /// Currency all catalog prices are reported in
    pub currency: CurrencyCode,
}

/// WordPress/WooCommerce connection configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CmsConfig {
    /// WordPress site URL without trailing slash
    pub base_url: Url,
    /// REST API root path (e.g., `/wp-json`)
    pub rest_prefix: String,
    /// WPGraphQL endpoint path (e.g., `/graphql`)
    pub graphql_path: String,
    /// WooCommerce consumer key
    pub consumer_key: SecretString,
    /// WooCommerce consumer secret
    pub consumer_secret: SecretString,
    /// Time-to-live for cached catalog and content responses
    pub cache_ttl: Duration,
    /// Maximum number of products fetched for one listing
    pub max_products: usize,
}

impl std::fmt::Debug for CmsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsConfig")
            .field("base_url", &self.base_url.as_str())
            .field("rest_prefix", &self.rest_prefix)
            .field("graphql_path", &self.graphql_path)
            .field("consumer_key", &"[REDACTED]")
            .field("consumer_secret", &"[REDACTED]")
            .field("cache_ttl", &self.cache_ttl)
            .field("max_products", &self.max_products)
            .finish()
    }
}

impl CmsConfig {
    /// Full URL for a REST route such as `wc/v3/products`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn rest_url(&self, route: &str) -> Result<Url, url::ParseError> {
        // Joined as text so WordPress installs in a subdirectory keep their path
        Url::parse(&format!(
            "{}/{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.rest_prefix.trim_matches('/'),
            route.trim_start_matches('/')
        ))
    }

    /// Full URL of the GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is invalid.
    pub fn graphql_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.graphql_path.trim_start_matches('/')
        ))
    }

    /// Origin of the CMS, used to allow its media in the CSP.
    #[must_use]
    pub fn origin(&self) -> String {
        self.base_url.origin().ascii_serialization()
    }
}

/// Checkout settings passed to WooCommerce when creating orders.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Payment gateway ID
    pub payment_method: String,
    /// Payment gateway title
    pub payment_method_title: String,
}

/// Analytics and tracking configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    /// Google Analytics 4 measurement ID
    pub ga4_measurement_id: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;
        Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            store: StoreConfig::from_env()?,
            cms: CmsConfig::from_env()?,
            checkout: CheckoutConfig::from_env(),
            analytics: AnalyticsConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StoreConfig {
    /// Load store settings from `STORE_NAME` and `STORE_CURRENCY`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the currency is not supported.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            name: get_env_or_default("STORE_NAME", "Fernleaf"),
            currency: parse_env("STORE_CURRENCY", "USD")?,
        })
    }
}

impl CmsConfig {
    /// Load CMS connection settings on their own, for tools that never
    /// serve pages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `CMS_URL` or the WooCommerce keys are
    /// missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = get_required_env("CMS_URL")?;
        let base_url = Url::parse(raw_url.trim_end_matches('/'))
            .map_err(|e| ConfigError::InvalidEnvVar("CMS_URL".to_string(), e.to_string()))?;

        let ttl_secs: u64 = parse_env("CMS_CACHE_TTL_SECS", "300")?;

        Ok(Self {
            base_url,
            rest_prefix: get_env_or_default("CMS_REST_PREFIX", "/wp-json"),
            graphql_path: get_env_or_default("CMS_GRAPHQL_PATH", "/graphql"),
            consumer_key: get_validated_secret("WC_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("WC_CONSUMER_SECRET")?,
            cache_ttl: Duration::from_secs(ttl_secs),
            max_products: parse_env("CATALOG_MAX_PRODUCTS", "500")?,
        })
    }
}

impl CheckoutConfig {
    fn from_env() -> Self {
        Self {
            payment_method: get_env_or_default("CHECKOUT_PAYMENT_METHOD", "bacs"),
            payment_method_title: get_env_or_default(
                "CHECKOUT_PAYMENT_TITLE",
                "Direct bank transfer",
            ),
        }
    }
}

impl AnalyticsConfig {
    fn from_env() -> Self {
        Self {
            ga4_measurement_id: get_optional_env("GA4_MEASUREMENT_ID"),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
///
/// WooCommerce keys carry a `ck_`/`cs_` prefix; only the random part is
/// checked for entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let random_part = secret
        .strip_prefix("ck_")
        .or_else(|| secret.strip_prefix("cs_"))
        .unwrap_or(secret);

    let entropy = shannon_entropy(random_part);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Generate a new key in WooCommerce > Settings > Advanced > REST API."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn cms_config() -> CmsConfig {
        CmsConfig {
            base_url: Url::parse("https://cms.test").unwrap(),
            rest_prefix: "/wp-json".to_string(),
            graphql_path: "/graphql".to_string(),
            consumer_key: SecretString::from("ck_super_secret_key"),
            consumer_secret: SecretString::from("cs_super_secret_value"),
            cache_ttl: Duration::from_secs(300),
            max_products: 500,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("ck_your-key-here", "WC_CONSUMER_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("cs_aaaaaaaaaaaaaaaaaaaaaaaa", "WC_CONSUMER_SECRET");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_woocommerce_key() {
        let result = validate_secret_strength(
            "ck_3f9a1c7e5b2d4086af1e9c3b7d5a2f4e6c8b0d1a",
            "WC_CONSUMER_KEY",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_rest_url_joins_prefix() {
        let config = cms_config();
        assert_eq!(
            config.rest_url("wc/v3/products").unwrap().as_str(),
            "https://cms.test/wp-json/wc/v3/products"
        );
        assert_eq!(
            config.rest_url("/wp/v2/posts").unwrap().as_str(),
            "https://cms.test/wp-json/wp/v2/posts"
        );
        assert_eq!(
            config.graphql_url().unwrap().as_str(),
            "https://cms.test/graphql"
        );
        assert_eq!(config.origin(), "https://cms.test");
    }

    #[test]
    fn test_rest_url_keeps_subdirectory() {
        let mut config = cms_config();
        config.base_url = Url::parse("https://example.org/shop").unwrap();
        assert_eq!(
            config.rest_url("wc/v3/orders").unwrap().as_str(),
            "https://example.org/shop/wp-json/wc/v3/orders"
        );
    }

    #[test]
    fn test_cms_config_debug_redacts_secrets() {
        let config = cms_config();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("https://cms.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(config.consumer_key.expose_secret()));
        assert!(!debug_output.contains(config.consumer_secret.expose_secret()));
    }
}
