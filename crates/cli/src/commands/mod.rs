//! CLI command implementations.
//!
//! # Environment Variables
//!
//! - `CMS_URL` - WordPress site URL
//! - `WC_CONSUMER_KEY` / `WC_CONSUMER_SECRET` - WooCommerce REST keys
//! - `STORE_CURRENCY` - Currency prices are parsed in (default `USD`)

pub mod ping;
pub mod products;
pub mod resolve;

use fernleaf_storefront::cms::{CmsClient, CmsError};
use fernleaf_storefront::config::{CmsConfig, ConfigError, StoreConfig};
use thiserror::Error;

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The CMS request failed.
    #[error("CMS error: {0}")]
    Cms(#[from] CmsError),

    /// An argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// At least one check failed.
    #[error("{0}")]
    CheckFailed(String),
}

/// Build CMS clients from the environment.
///
/// # Errors
///
/// Returns `CommandError::Config` if the CMS settings are missing or invalid.
pub fn connect() -> Result<CmsClient, CommandError> {
    dotenvy::dotenv().ok();

    let store = StoreConfig::from_env()?;
    let cms = CmsConfig::from_env()?;
    tracing::info!("Using CMS at {}", cms.origin());
    Ok(CmsClient::new(&cms, store.currency)?)
}
