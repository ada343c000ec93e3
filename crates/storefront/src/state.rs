//! Application state shared across handlers.

use std::sync::Arc;

use crate::cms::{CmsClient, CmsError};
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cms: CmsClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the CMS endpoints cannot be built from the config.
    pub fn new(config: StorefrontConfig) -> Result<Self, CmsError> {
        let cms = CmsClient::new(&config.cms, config.store.currency)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, cms }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }
}
