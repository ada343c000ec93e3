//! Catch-all URL resolution.
//!
//! A path like `/linen` could name a product category, a blog category, a
//! product, a post, or a page. Lookups run in that fixed order and the first
//! hit wins. Pages are looked up by their full URI so nested pages resolve;
//! everything else uses the last path segment.

use std::future::Future;

use fernleaf_core::SlugPath;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::cms::{
    BlogCategory, CmsClient, CmsError, Page, Post, PostConnection, Product, ProductCategory,
};

/// Posts per blog category page.
pub const BLOG_CATEGORY_PAGE_SIZE: i64 = 9;

/// Entity lookups the resolver needs.
///
/// Each method returns `CmsError::NotFound` when the entity doesn't exist.
pub trait SlugSource {
    fn product_category(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<ProductCategory, CmsError>> + Send;

    fn blog_category(
        &self,
        slug: &str,
        after: Option<String>,
    ) -> impl Future<Output = Result<(BlogCategory, PostConnection), CmsError>> + Send;

    fn product(&self, slug: &str) -> impl Future<Output = Result<Product, CmsError>> + Send;

    fn post(&self, slug: &str) -> impl Future<Output = Result<Post, CmsError>> + Send;

    fn page(&self, uri: &str) -> impl Future<Output = Result<Page, CmsError>> + Send;
}

impl SlugSource for CmsClient {
    async fn product_category(&self, slug: &str) -> Result<ProductCategory, CmsError> {
        self.rest().product_category_by_slug(slug).await
    }

    async fn blog_category(
        &self,
        slug: &str,
        after: Option<String>,
    ) -> Result<(BlogCategory, PostConnection), CmsError> {
        self.graphql()
            .blog_category_by_slug(slug, BLOG_CATEGORY_PAGE_SIZE, after)
            .await
    }

    async fn product(&self, slug: &str) -> Result<Product, CmsError> {
        self.rest().product_by_slug(slug).await
    }

    async fn post(&self, slug: &str) -> Result<Post, CmsError> {
        self.graphql().post_by_slug(slug).await
    }

    async fn page(&self, uri: &str) -> Result<Page, CmsError> {
        self.graphql().page_by_uri(uri).await
    }
}

/// What a path resolved to.
#[derive(Debug, Clone)]
pub enum Resolved {
    ProductCategory(Box<ProductCategory>),
    BlogCategory(Box<(BlogCategory, PostConnection)>),
    Product(Box<Product>),
    Post(Box<Post>),
    Page(Box<Page>),
}

impl Resolved {
    /// Entity kind, for logs and the CLI.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProductCategory(_) => "product category",
            Self::BlogCategory(_) => "blog category",
            Self::Product(_) => "product",
            Self::Post(_) => "post",
            Self::Page(_) => "page",
        }
    }
}

/// Why a path did not resolve.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every lookup reported not found.
    #[error("no entity matches this path")]
    NotFound,

    /// Nothing matched and at least one lookup failed for another reason.
    #[error("upstream lookup failed: {0}")]
    Upstream(#[source] CmsError),
}

/// Tracks the outcome of the lookups that missed.
#[derive(Default)]
struct Misses {
    last_error: Option<CmsError>,
}

impl Misses {
    /// Record a failed lookup and let the chain continue.
    fn record(&mut self, kind: &'static str, error: CmsError) {
        if error.is_not_found() {
            debug!(kind, "No match");
        } else {
            warn!(kind, error = %error, "Lookup failed, trying next entity kind");
            self.last_error = Some(error);
        }
    }

    fn finish(self) -> ResolveError {
        self.last_error
            .map_or(ResolveError::NotFound, ResolveError::Upstream)
    }
}

/// Resolve a catch-all path.
///
/// `after` is the blog category pagination cursor, forwarded when the path
/// turns out to be a blog category.
///
/// # Errors
///
/// Returns `ResolveError::NotFound` when nothing matches, or
/// `ResolveError::Upstream` when nothing matched and some lookup errored.
#[instrument(skip(source), fields(path = %path))]
pub async fn resolve<S: SlugSource>(
    source: &S,
    path: &SlugPath,
    after: Option<String>,
) -> Result<Resolved, ResolveError> {
    let slug = path.leaf().as_str();
    let mut misses = Misses::default();

    match source.product_category(slug).await {
        Ok(category) => return Ok(Resolved::ProductCategory(Box::new(category))),
        Err(e) => misses.record("product category", e),
    }

    match source.blog_category(slug, after).await {
        Ok(found) => return Ok(Resolved::BlogCategory(Box::new(found))),
        Err(e) => misses.record("blog category", e),
    }

    match source.product(slug).await {
        Ok(product) => return Ok(Resolved::Product(Box::new(product))),
        Err(e) => misses.record("product", e),
    }

    match source.post(slug).await {
        Ok(post) => return Ok(Resolved::Post(Box::new(post))),
        Err(e) => misses.record("post", e),
    }

    match source.page(&path.uri()).await {
        Ok(page) => return Ok(Resolved::Page(Box::new(page))),
        Err(e) => misses.record("page", e),
    }

    Err(misses.finish())
}
