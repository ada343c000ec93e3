//! Slug resolution command.

use fernleaf_core::SlugPath;
use fernleaf_storefront::cms::CmsClient;
use fernleaf_storefront::resolver::{self, ResolveError, Resolved};

use super::CommandError;

/// Name and identifier of what matched, for display.
fn describe(resolved: &Resolved) -> String {
    match resolved {
        Resolved::ProductCategory(category) => {
            format!("{} ({} products)", category.name, category.count)
        }
        Resolved::BlogCategory(found) => {
            let (category, connection) = found.as_ref();
            format!("{} ({} posts on first page)", category.name, connection.posts.len())
        }
        Resolved::Product(product) => format!("{} (id {})", product.name, product.id),
        Resolved::Post(post) => format!("{} (id {})", post.title, post.id),
        Resolved::Page(page) => format!("{} ({})", page.title, page.uri),
    }
}

/// Run the resolution chain for `path` and report the match.
///
/// A path that matches nothing is reported, not treated as a failure.
///
/// # Errors
///
/// Returns an error if the path is malformed or a lookup failed upstream.
pub async fn run(cms: &CmsClient, path: &str) -> Result<(), CommandError> {
    let slug_path =
        SlugPath::parse(path).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;

    match resolver::resolve(cms, &slug_path, None).await {
        Ok(resolved) => {
            tracing::info!("{path} -> {}: {}", resolved.kind(), describe(&resolved));
            Ok(())
        }
        Err(ResolveError::NotFound) => {
            tracing::warn!("{path} -> not found");
            Ok(())
        }
        Err(ResolveError::Upstream(e)) => Err(e.into()),
    }
}
