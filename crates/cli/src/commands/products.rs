//! Catalog listing command.

use fernleaf_core::Slug;
use fernleaf_storefront::catalog::{CatalogQuery, SortOrder, filter_products};
use fernleaf_storefront::cms::{CmsClient, ProductQuery};

use super::CommandError;

/// List products in catalog order.
///
/// # Errors
///
/// Returns an error if the category slug or sort key is invalid, or the
/// CMS request fails.
pub async fn run(cms: &CmsClient, category: Option<&str>, sort: &str) -> Result<(), CommandError> {
    let order = SortOrder::from_param(sort);
    if !sort.is_empty() && order == SortOrder::Default {
        return Err(CommandError::InvalidArgument(format!("unknown sort key: {sort}")));
    }

    let query = match category {
        Some(raw) => {
            let slug = Slug::parse(raw).map_err(|e| CommandError::InvalidArgument(e.to_string()))?;
            let category = cms.rest().product_category_by_slug(slug.as_str()).await?;
            tracing::info!("Category: {}", category.name);
            ProductQuery::in_category(category.id)
        }
        None => ProductQuery::default(),
    };

    let products = cms.rest().products(&query).await?;
    let catalog = CatalogQuery {
        sort: order,
        ..CatalogQuery::from_query_str("")
    };
    let listed = filter_products(&products, &catalog);

    for product in &listed {
        tracing::info!(
            "{:>6}  {:<40}  {:>10}  {}",
            product.id,
            product.name,
            product.price.display(),
            product.stock_status.label()
        );
    }
    tracing::info!("{} products", listed.len());
    Ok(())
}
