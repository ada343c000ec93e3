//! Product detail route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use fernleaf_core::Slug;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{LinkView, PageContext, ProductCard, ProductDetail};
use crate::cms::{Product, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session::load_wishlist;
use crate::state::AppState;

/// Maximum related products shown under a product.
pub const RELATED_PRODUCTS: usize = 4;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductDetail,
    pub related: Vec<ProductCard>,
    pub on_wishlist: bool,
    pub breadcrumbs: Vec<LinkView>,
}

/// Products sharing `product`'s first category, excluding itself.
#[must_use]
pub fn related_products<'a>(product: &Product, candidates: &'a [Product]) -> Vec<&'a Product> {
    candidates
        .iter()
        .filter(|p| p.id != product.id)
        .take(RELATED_PRODUCTS)
        .collect()
}

/// Display a product by slug.
///
/// # Errors
///
/// Returns 404 if the product does not exist.
#[instrument(skip(state, ctx, session))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Path(slug): Path<String>,
) -> Result<ProductShowTemplate> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(slug.clone()))?;
    let product = state
        .cms()
        .rest()
        .product_by_slug(slug.as_str())
        .await
        .map_err(|e| AppError::from_lookup(e, "product"))?;

    Ok(render(&state, ctx, &session, &product).await)
}

/// Render a product page; also used by the catch-all resolver.
pub async fn render(
    state: &AppState,
    ctx: PageContext,
    session: &Session,
    product: &Product,
) -> ProductShowTemplate {
    let related = match product.categories.first() {
        Some(category) => state
            .cms()
            .rest()
            .products(&ProductQuery::in_category(category.id))
            .await
            .map_or_else(
                |e| {
                    tracing::warn!(error = %e, "Failed to fetch related products");
                    Vec::new()
                },
                |candidates| {
                    related_products(product, &candidates)
                        .into_iter()
                        .map(ProductCard::from)
                        .collect()
                },
            ),
        None => Vec::new(),
    };

    let mut breadcrumbs = vec![
        LinkView {
            name: "Home".to_string(),
            url: "/".to_string(),
        },
        LinkView {
            name: "Shop".to_string(),
            url: "/shop".to_string(),
        },
    ];
    if let Some(category) = product.categories.first() {
        breadcrumbs.push(LinkView {
            name: category.name.clone(),
            url: format!("/product-category/{}", category.slug),
        });
    }

    crate::error::add_breadcrumb(
        "navigation",
        "Viewed product",
        Some(&[("slug", product.slug.as_str())]),
    );

    ProductShowTemplate {
        on_wishlist: load_wishlist(session).await.contains(product.id),
        ctx,
        product: ProductDetail::from(product),
        related,
        breadcrumbs,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernleaf_core::{CurrencyCode, Price, ProductId, StockStatus};

    use super::*;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            slug: format!("p-{id}"),
            name: format!("Product {id}"),
            description_html: String::new(),
            short_description_html: String::new(),
            sku: None,
            price: Price::zero(CurrencyCode::USD),
            regular_price: None,
            on_sale: false,
            featured: false,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            images: vec![],
            categories: vec![],
            attributes: vec![],
            variations: vec![],
            average_rating: 0.0,
            rating_count: 0,
            total_sales: 0,
            date_created: None,
        }
    }

    #[test]
    fn test_related_excludes_self_and_caps() {
        let candidates: Vec<Product> = (1..=7).map(product).collect();
        let related = related_products(&product(2), &candidates);
        let ids: Vec<i64> = related.iter().map(|p| p.id.as_i64()).collect();
        assert_eq!(ids, vec![1, 3, 4, 5]);
    }
}
