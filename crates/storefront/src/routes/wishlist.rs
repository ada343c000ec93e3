//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use fernleaf_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{PageContext, ProductCard};
use super::{is_htmx, safe_return_path};
use crate::cms::{Product, ProductQuery};
use crate::error::Result;
use crate::filters;
use crate::models::session::{load_wishlist, save_wishlist};
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: i64,
    /// Where to send non-HTMX callers afterwards.
    pub return_to: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCard>,
}

/// Wishlist button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: i64,
    pub on_wishlist: bool,
    pub return_to: String,
}

/// Order fetched products by wishlist position, skipping ids the CMS no
/// longer returns.
#[must_use]
pub fn in_wishlist_order<'a>(ids: &[ProductId], products: &'a [Product]) -> Vec<&'a Product> {
    ids.iter()
        .filter_map(|id| products.iter().find(|p| p.id == *id))
        .collect()
}

/// Display the wishlist.
///
/// # Errors
///
/// Returns 502 if the products cannot be fetched.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
) -> Result<WishlistTemplate> {
    let wishlist = load_wishlist(&session).await;
    if wishlist.is_empty() {
        return Ok(WishlistTemplate {
            ctx,
            products: Vec::new(),
        });
    }

    let products = state
        .cms()
        .rest()
        .products(&ProductQuery {
            include: wishlist.ids().to_vec(),
            ..ProductQuery::default()
        })
        .await?;

    Ok(WishlistTemplate {
        ctx,
        products: in_wishlist_order(wishlist.ids(), &products)
            .into_iter()
            .map(ProductCard::from)
            .collect(),
    })
}

/// Add or remove a product.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip(session, headers))]
pub async fn toggle(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ToggleForm>,
) -> Result<Response> {
    let mut wishlist = load_wishlist(&session).await;
    let on_wishlist = wishlist.toggle(ProductId::new(form.product_id));
    save_wishlist(&session, &wishlist).await?;

    let return_to = safe_return_path(form.return_to.as_deref(), "/wishlist");
    if is_htmx(&headers) {
        Ok((
            AppendHeaders([("HX-Trigger", "wishlist-updated")]),
            WishlistButtonTemplate {
                product_id: form.product_id,
                on_wishlist,
                return_to,
            },
        )
            .into_response())
    } else {
        Ok(Redirect::to(&return_to).into_response())
    }
}

#[cfg(test)]
mod tests {
    use fernleaf_core::{CurrencyCode, Price, StockStatus};

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
    fn test_wishlist_order_and_missing_products() {
        let fetched = vec![product(1), product(2), product(3)];
        let ids = [ProductId::new(3), ProductId::new(9), ProductId::new(1)];
        let ordered: Vec<i64> = in_wishlist_order(&ids, &fetched)
            .iter()
            .map(|p| p.id.as_i64())
            .collect();
        assert_eq!(ordered, vec![3, 1]);
    }
}
