//! Cart route handlers.
//!
//! The cart lives in the session. Add-to-cart answers HTMX callers with the
//! badge fragment and an `HX-Trigger: cart-updated` header; every other
//! write redirects back to `/cart` with an optional notice in the query.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use fernleaf_core::{Slug, VariationId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{is_htmx, views::PageContext};
use crate::cms::CmsError;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session::{load_cart, save_cart};
use crate::models::{Cart, CartLine, CouponError};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone, Debug)]
pub struct CartItemView {
    pub key: String,
    pub url: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub quantity: u32,
    pub max_quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

/// An applied coupon row.
#[derive(Clone, Debug)]
pub struct CouponView {
    pub code: String,
    pub discount: String,
    pub free_shipping: bool,
}

/// Cart display data for templates.
#[derive(Clone, Debug)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub coupons: Vec<CouponView>,
    pub subtotal: String,
    pub discount: Option<String>,
    pub total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let discount = cart.discount_total();
        Self {
            items: cart
                .lines
                .iter()
                .map(|line| CartItemView {
                    key: line.key.clone(),
                    url: format!("/products/{}", line.slug),
                    name: line.name.clone(),
                    variant_label: line.variant_label.clone(),
                    quantity: line.quantity,
                    max_quantity: line
                        .max_quantity
                        .unwrap_or(crate::models::cart::MAX_LINE_QUANTITY),
                    price: line.unit_price.display(),
                    line_price: line.line_total().display(),
                    image_url: line.image_url.clone(),
                })
                .collect(),
            coupons: cart
                .coupons
                .iter()
                .map(|c| CouponView {
                    code: c.code.clone(),
                    discount: cart.coupon_discount(c).display(),
                    free_shipping: c.free_shipping,
                })
                .collect(),
            subtotal: cart.subtotal().display(),
            discount: (!discount.is_zero()).then(|| discount.display()),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Forms and Notices
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub slug: String,
    /// Empty when the product has no variations.
    #[serde(default)]
    pub variation_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub key: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub key: String,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

/// Notices carried across the post/redirect/get cycle.
#[derive(Debug, Default, Deserialize)]
pub struct CartNotice {
    pub notice: Option<String>,
    pub error: Option<String>,
}

fn redirect_with(kind: &str, message: &str) -> Response {
    Redirect::to(&format!("/cart?{kind}={}", urlencoding::encode(message))).into_response()
}

fn dropped_notice(dropped: &[String]) -> Option<String> {
    (!dropped.is_empty()).then(|| {
        format!(
            "Removed coupon{} no longer valid for this cart: {}",
            if dropped.len() == 1 { "" } else { "s" },
            dropped.join(", ")
        )
    })
}

fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline error fragment for HTMX callers.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Query(notice): Query<CartNotice>,
) -> Result<CartShowTemplate> {
    let mut cart = load_cart(&session, state.config().store.currency).await;

    // Coupons can expire while they sit in the cart
    let dropped = cart.revalidate_coupons(today());
    if !dropped.is_empty() {
        save_cart(&session, &cart).await?;
    }

    Ok(CartShowTemplate {
        ctx,
        cart: CartView::from(&cart),
        notice: dropped_notice(&dropped).or(notice.notice),
        error: notice.error,
    })
}

/// Add item to cart.
///
/// # Errors
///
/// Returns 404 if the product does not exist and 422 if it cannot be added
/// (out of stock, missing option).
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let htmx = is_htmx(&headers);
    let slug = Slug::parse(&form.slug).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let variation_id = match form.variation_id.trim() {
        "" => None,
        raw => Some(VariationId::new(raw.parse().map_err(|_| {
            AppError::BadRequest("invalid variation".to_string())
        })?)),
    };

    let product = state
        .cms()
        .rest()
        .product_by_slug(slug.as_str())
        .await
        .map_err(|e| AppError::from_lookup(e, "product"))?;

    let line = match CartLine::from_product(&product, variation_id, form.quantity.unwrap_or(1)) {
        Ok(line) => line,
        Err(e) if htmx => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                CartErrorTemplate {
                    message: e.to_string(),
                },
            )
                .into_response());
        }
        Err(e) => return Err(AppError::Validation(e.to_string())),
    };

    let mut cart = load_cart(&session, state.config().store.currency).await;
    cart.add(line);
    let dropped = cart.revalidate_coupons(today());
    save_cart(&session, &cart).await?;

    let product_id = product.id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );

    if htmx {
        Ok((
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response())
    } else {
        Ok(dropped_notice(&dropped).map_or_else(
            || Redirect::to("/cart").into_response(),
            |notice| redirect_with("notice", &notice),
        ))
    }
}

/// Update cart item quantity.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session, state.config().store.currency).await;

    if let Err(e) = cart.set_quantity(&form.key, form.quantity) {
        return Ok(redirect_with("error", &e.to_string()));
    }

    let dropped = cart.revalidate_coupons(today());
    save_cart(&session, &cart).await?;

    Ok(dropped_notice(&dropped).map_or_else(
        || Redirect::to("/cart").into_response(),
        |notice| redirect_with("notice", &notice),
    ))
}

/// Remove item from cart.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session, state.config().store.currency).await;
    cart.remove(&form.key);

    let dropped = cart.revalidate_coupons(today());
    save_cart(&session, &cart).await?;

    Ok(dropped_notice(&dropped).map_or_else(
        || Redirect::to("/cart").into_response(),
        |notice| redirect_with("notice", &notice),
    ))
}

/// Apply a coupon code.
///
/// # Errors
///
/// Returns 502 if the coupon lookup fails for a reason other than an
/// unknown code.
#[instrument(skip(state, session))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let code = form.code.trim().to_lowercase();
    if code.is_empty() {
        return Ok(redirect_with("error", "Please enter a coupon code"));
    }

    let mut cart = load_cart(&session, state.config().store.currency).await;
    if cart.is_empty() {
        return Ok(redirect_with("error", &CouponError::EmptyCart.to_string()));
    }

    let coupon = match state.cms().rest().coupon_by_code(&code).await {
        Ok(coupon) => coupon,
        Err(CmsError::NotFound(_)) => {
            return Ok(redirect_with("error", &CouponError::Invalid(code).to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    match cart.apply_coupon(coupon, today()) {
        Ok(()) => {
            save_cart(&session, &cart).await?;
            Ok(redirect_with("notice", &format!("Coupon \"{code}\" applied")))
        }
        Err(e) => Ok(redirect_with("error", &e.to_string())),
    }
}

/// Remove an applied coupon.
///
/// # Errors
///
/// Returns an error if the session cannot be saved.
#[instrument(skip(state, session))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session, state.config().store.currency).await;
    if cart.remove_coupon(form.code.trim()) {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to("/cart").into_response())
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: load_cart(&session, state.config().store.currency)
            .await
            .item_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_notice() {
        assert_eq!(dropped_notice(&[]), None);
        assert_eq!(
            dropped_notice(&["min50".to_string()]).as_deref(),
            Some("Removed coupon no longer valid for this cart: min50")
        );
        assert_eq!(
            dropped_notice(&["a".to_string(), "b".to_string()]).as_deref(),
            Some("Removed coupons no longer valid for this cart: a, b")
        );
    }

    #[test]
    fn test_cart_view_totals() {
        let cart = Cart::new(fernleaf_core::CurrencyCode::USD);
        let view = CartView::from(&cart);
        assert_eq!(view.total, "$0.00");
        assert!(view.discount.is_none());
        assert!(view.items.is_empty());
    }
}
