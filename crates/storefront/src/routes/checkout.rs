//! Checkout route handlers.
//!
//! Orders are created in WooCommerce as guest orders with `status: pending`.
//! When WooCommerce returns a payment URL the shopper is sent there to pay;
//! otherwise (offline gateways such as bank transfer) they land on the
//! confirmation page.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use fernleaf_core::{Email, OrderId, OrderStatus};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::CartView;
use super::views::PageContext;
use crate::cms::{Address, CmsError, NewCouponLine, NewOrder, NewOrderLine};
use crate::config::CheckoutConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session::{last_order, load_cart, save_cart, set_last_order};
use crate::models::{Cart, LastOrder};
use crate::state::AppState;

// =============================================================================
// Form
// =============================================================================

/// Billing form submitted at checkout. Shipping uses the same address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub note: String,
}

/// Field name to error message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, &'static str>);

impl FormErrors {
    /// Error for a field, if any.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }
}

impl CheckoutForm {
    /// Validate the form into a billing address.
    ///
    /// # Errors
    ///
    /// Returns every field that failed, not just the first.
    pub fn validate(&self) -> std::result::Result<Address, FormErrors> {
        let mut errors = FormErrors::default();

        let required = [
            ("first_name", &self.first_name, "Enter your first name"),
            ("last_name", &self.last_name, "Enter your last name"),
            ("address_1", &self.address_1, "Enter your street address"),
            ("city", &self.city, "Enter your city"),
            ("postcode", &self.postcode, "Enter your postcode"),
            ("country", &self.country, "Choose your country"),
        ];
        for (field, value, message) in required {
            if value.trim().is_empty() {
                errors.add(field, message);
            }
        }

        let email = Email::parse(self.email.trim());
        if email.is_err() {
            errors.add("email", "Enter a valid email address");
        }

        let country = self.country.trim().to_ascii_uppercase();
        let well_formed = country.len() == 2 && country.bytes().all(|b| b.is_ascii_alphabetic());
        if !country.is_empty() && !well_formed {
            errors.add("country", "Use a two-letter country code");
        }

        match email {
            Ok(email) if errors.is_empty() => Ok(Address {
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
                address_1: self.address_1.trim().to_string(),
                address_2: self.address_2.trim().to_string(),
                city: self.city.trim().to_string(),
                state: self.state.trim().to_string(),
                postcode: self.postcode.trim().to_string(),
                country,
                email: Some(email.as_str().to_string()),
                phone: Some(self.phone.trim().to_string()).filter(|p| !p.is_empty()),
            }),
            _ => Err(errors),
        }
    }
}

/// Build the WooCommerce order payload for a cart.
#[must_use]
pub fn build_order(
    cart: &Cart,
    billing: Address,
    note: &str,
    checkout: &CheckoutConfig,
) -> NewOrder {
    let shipping = Address {
        email: None,
        phone: None,
        ..billing.clone()
    };

    NewOrder {
        status: OrderStatus::Pending,
        set_paid: false,
        payment_method: checkout.payment_method.clone(),
        payment_method_title: checkout.payment_method_title.clone(),
        currency: cart.currency.code().to_string(),
        billing,
        shipping,
        line_items: cart
            .lines
            .iter()
            .map(|line| NewOrderLine {
                product_id: line.product_id,
                variation_id: line.variation_id,
                quantity: line.quantity,
            })
            .collect(),
        coupon_lines: cart
            .coupons
            .iter()
            .map(|c| NewCouponLine {
                code: c.code.clone(),
            })
            .collect(),
        customer_note: note.trim().to_string(),
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub form: CheckoutForm,
    pub errors: FormErrors,
    pub notice: Option<String>,
    pub error: Option<String>,
    pub payment_method_title: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CompleteTemplate {
    pub ctx: PageContext,
    pub order_id: i64,
}

/// `?key=` on the confirmation page.
#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    #[serde(default)]
    pub key: String,
}

fn checkout_page(state: &AppState, ctx: PageContext, cart: &Cart) -> CheckoutTemplate {
    CheckoutTemplate {
        ctx,
        cart: CartView::from(cart),
        form: CheckoutForm::default(),
        errors: FormErrors::default(),
        notice: None,
        error: None,
        payment_method_title: state.config().checkout.payment_method_title.clone(),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the checkout form. An empty cart redirects to `/cart`.
#[instrument(skip(state, session, ctx))]
pub async fn show(State(state): State<AppState>, session: Session, ctx: PageContext) -> Response {
    let cart = load_cart(&session, state.config().store.currency).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }
    checkout_page(&state, ctx, &cart).into_response()
}

/// Place the order.
///
/// # Errors
///
/// Returns 502 if WooCommerce cannot be reached and an error if the session
/// cannot be saved.
#[instrument(skip(state, session, ctx, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    ctx: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = load_cart(&session, state.config().store.currency).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let billing = match form.validate() {
        Ok(billing) => billing,
        Err(errors) => {
            let mut page = checkout_page(&state, ctx, &cart);
            page.form = form;
            page.errors = errors;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    // Totals must not change under the shopper without them seeing it
    let dropped = cart.revalidate_coupons(chrono::Utc::now().date_naive());
    if !dropped.is_empty() {
        save_cart(&session, &cart).await?;
        let mut page = checkout_page(&state, ctx, &cart);
        page.form = form;
        page.notice = Some(format!(
            "Removed coupons no longer valid for this cart: {}. Please review your total.",
            dropped.join(", ")
        ));
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let order = build_order(&cart, billing, &form.note, &state.config().checkout);
    let created = match state.cms().rest().create_order(&order).await {
        Ok(created) => created,
        Err(CmsError::Api { code, message, .. }) => {
            tracing::warn!(code = %code, message = %message, "WooCommerce rejected order");
            let mut page = checkout_page(&state, ctx, &cart);
            page.form = form;
            page.error = Some(format!(
                "We couldn't place your order: {}",
                filters::html_to_text(&message)
            ));
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
        Err(e) => return Err(AppError::Cms(e)),
    };

    cart.clear();
    save_cart(&session, &cart).await?;
    set_last_order(
        &session,
        &LastOrder {
            id: created.id,
            key: created.order_key.clone(),
        },
    )
    .await?;

    let order_id = created.id.to_string();
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", order_id.as_str())]),
    );

    let target = created.payment_url.filter(|u| !u.is_empty()).unwrap_or_else(|| {
        format!(
            "/checkout/complete/{}?key={}",
            created.id,
            urlencoding::encode(&created.order_key)
        )
    });
    Ok(Redirect::to(&target).into_response())
}

/// Order confirmation, shown only to the session that placed the order.
///
/// # Errors
///
/// Returns 404 unless the id and key match the session's last order.
#[instrument(skip(session, ctx, query))]
pub async fn complete(
    session: Session,
    ctx: PageContext,
    Path(id): Path<i64>,
    Query(query): Query<CompleteQuery>,
) -> Result<CompleteTemplate> {
    match last_order(&session).await {
        Some(order) if order.id == OrderId::new(id) && order.key == query.key => {
            Ok(CompleteTemplate { ctx, order_id: id })
        }
        _ => Err(AppError::NotFound(format!("order {id}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernleaf_core::{CurrencyCode, Price, ProductId, VariationId};

    use super::*;
    use crate::models::CartLine;

    fn valid_form() -> CheckoutForm {
        CheckoutForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address_1: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            postcode: "N1 1AA".to_string(),
            country: "gb".to_string(),
            ..CheckoutForm::default()
        }
    }

    #[test]
    fn test_valid_form() {
        let address = valid_form().validate().unwrap();
        assert_eq!(address.country, "GB");
        assert_eq!(address.email.as_deref(), Some("ada@example.com"));
        assert_eq!(address.phone, None);
    }

    #[test]
    fn test_reports_every_invalid_field() {
        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            country: "Britain".to_string(),
            ..CheckoutForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
        assert_eq!(errors.get("country"), Some("Use a two-letter country code"));
        assert!(errors.get("first_name").is_some());
        assert!(errors.get("address_2").is_none());
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn test_build_order_payload() {
        let mut cart = Cart::new(CurrencyCode::USD);
        cart.add(CartLine {
            key: "7:70".to_string(),
            product_id: ProductId::new(7),
            variation_id: Some(VariationId::new(70)),
            slug: "tee".to_string(),
            name: "Tee".to_string(),
            variant_label: Some("M".to_string()),
            unit_price: Price::parse("20", CurrencyCode::USD).unwrap().unwrap(),
            quantity: 2,
            max_quantity: None,
            image_url: None,
        });

        let checkout = CheckoutConfig {
            payment_method: "bacs".to_string(),
            payment_method_title: "Direct bank transfer".to_string(),
        };
        let billing = valid_form().validate().unwrap();
        let order = build_order(&cart, billing, "  Leave at door ", &checkout);

        assert_eq!(order.status, OrderStatus::Pending);
        assert!(!order.set_paid);
        assert_eq!(order.currency, "USD");
        assert_eq!(order.customer_note, "Leave at door");
        assert_eq!(order.shipping.city, "London");
        assert_eq!(order.shipping.email, None);

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["line_items"][0]["product_id"], 7);
        assert_eq!(json["line_items"][0]["variation_id"], 70);
        assert_eq!(json["line_items"][0]["quantity"], 2);
        assert_eq!(json["payment_method"], "bacs");
        assert_eq!(json["status"], "pending");
    }
}
