//! Session-held shopping cart.
//!
//! WooCommerce is only told about the cart at checkout, so lines, prices, and
//! applied coupons live in the session until then. Prices are snapshots taken
//! when the line was added; WooCommerce recomputes totals on order creation.

use chrono::NaiveDate;
use fernleaf_core::{CurrencyCode, Price, ProductId, VariationId};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cms::{Coupon, DiscountType, Product};

/// Upper bound on any line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Errors from cart operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("Please choose an option for {0}")]
    VariationRequired(String),

    #[error("That option is no longer available")]
    VariationNotFound,

    #[error("That item is no longer in your cart")]
    LineNotFound,
}

/// Reasons a coupon cannot be applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponError {
    #[error("Coupon \"{0}\" does not exist")]
    Invalid(String),

    #[error("Coupon \"{0}\" is already applied")]
    AlreadyApplied(String),

    #[error("Coupon \"{0}\" has expired")]
    Expired(String),

    #[error("Coupon \"{0}\" has reached its usage limit")]
    UsageLimitReached(String),

    #[error("The minimum spend for this coupon is {0}")]
    MinimumNotMet(String),

    #[error("The maximum spend for this coupon is {0}")]
    MaximumExceeded(String),

    #[error("Coupon \"{0}\" cannot be combined with other coupons")]
    IndividualUse(String),

    #[error("Add something to your cart before applying a coupon")]
    EmptyCart,
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// `"{product_id}"` or `"{product_id}:{variation_id}"`.
    pub key: String,
    pub product_id: ProductId,
    pub variation_id: Option<VariationId>,
    pub slug: String,
    pub name: String,
    pub variant_label: Option<String>,
    pub unit_price: Price,
    pub quantity: u32,
    /// Stock cap when the product manages stock.
    pub max_quantity: Option<u32>,
    pub image_url: Option<String>,
}

impl CartLine {
    /// Key identifying a product/variation pair.
    #[must_use]
    pub fn key_for(product_id: ProductId, variation_id: Option<VariationId>) -> String {
        match variation_id {
            Some(v) => format!("{product_id}:{v}"),
            None => product_id.to_string(),
        }
    }

    /// Build a line for a product (and variation, for variable products).
    ///
    /// # Errors
    ///
    /// Returns an error if the product or variation is out of stock, a
    /// variable product is added without a variation, or the variation does
    /// not belong to the product.
    pub fn from_product(
        product: &Product,
        variation_id: Option<VariationId>,
        quantity: u32,
    ) -> Result<Self, CartError> {
        let (price, status, stock, label, image) = match variation_id {
            Some(id) => {
                let variation = product.variation(id).ok_or(CartError::VariationNotFound)?;
                (
                    variation.price,
                    variation.stock_status,
                    variation.stock_quantity,
                    Some(variation.label()),
                    variation
                        .image
                        .as_ref()
                        .or_else(|| product.featured_image())
                        .map(|i| i.url.clone()),
                )
            }
            None if product.is_variable() => {
                return Err(CartError::VariationRequired(product.name.clone()));
            }
            None => (
                product.price,
                product.stock_status,
                product.stock_quantity,
                None,
                product.featured_image().map(|i| i.url.clone()),
            ),
        };

        if !status.is_purchasable() {
            return Err(CartError::OutOfStock(product.name.clone()));
        }

        // Backorders ignore the stock count
        let max_quantity = if status == fernleaf_core::StockStatus::OnBackorder {
            None
        } else {
            stock
                .filter(|q| *q > 0)
                .map(|q| u32::try_from(q).unwrap_or(MAX_LINE_QUANTITY))
        };

        Ok(Self {
            key: Self::key_for(product.id, variation_id),
            product_id: product.id,
            variation_id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            variant_label: label.filter(|l| !l.is_empty()),
            unit_price: price,
            quantity: clamp_quantity(quantity, max_quantity),
            max_quantity,
            image_url: image,
        })
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

fn clamp_quantity(quantity: u32, max: Option<u32>) -> u32 {
    let cap = max.map_or(MAX_LINE_QUANTITY, |m| m.min(MAX_LINE_QUANTITY));
    quantity.clamp(1, cap.max(1))
}

/// The cart stored under [`super::session::keys::CART`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub coupons: Vec<Coupon>,
    pub currency: CurrencyCode,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            coupons: Vec::new(),
            currency,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging with an existing line for the same product/variation.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self.lines.iter_mut().find(|l| l.key == line.key) {
            existing.max_quantity = line.max_quantity;
            existing.unit_price = line.unit_price;
            existing.quantity =
                clamp_quantity(existing.quantity.saturating_add(line.quantity), line.max_quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this key.
    pub fn set_quantity(&mut self, key: &str, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(key) {
                Ok(())
            } else {
                Err(CartError::LineNotFound)
            };
        }

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.key == key)
            .ok_or(CartError::LineNotFound)?;
        line.quantity = clamp_quantity(quantity, line.max_quantity);
        Ok(())
    }

    /// Remove a line. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.key != key);
        self.lines.len() != before
    }

    /// Empty the cart and drop coupons.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupons.clear();
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines
            .iter()
            .fold(Price::zero(self.currency), |acc, l| acc.plus(&l.line_total()))
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Apply a coupon after validating it against the cart.
    ///
    /// # Errors
    ///
    /// Returns the first rule the coupon fails.
    pub fn apply_coupon(&mut self, coupon: Coupon, today: NaiveDate) -> Result<(), CouponError> {
        if self
            .coupons
            .iter()
            .any(|c| c.code.eq_ignore_ascii_case(&coupon.code))
        {
            return Err(CouponError::AlreadyApplied(coupon.code));
        }

        self.check_coupon(&coupon, &self.coupons, today)?;
        self.coupons.push(coupon);
        Ok(())
    }

    /// Remove a coupon by code. Returns whether it was applied.
    pub fn remove_coupon(&mut self, code: &str) -> bool {
        let before = self.coupons.len();
        self.coupons.retain(|c| !c.code.eq_ignore_ascii_case(code));
        self.coupons.len() != before
    }

    /// Drop coupons that no longer qualify (after quantity changes, or a
    /// coupon that expired while in the cart). Returns the dropped codes.
    pub fn revalidate_coupons(&mut self, today: NaiveDate) -> Vec<String> {
        let mut kept: Vec<Coupon> = Vec::with_capacity(self.coupons.len());
        let mut dropped = Vec::new();

        for coupon in std::mem::take(&mut self.coupons) {
            if self.check_coupon(&coupon, &kept, today).is_ok() {
                kept.push(coupon);
            } else {
                dropped.push(coupon.code);
            }
        }

        self.coupons = kept;
        dropped
    }

    fn check_coupon(
        &self,
        coupon: &Coupon,
        others: &[Coupon],
        today: NaiveDate,
    ) -> Result<(), CouponError> {
        let code = || coupon.code.clone();

        if self.is_empty() {
            return Err(CouponError::EmptyCart);
        }

        // WooCommerce expires coupons at the start of the expiry date
        if coupon.date_expires.is_some_and(|d| today >= d.date()) {
            return Err(CouponError::Expired(code()));
        }

        if coupon
            .usage_limit
            .is_some_and(|limit| coupon.usage_count >= limit)
        {
            return Err(CouponError::UsageLimitReached(code()));
        }

        if !others.is_empty() && (coupon.individual_use || others.iter().any(|c| c.individual_use))
        {
            return Err(CouponError::IndividualUse(code()));
        }

        let subtotal = self.subtotal();
        if let Some(min) = coupon.minimum_amount
            && subtotal.amount < min.amount
        {
            return Err(CouponError::MinimumNotMet(min.display()));
        }
        if let Some(max) = coupon.maximum_amount
            && subtotal.amount > max.amount
        {
            return Err(CouponError::MaximumExceeded(max.display()));
        }

        Ok(())
    }

    /// Discount of a single coupon, before the cart-wide cap.
    #[must_use]
    pub fn coupon_discount(&self, coupon: &Coupon) -> Price {
        let subtotal = self.subtotal();
        let amount = match coupon.discount_type {
            DiscountType::Percent => (subtotal.amount * coupon.amount / Decimal::ONE_HUNDRED)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            DiscountType::FixedCart => coupon.amount,
            DiscountType::FixedProduct => self
                .lines
                .iter()
                .map(|l| (coupon.amount * Decimal::from(l.quantity)).min(l.line_total().amount))
                .sum(),
        };
        Price::new(amount.clamp(Decimal::ZERO, subtotal.amount), self.currency)
    }

    /// Sum of coupon discounts, capped at the subtotal.
    #[must_use]
    pub fn discount_total(&self) -> Price {
        let subtotal = self.subtotal();
        let total: Decimal = self
            .coupons
            .iter()
            .map(|c| self.coupon_discount(c).amount)
            .sum();
        Price::new(total.min(subtotal.amount), self.currency)
    }

    /// Subtotal minus discounts.
    #[must_use]
    pub fn total(&self) -> Price {
        self.subtotal().saturating_sub(&self.discount_total())
    }

    /// Whether any applied coupon grants free shipping.
    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.coupons.iter().any(|c| c.free_shipping)
    }
}
