//! Domain types for the headless CMS.
//!
//! Records arrive in two shapes (WooCommerce/WordPress REST and WPGraphQL).
//! Both are converted into these types so templates and the cart never see
//! which API a record came from.

use chrono::NaiveDateTime;
use fernleaf_core::{
    CategoryId, OrderId, OrderStatus, PageId, PostId, Price, ProductId, StockStatus, VariationId,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// Media
// =============================================================================

/// Product, post, or category image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt: String,
}

// =============================================================================
// Product Types
// =============================================================================

/// Minimal reference to a product category attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
}

/// A product attribute (e.g., "Size" with options S/M/L).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    /// Attribute name (e.g., "Color").
    pub name: String,
    /// Available options.
    pub options: Vec<String>,
    /// Whether the attribute distinguishes variations.
    pub variation: bool,
}

/// Selected option on a variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationOption {
    pub name: String,
    pub option: String,
}

/// A purchasable variation of a variable product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariation {
    pub id: VariationId,
    pub sku: Option<String>,
    pub price: Price,
    pub regular_price: Option<Price>,
    pub on_sale: bool,
    pub stock_status: StockStatus,
    pub stock_quantity: Option<i64>,
    pub attributes: Vec<VariationOption>,
    pub image: Option<Image>,
}

impl ProductVariation {
    /// Label like "Blue / Large".
    #[must_use]
    pub fn label(&self) -> String {
        self.attributes
            .iter()
            .map(|a| a.option.as_str())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

/// A product in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    /// HTML description.
    pub description_html: String,
    /// HTML short description.
    pub short_description_html: String,
    pub sku: Option<String>,
    /// Current price (sale price when on sale).
    pub price: Price,
    /// Regular price, when it differs from the current price.
    pub regular_price: Option<Price>,
    pub on_sale: bool,
    pub featured: bool,
    pub stock_status: StockStatus,
    /// Remaining stock when the product manages stock.
    pub stock_quantity: Option<i64>,
    pub images: Vec<Image>,
    pub categories: Vec<CategoryRef>,
    pub attributes: Vec<ProductAttribute>,
    /// Variations (only populated on detail lookups of variable products).
    pub variations: Vec<ProductVariation>,
    pub average_rating: f64,
    pub rating_count: i64,
    pub total_sales: i64,
    pub date_created: Option<NaiveDateTime>,
}

impl Product {
    /// First image, if any.
    #[must_use]
    pub fn featured_image(&self) -> Option<&Image> {
        self.images.first()
    }

    /// Whether the product offers a variation choice.
    #[must_use]
    pub fn is_variable(&self) -> bool {
        !self.variations.is_empty()
    }

    /// Find a variation by ID.
    #[must_use]
    pub fn variation(&self, id: VariationId) -> Option<&ProductVariation> {
        self.variations.iter().find(|v| v.id == id)
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description_html: String,
    pub parent: Option<CategoryId>,
    pub count: i64,
    pub image: Option<Image>,
}

// =============================================================================
// Content Types
// =============================================================================

/// A blog category (WordPress `category` taxonomy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogCategory {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub count: i64,
}

/// Minimal term reference on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub slug: String,
    pub name: String,
}

/// A blog post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub slug: String,
    pub title: String,
    pub excerpt_html: String,
    /// Empty on listing responses that omit content.
    pub content_html: String,
    pub date: Option<NaiveDateTime>,
    pub modified: Option<NaiveDateTime>,
    pub author_name: Option<String>,
    pub featured_image: Option<Image>,
    pub categories: Vec<TermRef>,
    pub tags: Vec<TermRef>,
}

/// A page of posts plus pagination info.
///
/// REST listings paginate by page number; GraphQL listings by cursor. Both
/// fields are filled where the API reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostConnection {
    pub posts: Vec<Post>,
    /// Current page number (REST).
    pub page: u32,
    /// Total pages (REST `X-WP-TotalPages`).
    pub total_pages: u32,
    /// Cursor of the next page (GraphQL).
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

/// A static CMS page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub slug: String,
    /// Hierarchical URI (`/about/team/`).
    pub uri: String,
    pub title: String,
    pub content_html: String,
    pub modified: Option<NaiveDateTime>,
    pub featured_image: Option<Image>,
}

// =============================================================================
// Commerce Types
// =============================================================================

/// How a coupon discount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Percentage of the cart subtotal.
    Percent,
    /// Fixed amount off the whole cart.
    FixedCart,
    /// Fixed amount off each unit.
    FixedProduct,
}

/// A WooCommerce coupon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Coupon code (lowercase, as WooCommerce stores it).
    pub code: String,
    pub discount_type: DiscountType,
    /// Percentage or fixed amount depending on `discount_type`.
    pub amount: rust_decimal::Decimal,
    pub minimum_amount: Option<Price>,
    pub maximum_amount: Option<Price>,
    pub date_expires: Option<NaiveDateTime>,
    pub usage_limit: Option<i64>,
    pub usage_count: i64,
    pub individual_use: bool,
    pub free_shipping: bool,
}

/// Billing/shipping address submitted at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A line of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<VariationId>,
    pub quantity: u32,
}

/// A coupon applied to a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCouponLine {
    pub code: String,
}

/// Order creation payload for `POST wc/v3/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub status: OrderStatus,
    pub set_paid: bool,
    pub payment_method: String,
    pub payment_method_title: String,
    pub currency: String,
    pub billing: Address,
    pub shipping: Address,
    pub line_items: Vec<NewOrderLine>,
    pub coupon_lines: Vec<NewCouponLine>,
    pub customer_note: String,
}

/// A created order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_key: String,
    pub status: OrderStatus,
    pub total: Price,
    pub payment_url: Option<String>,
}
