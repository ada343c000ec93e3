//! Template view models and the per-request page context.
//!
//! Domain types from `cms` are flattened into display-ready strings here so
//! templates stay free of formatting logic.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::NaiveDateTime;
use tower_sessions::Session;

use crate::cms::{Image, Page, Post, Product, ProductCategory, ProductVariation};
use crate::config::AnalyticsConfig;
use crate::middleware::CspNonce;
use crate::models::session::{load_cart, load_wishlist};
use crate::state::AppState;

// =============================================================================
// Page Context
// =============================================================================

/// Data every full page needs: store name, analytics, CSP nonce, and the
/// header badges.
#[derive(Clone, Debug)]
pub struct PageContext {
    pub store_name: String,
    pub base_url: String,
    pub analytics: AnalyticsConfig,
    pub nonce: String,
    pub cart_count: u32,
    pub wishlist_count: usize,
    /// Request path, for canonical links and active nav items.
    pub path: String,
}

impl PageContext {
    /// Canonical URL of the current page.
    #[must_use]
    pub fn canonical_url(&self) -> String {
        format!("{}{}", self.base_url, self.path)
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let session = <Session as FromRequestParts<AppState>>::from_request_parts(parts, state)
            .await
            .ok();

        let (cart_count, wishlist_count) = match &session {
            Some(session) => (
                load_cart(session, state.config().store.currency)
                    .await
                    .item_count(),
                load_wishlist(session).await.len(),
            ),
            None => (0, 0),
        };

        Ok(Self {
            store_name: state.config().store.name.clone(),
            base_url: state.config().base_url.clone(),
            analytics: state.config().analytics.clone(),
            nonce,
            cart_count,
            wishlist_count,
            path: parts.uri.path().to_string(),
        })
    }
}

// =============================================================================
// Shared Views
// =============================================================================

/// Image display data for templates.
#[derive(Clone, Debug)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

impl ImageView {
    fn from_image(image: &Image, fallback_alt: &str) -> Self {
        Self {
            url: image.url.clone(),
            alt: if image.alt.is_empty() {
                fallback_alt.to_string()
            } else {
                image.alt.clone()
            },
        }
    }
}

/// A named link (categories, tags, breadcrumbs).
#[derive(Clone, Debug)]
pub struct LinkView {
    pub name: String,
    pub url: String,
}

fn format_date(date: Option<NaiveDateTime>) -> Option<String> {
    date.map(|d| d.format("%B %-d, %Y").to_string())
}

// =============================================================================
// Products
// =============================================================================

/// Product card for listings.
#[derive(Clone, Debug)]
pub struct ProductCard {
    pub id: i64,
    pub slug: String,
    pub url: String,
    pub name: String,
    pub price: String,
    /// Struck-through price when on sale.
    pub regular_price: Option<String>,
    pub on_sale: bool,
    pub purchasable: bool,
    pub is_variable: bool,
    pub stock_label: &'static str,
    pub image: Option<ImageView>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.as_i64(),
            slug: product.slug.clone(),
            url: format!("/products/{}", product.slug),
            name: product.name.clone(),
            price: product.price.display(),
            regular_price: product
                .regular_price
                .filter(|_| product.on_sale)
                .map(|p| p.display()),
            on_sale: product.on_sale,
            purchasable: product.stock_status.is_purchasable(),
            is_variable: product.is_variable(),
            stock_label: product.stock_status.label(),
            image: product
                .featured_image()
                .map(|i| ImageView::from_image(i, &product.name)),
        }
    }
}

/// One purchasable option of a variable product.
#[derive(Clone, Debug)]
pub struct VariationView {
    pub id: i64,
    pub label: String,
    pub price: String,
    pub purchasable: bool,
}

impl From<&ProductVariation> for VariationView {
    fn from(variation: &ProductVariation) -> Self {
        Self {
            id: variation.id.as_i64(),
            label: variation.label(),
            price: variation.price.display(),
            purchasable: variation.stock_status.is_purchasable(),
        }
    }
}

/// A descriptive attribute shown in the detail table.
#[derive(Clone, Debug)]
pub struct AttributeView {
    pub name: String,
    pub value: String,
}

/// Product detail page data.
#[derive(Clone, Debug)]
pub struct ProductDetail {
    pub card: ProductCard,
    pub sku: Option<String>,
    pub description_html: String,
    pub short_description_html: String,
    pub images: Vec<ImageView>,
    pub categories: Vec<LinkView>,
    pub attributes: Vec<AttributeView>,
    pub variations: Vec<VariationView>,
    pub max_quantity: u32,
    pub rating: Option<String>,
}

impl From<&Product> for ProductDetail {
    fn from(product: &Product) -> Self {
        let max_quantity = product
            .stock_quantity
            .filter(|q| *q > 0)
            .and_then(|q| u32::try_from(q).ok())
            .unwrap_or(crate::models::cart::MAX_LINE_QUANTITY)
            .min(crate::models::cart::MAX_LINE_QUANTITY);

        Self {
            card: ProductCard::from(product),
            sku: product.sku.clone(),
            description_html: product.description_html.clone(),
            short_description_html: product.short_description_html.clone(),
            images: product
                .images
                .iter()
                .map(|i| ImageView::from_image(i, &product.name))
                .collect(),
            categories: product
                .categories
                .iter()
                .map(|c| LinkView {
                    name: c.name.clone(),
                    url: format!("/product-category/{}", c.slug),
                })
                .collect(),
            attributes: product
                .attributes
                .iter()
                .filter(|a| !a.variation)
                .map(|a| AttributeView {
                    name: a.name.clone(),
                    value: a.options.join(", "),
                })
                .collect(),
            variations: product.variations.iter().map(VariationView::from).collect(),
            max_quantity,
            rating: (product.rating_count > 0).then(|| {
                format!(
                    "{:.1} out of 5 ({} reviews)",
                    product.average_rating, product.rating_count
                )
            }),
        }
    }
}

/// Category tile for the home page and category headers.
#[derive(Clone, Debug)]
pub struct CategoryView {
    pub name: String,
    pub url: String,
    pub description_html: String,
    pub count: i64,
    pub image: Option<ImageView>,
}

impl From<&ProductCategory> for CategoryView {
    fn from(category: &ProductCategory) -> Self {
        Self {
            name: category.name.clone(),
            url: format!("/product-category/{}", category.slug),
            description_html: category.description_html.clone(),
            count: category.count,
            image: category
                .image
                .as_ref()
                .map(|i| ImageView::from_image(i, &category.name)),
        }
    }
}

// =============================================================================
// Content
// =============================================================================

/// Post view for templates.
#[derive(Clone, Debug)]
pub struct PostView {
    pub slug: String,
    /// Posts resolve through the catch-all route at their WordPress permalink.
    pub url: String,
    pub title: String,
    pub excerpt_html: String,
    pub content_html: String,
    pub date: Option<String>,
    pub author: Option<String>,
    pub image: Option<ImageView>,
    pub categories: Vec<LinkView>,
    pub tags: Vec<String>,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            url: format!("/{}", post.slug),
            title: post.title.clone(),
            excerpt_html: post.excerpt_html.clone(),
            content_html: post.content_html.clone(),
            date: format_date(post.date),
            author: post.author_name.clone(),
            image: post
                .featured_image
                .as_ref()
                .map(|i| ImageView::from_image(i, &post.title)),
            categories: post
                .categories
                .iter()
                .map(|c| LinkView {
                    name: c.name.clone(),
                    url: format!("/blog/category/{}", c.slug),
                })
                .collect(),
            tags: post.tags.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

/// Static page view.
#[derive(Clone, Debug)]
pub struct PageView {
    pub title: String,
    pub content_html: String,
    pub updated: Option<String>,
    pub image: Option<ImageView>,
}

impl From<&Page> for PageView {
    fn from(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            content_html: page.content_html.clone(),
            updated: format_date(page.modified),
            image: page
                .featured_image
                .as_ref()
                .map(|i| ImageView::from_image(i, &page.title)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernleaf_core::{CategoryId, CurrencyCode, PostId, Price, ProductId, StockStatus};

    use super::*;
    use crate::cms::{CategoryRef, TermRef};

    fn product() -> Product {
        Product {
            id: ProductId::new(12),
            slug: "linen-sheet".to_string(),
            name: "Linen Sheet".to_string(),
            description_html: "<p>Soft</p>".to_string(),
            short_description_html: String::new(),
            sku: Some("LS-1".to_string()),
            price: Price::parse("80", CurrencyCode::USD).unwrap().unwrap(),
            regular_price: Price::parse("100", CurrencyCode::USD).unwrap(),
            on_sale: true,
            featured: false,
            stock_status: StockStatus::InStock,
            stock_quantity: Some(4),
            images: vec![Image {
                url: "https://cms.example.com/sheet.jpg".to_string(),
                alt: String::new(),
            }],
            categories: vec![CategoryRef {
                id: CategoryId::new(3),
                slug: "bedding".to_string(),
                name: "Bedding".to_string(),
            }],
            attributes: vec![],
            variations: vec![],
            average_rating: 4.3,
            rating_count: 8,
            total_sales: 0,
            date_created: None,
        }
    }

    #[test]
    fn test_product_card() {
        let card = ProductCard::from(&product());
        assert_eq!(card.url, "/products/linen-sheet");
        assert_eq!(card.price, "$80.00");
        assert_eq!(card.regular_price.as_deref(), Some("$100.00"));
        assert_eq!(card.image.unwrap().alt, "Linen Sheet");
    }

    #[test]
    fn test_product_detail() {
        let detail = ProductDetail::from(&product());
        assert_eq!(detail.max_quantity, 4);
        assert_eq!(detail.categories[0].url, "/product-category/bedding");
        assert_eq!(detail.rating.as_deref(), Some("4.3 out of 5 (8 reviews)"));
    }

    #[test]
    fn test_post_view_links() {
        let post = Post {
            id: PostId::new(1),
            slug: "spring-linen".to_string(),
            title: "Spring".to_string(),
            excerpt_html: String::new(),
            content_html: String::new(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
                .unwrap()
                .and_hms_opt(9, 0, 0),
            modified: None,
            author_name: None,
            featured_image: None,
            categories: vec![TermRef {
                slug: "news".to_string(),
                name: "News".to_string(),
            }],
            tags: vec![],
        };
        let view = PostView::from(&post);
        assert_eq!(view.url, "/spring-linen");
        assert_eq!(view.date.as_deref(), Some("March 5, 2024"));
        assert_eq!(view.categories[0].url, "/blog/category/news");
    }
}
