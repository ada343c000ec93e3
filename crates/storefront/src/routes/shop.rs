//! Catalog listing route handlers (`/shop` and category pages).
//!
//! Listings fetch the whole (capped) product array once, then filter, sort,
//! and paginate it in memory via [`crate::catalog`].

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, RawQuery, State};
use fernleaf_core::{CurrencyCode, Slug};
use tracing::instrument;

use super::views::{CategoryView, PageContext, ProductCard};
use crate::catalog::{CatalogQuery, Facets, SortOrder, filter_products, paginate};
use crate::cms::{Product, ProductCategory, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: usize = 12;

/// A sort dropdown entry.
#[derive(Clone, Debug)]
pub struct SortOption {
    pub param: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// A checkbox in an attribute facet.
#[derive(Clone, Debug)]
pub struct FacetOption {
    /// `name:option`, the `attr` query value.
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// All options of one attribute.
#[derive(Clone, Debug)]
pub struct FacetGroup {
    pub name: String,
    pub options: Vec<FacetOption>,
}

/// A category facet entry.
#[derive(Clone, Debug)]
pub struct CategoryFacet {
    pub slug: String,
    pub name: String,
    pub selected: bool,
}

/// Everything the listing template needs besides the page header.
#[derive(Clone, Debug)]
pub struct CatalogListing {
    /// Path the filter form submits to.
    pub base_path: String,
    pub products: Vec<ProductCard>,
    pub total_items: usize,
    pub page: usize,
    pub total_pages: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub sort_options: Vec<SortOption>,
    pub attribute_facets: Vec<FacetGroup>,
    pub category_facets: Vec<CategoryFacet>,
    /// Selected category slug, empty for all.
    pub selected_category: String,
    /// Placeholder bounds for the price inputs.
    pub price_floor: Option<String>,
    pub price_ceiling: Option<String>,
    /// Current filter values, echoed back into the form.
    pub min_price: String,
    pub max_price: String,
    pub in_stock: bool,
    pub on_sale: bool,
    pub q: String,
    pub has_filters: bool,
}

fn page_url(base_path: &str, query: &CatalogQuery, page: usize) -> String {
    let qs = query.to_query_string(page);
    if qs.is_empty() {
        base_path.to_string()
    } else {
        format!("{base_path}?{qs}")
    }
}

/// Filter, sort, and paginate `products` for display.
#[must_use]
pub fn build_listing(
    products: &[Product],
    query: &CatalogQuery,
    base_path: &str,
    currency: CurrencyCode,
    show_categories: bool,
) -> CatalogListing {
    let facets = Facets::from_products(products, currency);
    let filtered = filter_products(products, query);
    let slice = paginate(filtered, query.page, PRODUCTS_PER_PAGE);

    let attribute_facets = facets
        .attributes
        .iter()
        .map(|(name, options)| FacetGroup {
            name: name.clone(),
            options: options
                .iter()
                .map(|option| FacetOption {
                    value: format!("{name}:{option}"),
                    label: option.clone(),
                    selected: query.is_selected(name, option),
                })
                .collect(),
        })
        .collect();

    let category_facets = if show_categories {
        facets
            .categories
            .iter()
            .map(|(slug, name)| CategoryFacet {
                slug: slug.clone(),
                name: name.clone(),
                selected: query.category.as_deref() == Some(slug.as_str()),
            })
            .collect()
    } else {
        Vec::new()
    };

    CatalogListing {
        base_path: base_path.to_string(),
        total_items: slice.total_items,
        page: slice.page,
        total_pages: slice.total_pages,
        prev_url: slice
            .has_prev()
            .then(|| page_url(base_path, query, slice.page - 1)),
        next_url: slice
            .has_next()
            .then(|| page_url(base_path, query, slice.page + 1)),
        products: slice.items.into_iter().map(ProductCard::from).collect(),
        sort_options: SortOrder::ALL
            .iter()
            .map(|order| SortOption {
                param: order.as_param(),
                label: order.label(),
                selected: *order == query.sort,
            })
            .collect(),
        attribute_facets,
        category_facets,
        selected_category: query.category.clone().unwrap_or_default(),
        price_floor: facets.min_price.map(|p| p.amount.round().to_string()),
        price_ceiling: facets.max_price.map(|p| p.amount.ceil().to_string()),
        min_price: query.min_price.map(|d| d.to_string()).unwrap_or_default(),
        max_price: query.max_price.map(|d| d.to_string()).unwrap_or_default(),
        in_stock: query.in_stock,
        on_sale: query.on_sale,
        q: query.q.clone().unwrap_or_default(),
        has_filters: query.has_filters(),
    }
}

/// Catalog listing template (shop and product categories).
#[derive(Template, WebTemplate)]
#[template(path = "catalog/listing.html")]
pub struct CatalogTemplate {
    pub ctx: PageContext,
    pub title: String,
    pub category: Option<CategoryView>,
    pub listing: CatalogListing,
}

/// Display all products.
///
/// # Errors
///
/// Returns 502 if the product list cannot be fetched.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    RawQuery(raw): RawQuery,
) -> Result<CatalogTemplate> {
    let query = CatalogQuery::from_query_str(raw.as_deref().unwrap_or_default());
    let products = state.cms().rest().products(&ProductQuery::default()).await?;

    let listing = build_listing(
        &products,
        &query,
        "/shop",
        state.config().store.currency,
        true,
    );

    Ok(CatalogTemplate {
        ctx,
        title: "Shop".to_string(),
        category: None,
        listing,
    })
}

/// Display a product category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, ctx))]
pub async fn category(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<CatalogTemplate> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(slug.clone()))?;
    let category = state
        .cms()
        .rest()
        .product_category_by_slug(slug.as_str())
        .await
        .map_err(|e| AppError::from_lookup(e, "product category"))?;

    render_category(&state, ctx, &category, raw.as_deref()).await
}

/// Render a category listing; also used by the catch-all resolver.
///
/// # Errors
///
/// Returns 502 if the category's products cannot be fetched.
pub async fn render_category(
    state: &AppState,
    ctx: PageContext,
    category: &ProductCategory,
    raw_query: Option<&str>,
) -> Result<CatalogTemplate> {
    let mut query = CatalogQuery::from_query_str(raw_query.unwrap_or_default());
    // The category is fixed by the path
    query.category = None;

    let products = state
        .cms()
        .rest()
        .products(&ProductQuery::in_category(category.id))
        .await?;

    let view = CategoryView::from(category);
    let base_path = ctx.path.clone();
    let listing = build_listing(
        &products,
        &query,
        &base_path,
        state.config().store.currency,
        false,
    );

    Ok(CatalogTemplate {
        ctx,
        title: category.name.clone(),
        category: Some(view),
        listing,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fernleaf_core::{Price, ProductId, StockStatus};

    use super::*;
    use crate::cms::ProductAttribute;

    fn product(id: i64, price: &str, size: &str) -> Product {
        Product {
            id: ProductId::new(id),
            slug: format!("p-{id}"),
            name: format!("Product {id}"),
            description_html: String::new(),
            short_description_html: String::new(),
            sku: None,
            price: Price::parse(price, CurrencyCode::USD).unwrap().unwrap(),
            regular_price: None,
            on_sale: false,
            featured: false,
            stock_status: StockStatus::InStock,
            stock_quantity: None,
            images: vec![],
            categories: vec![],
            attributes: vec![ProductAttribute {
                name: "Size".to_string(),
                options: vec![size.to_string()],
                variation: false,
            }],
            variations: vec![],
            average_rating: 0.0,
            rating_count: 0,
            total_sales: 0,
            date_created: None,
        }
    }

    #[test]
    fn test_listing_paginates_and_links_pages() {
        let products: Vec<Product> = (1..=30).map(|i| product(i, "10", "M")).collect();
        let query = CatalogQuery::from_query_str("page=2&sort=price");
        let listing = build_listing(&products, &query, "/shop", CurrencyCode::USD, true);

        assert_eq!(listing.products.len(), PRODUCTS_PER_PAGE);
        assert_eq!(listing.total_pages, 3);
        assert_eq!(listing.prev_url.as_deref(), Some("/shop?sort=price"));
        assert_eq!(listing.next_url.as_deref(), Some("/shop?sort=price&page=3"));
        assert!(listing
            .sort_options
            .iter()
            .any(|o| o.selected && o.param == "price"));
    }

    #[test]
    fn test_listing_marks_selected_facets() {
        let products = vec![product(1, "10", "S"), product(2, "20", "M")];
        let query = CatalogQuery::from_query_str("attr=Size:M");
        let listing = build_listing(&products, &query, "/shop", CurrencyCode::USD, true);

        assert_eq!(listing.products.len(), 1);
        let sizes = &listing.attribute_facets[0];
        assert_eq!(sizes.name, "Size");
        assert_eq!(
            sizes
                .options
                .iter()
                .map(|o| (o.label.as_str(), o.selected))
                .collect::<Vec<_>>(),
            vec![("M", true), ("S", false)]
        );
        assert_eq!(listing.price_floor.as_deref(), Some("10"));
        assert!(listing.has_filters);
    }
}
