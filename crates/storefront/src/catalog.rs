//! Catalog filtering, sorting, and pagination.
//!
//! Listings fetch the whole (capped) product array once and do all of this in
//! memory, so every filter combination is served from the same cached list.

use std::collections::{BTreeMap, BTreeSet};

use fernleaf_core::{CurrencyCode, Price};
use rust_decimal::Decimal;

use crate::cms::Product;

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Upstream (menu) order.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    /// Newest first.
    Newest,
    /// Best sellers first.
    Popularity,
    /// Highest rated first.
    Rating,
    NameAsc,
}

impl SortOrder {
    /// Parse a `sort` query value. Unknown values fall back to `Default`.
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value {
            "price" => Self::PriceAsc,
            "price-desc" => Self::PriceDesc,
            "date" => Self::Newest,
            "popularity" => Self::Popularity,
            "rating" => Self::Rating,
            "name" => Self::NameAsc,
            _ => Self::Default,
        }
    }

    /// The query value for this order (empty for `Default`).
    #[must_use]
    pub const fn as_param(&self) -> &'static str {
        match self {
            Self::Default => "",
            Self::PriceAsc => "price",
            Self::PriceDesc => "price-desc",
            Self::Newest => "date",
            Self::Popularity => "popularity",
            Self::Rating => "rating",
            Self::NameAsc => "name",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Default => "Featured",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::Newest => "Newest",
            Self::Popularity => "Best selling",
            Self::Rating => "Top rated",
            Self::NameAsc => "Name",
        }
    }

    /// All orders, in dropdown order.
    pub const ALL: [Self; 7] = [
        Self::Default,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Newest,
        Self::Popularity,
        Self::Rating,
        Self::NameAsc,
    ];
}

/// An attribute filter such as `Size:M`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub name: String,
    pub option: String,
}

impl AttributeFilter {
    /// Parse `name:option`. Both sides must be non-empty.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, option) = raw.split_once(':')?;
        let (name, option) = (name.trim(), option.trim());
        if name.is_empty() || option.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            option: option.to_string(),
        })
    }
}

/// Filters parsed from a listing's query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: bool,
    pub on_sale: bool,
    /// Category slug.
    pub category: Option<String>,
    pub attributes: Vec<AttributeFilter>,
    /// Case-insensitive substring of name or SKU.
    pub q: Option<String>,
    pub sort: SortOrder,
    pub page: usize,
}

impl CatalogQuery {
    /// Parse a raw query string (`min_price=10&attr=Size:M&attr=Size:L`).
    ///
    /// Repeated `attr` keys are collected. Malformed values are ignored
    /// rather than rejected, so a hand-edited URL still renders.
    #[must_use]
    pub fn from_query_str(raw: &str) -> Self {
        let mut query = Self {
            page: 1,
            ..Self::default()
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "min_price" => query.min_price = value.parse().ok(),
                "max_price" => query.max_price = value.parse().ok(),
                "in_stock" => query.in_stock = is_truthy(value),
                "on_sale" => query.on_sale = is_truthy(value),
                "category" if !value.is_empty() => query.category = Some(value.to_lowercase()),
                "attr" => query.attributes.extend(AttributeFilter::parse(value)),
                "q" if !value.is_empty() => query.q = Some(value.to_string()),
                "sort" => query.sort = SortOrder::from_param(value),
                "page" => query.page = value.parse().unwrap_or(1).max(1),
                _ => {}
            }
        }

        query
    }

    /// Whether any filter (not sort or page) is active.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.min_price.is_some()
            || self.max_price.is_some()
            || self.in_stock
            || self.on_sale
            || self.category.is_some()
            || !self.attributes.is_empty()
            || self.q.is_some()
    }

    /// Whether `option` of attribute `name` is selected.
    #[must_use]
    pub fn is_selected(&self, name: &str, option: &str) -> bool {
        self.attributes
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case(name) && a.option.eq_ignore_ascii_case(option))
    }

    /// Serialize back to a query string, replacing the page number.
    #[must_use]
    pub fn to_query_string(&self, page: usize) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        if let Some(min) = self.min_price {
            out.append_pair("min_price", &min.to_string());
        }
        if let Some(max) = self.max_price {
            out.append_pair("max_price", &max.to_string());
        }
        if self.in_stock {
            out.append_pair("in_stock", "1");
        }
        if self.on_sale {
            out.append_pair("on_sale", "1");
        }
        if let Some(category) = &self.category {
            out.append_pair("category", category);
        }
        for attr in &self.attributes {
            out.append_pair("attr", &format!("{}:{}", attr.name, attr.option));
        }
        if let Some(q) = &self.q {
            out.append_pair("q", q);
        }
        if self.sort != SortOrder::Default {
            out.append_pair("sort", self.sort.as_param());
        }
        if page > 1 {
            out.append_pair("page", &page.to_string());
        }
        out.finish()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "1" | "true" | "on" | "yes")
}

/// Apply filters and sorting.
///
/// Filters are conjunctive, except that attribute filters sharing a name are
/// alternatives (`Size:S` or `Size:M`). Sorting is stable.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], query: &CatalogQuery) -> Vec<&'a Product> {
    // Group selected options by attribute name
    let mut wanted: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for attr in &query.attributes {
        wanted
            .entry(attr.name.to_lowercase())
            .or_default()
            .push(attr.option.as_str());
    }
    let needle = query.q.as_deref().map(str::to_lowercase);

    let mut matched: Vec<&Product> = products
        .iter()
        .filter(|p| query.min_price.is_none_or(|min| p.price.amount >= min))
        .filter(|p| query.max_price.is_none_or(|max| p.price.amount <= max))
        .filter(|p| !query.in_stock || p.stock_status.is_purchasable())
        .filter(|p| !query.on_sale || p.on_sale)
        .filter(|p| {
            query
                .category
                .as_deref()
                .is_none_or(|slug| p.categories.iter().any(|c| c.slug == slug))
        })
        .filter(|p| {
            wanted.iter().all(|(name, options)| {
                p.attributes.iter().any(|a| {
                    a.name.to_lowercase() == *name
                        && a.options
                            .iter()
                            .any(|o| options.iter().any(|w| o.eq_ignore_ascii_case(w)))
                })
            })
        })
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.name.to_lowercase().contains(n)
                    || p.sku.as_deref().is_some_and(|s| s.to_lowercase().contains(n))
            })
        })
        .collect();

    sort_products(&mut matched, query.sort);
    matched
}

/// Sort in place. `sort_by` is stable, so ties keep upstream order.
pub fn sort_products(products: &mut [&Product], order: SortOrder) {
    match order {
        SortOrder::Default => {}
        SortOrder::PriceAsc => products.sort_by(|a, b| a.price.amount.cmp(&b.price.amount)),
        SortOrder::PriceDesc => products.sort_by(|a, b| b.price.amount.cmp(&a.price.amount)),
        // Products without a date sort last
        SortOrder::Newest => products.sort_by(|a, b| b.date_created.cmp(&a.date_created)),
        SortOrder::Popularity => products.sort_by(|a, b| b.total_sales.cmp(&a.total_sales)),
        SortOrder::Rating => products.sort_by(|a, b| {
            b.average_rating
                .total_cmp(&a.average_rating)
                .then_with(|| b.rating_count.cmp(&a.rating_count))
        }),
        SortOrder::NameAsc => {
            products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    /// Current page (1-indexed, clamped).
    pub page: usize,
    /// Always at least 1.
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> PageSlice<T> {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice `items` into pages of `per_page`, clamping `page` into range.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> PageSlice<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    PageSlice {
        items,
        page,
        total_pages,
        total_items,
    }
}

// =============================================================================
// Facets
// =============================================================================

/// Filter options available for the fetched products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facets {
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    /// Attribute name to sorted, de-duplicated options.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// `(slug, name)` of categories present, sorted by name.
    pub categories: Vec<(String, String)>,
}

impl Facets {
    /// Compute facets over the full (unfiltered) product array.
    #[must_use]
    pub fn from_products(products: &[Product], currency: CurrencyCode) -> Self {
        let min = products.iter().map(|p| p.price.amount).min();
        let max = products.iter().map(|p| p.price.amount).max();

        let mut attributes: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut categories: BTreeMap<String, String> = BTreeMap::new();

        for product in products {
            for attr in &product.attributes {
                attributes
                    .entry(attr.name.clone())
                    .or_default()
                    .extend(attr.options.iter().cloned());
            }
            for category in &product.categories {
                categories
                    .entry(category.slug.clone())
                    .or_insert_with(|| category.name.clone());
            }
        }

        let mut categories: Vec<(String, String)> = categories.into_iter().collect();
        categories.sort_by(|a, b| a.1.cmp(&b.1));

        Self {
            min_price: min.map(|amount| Price::new(amount, currency)),
            max_price: max.map(|amount| Price::new(amount, currency)),
            attributes: attributes
                .into_iter()
                .map(|(name, options)| (name, options.into_iter().collect()))
                .collect(),
            categories,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use fernleaf_core::{CategoryId, ProductId, StockStatus};

    use super::*;
    use crate::cms::{CategoryRef, ProductAttribute};

    fn product(id: i64, name: &str, price: &str) -> Product {
        Product {
            id: ProductId::new(id),
            slug: name.to_lowercase().replace(' ', "-"),
            name: name.to_string(),
            description_html: String::new(),
            short_description_html: String::new(),
            sku: Some(format!("SKU-{id}")),
            price: Price::parse(price, CurrencyCode::USD).unwrap().unwrap(),
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

    fn with_attr(mut p: Product, name: &str, options: &[&str]) -> Product {
        p.attributes.push(ProductAttribute {
            name: name.to_string(),
            options: options.iter().map(ToString::to_string).collect(),
            variation: true,
        });
        p
    }

    fn ids(products: &[&Product]) -> Vec<i64> {
        products.iter().map(|p| p.id.as_i64()).collect()
    }

    fn catalog() -> Vec<Product> {
        let mut shirt = with_attr(product(1, "Linen Shirt", "30"), "Size", &["S", "M"]);
        shirt.categories.push(CategoryRef {
            id: CategoryId::new(9),
            slug: "shirts".to_string(),
            name: "Shirts".to_string(),
        });
        shirt.total_sales = 5;
        shirt.date_created = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0);

        let mut scarf = with_attr(product(2, "Wool Scarf", "15"), "Color", &["Red"]);
        scarf.on_sale = true;
        scarf.total_sales = 9;
        scarf.average_rating = 4.5;
        scarf.rating_count = 2;
        scarf.date_created = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0);

        let mut hat = with_attr(product(3, "apron", "15"), "Size", &["L"]);
        hat.stock_status = StockStatus::OutOfStock;
        hat.average_rating = 4.5;
        hat.rating_count = 7;

        vec![shirt, scarf, hat]
    }

    #[test]
    fn test_parse_query_string() {
        let query = CatalogQuery::from_query_str(
            "min_price=10&max_price=abc&in_stock=1&attr=Size%3AM&attr=Size:L&attr=bogus&sort=price-desc&page=0",
        );
        assert_eq!(query.min_price, Some(Decimal::from(10)));
        assert_eq!(query.max_price, None);
        assert!(query.in_stock);
        assert_eq!(query.attributes.len(), 2);
        assert_eq!(query.sort, SortOrder::PriceDesc);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn test_query_string_round_trip_keeps_filters() {
        let query = CatalogQuery::from_query_str("attr=Size:M&on_sale=1&sort=name");
        assert_eq!(
            query.to_query_string(2),
            "on_sale=1&attr=Size%3AM&sort=name&page=2"
        );
        assert_eq!(CatalogQuery::from_query_str(&query.to_query_string(1)), query);
    }

    #[test]
    fn test_unknown_sort_is_default() {
        assert_eq!(SortOrder::from_param("random"), SortOrder::Default);
        assert_eq!(SortOrder::from_param(""), SortOrder::Default);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let products = catalog();
        let query = CatalogQuery::from_query_str("max_price=20&in_stock=1");
        assert_eq!(ids(&filter_products(&products, &query)), vec![2]);
    }

    #[test]
    fn test_same_attribute_options_are_alternatives() {
        let products = catalog();
        let query = CatalogQuery::from_query_str("attr=Size:M&attr=size:l");
        assert_eq!(ids(&filter_products(&products, &query)), vec![1, 3]);

        let query = CatalogQuery::from_query_str("attr=Size:M&attr=Color:Red");
        assert!(filter_products(&products, &query).is_empty());
    }

    #[test]
    fn test_search_matches_name_and_sku() {
        let products = catalog();
        let query = CatalogQuery::from_query_str("q=LINEN");
        assert_eq!(ids(&filter_products(&products, &query)), vec![1]);
        let query = CatalogQuery::from_query_str("q=sku-3");
        assert_eq!(ids(&filter_products(&products, &query)), vec![3]);
    }

    #[test]
    fn test_category_filter() {
        let products = catalog();
        let query = CatalogQuery::from_query_str("category=Shirts");
        assert_eq!(ids(&filter_products(&products, &query)), vec![1]);
    }

    #[test]
    fn test_sorting_is_stable() {
        let products = catalog();
        let sorted = |sort: &str| {
            let query = CatalogQuery::from_query_str(&format!("sort={sort}"));
            ids(&filter_products(&products, &query))
        };
        // Scarf and apron tie at 15
        assert_eq!(sorted("price"), vec![2, 3, 1]);
        assert_eq!(sorted("price-desc"), vec![1, 2, 3]);
        assert_eq!(sorted("date"), vec![2, 1, 3]);
        assert_eq!(sorted("popularity"), vec![2, 1, 3]);
        assert_eq!(sorted("rating"), vec![3, 2, 1]);
        assert_eq!(sorted("name"), vec![3, 1, 2]);
        assert_eq!(sorted(""), vec![1, 2, 3]);
    }

    #[test]
    fn test_paginate_clamps_page() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 9, 12);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![25]);
        assert!(page.has_prev());
        assert!(!page.has_next());

        let empty = paginate(Vec::<i32>::new(), 4, 12);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_facets() {
        let facets = Facets::from_products(&catalog(), CurrencyCode::USD);
        assert_eq!(facets.min_price.unwrap().display(), "$15.00");
        assert_eq!(facets.max_price.unwrap().display(), "$30.00");
        assert_eq!(facets.attributes["Size"], vec!["L", "M", "S"]);
        assert_eq!(facets.categories, vec![("shirts".to_string(), "Shirts".to_string())]);
    }
}
