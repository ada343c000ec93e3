//! WooCommerce/WordPress REST conversions.

use fernleaf_core::{
    CategoryId, CurrencyCode, OrderId, PostId, Price, ProductId, StockStatus, VariationId,
};
use rust_decimal::Decimal;

use super::{
    decode_entities, image, non_empty, parse_price, parse_wp_datetime, regular_if_different,
};
use crate::cms::rest::wire::{
    RestCoupon, RestEmbedded, RestImage, RestOrder, RestPost, RestProduct, RestProductCategory,
    RestVariation,
};
use crate::cms::types::{
    CategoryRef, Coupon, DiscountType, Image, Order, Post, Product, ProductAttribute,
    ProductCategory, ProductVariation, TermRef, VariationOption,
};

fn convert_image(img: RestImage) -> Option<Image> {
    image(Some(img.src), Some(img.alt))
}

/// Convert a REST product. Variations are attached separately.
pub fn convert_product(p: RestProduct, currency: CurrencyCode) -> Product {
    let price = parse_price(Some(&p.price), currency).unwrap_or(Price::zero(currency));
    let regular = parse_price(Some(&p.regular_price), currency);

    Product {
        id: ProductId::new(p.id),
        slug: p.slug,
        name: decode_entities(&p.name),
        description_html: p.description,
        short_description_html: p.short_description,
        sku: non_empty(Some(p.sku)),
        regular_price: regular_if_different(regular, price),
        price,
        on_sale: p.on_sale,
        featured: p.featured,
        stock_status: StockStatus::from_api(&p.stock_status),
        stock_quantity: p.stock_quantity,
        images: p.images.into_iter().filter_map(convert_image).collect(),
        categories: p
            .categories
            .into_iter()
            .map(|c| CategoryRef {
                id: CategoryId::new(c.id),
                slug: c.slug,
                name: decode_entities(&c.name),
            })
            .collect(),
        attributes: p
            .attributes
            .into_iter()
            .map(|a| ProductAttribute {
                name: a.name,
                options: a.options,
                variation: a.variation,
            })
            .collect(),
        variations: Vec::new(),
        average_rating: p.average_rating,
        rating_count: p.rating_count,
        total_sales: p.total_sales,
        date_created: parse_wp_datetime(p.date_created.as_deref()),
    }
}

pub fn convert_variation(v: RestVariation, currency: CurrencyCode) -> ProductVariation {
    let price = parse_price(Some(&v.price), currency).unwrap_or(Price::zero(currency));
    let regular = parse_price(Some(&v.regular_price), currency);

    ProductVariation {
        id: VariationId::new(v.id),
        sku: non_empty(Some(v.sku)),
        regular_price: regular_if_different(regular, price),
        price,
        on_sale: v.on_sale,
        stock_status: StockStatus::from_api(&v.stock_status),
        stock_quantity: v.stock_quantity,
        attributes: v
            .attributes
            .into_iter()
            .map(|a| VariationOption {
                name: a.name,
                option: a.option,
            })
            .collect(),
        image: v.image.and_then(convert_image),
    }
}

pub fn convert_product_category(c: RestProductCategory) -> ProductCategory {
    ProductCategory {
        id: CategoryId::new(c.id),
        slug: c.slug,
        name: decode_entities(&c.name),
        description_html: c.description,
        parent: (c.parent != 0).then(|| CategoryId::new(c.parent)),
        count: c.count,
        image: c.image.and_then(convert_image),
    }
}

fn terms(embedded: &RestEmbedded, taxonomy: &str) -> Vec<TermRef> {
    embedded
        .terms
        .iter()
        .flatten()
        .filter(|t| t.taxonomy == taxonomy)
        .map(|t| TermRef {
            slug: t.slug.clone(),
            name: decode_entities(&t.name),
        })
        .collect()
}

pub fn convert_post(p: RestPost) -> Post {
    let embedded = p.embedded.unwrap_or_default();

    Post {
        id: PostId::new(p.id),
        slug: p.slug,
        title: decode_entities(&p.title.rendered),
        excerpt_html: p.excerpt.map(|e| e.rendered).unwrap_or_default(),
        content_html: p.content.map(|c| c.rendered).unwrap_or_default(),
        date: parse_wp_datetime(p.date.as_deref()),
        modified: parse_wp_datetime(p.modified.as_deref()),
        author_name: embedded.author.first().map(|a| a.name.clone()),
        featured_image: embedded
            .featured_media
            .first()
            .and_then(|m| image(Some(m.source_url.clone()), Some(m.alt_text.clone()))),
        categories: terms(&embedded, "category"),
        tags: terms(&embedded, "post_tag"),
    }
}

/// Convert a REST coupon.
///
/// WooCommerce reports unset minimum/maximum amounts as `"0.00"`.
pub fn convert_coupon(c: RestCoupon, currency: CurrencyCode) -> Coupon {
    let limit = |raw: &str| parse_price(Some(raw), currency).filter(|p| !p.is_zero());

    Coupon {
        code: c.code.to_lowercase(),
        discount_type: match c.discount_type.as_str() {
            "fixed_cart" => DiscountType::FixedCart,
            "fixed_product" => DiscountType::FixedProduct,
            _ => DiscountType::Percent,
        },
        amount: parse_price(Some(&c.amount), currency).map_or(Decimal::ZERO, |p| p.amount),
        minimum_amount: limit(&c.minimum_amount),
        maximum_amount: limit(&c.maximum_amount),
        date_expires: parse_wp_datetime(c.date_expires.as_deref()),
        usage_limit: c.usage_limit,
        usage_count: c.usage_count,
        individual_use: c.individual_use,
        free_shipping: c.free_shipping,
    }
}

pub fn convert_order(o: RestOrder, currency: CurrencyCode) -> Order {
    Order {
        id: OrderId::new(o.id),
        order_key: o.order_key,
        status: o.status,
        total: parse_price(Some(&o.total), currency).unwrap_or(Price::zero(currency)),
        payment_url: non_empty(o.payment_url),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product_json() -> RestProduct {
        serde_json::from_str(
            r#"{
                "id": 42,
                "slug": "linen-shirt",
                "name": "Linen &amp; Cotton Shirt",
                "description": "<p>Soft.</p>",
                "short_description": "<p>Short.</p>",
                "sku": "LS-1",
                "price": "19.99",
                "regular_price": "24.99",
                "on_sale": true,
                "featured": true,
                "stock_status": "instock",
                "stock_quantity": 5,
                "images": [{"src": "https://cms.test/a.jpg", "alt": "Front"}, {"src": "", "alt": ""}],
                "categories": [{"id": 9, "slug": "shirts", "name": "Shirts"}],
                "attributes": [{"name": "Size", "options": ["S", "M"], "variation": true}],
                "variations": [100, 101],
                "average_rating": "4.50",
                "rating_count": 2,
                "total_sales": 17,
                "date_created": "2024-03-01T09:30:00"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_convert_product() {
        let product = convert_product(product_json(), CurrencyCode::USD);
        assert_eq!(product.id, ProductId::new(42));
        assert_eq!(product.name, "Linen & Cotton Shirt");
        assert_eq!(product.price.display(), "$19.99");
        assert_eq!(product.regular_price.unwrap().display(), "$24.99");
        assert_eq!(product.sku.as_deref(), Some("LS-1"));
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.categories[0].slug, "shirts");
        assert!(product.variations.is_empty());
        assert!(product.date_created.is_some());
    }

    #[test]
    fn test_convert_product_regular_equal_to_price_is_dropped() {
        let mut raw = product_json();
        raw.regular_price = "19.99".to_string();
        raw.on_sale = false;
        let product = convert_product(raw, CurrencyCode::USD);
        assert!(product.regular_price.is_none());
    }

    #[test]
    fn test_convert_variation_label() {
        let raw: RestVariation = serde_json::from_str(
            r#"{"id": 100, "price": "21.00", "regular_price": "21.00", "stock_status": "outofstock",
                "attributes": [{"name": "Size", "option": "M"}, {"name": "Color", "option": "Sand"}]}"#,
        )
        .unwrap();
        let variation = convert_variation(raw, CurrencyCode::USD);
        assert_eq!(variation.label(), "M / Sand");
        assert_eq!(variation.stock_status, StockStatus::OutOfStock);
        assert!(variation.regular_price.is_none());
    }

    #[test]
    fn test_convert_category_root_has_no_parent() {
        let raw: RestProductCategory = serde_json::from_str(
            r#"{"id": 9, "slug": "shirts", "name": "Shirts &amp; Tops", "parent": 0, "count": 4}"#,
        )
        .unwrap();
        let category = convert_product_category(raw);
        assert_eq!(category.name, "Shirts & Tops");
        assert_eq!(category.parent, None);
    }

    #[test]
    fn test_convert_post_reads_embedded() {
        let raw: RestPost = serde_json::from_str(
            r#"{
                "id": 5,
                "slug": "spring",
                "title": {"rendered": "Spring&#8217;s here"},
                "excerpt": {"rendered": "<p>Ex</p>"},
                "content": {"rendered": "<p>Body</p>"},
                "date": "2024-04-01T08:00:00",
                "_embedded": {
                    "author": [{"name": "Robin"}],
                    "wp:featuredmedia": [{"source_url": "https://cms.test/s.jpg", "alt_text": "Sun"}],
                    "wp:term": [
                        [{"taxonomy": "category", "slug": "news", "name": "News"}],
                        [{"taxonomy": "post_tag", "slug": "linen", "name": "Linen"}]
                    ]
                }
            }"#,
        )
        .unwrap();
        let post = convert_post(raw);
        assert_eq!(post.title, "Spring’s here");
        assert_eq!(post.author_name.as_deref(), Some("Robin"));
        assert_eq!(post.featured_image.unwrap().alt, "Sun");
        assert_eq!(post.categories[0].slug, "news");
        assert_eq!(post.tags[0].slug, "linen");
    }

    #[test]
    fn test_convert_coupon_zero_limits_are_unset() {
        let raw: RestCoupon = serde_json::from_str(
            r#"{"code": "SAVE10", "discount_type": "percent", "amount": "10.00",
                "minimum_amount": "0.00", "maximum_amount": "100.00", "usage_count": 1}"#,
        )
        .unwrap();
        let coupon = convert_coupon(raw, CurrencyCode::USD);
        assert_eq!(coupon.code, "save10");
        assert_eq!(coupon.discount_type, DiscountType::Percent);
        assert_eq!(coupon.amount, Decimal::new(1000, 2));
        assert!(coupon.minimum_amount.is_none());
        assert_eq!(coupon.maximum_amount.unwrap().display(), "$100.00");
    }

    #[test]
    fn test_convert_order() {
        let raw: RestOrder = serde_json::from_str(
            r#"{"id": 300, "order_key": "wc_order_abc", "status": "pending", "total": "39.98", "payment_url": ""}"#,
        )
        .unwrap();
        let order = convert_order(raw, CurrencyCode::USD);
        assert_eq!(order.id, OrderId::new(300));
        assert_eq!(order.total.display(), "$39.98");
        assert!(order.payment_url.is_none());
    }
}
