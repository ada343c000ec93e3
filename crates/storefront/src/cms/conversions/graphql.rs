//! WPGraphQL and WooGraphQL conversions.

use fernleaf_core::{CategoryId, CurrencyCode, PageId, PostId, Price, ProductId, StockStatus};

use super::{
    decode_entities, image, non_empty, parse_price, parse_wp_datetime, regular_if_different,
};
use crate::cms::graphql::queries::{
    CategoryNode, Edge, MediaItem, Nodes, PageNode, PostNode, ProductNode, Term,
};
use crate::cms::types::{BlogCategory, CategoryRef, Image, Page, Post, PostConnection, Product, TermRef};

fn convert_media(media: Option<MediaItem>) -> Option<Image> {
    media.and_then(|m| image(m.source_url, m.alt_text))
}

fn convert_featured(edge: Option<Edge<MediaItem>>) -> Option<Image> {
    convert_media(edge.map(|e| e.node))
}

fn convert_terms(terms: Option<Nodes<Term>>) -> Vec<TermRef> {
    terms
        .map(|t| t.nodes)
        .unwrap_or_default()
        .into_iter()
        .map(|t| TermRef {
            slug: t.slug,
            name: decode_entities(&t.name),
        })
        .collect()
}

pub fn convert_post(p: PostNode) -> Post {
    Post {
        id: PostId::new(p.database_id),
        slug: p.slug,
        title: decode_entities(&p.title.unwrap_or_default()),
        excerpt_html: p.excerpt.unwrap_or_default(),
        content_html: p.content.unwrap_or_default(),
        date: parse_wp_datetime(p.date.as_deref()),
        modified: parse_wp_datetime(p.modified.as_deref()),
        author_name: p.author.map(|a| a.node.name),
        featured_image: convert_featured(p.featured_image),
        categories: convert_terms(p.categories),
        tags: convert_terms(p.tags),
    }
}

/// Convert a category node and its first page of posts.
pub fn convert_blog_category(c: CategoryNode) -> (BlogCategory, PostConnection) {
    let connection = PostConnection {
        posts: c.posts.nodes.into_iter().map(convert_post).collect(),
        page: 0,
        total_pages: 0,
        end_cursor: c.posts.page_info.end_cursor,
        has_next_page: c.posts.page_info.has_next_page,
    };

    let category = BlogCategory {
        id: CategoryId::new(c.database_id),
        slug: c.slug,
        name: decode_entities(&c.name),
        description: c.description.unwrap_or_default(),
        count: c.count.unwrap_or(0),
    };

    (category, connection)
}

pub fn convert_page(p: PageNode) -> Page {
    let uri = p.uri.unwrap_or_else(|| format!("/{}/", p.slug));
    Page {
        id: PageId::new(p.database_id),
        slug: p.slug,
        uri,
        title: decode_entities(&p.title.unwrap_or_default()),
        content_html: p.content.unwrap_or_default(),
        modified: parse_wp_datetime(p.modified.as_deref()),
        featured_image: convert_featured(p.featured_image),
    }
}

/// Convert a WooGraphQL product listing node.
///
/// Listing queries don't request attributes or variations, so those are empty.
pub fn convert_product(p: ProductNode, currency: CurrencyCode) -> Product {
    let price = parse_price(p.price.as_deref(), currency).unwrap_or(Price::zero(currency));
    let regular = parse_price(p.regular_price.as_deref(), currency);

    let mut images: Vec<Image> = convert_media(p.image).into_iter().collect();
    images.extend(
        p.gallery_images
            .map(|g| g.nodes)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| image(m.source_url, m.alt_text)),
    );

    Product {
        id: ProductId::new(p.database_id),
        slug: p.slug,
        name: decode_entities(&p.name),
        description_html: p.description.unwrap_or_default(),
        short_description_html: p.short_description.unwrap_or_default(),
        sku: non_empty(p.sku),
        regular_price: regular_if_different(regular, price),
        price,
        on_sale: p.on_sale,
        featured: p.featured,
        stock_status: p
            .stock_status
            .as_deref()
            .map_or(StockStatus::InStock, StockStatus::from_api),
        stock_quantity: p.stock_quantity,
        images,
        categories: p
            .product_categories
            .map(|c| c.nodes)
            .unwrap_or_default()
            .into_iter()
            .map(|c| CategoryRef {
                id: CategoryId::new(c.database_id),
                slug: c.slug,
                name: decode_entities(&c.name),
            })
            .collect(),
        attributes: Vec::new(),
        variations: Vec::new(),
        average_rating: p.average_rating.unwrap_or(0.0),
        rating_count: p.review_count.unwrap_or(0),
        total_sales: p.total_sales.unwrap_or(0),
        date_created: parse_wp_datetime(p.date.as_deref()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cms::conversions::rest;
    use crate::cms::rest::wire::{RestPost, RestProduct};

    const REST_PRODUCT: &str = r#"{
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
        "images": [
            {"src": "https://cms.test/a.jpg", "alt": "Front"},
            {"src": "https://cms.test/b.jpg", "alt": "Back"}
        ],
        "categories": [{"id": 9, "slug": "shirts", "name": "Shirts"}],
        "attributes": [],
        "average_rating": "4.50",
        "rating_count": 2,
        "total_sales": 17,
        "date_created": "2024-03-01T09:30:00"
    }"#;

    const GRAPHQL_PRODUCT: &str = r#"{
        "databaseId": 42,
        "slug": "linen-shirt",
        "name": "Linen & Cotton Shirt",
        "description": "<p>Soft.</p>",
        "shortDescription": "<p>Short.</p>",
        "sku": "LS-1",
        "onSale": true,
        "featured": true,
        "price": "19.99",
        "regularPrice": "24.99",
        "stockStatus": "IN_STOCK",
        "stockQuantity": 5,
        "averageRating": 4.5,
        "reviewCount": 2,
        "totalSales": 17,
        "date": "2024-03-01T09:30:00",
        "image": {"sourceUrl": "https://cms.test/a.jpg", "altText": "Front"},
        "galleryImages": {"nodes": [{"sourceUrl": "https://cms.test/b.jpg", "altText": "Back"}]},
        "productCategories": {"nodes": [{"databaseId": 9, "slug": "shirts", "name": "Shirts"}]}
    }"#;

    #[test]
    fn test_product_matches_rest_conversion() {
        let from_rest = rest::convert_product(
            serde_json::from_str::<RestProduct>(REST_PRODUCT).unwrap(),
            CurrencyCode::USD,
        );
        let from_graphql = convert_product(
            serde_json::from_str::<ProductNode>(GRAPHQL_PRODUCT).unwrap(),
            CurrencyCode::USD,
        );
        assert_eq!(from_rest, from_graphql);
    }

    #[test]
    fn test_variable_product_price_range() {
        let node: ProductNode = serde_json::from_str(
            r#"{"databaseId": 3, "slug": "tee", "name": "Tee", "price": "10.00, 20.00",
                "regularPrice": "10.00, 20.00", "stockStatus": "ON_BACKORDER"}"#,
        )
        .unwrap();
        let product = convert_product(node, CurrencyCode::USD);
        assert_eq!(product.price.display(), "$10.00");
        assert!(product.regular_price.is_none());
        assert_eq!(product.stock_status, StockStatus::OnBackorder);
    }

    #[test]
    fn test_post_matches_rest_conversion() {
        let rest_post: RestPost = serde_json::from_str(
            r#"{
                "id": 5,
                "slug": "spring",
                "title": {"rendered": "Spring&#8217;s here"},
                "excerpt": {"rendered": "<p>Ex</p>"},
                "content": {"rendered": "<p>Body</p>"},
                "date": "2024-04-01T08:00:00",
                "modified": "2024-04-02T08:00:00",
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
        let graphql_post: PostNode = serde_json::from_str(
            r#"{
                "databaseId": 5,
                "slug": "spring",
                "title": "Spring’s here",
                "excerpt": "<p>Ex</p>",
                "content": "<p>Body</p>",
                "date": "2024-04-01T08:00:00",
                "modified": "2024-04-02T08:00:00",
                "author": {"node": {"name": "Robin"}},
                "featuredImage": {"node": {"sourceUrl": "https://cms.test/s.jpg", "altText": "Sun"}},
                "categories": {"nodes": [{"slug": "news", "name": "News"}]},
                "tags": {"nodes": [{"slug": "linen", "name": "Linen"}]}
            }"#,
        )
        .unwrap();

        assert_eq!(rest::convert_post(rest_post), convert_post(graphql_post));
    }

    #[test]
    fn test_blog_category_page_info() {
        let node: CategoryNode = serde_json::from_str(
            r#"{"databaseId": 3, "slug": "news", "name": "News", "count": 12,
                "posts": {"nodes": [{"databaseId": 1, "slug": "a", "title": "A"}],
                          "pageInfo": {"hasNextPage": true, "endCursor": "YXJyYXk6MQ=="}}}"#,
        )
        .unwrap();
        let (category, posts) = convert_blog_category(node);
        assert_eq!(category.count, 12);
        assert_eq!(posts.posts.len(), 1);
        assert!(posts.has_next_page);
        assert_eq!(posts.end_cursor.as_deref(), Some("YXJyYXk6MQ=="));
    }

    #[test]
    fn test_page_uri_defaults_from_slug() {
        let node: PageNode =
            serde_json::from_str(r#"{"databaseId": 2, "slug": "about", "title": "About"}"#)
                .unwrap();
        assert_eq!(convert_page(node).uri, "/about/");
    }
}
