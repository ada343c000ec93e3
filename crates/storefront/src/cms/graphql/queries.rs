//! WPGraphQL query definitions.
//!
//! No schema is checked in, so each query implements [`GraphQLQuery`] by hand:
//! a static query document, a variables struct, and the response shape.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared fragments and response shapes
// =============================================================================

/// `PostFields` fragment, appended to queries with `concat!`.
macro_rules! post_fields {
    () => {
        r"
fragment PostFields on Post {
  databaseId
  slug
  title
  excerpt
  content
  date
  modified
  author { node { name } }
  featuredImage { node { sourceUrl altText } }
  categories { nodes { slug name } }
  tags { nodes { slug name } }
}
"
    };
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Term {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostNode {
    pub database_id: i64,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub author: Option<Edge<Author>>,
    #[serde(default)]
    pub featured_image: Option<Edge<MediaItem>>,
    #[serde(default)]
    pub categories: Option<Nodes<Term>>,
    #[serde(default)]
    pub tags: Option<Nodes<Term>>,
}

// =============================================================================
// GetPostBySlug
// =============================================================================

pub struct GetPostBySlug;

#[derive(Debug, Clone, Serialize)]
pub struct SlugVariables {
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPostBySlugData {
    pub post: Option<PostNode>,
}

impl GraphQLQuery for GetPostBySlug {
    type Variables = SlugVariables;
    type ResponseData = GetPostBySlugData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: concat!(
                "query GetPostBySlug($slug: ID!) { post(id: $slug, idType: SLUG) { ...PostFields } }",
                post_fields!()
            ),
            operation_name: "GetPostBySlug",
        }
    }
}

// =============================================================================
// GetBlogCategory
// =============================================================================

pub struct GetBlogCategory;

#[derive(Debug, Clone, Serialize)]
pub struct BlogCategoryVariables {
    pub slug: String,
    pub first: i64,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPosts {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<PostNode>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub database_id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
    pub posts: CategoryPosts,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetBlogCategoryData {
    pub category: Option<CategoryNode>,
}

impl GraphQLQuery for GetBlogCategory {
    type Variables = BlogCategoryVariables;
    type ResponseData = GetBlogCategoryData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: concat!(
                r"query GetBlogCategory($slug: ID!, $first: Int!, $after: String) {
  category(id: $slug, idType: SLUG) {
    databaseId
    slug
    name
    description
    count
    posts(first: $first, after: $after) {
      nodes { ...PostFields }
      pageInfo { hasNextPage endCursor }
    }
  }
}",
                post_fields!()
            ),
            operation_name: "GetBlogCategory",
        }
    }
}

// =============================================================================
// GetPageByUri
// =============================================================================

pub struct GetPageByUri;

#[derive(Debug, Clone, Serialize)]
pub struct UriVariables {
    pub uri: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    pub database_id: i64,
    pub slug: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default)]
    pub featured_image: Option<Edge<MediaItem>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetPageByUriData {
    pub page: Option<PageNode>,
}

impl GraphQLQuery for GetPageByUri {
    type Variables = UriVariables;
    type ResponseData = GetPageByUriData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: r"query GetPageByUri($uri: ID!) {
  page(id: $uri, idType: URI) {
    databaseId
    slug
    uri
    title
    content
    modified
    featuredImage { node { sourceUrl altText } }
  }
}",
            operation_name: "GetPageByUri",
        }
    }
}

// =============================================================================
// GetFeaturedProducts (WooGraphQL)
// =============================================================================

pub struct GetFeaturedProducts;

#[derive(Debug, Clone, Serialize)]
pub struct FirstVariables {
    pub first: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategoryNode {
    pub database_id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductNode {
    pub database_id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub featured: bool,
    /// Only present on simple and variable products (inline fragments).
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub regular_price: Option<String>,
    #[serde(default)]
    pub stock_status: Option<String>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<i64>,
    #[serde(default)]
    pub total_sales: Option<i64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: Option<MediaItem>,
    #[serde(default)]
    pub gallery_images: Option<Nodes<MediaItem>>,
    #[serde(default)]
    pub product_categories: Option<Nodes<ProductCategoryNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetFeaturedProductsData {
    pub products: Option<Nodes<ProductNode>>,
}

impl GraphQLQuery for GetFeaturedProducts {
    type Variables = FirstVariables;
    type ResponseData = GetFeaturedProductsData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: r"query GetFeaturedProducts($first: Int!) {
  products(first: $first, where: { featured: true }) {
    nodes {
      databaseId
      slug
      name
      description
      shortDescription
      sku
      onSale
      featured
      averageRating
      reviewCount
      totalSales
      date
      image { sourceUrl altText }
      galleryImages { nodes { sourceUrl altText } }
      productCategories { nodes { databaseId slug name } }
      ... on SimpleProduct {
        price(format: RAW)
        regularPrice(format: RAW)
        stockStatus
        stockQuantity
      }
      ... on VariableProduct {
        price(format: RAW)
        regularPrice(format: RAW)
        stockStatus
        stockQuantity
      }
    }
  }
}",
            operation_name: "GetFeaturedProducts",
        }
    }
}

// =============================================================================
// Ping
// =============================================================================

pub struct Ping;

#[derive(Debug, Clone, Serialize)]
pub struct NoVariables {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingData {
    pub general_settings: Option<GeneralSettings>,
}

impl GraphQLQuery for Ping {
    type Variables = NoVariables;
    type ResponseData = PingData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        QueryBody {
            variables,
            query: "query Ping { generalSettings { title } }",
            operation_name: "Ping",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_body_serializes_operation() {
        let body = GetPostBySlug::build_query(SlugVariables {
            slug: "hello".to_string(),
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["operationName"], "GetPostBySlug");
        assert_eq!(json["variables"]["slug"], "hello");
        assert!(json["query"].as_str().unwrap().contains("fragment PostFields"));
    }

    #[test]
    fn test_inline_fragment_fields_are_optional() {
        let json = r#"{"products":{"nodes":[{"databaseId":7,"slug":"gift-card","name":"Gift card"}]}}"#;
        let data: GetFeaturedProductsData = serde_json::from_str(json).unwrap();
        let node = &data.products.unwrap().nodes[0];
        assert_eq!(node.database_id, 7);
        assert!(node.price.is_none());
    }
}
