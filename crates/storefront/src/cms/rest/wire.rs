//! JSON shapes returned by the WooCommerce v3 and WordPress v2 REST APIs.
//!
//! Only the fields the storefront reads are declared. WooCommerce has changed
//! the JSON type of a few numeric fields across releases, so those accept
//! either a number or a numeric string.

use serde::{Deserialize, Deserializer};

/// WordPress error body (`{"code","message","data":{"status"}}`).
#[derive(Debug, Deserialize)]
pub struct WpError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestImage {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestCategoryRef {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestAttribute {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub variation: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestProduct {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub images: Vec<RestImage>,
    #[serde(default)]
    pub categories: Vec<RestCategoryRef>,
    #[serde(default)]
    pub attributes: Vec<RestAttribute>,
    /// Variation IDs (variable products only).
    #[serde(default)]
    pub variations: Vec<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub average_rating: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub rating_count: i64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub total_sales: i64,
    #[serde(default)]
    pub date_created: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestVariationAttribute {
    pub name: String,
    pub option: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestVariation {
    pub id: i64,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub attributes: Vec<RestVariationAttribute>,
    #[serde(default)]
    pub image: Option<RestImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestProductCategory {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub image: Option<RestImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestAuthor {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestMedia {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub alt_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestTerm {
    pub taxonomy: String,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestEmbedded {
    #[serde(default)]
    pub author: Vec<RestAuthor>,
    #[serde(default, rename = "wp:featuredmedia")]
    pub featured_media: Vec<RestMedia>,
    /// One list per taxonomy (categories, tags).
    #[serde(default, rename = "wp:term")]
    pub terms: Vec<Vec<RestTerm>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestPost {
    pub id: i64,
    pub slug: String,
    pub title: Rendered,
    #[serde(default)]
    pub excerpt: Option<Rendered>,
    #[serde(default)]
    pub content: Option<Rendered>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<RestEmbedded>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestCoupon {
    pub code: String,
    pub discount_type: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub date_expires: Option<String>,
    #[serde(default)]
    pub usage_count: i64,
    #[serde(default)]
    pub usage_limit: Option<i64>,
    #[serde(default)]
    pub individual_use: bool,
    #[serde(default)]
    pub minimum_amount: String,
    #[serde(default)]
    pub maximum_amount: String,
    #[serde(default)]
    pub free_shipping: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestOrder {
    pub id: i64,
    #[serde(default)]
    pub order_key: String,
    pub status: fernleaf_core::OrderStatus,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(NumberOrString::Int(i)) => i,
        #[allow(clippy::cast_possible_truncation)] // Counts are whole numbers
        Some(NumberOrString::Float(f)) => f as i64,
        Some(NumberOrString::Str(s)) => s.trim().parse().unwrap_or(0),
        None => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Option::<NumberOrString>::deserialize(deserializer)? {
        #[allow(clippy::cast_precision_loss)]
        Some(NumberOrString::Int(i)) => i as f64,
        Some(NumberOrString::Float(f)) => f,
        Some(NumberOrString::Str(s)) => s.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_numbers() {
        let json = r#"{"id":1,"slug":"a","name":"A","average_rating":"4.50","rating_count":3,"total_sales":"12"}"#;
        let product: RestProduct = serde_json::from_str(json).unwrap();
        assert!((product.average_rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(product.rating_count, 3);
        assert_eq!(product.total_sales, 12);
    }

    #[test]
    fn test_embedded_terms() {
        let json = r#"{
            "id": 5,
            "slug": "hello",
            "title": {"rendered": "Hello"},
            "_embedded": {
                "author": [{"name": "Sam"}],
                "wp:term": [[{"taxonomy": "category", "slug": "news", "name": "News"}], []]
            }
        }"#;
        let post: RestPost = serde_json::from_str(json).unwrap();
        let embedded = post.embedded.unwrap();
        assert_eq!(embedded.author[0].name, "Sam");
        assert_eq!(embedded.terms[0][0].taxonomy, "category");
        assert!(embedded.featured_media.is_empty());
    }
}
