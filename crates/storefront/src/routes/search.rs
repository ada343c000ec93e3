//! Search route handler.
//!
//! Products and posts are searched upstream (WooCommerce and WordPress full
//! text search); the storefront keeps no index of its own.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::instrument;

use super::views::{PageContext, PostView, ProductCard};
use crate::cms::{PostQuery, ProductQuery};
use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Maximum posts listed in search results.
const POST_RESULTS: u32 = 6;

/// Search page query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Search page template.
#[derive(Template, WebTemplate)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub ctx: PageContext,
    pub query: String,
    pub products: Vec<ProductCard>,
    pub posts: Vec<PostView>,
    pub searched: bool,
}

/// Display search results.
///
/// A blank query renders the empty search page without calling the CMS.
///
/// # Errors
///
/// Returns 502 if the product search fails.
#[instrument(skip(state, ctx))]
pub async fn search(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<SearchQuery>,
) -> Result<SearchTemplate> {
    let q = query.q.trim().to_string();
    if q.is_empty() {
        return Ok(SearchTemplate {
            ctx,
            query: q,
            products: Vec::new(),
            posts: Vec::new(),
            searched: false,
        });
    }

    let rest = state.cms().rest();
    let product_query = ProductQuery {
        search: Some(q.clone()),
        ..ProductQuery::default()
    };
    let post_query = PostQuery {
        search: Some(q.clone()),
        per_page: POST_RESULTS,
        ..PostQuery::default()
    };
    let (products, posts) = tokio::join!(rest.products(&product_query), rest.posts(&post_query));

    let posts = posts.map_or_else(
        |e| {
            tracing::warn!(error = %e, "Post search failed");
            Vec::new()
        },
        |connection| connection.posts.iter().map(PostView::from).collect(),
    );

    Ok(SearchTemplate {
        ctx,
        query: q,
        products: products?.iter().map(ProductCard::from).collect(),
        posts,
        searched: true,
    })
}
