//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use super::views::{CategoryView, PageContext, PostView, ProductCard};
use crate::cms::PostQuery;
use crate::filters;
use crate::state::AppState;

/// Number of featured products on the home page.
const FEATURED_PRODUCTS: i64 = 8;

/// Number of top-level categories shown as tiles.
const CATEGORY_TILES: usize = 6;

/// Number of latest posts shown.
const LATEST_POSTS: u32 = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub featured: Vec<ProductCard>,
    pub categories: Vec<CategoryView>,
    pub posts: Vec<PostView>,
}

/// Display the home page.
///
/// Each section is fetched independently and renders empty if its upstream
/// call fails.
#[instrument(skip(state, ctx))]
pub async fn home(State(state): State<AppState>, ctx: PageContext) -> HomeTemplate {
    let cms = state.cms();
    let latest = PostQuery {
        per_page: LATEST_POSTS,
        ..PostQuery::default()
    };
    let (featured, categories, posts) = tokio::join!(
        cms.graphql().featured_products(FEATURED_PRODUCTS),
        cms.rest().product_categories(),
        cms.rest().posts(&latest),
    );

    let featured = featured.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to fetch featured products");
            Vec::new()
        },
        |products| products.iter().map(ProductCard::from).collect(),
    );

    let categories = categories.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to fetch product categories");
            Vec::new()
        },
        |categories| {
            categories
                .iter()
                .filter(|c| c.parent.is_none())
                .take(CATEGORY_TILES)
                .map(CategoryView::from)
                .collect()
        },
    );

    let posts = posts.map_or_else(
        |e| {
            tracing::error!(error = %e, "Failed to fetch latest posts");
            Vec::new()
        },
        |connection| connection.posts.iter().map(PostView::from).collect(),
    );

    HomeTemplate {
        ctx,
        featured,
        categories,
        posts,
    }
}
