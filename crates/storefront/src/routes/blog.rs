//! Blog route handlers.
//!
//! The post listing pages by number over WordPress REST; blog categories page
//! by cursor over WPGraphQL. Single posts resolve through the catch-all route.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use fernleaf_core::Slug;
use serde::Deserialize;
use tracing::instrument;

use super::views::{LinkView, PageContext, PostView};
use crate::cms::{BlogCategory, Post, PostConnection, PostQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::resolver::BLOG_CATEGORY_PAGE_SIZE;
use crate::state::AppState;

/// Posts per blog index page.
pub const POSTS_PER_PAGE: u32 = 9;

/// `?page=` for the blog index.
#[derive(Debug, Deserialize)]
pub struct BlogIndexQuery {
    pub page: Option<u32>,
}

/// `?after=` cursor for blog categories.
#[derive(Debug, Default, Deserialize)]
pub struct CursorQuery {
    pub after: Option<String>,
}

/// Blog index page template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub ctx: PageContext,
    pub posts: Vec<PostView>,
    pub page: u32,
    pub total_pages: u32,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// Blog category listing template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/category.html")]
pub struct BlogCategoryTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub description: String,
    pub posts: Vec<PostView>,
    /// Link back to the first page when paging by cursor.
    pub first_url: Option<String>,
    pub next_url: Option<String>,
}

/// Blog post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "blog/show.html")]
pub struct BlogShowTemplate {
    pub ctx: PageContext,
    pub post: PostView,
    pub breadcrumbs: Vec<LinkView>,
}

/// Display the blog index.
///
/// # Errors
///
/// Returns 502 if the posts cannot be fetched.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    ctx: PageContext,
    Query(query): Query<BlogIndexQuery>,
) -> Result<BlogIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    let connection = state
        .cms()
        .rest()
        .posts(&PostQuery {
            page,
            per_page: POSTS_PER_PAGE,
            ..PostQuery::default()
        })
        .await?;

    let total_pages = connection.total_pages.max(1);
    Ok(BlogIndexTemplate {
        ctx,
        posts: connection.posts.iter().map(PostView::from).collect(),
        page,
        total_pages,
        prev_url: (page > 1).then(|| {
            if page == 2 {
                "/blog".to_string()
            } else {
                format!("/blog?page={}", page - 1)
            }
        }),
        next_url: (page < total_pages).then(|| format!("/blog?page={}", page + 1)),
    })
}

/// Display a blog category.
///
/// # Errors
///
/// Returns 404 if the category does not exist.
#[instrument(skip(state, ctx))]
pub async fn category(
    State(state): State<AppState>,
    ctx: PageContext,
    Path(slug): Path<String>,
    Query(cursor): Query<CursorQuery>,
) -> Result<BlogCategoryTemplate> {
    let slug = Slug::parse(&slug).map_err(|_| AppError::NotFound(slug.clone()))?;
    let after = cursor.after.filter(|a| !a.is_empty());
    let paged = after.is_some();

    let (category, connection) = state
        .cms()
        .graphql()
        .blog_category_by_slug(slug.as_str(), BLOG_CATEGORY_PAGE_SIZE, after)
        .await
        .map_err(|e| AppError::from_lookup(e, "blog category"))?;

    Ok(render_category(ctx, category, &connection, paged))
}

/// Render a blog category page; also used by the catch-all resolver.
#[must_use]
pub fn render_category(
    ctx: PageContext,
    category: BlogCategory,
    connection: &PostConnection,
    paged: bool,
) -> BlogCategoryTemplate {
    let base = ctx.path.clone();
    let next_url = connection
        .end_cursor
        .as_ref()
        .filter(|_| connection.has_next_page)
        .map(|cursor| format!("{base}?after={}", urlencoding::encode(cursor)));

    BlogCategoryTemplate {
        ctx,
        name: category.name,
        description: category.description,
        posts: connection.posts.iter().map(PostView::from).collect(),
        first_url: paged.then_some(base),
        next_url,
    }
}

/// Render a single post.
#[must_use]
pub fn render_post(ctx: PageContext, post: &Post) -> BlogShowTemplate {
    let view = PostView::from(post);
    let mut breadcrumbs = vec![
        LinkView {
            name: "Home".to_string(),
            url: "/".to_string(),
        },
        LinkView {
            name: "Blog".to_string(),
            url: "/blog".to_string(),
        },
    ];
    breadcrumbs.extend(view.categories.first().cloned());

    BlogShowTemplate {
        ctx,
        post: view,
        breadcrumbs,
    }
}
