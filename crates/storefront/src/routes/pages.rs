//! Catch-all route: resolves any other path against the CMS.
//!
//! The path's last segment is tried as a product category, blog category,
//! product, and post, in that order; the full path is then tried as a
//! WordPress page URI.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fernleaf_core::SlugPath;
use tower_sessions::Session;
use tracing::instrument;

use super::blog::{self, CursorQuery};
use super::views::{PageContext, PageView};
use super::{products, shop};
use crate::error::{AppError, Result};
use crate::filters;
use crate::resolver::{self, Resolved};
use crate::state::AppState;

/// WordPress page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/page.html")]
pub struct PageTemplate {
    pub ctx: PageContext,
    pub page: PageView,
}

/// Error page. Rendered without a page context so it works even when the
/// request never reached a handler.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub code: u16,
    pub title: &'static str,
    pub message: String,
}

impl ErrorTemplate {
    #[must_use]
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            code: status.as_u16(),
            title: status.canonical_reason().unwrap_or("Error"),
            message,
        }
    }
}

/// Resolve a path to whatever the CMS has at it.
///
/// # Errors
///
/// Returns 404 when nothing matches and 502 when nothing matched because a
/// lookup failed.
#[instrument(skip(state, ctx, session, cursor, raw))]
pub async fn resolve(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Path(path): Path<String>,
    Query(cursor): Query<CursorQuery>,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let path = SlugPath::parse(&path).map_err(|_| AppError::NotFound(path.clone()))?;
    let after = cursor.after.filter(|a| !a.is_empty());
    let paged = after.is_some();

    let resolved = resolver::resolve(state.cms(), &path, after).await?;

    Ok(match resolved {
        Resolved::ProductCategory(category) => {
            shop::render_category(&state, ctx, &category, raw.as_deref())
                .await?
                .into_response()
        }
        Resolved::BlogCategory(found) => {
            let (category, connection) = *found;
            blog::render_category(ctx, category, &connection, paged).into_response()
        }
        Resolved::Product(product) => products::render(&state, ctx, &session, &product)
            .await
            .into_response(),
        Resolved::Post(post) => blog::render_post(ctx, &post).into_response(),
        Resolved::Page(page) => PageTemplate {
            ctx,
            page: PageView::from(page.as_ref()),
        }
        .into_response(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_template_renders_status() {
        let html = ErrorTemplate::new(StatusCode::NOT_FOUND, "No such page".to_string())
            .render()
            .unwrap_or_default();
        assert!(html.contains("404"));
        assert!(html.contains("Not Found"));
        assert!(html.contains("No such page"));
    }
}
