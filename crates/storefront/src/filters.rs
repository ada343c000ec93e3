//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").ok());
static SPACE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s+").ok());

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for storefront.js.
///
/// Usage in templates: `{{ ""|js_hash }}`
#[askama::filter_fn]
pub fn js_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("JS_HASH"))
}

/// Plain text from CMS HTML, for excerpts and meta descriptions.
///
/// Usage in templates: `{{ post.excerpt_html|strip_html }}`
#[askama::filter_fn]
pub fn strip_html(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(html_to_text(&value.to_string()))
}

/// Truncate to `max` characters on a word boundary, appending an ellipsis.
///
/// Usage in templates: `{{ text|truncate_words(160) }}`
#[askama::filter_fn]
pub fn truncate_words(
    value: impl Display,
    _env: &dyn askama::Values,
    max: usize,
) -> askama::Result<String> {
    Ok(truncate(&value.to_string(), max))
}

pub(crate) fn html_to_text(html: &str) -> String {
    let without_tags = TAG_RE
        .as_ref()
        .map_or_else(|| html.to_string(), |re| re.replace_all(html, " ").into_owned());
    let decoded = crate::cms::conversions::decode_entities(&without_tags);
    SPACE_RE
        .as_ref()
        .map_or_else(|| decoded.clone(), |re| re.replace_all(&decoded, " ").into_owned())
        .trim()
        .to_string()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    let trimmed = cut
        .rsplit_once(' ')
        .map_or(cut.as_str(), |(head, _)| head)
        .trim_end_matches([',', '.', ';', ':']);
    format!("{trimmed}…")
}
