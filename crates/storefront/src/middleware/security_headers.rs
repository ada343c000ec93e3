//! Security headers middleware for XSS, clickjacking, and isolation protection.
//!
//! Adds restrictive security headers to all responses. The CSP allows images
//! from the CMS origin (product and post media are served from WordPress) and
//! inline scripts carrying the per-request nonce.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CACHE_CONTROL, CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::CspNonce;
use crate::state::AppState;

/// Google Analytics hosts, allowed only when a measurement ID is configured.
const GA_SCRIPT_SRC: &str = "https://www.googletagmanager.com";
const GA_CONNECT_SRC: &str = "https://*.google-analytics.com https://*.googletagmanager.com";

/// Build the Content-Security-Policy value.
#[must_use]
pub fn content_security_policy(cms_origin: &str, nonce: &str, analytics: bool) -> String {
    let (script_extra, connect_extra) = if analytics {
        (format!(" {GA_SCRIPT_SRC}"), format!(" {GA_CONNECT_SRC}"))
    } else {
        (String::new(), String::new())
    };

    format!(
        "default-src 'none'; \
         script-src 'self' 'nonce-{nonce}'{script_extra}; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data: {cms_origin}; \
         connect-src 'self'{connect_extra}; \
         frame-src 'none'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self' {cms_origin}; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` - See [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cache-Control: no-store, max-age=0` - Unless the handler set one
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
/// - `Cross-Origin-Embedder-Policy: credentialless` - CMS media carries no CORP header
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .map(|n| n.value().to_string())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    let csp = content_security_policy(
        &state.config().cms.origin(),
        &nonce,
        state.config().analytics.ga4_measurement_id.is_some(),
    );
    if let Ok(value) = HeaderValue::from_str(&csp) {
        headers.insert(CONTENT_SECURITY_POLICY, value);
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             payment=(), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    if !headers.contains_key(CACHE_CONTROL) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store, max-age=0"));
    }

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("credentialless"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_cms_media_and_nonce() {
        let csp = content_security_policy("https://cms.example.com", "abc123", false);
        assert!(csp.contains("img-src 'self' data: https://cms.example.com;"));
        assert!(csp.contains("script-src 'self' 'nonce-abc123';"));
        assert!(!csp.contains("googletagmanager"));
    }

    #[test]
    fn test_csp_allows_analytics_when_configured() {
        let csp = content_security_policy("https://cms.example.com", "n", true);
        assert!(csp.contains("script-src 'self' 'nonce-n' https://www.googletagmanager.com;"));
        assert!(csp.contains("connect-src 'self' https://*.google-analytics.com"));
    }
}
