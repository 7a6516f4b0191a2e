//! Security headers middleware.
//!
//! The admin renders no inline scripts and embeds no third parties; the only
//! foreign origin is the backend serving product images.

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

use crate::state::AppState;

/// Origin (`scheme://host[:port]`) of a URL, or `None` when unparsable.
fn origin_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .filter(|origin| origin != "null")
}

/// Build the admin CSP.
#[must_use]
pub fn content_security_policy(image_origin: Option<&str>) -> String {
    let images = image_origin.map(|o| format!(" {o}")).unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'self'; \
         style-src 'self'; \
         img-src 'self' data: blob:{images}; \
         connect-src 'self'; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    )
}

/// Add security headers to every response.
///
/// Admin pages are never cached: they show live stock and are only valid for
/// the logged-in session.
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    let image_origin = origin_of(state.backend().base_url());
    match HeaderValue::from_str(&content_security_policy(image_origin.as_deref())) {
        Ok(csp) => {
            headers.insert(CONTENT_SECURITY_POLICY, csp);
        }
        Err(e) => tracing::error!("Invalid CSP header value: {e}"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), geolocation=(), microphone=(), payment=(), usb=()",
        ),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_allows_backend_images_only() {
        let csp = content_security_policy(Some("https://api.yakimoto.se"));
        assert!(csp.contains("img-src 'self' data: blob: https://api.yakimoto.se;"));
        assert!(csp.contains("script-src 'self';"));
        assert!(!csp.contains("unsafe-inline"));
        assert!(HeaderValue::from_str(&csp).is_ok());
    }

    #[test]
    fn test_origin_of_drops_path() {
        assert_eq!(
            origin_of("http://localhost:8000/api").as_deref(),
            Some("http://localhost:8000")
        );
    }
}
