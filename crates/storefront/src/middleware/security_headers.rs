//! Security headers middleware.
//!
//! Everything is locked down except the third parties the shop needs: Stripe
//! (card element iframe and API), Google tag (analytics), and the backend
//! origin that serves product images.

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};

use super::csp::CspNonce;
use crate::state::AppState;

/// Origin (`scheme://host[:port]`) of a URL, or `None` when unparsable.
fn origin_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()
        .map(|u| u.origin().ascii_serialization())
        .filter(|origin| origin != "null")
}

/// Build the CSP for one response.
///
/// ```text
/// default-src 'none';
/// script-src 'self' 'nonce-…' https://js.stripe.com https://www.googletagmanager.com;
/// style-src 'self';
/// img-src 'self' data: <backend> https://*.google-analytics.com https://*.googletagmanager.com;
/// connect-src 'self' https://api.stripe.com https://*.google-analytics.com …;
/// frame-src https://js.stripe.com https://hooks.stripe.com;
/// …
/// ```
#[must_use]
pub fn content_security_policy(nonce: &CspNonce, image_origin: Option<&str>) -> String {
    let images = image_origin.map(|o| format!(" {o}")).unwrap_or_default();
    format!(
        "default-src 'none'; \
         script-src 'self' {nonce} https://js.stripe.com https://www.googletagmanager.com; \
         style-src 'self'; \
         font-src 'self'; \
         img-src 'self' data:{images} https://*.google-analytics.com https://*.googletagmanager.com; \
         connect-src 'self' https://api.stripe.com https://*.google-analytics.com https://*.analytics.google.com https://*.googletagmanager.com; \
         frame-src https://js.stripe.com https://hooks.stripe.com; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'",
        nonce = nonce.source(),
    )
}

/// Add security headers to every response.
///
/// - `X-Frame-Options: DENY`
/// - `X-Content-Type-Options: nosniff`
/// - `Referrer-Policy: strict-origin-when-cross-origin` (Stripe needs the origin)
/// - `Content-Security-Policy` with the request's nonce
/// - `Permissions-Policy` denying everything but `payment` for Stripe
/// - `Cross-Origin-Opener-Policy: same-origin-allow-popups` (3-D Secure)
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let nonce = request
        .extensions()
        .get::<CspNonce>()
        .cloned()
        .unwrap_or_else(CspNonce::generate);

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    let image_origin = origin_of(state.backend().base_url());
    match HeaderValue::from_str(&content_security_policy(&nonce, image_origin.as_deref())) {
        Ok(csp) => {
            headers.insert(CONTENT_SECURITY_POLICY, csp);
        }
        Err(e) => tracing::error!("Invalid CSP header value: {e}"),
    }

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "accelerometer=(), \
             autoplay=(), \
             browsing-topics=(), \
             camera=(), \
             display-capture=(), \
             geolocation=(), \
             gyroscope=(), \
             magnetometer=(), \
             microphone=(), \
             midi=(), \
             payment=(self \"https://js.stripe.com\"), \
             usb=(), \
             xr-spatial-tracking=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin-allow-popups"),
    );

    headers.insert(
        HeaderName::from_static("x-dns-prefetch-control"),
        HeaderValue::from_static("off"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csp_contains_nonce_and_image_origin() {
        let nonce = CspNonce("abc=".to_string());
        let csp = content_security_policy(&nonce, Some("https://api.yakimoto.se"));
        assert!(csp.contains("script-src 'self' 'nonce-abc=' https://js.stripe.com"));
        assert!(csp.contains("img-src 'self' data: https://api.yakimoto.se "));
        assert!(csp.contains("frame-src https://js.stripe.com"));
        assert!(HeaderValue::from_str(&csp).is_ok());
    }

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://api.yakimoto.se/v1").as_deref(),
            Some("https://api.yakimoto.se")
        );
        assert_eq!(
            origin_of("http://localhost:8000").as_deref(),
            Some("http://localhost:8000")
        );
        assert_eq!(origin_of("not a url"), None);
    }
}
