use axum::{
    Router,
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::warn;

fn security_headers() -> [(HeaderName, HeaderValue); 6] {
    [
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::X_XSS_PROTECTION, HeaderValue::from_static("1; mode=block")),
        (
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer-when-downgrade"),
        ),
        (
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("geolocation=(self)"),
        ),
    ]
}

/// Adds the security response headers and the user-enumeration guard.
pub fn harden(router: Router) -> Router {
    let router = router.layer(middleware::from_fn(block_author_enumeration));

    security_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}

async fn block_author_enumeration(request: Request, next: Next) -> Response {
    let enumerating = request
        .uri()
        .query()
        .map(|q| q.split('&').any(|pair| pair.split('=').next() == Some("author")))
        .unwrap_or(false);

    if enumerating {
        warn!(uri = %request.uri(), "Blocked author enumeration attempt");
        return (StatusCode::FORBIDDEN, "User enumeration is not allowed.").into_response();
    }

    next.run(request).await
}
