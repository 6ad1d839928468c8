//! Request inspection helpers.
//!
//! # Responsibilities
//! - Name the request ID header
//! - Extract routing-relevant information (host)
//! - Build the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - HTTP/2 requests may carry the host only in the URI authority

use axum::http::{header, HeaderName, Request};
use tracing::Span;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Host the client addressed: the `Host` header, else the URI authority.
pub fn request_host<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
}

/// Request ID set by the request ID layer, or `"unknown"`.
pub fn request_id<B>(req: &Request<B>) -> &str {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span wrapping every log line emitted while handling `req`.
pub fn make_request_span<B>(req: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(req),
        method = %req.method(),
        host = request_host(req).unwrap_or(""),
        path = %req.uri().path(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_request_host_prefers_header() {
        let req = Request::builder()
            .uri("http://authority.example.com/")
            .header("Host", "api.example.com")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("api.example.com"));
    }

    #[test]
    fn test_request_host_from_authority() {
        let req = Request::builder()
            .uri("http://api.example.com:8080/view/")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), Some("api.example.com:8080"));

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(request_host(&req), None);
    }

    #[test]
    fn test_request_id() {
        let req = Request::builder()
            .header("x-request-id", "abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&req), "abc");
    }
}
