//! Request ID middleware for request tracing and correlation.
//!
//! Same contract as the storefront: an upstream `x-request-id` is kept when
//! it looks sane, otherwise a UUID v4 is generated. The ID is recorded on the
//! span and Sentry scope and echoed back.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted as-is.
const MAX_REQUEST_ID_LENGTH: usize = 128;

/// The request ID for a request, adopting a sane upstream value.
fn resolve_request_id(upstream: Option<&str>) -> String {
    upstream
        .map(str::trim)
        .filter(|id| {
            !id.is_empty()
                && id.len() <= MAX_REQUEST_ID_LENGTH
                && id
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        })
        .map_or_else(|| Uuid::new_v4().to_string(), String::from)
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = resolve_request_id(
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok()),
    );

    Span::current().record("request_id", request_id.as_str());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_id_adopted() {
        assert_eq!(resolve_request_id(Some("fly-91c2_admin")), "fly-91c2_admin");
    }

    #[test]
    fn test_bad_upstream_id_replaced() {
        let id = resolve_request_id(Some("<script>"));
        assert!(Uuid::parse_str(&id).is_ok());
        let id = resolve_request_id(Some(&"a".repeat(200)));
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_missing_id_generated() {
        assert!(Uuid::parse_str(&resolve_request_id(None)).is_ok());
    }
}
