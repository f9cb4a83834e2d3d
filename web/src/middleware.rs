//! Axum middleware for request tracking.
//!
//! Every request gets a correlation identity: taken from the
//! `X-Correlation-ID` header when the client sends one, generated
//! otherwise. The identity is stored in request extensions for handlers
//! (the create path seeds its request span from it, so the same token
//! later travels with the published envelope), wrapped around the request
//! as a tracing span, and echoed back in the response header.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Correlation-ID middleware, applied with [`axum::middleware::from_fn`].
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware::from_fn};
/// use todo_pipeline_web::middleware::track_correlation_id;
///
/// let app = Router::new()
///     .route("/todo", post(create_todo))
///     .layer(from_fn(track_correlation_id));
/// ```
pub async fn track_correlation_id(mut req: Request, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    // Handlers pick the identity up from request extensions.
    req.extensions_mut().insert(correlation_id);

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    // Echo the identity back so clients can quote it in bug reports.
    if let Ok(header_value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(from_fn(track_correlation_id))
    }

    async fn response_correlation_id(request: Request<Body>) -> String {
        let response = app().oneshot(request).await.unwrap();
        response
            .headers()
            .get(CORRELATION_ID_HEADER)
            .expect("correlation ID header should be present")
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn generates_an_id_when_the_client_sends_none() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let id = response_correlation_id(request).await;
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn preserves_the_client_supplied_id() {
        let request_uuid = Uuid::new_v4();
        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, request_uuid.to_string())
            .body(Body::empty())
            .unwrap();

        let id = response_correlation_id(request).await;
        assert_eq!(id, request_uuid.to_string());
    }

    #[tokio::test]
    async fn replaces_an_unparseable_id() {
        let request = Request::builder()
            .uri("/test")
            .header(CORRELATION_ID_HEADER, "not-a-uuid")
            .body(Body::empty())
            .unwrap();

        let id = response_correlation_id(request).await;
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, "not-a-uuid");
    }
}
