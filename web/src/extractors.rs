//! Custom Axum extractors.
//!
//! # Examples
//!
//! ```ignore
//! use todo_pipeline_web::extractors::CorrelationId;
//!
//! async fn handler(CorrelationId(id): CorrelationId) -> String {
//!     format!("Request ID: {id}")
//! }
//! ```

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Prefers the identity stored in request extensions by the
/// [`track_correlation_id`](crate::middleware::track_correlation_id)
/// middleware, so the handler, the span, and the response header all
/// agree. Without the middleware it falls back to the `X-Correlation-ID`
/// header, or a fresh UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts.extensions.get::<Uuid>().copied().unwrap_or_else(|| {
            parts
                .headers
                .get(crate::middleware::CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4)
        });

        Ok(Self(correlation_id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    #[tokio::test]
    async fn extension_takes_precedence_over_header() {
        let from_middleware = Uuid::new_v4();
        let from_header = Uuid::new_v4();

        let mut request = Request::builder()
            .uri("/todo")
            .header("X-Correlation-ID", from_header.to_string())
            .body(())
            .unwrap();
        request.extensions_mut().insert(from_middleware);
        let (mut parts, ()) = request.into_parts();

        let CorrelationId(id) = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(id, from_middleware);
    }

    #[tokio::test]
    async fn header_used_without_middleware() {
        let from_header = Uuid::new_v4();
        let request = Request::builder()
            .uri("/todo")
            .header("X-Correlation-ID", from_header.to_string())
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();

        let CorrelationId(id) = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(id, from_header);
    }
}
