//! Caller identity extractor.
//!
//! Authentication is terminated upstream; the gateway forwards the
//! verified user id in the `X-User-Id` header. Handlers that need an
//! identity take a [`Caller`] argument and reject anonymous requests
//! with 401 before any business logic runs.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "X-User-Id";

/// The authenticated user on whose behalf the request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Uuid);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".into()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized("Invalid X-User-Id header".into()))?;
        let user_id = Uuid::parse_str(value)
            .map_err(|_| ApiError::Unauthorized("X-User-Id is not a valid UUID".into()))?;
        Ok(Caller(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = request.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_header() {
        let user_id = Uuid::new_v4();
        let request = Request::builder()
            .header(USER_ID_HEADER, user_id.to_string())
            .body(())
            .unwrap();
        assert_eq!(extract(request).await.unwrap(), Caller(user_id));
    }

    #[tokio::test]
    async fn test_missing_header() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            ApiError::Unauthorized(_)
        ));
    }

    #[tokio::test]
    async fn test_malformed_uuid() {
        let request = Request::builder()
            .header(USER_ID_HEADER, "not-a-uuid")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await.unwrap_err(),
            ApiError::Unauthorized(_)
        ));
    }
}
