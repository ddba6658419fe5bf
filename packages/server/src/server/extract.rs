//! Request extractors.

use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::server::error::ApiError;

/// JSON request body decoded regardless of the `Content-Type` header.
///
/// The route's body limit still applies. Both read and decode failures
/// render as `invalid_request` errors.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await?;
        let value = serde_json::from_slice(&body)?;
        Ok(Self(value))
    }
}
