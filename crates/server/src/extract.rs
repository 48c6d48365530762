use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use services::services::validation::{Validate, parse_payload};

use crate::error::ApiError;

/// JSON body parsed and validated field by field.
///
/// Rejects with [`ApiError::Validation`] so clients get every offending field
/// at once instead of the first serde error.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        Ok(Payload(parse_payload::<T>(value)?))
    }
}

/// Path parameters whose rejection uses the JSON error envelope.
pub struct PathIds<T>(pub T);

impl<S, T> FromRequestParts<S> for PathIds<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(PathIds(value))
    }
}
