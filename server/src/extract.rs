//! Request extractors with the service's own rejection rules.
//!
//! `TodoId` runs before any body extractor, so a malformed path is a 404
//! even when the body or content type is also wrong. `JsonBody` accepts only
//! an exact `application/json` content type, decodes a bare `null` body as
//! the payload's default and reports decode failures as 400 with the
//! decoder's message.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

const JSON: &str = "application/json";

/// The single path segment after `/todos/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoId(pub String);

impl<S> FromRequestParts<S> for TodoId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(rest) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        single_segment(&rest)
            .map(|id| TodoId(id.to_string()))
            .ok_or(ApiError::NotFound)
    }
}

fn single_segment(rest: &str) -> Option<&str> {
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    (!rest.is_empty() && !rest.contains('/')).then_some(rest)
}

/// A JSON request body that insists on `content-type: application/json`.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .unwrap_or_default();
        if content_type != JSON {
            return Err(ApiError::UnsupportedMediaType(content_type));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Internal(rejection.body_text()))?;
        serde_json::from_slice::<Option<T>>(&bytes)
            .map(|body| JsonBody(body.unwrap_or_default()))
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }
}
