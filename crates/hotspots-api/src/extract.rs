//! Request extractors with API-shaped rejections.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// [`axum::Json`] for request bodies. A body that is not JSON, or does not
/// fit `T`, is rejected as a 400 with the usual `{"error": …}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);
