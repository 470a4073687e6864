//! Bearer-credential middleware and the identity extractors built on it.
//!
//! [`authenticate`] runs on every request. It never rejects on its own: it
//! records the outcome as a [`Credential`] in the request extensions, and the
//! [`Caller`] and [`Admin`] extractors decide whether a handler may proceed.

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::Response,
};
use hotspots_core::identity::{Authenticator, Identity};

use crate::error::ApiError;

/// Outcome of credential verification for one request.
#[derive(Debug, Clone)]
pub enum Credential {
  Missing,
  Verified(Identity),
  Rejected(String),
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, String> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };
  let value = value
    .to_str()
    .map_err(|_| "authorization header is not valid text".to_string())?;
  let (scheme, token) = value
    .split_once(' ')
    .ok_or_else(|| "authorization header must be `Bearer <token>`".to_string())?;
  if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
    return Err("authorization header must be `Bearer <token>`".into());
  }
  Ok(Some(token.trim()))
}

fn credential_for(headers: &HeaderMap, authenticator: &dyn Authenticator) -> Credential {
  match bearer_token(headers) {
    Ok(None) => Credential::Missing,
    Ok(Some(token)) => match authenticator.verify(token) {
      Ok(identity) => Credential::Verified(identity),
      Err(e) => {
        tracing::warn!(error = %e, "bearer token rejected");
        Credential::Rejected(e.to_string())
      }
    },
    Err(reason) => {
      tracing::warn!(%reason, "malformed authorization header");
      Credential::Rejected(reason)
    }
  }
}

/// Middleware: verify the bearer token, if any, and stash the outcome.
pub async fn authenticate(
  State(authenticator): State<Arc<dyn Authenticator>>,
  mut req: Request,
  next: Next,
) -> Response {
  let credential = credential_for(req.headers(), authenticator.as_ref());
  req.extensions_mut().insert(credential);
  next.run(req).await
}

/// A verified caller. Rejects with 401 when the request carries no valid
/// credential.
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    match parts.extensions.get::<Credential>() {
      Some(Credential::Verified(identity)) => Ok(Caller(identity.clone())),
      Some(Credential::Rejected(reason)) => Err(ApiError::Unauthorized(reason.clone())),
      Some(Credential::Missing) | None => {
        Err(ApiError::Unauthorized("missing bearer token".into()))
      }
    }
  }
}

/// A verified caller holding the admin permission. 401 without a valid
/// credential, 403 without the permission.
#[derive(Debug, Clone)]
pub struct Admin(pub Identity);

impl<S> FromRequestParts<S> for Admin
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let Caller(identity) = Caller::from_request_parts(parts, state).await?;
    if !identity.is_admin() {
      tracing::debug!(user = %identity.user_id, "admin permission required");
      return Err(ApiError::Forbidden("admin permission required".into()));
    }
    Ok(Admin(identity))
  }
}
