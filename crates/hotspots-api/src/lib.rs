//! JSON REST API for HotSpots.
//!
//! Exposes an axum [`Router`] backed by a [`Catalog`] over any store that
//! implements both [`SpotStore`] and [`BlobStore`]. Bearer credentials are
//! verified by the injected [`Authenticator`]; TLS and CORS are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", hotspots_api::api_router(catalog, authenticator, max_image_bytes))
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod factors;
pub mod images;
pub mod reviews;
pub mod spots;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  middleware,
  routing::{get, post, put},
};
use hotspots_core::{
  catalog::{Catalog, parse_id},
  identity::Authenticator,
  store::{BlobStore, SpotStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::ApiError;

/// Response body for operations that yield an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdBody {
  pub id: Uuid,
}

/// Malformed ids answer exactly like missing spots.
pub(crate) fn spot_id(raw: &str) -> Result<Uuid, ApiError> {
  parse_id(raw).ok_or_else(|| ApiError::NotFound(format!("spot not found: {raw}")))
}

/// Build a fully-materialised API router for `catalog`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(
  catalog: Arc<Catalog<S>>,
  authenticator: Arc<dyn Authenticator>,
  max_image_bytes: usize,
) -> Router<()>
where
  S: SpotStore + BlobStore + 'static,
{
  Router::new()
    // Spots
    .route("/spots", get(spots::list::<S>).post(spots::create::<S>))
    .route(
      "/spots/{id}",
      get(spots::get_one::<S>)
        .put(spots::update::<S>)
        .delete(spots::delete::<S>),
    )
    .route("/spots/{id}/factors", post(factors::submit::<S>))
    .route(
      "/spots/{id}/image",
      put(images::upload::<S>).layer(DefaultBodyLimit::max(max_image_bytes)),
    )
    .route("/spots/{id}/reviews", get(reviews::list_for_spot::<S>))
    // Reviews
    .route("/reviews", post(reviews::create::<S>))
    .route(
      "/reviews/{id}",
      get(reviews::get_one::<S>)
        .put(reviews::update::<S>)
        .delete(reviews::delete::<S>),
    )
    // Images
    .route("/images/{id}", get(images::fetch::<S>))
    .with_state(catalog)
    .layer(middleware::from_fn_with_state(authenticator, auth::authenticate))
}
