//! Handlers for review endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/spots/{id}/reviews` | Newest first; 404 for an unknown spot |
//! | `POST`   | `/reviews` | Body: `{"spot_id","title","text","rating"}` |
//! | `GET`    | `/reviews/{id}` | |
//! | `PUT`    | `/reviews/{id}` | Owner or admin. Partial body |
//! | `DELETE` | `/reviews/{id}` | Owner or admin |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hotspots_core::{
  catalog::{Catalog, parse_id},
  review::{NewReview, Review, ReviewPatch},
  store::{BlobStore, SpotStore},
};
use uuid::Uuid;

use crate::{IdBody, auth::Caller, error::ApiError, extract::JsonBody, spot_id};

fn review_id(raw: &str) -> Result<Uuid, ApiError> {
  parse_id(raw).ok_or_else(|| ApiError::NotFound(format!("review not found: {raw}")))
}

/// `GET /spots/{id}/reviews`
pub async fn list_for_spot<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Path(raw): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  Ok(Json(catalog.list_reviews(id).await?))
}

/// `POST /reviews`
pub async fn create<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Caller(caller): Caller,
  JsonBody(body): JsonBody<NewReview>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = catalog.create_review(&caller, body).await?;
  Ok((StatusCode::CREATED, Json(IdBody { id })))
}

/// `GET /reviews/{id}`
pub async fn get_one<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Path(raw): Path<String>,
) -> Result<Json<Review>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = review_id(&raw)?;
  Ok(Json(catalog.get_review(id).await?))
}

/// `PUT /reviews/{id}`
pub async fn update<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Caller(caller): Caller,
  Path(raw): Path<String>,
  JsonBody(patch): JsonBody<ReviewPatch>,
) -> Result<Json<IdBody>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = review_id(&raw)?;
  Ok(Json(IdBody { id: catalog.update_review(&caller, id, patch).await? }))
}

/// `DELETE /reviews/{id}`
pub async fn delete<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Caller(caller): Caller,
  Path(raw): Path<String>,
) -> Result<Json<IdBody>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = review_id(&raw)?;
  Ok(Json(IdBody { id: catalog.delete_review(&caller, id).await? }))
}
