//! Handlers for `/spots` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/spots` | Summaries with the availability factor |
//! | `POST`   | `/spots` | Admin. Body: `{"name","address","capacity","image"}` |
//! | `GET`    | `/spots/{id}` | Full detail including factors and reviews |
//! | `PUT`    | `/spots/{id}` | Admin. Partial body; `"image": ""` clears it |
//! | `DELETE` | `/spots/{id}` | Admin. Also removes reviews and the uploaded image |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use hotspots_core::{
  catalog::Catalog,
  spot::{NewSpot, SpotDetail, SpotPatch, SpotSummary},
  store::{BlobStore, SpotStore},
};

use crate::{IdBody, auth::Admin, error::ApiError, extract::JsonBody, spot_id};

/// `GET /spots`
pub async fn list<S>(
  State(catalog): State<Arc<Catalog<S>>>,
) -> Result<Json<Vec<SpotSummary>>, ApiError>
where
  S: SpotStore + BlobStore,
{
  Ok(Json(catalog.list_spots().await?))
}

/// `POST /spots`
pub async fn create<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Admin(admin): Admin,
  JsonBody(body): JsonBody<NewSpot>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = catalog.create_spot(body).await?;
  tracing::debug!(%id, by = %admin.user_id, "create spot");
  Ok((StatusCode::CREATED, Json(IdBody { id })))
}

/// `GET /spots/{id}`
pub async fn get_one<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Path(raw): Path<String>,
) -> Result<Json<SpotDetail>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  Ok(Json(catalog.get_spot(id).await?))
}

/// `PUT /spots/{id}`
pub async fn update<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Admin(_): Admin,
  Path(raw): Path<String>,
  JsonBody(patch): JsonBody<SpotPatch>,
) -> Result<Json<IdBody>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  Ok(Json(IdBody { id: catalog.update_spot(id, patch).await? }))
}

/// `DELETE /spots/{id}`
pub async fn delete<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Admin(_): Admin,
  Path(raw): Path<String>,
) -> Result<Json<IdBody>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  Ok(Json(IdBody { id: catalog.delete_spot(id).await? }))
}
