//! `POST /spots/{id}/factors`
//!
//! Body: any subset of `{"availability","noise","temperature","ambiance"}`
//! as numbers. Values are clamped to the configured scale; omitted kinds are
//! left untouched.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use hotspots_core::{
  catalog::Catalog,
  factor::FactorRatings,
  store::{BlobStore, SpotStore},
};

use crate::{IdBody, auth::Caller, error::ApiError, extract::JsonBody, spot_id};

pub async fn submit<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Caller(caller): Caller,
  Path(raw): Path<String>,
  JsonBody(ratings): JsonBody<FactorRatings>,
) -> Result<Json<IdBody>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  let id = catalog.submit_factors(id, ratings).await?;
  tracing::debug!(spot_id = %id, user = %caller.user_id, "factors submitted");
  Ok(Json(IdBody { id }))
}
