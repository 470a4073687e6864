//! Image upload and download.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `PUT`  | `/spots/{id}/image` | Admin. Raw body; `Content-Type: image/*`; optional `?filename=` |
//! | `GET`  | `/images/{id}` | Bytes with `Content-Type`, `Content-Disposition` and `ETag`; honours `If-None-Match` |

use std::sync::Arc;

use axum::{
  Json,
  body::Body,
  extract::{Path, Query, State},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use hotspots_core::{
  catalog::{Catalog, parse_id},
  spot::image_path,
  store::{BlobStore, NewBlob, SpotStore},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{auth::Admin, error::ApiError, spot_id};

const DEFAULT_FILENAME: &str = "image";

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Uploaded {
  pub id:    Uuid,
  pub image: String,
}

/// `PUT /spots/{id}/image`
pub async fn upload<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Admin(_): Admin,
  Path(raw): Path<String>,
  Query(params): Query<UploadParams>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Uploaded>, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = spot_id(&raw)?;
  let media_type = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
    .filter(|v| v.starts_with("image/"))
    .ok_or_else(|| ApiError::BadRequest("content type must be an image/* media type".into()))?;
  let filename = params
    .filename
    .map(|f| sanitize_filename(&f))
    .filter(|f| !f.is_empty())
    .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

  let blob_id = catalog
    .upload_image(id, NewBlob { filename, media_type, data: body.to_vec() })
    .await?;
  Ok(Json(Uploaded { id, image: image_path(blob_id) }))
}

/// `GET /images/{id}`
pub async fn fetch<S>(
  State(catalog): State<Arc<Catalog<S>>>,
  Path(raw): Path<String>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: SpotStore + BlobStore,
{
  let id = parse_id(&raw).ok_or_else(|| ApiError::NotFound(format!("image not found: {raw}")))?;
  let blob = catalog.fetch_image(id).await?;
  let etag = format!("\"{}\"", blob.content_hash);

  let matches = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|v| v.split(',').any(|t| t.trim() == etag || t.trim() == "*"));
  if matches {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let content_type = HeaderValue::from_str(&blob.media_type)
    .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
  let disposition = HeaderValue::from_str(&format!("inline; filename=\"{}\"", blob.filename))
    .unwrap_or_else(|_| HeaderValue::from_static("inline"));

  let mut res = Response::new(Body::from(blob.data));
  let h = res.headers_mut();
  h.insert(header::CONTENT_TYPE, content_type);
  h.insert(header::CONTENT_DISPOSITION, disposition);
  if let Ok(v) = HeaderValue::from_str(&etag) {
    h.insert(header::ETAG, v);
  }
  Ok(res)
}

/// Keep only characters that are safe inside a quoted header parameter.
fn sanitize_filename(raw: &str) -> String {
  raw
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    .collect()
}
