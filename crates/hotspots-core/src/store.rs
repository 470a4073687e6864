//! The `SpotStore` and `BlobStore` traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `hotspots-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.
//!
//! Backends report absence through `Option`/`bool` returns, uniqueness
//! violations as [`Error::Duplicate`](crate::Error::Duplicate), and every
//! other failure as [`Error::Store`](crate::Error::Store), so no backend
//! detail reaches the caller.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  factor::{FactorEntry, FactorKind, FactorSet},
  review::{Review, ReviewPatch},
  spot::{Spot, SpotPatch},
};

// ─── Spots and reviews ───────────────────────────────────────────────────────

/// Document persistence for spots, their factor state, and their reviews.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SpotStore: Send + Sync {
  // ── Spots ─────────────────────────────────────────────────────────────

  /// Persist a new spot including its initial factor entries.
  fn insert_spot(&self, spot: Spot) -> impl Future<Output = Result<()>> + Send + '_;

  fn list_spots(&self) -> impl Future<Output = Result<Vec<Spot>>> + Send + '_;

  fn get_spot(&self, id: Uuid) -> impl Future<Output = Result<Option<Spot>>> + Send + '_;

  /// Apply `patch` and stamp `updated_at`. Returns `None` if the spot does not
  /// exist.
  fn update_spot(
    &self,
    id: Uuid,
    patch: SpotPatch,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Spot>>> + Send + '_;

  /// Delete a spot together with its factor entries and reviews, atomically.
  /// Returns the deleted spot, or `None` if it did not exist.
  fn delete_spot(&self, id: Uuid) -> impl Future<Output = Result<Option<Spot>>> + Send + '_;

  // ── Factors ───────────────────────────────────────────────────────────

  /// The stored factor state of a spot, or `None` if the spot does not exist.
  fn get_factors(
    &self,
    spot_id: Uuid,
  ) -> impl Future<Output = Result<Option<FactorSet>>> + Send + '_;

  /// Overwrite one kind's entry. Writes to different kinds of the same spot
  /// never touch each other. Returns `false` if the spot does not exist.
  fn save_factor(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    entry: FactorEntry,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  /// Reset one kind to an empty entry stamped `today`, unless its stored entry
  /// is already stamped `today`, in which case it is left as is. Returns the
  /// entry stored afterwards, or `None` if the spot does not exist.
  fn reset_factor(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    today: NaiveDate,
  ) -> impl Future<Output = Result<Option<FactorEntry>>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  fn insert_review(&self, review: Review) -> impl Future<Output = Result<()>> + Send + '_;

  fn get_review(&self, id: Uuid) -> impl Future<Output = Result<Option<Review>>> + Send + '_;

  /// Reviews for a spot, newest first.
  fn list_reviews(&self, spot_id: Uuid) -> impl Future<Output = Result<Vec<Review>>> + Send + '_;

  fn update_review(
    &self,
    id: Uuid,
    patch: ReviewPatch,
    updated_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<Review>>> + Send + '_;

  /// Returns `false` if the review did not exist.
  fn delete_review(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send + '_;
}

// ─── Blobs ───────────────────────────────────────────────────────────────────

/// Input to [`BlobStore::put_blob`].
#[derive(Debug, Clone)]
pub struct NewBlob {
  pub filename:   String,
  pub media_type: String,
  pub data:       Vec<u8>,
}

/// A stored binary object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
  pub blob_id:      Uuid,
  pub filename:     String,
  pub media_type:   String,
  /// SHA-256 hex digest of `data`.
  pub content_hash: String,
  #[serde(skip)]
  pub data:         Vec<u8>,
  pub created_at:   DateTime<Utc>,
}

/// Binary storage for uploaded spot images.
pub trait BlobStore: Send + Sync {
  fn put_blob(&self, blob: NewBlob) -> impl Future<Output = Result<Blob>> + Send + '_;

  fn get_blob(&self, id: Uuid) -> impl Future<Output = Result<Option<Blob>>> + Send + '_;

  /// Returns `false` if the blob did not exist.
  fn delete_blob(&self, id: Uuid) -> impl Future<Output = Result<bool>> + Send + '_;
}
