//! Spots: the reviewable places.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  factor::{FactorEntry, FactorSet},
  review::Review,
};

/// Path prefix under which stored spot images are served. A spot whose
/// `image` starts with this prefix owns the referenced blob.
pub const IMAGE_PATH_PREFIX: &str = "/images/";

/// A persisted spot together with its current factor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spot {
  pub spot_id:    Uuid,
  pub name:       String,
  pub address:    String,
  /// Free-text capacity label, e.g. "Low", "Medium", "High".
  pub capacity:   String,
  /// Either an external URL or `/images/{blob_id}` for an uploaded image.
  pub image:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub factors:    FactorSet,
}

impl Spot {
  /// Build a fresh spot from creation input; both timestamps are `now`.
  pub fn new(input: NewSpot, now: DateTime<Utc>) -> Self {
    Self {
      spot_id:    Uuid::new_v4(),
      name:       input.name,
      address:    input.address,
      capacity:   input.capacity,
      image:      input.image,
      created_at: now,
      updated_at: now,
      factors:    FactorSet::default(),
    }
  }

  /// The blob this spot's image points at, if it is a stored upload.
  pub fn image_blob_id(&self) -> Option<Uuid> {
    self.image.as_deref().and_then(image_blob_id)
  }
}

/// Parse the blob id out of an `/images/{id}` reference.
pub fn image_blob_id(image: &str) -> Option<Uuid> {
  image
    .strip_prefix(IMAGE_PATH_PREFIX)
    .and_then(|id| Uuid::parse_str(id).ok())
}

/// The reference stored on a spot for an uploaded blob.
pub fn image_path(blob_id: Uuid) -> String { format!("{IMAGE_PATH_PREFIX}{blob_id}") }

/// Input to [`crate::catalog::Catalog::create_spot`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewSpot {
  pub name:     String,
  pub address:  String,
  #[serde(default)]
  pub capacity: String,
  #[serde(default)]
  pub image:    Option<String>,
}

/// Partial update; `None` leaves a field unchanged. An empty `image` clears
/// the reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpotPatch {
  pub name:     Option<String>,
  pub address:  Option<String>,
  pub capacity: Option<String>,
  pub image:    Option<String>,
}

impl SpotPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.address.is_none()
      && self.capacity.is_none()
      && self.image.is_none()
  }
}

/// The lightweight listing form of a spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotSummary {
  pub spot_id:      Uuid,
  pub name:         String,
  pub address:      String,
  pub image:        Option<String>,
  pub availability: FactorEntry,
}

impl From<&Spot> for SpotSummary {
  fn from(s: &Spot) -> Self {
    Self {
      spot_id:      s.spot_id,
      name:         s.name.clone(),
      address:      s.address.clone(),
      image:        s.image.clone(),
      availability: s.factors.availability,
    }
  }
}

/// Full detail view: the spot, its factors, and its reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotDetail {
  #[serde(flatten)]
  pub spot:    Spot,
  pub reviews: Vec<Review>,
}
