//! Reviews: free-text feedback a user leaves on a spot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Lowest accepted review rating.
pub const MIN_REVIEW_RATING: u8 = 1;
/// Highest accepted review rating.
pub const MAX_REVIEW_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:  Uuid,
  pub spot_id:    Uuid,
  /// The verified identity that created the review. Never taken from a
  /// request payload.
  pub user_id:    String,
  pub title:      String,
  pub text:       String,
  pub rating:     u8,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Review {
  pub fn new(input: NewReview, user_id: String, now: DateTime<Utc>) -> Self {
    Self {
      review_id: Uuid::new_v4(),
      spot_id: input.spot_id,
      user_id,
      title: input.title,
      text: input.text,
      rating: input.rating,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Input to [`crate::catalog::Catalog::create_review`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
  pub spot_id: Uuid,
  pub title:   String,
  #[serde(default)]
  pub text:    String,
  pub rating:  u8,
}

impl NewReview {
  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    validate_rating(self.rating)
  }
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
  pub title:  Option<String>,
  pub text:   Option<String>,
  pub rating: Option<u8>,
}

impl ReviewPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if let Some(rating) = self.rating {
      validate_rating(rating)?;
    }
    Ok(())
  }
}

fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::Invalid("review title must not be empty".into()));
  }
  Ok(())
}

fn validate_rating(rating: u8) -> Result<()> {
  if !(MIN_REVIEW_RATING..=MAX_REVIEW_RATING).contains(&rating) {
    return Err(Error::Invalid(format!(
      "review rating must be between {MIN_REVIEW_RATING} and {MAX_REVIEW_RATING}, got {rating}"
    )));
  }
  Ok(())
}
