//! [`Catalog`] holds the operations exposed to the request boundary.
//!
//! Holds the injected store handle, the factor aggregator and the clock. It
//! keeps no state of its own between calls.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  access,
  aggregate::FactorAggregator,
  clock::Clock,
  factor::{FactorRatings, RatingScale},
  identity::Identity,
  review::{NewReview, Review, ReviewPatch},
  spot::{IMAGE_PATH_PREFIX, NewSpot, Spot, SpotDetail, SpotPatch, SpotSummary, image_path},
  store::{Blob, BlobStore, NewBlob, SpotStore},
};

pub struct Catalog<S> {
  store:      Arc<S>,
  aggregator: FactorAggregator<S>,
  clock:      Arc<dyn Clock>,
}

impl<S> Clone for Catalog<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      aggregator: self.aggregator.clone(),
      clock:      Arc::clone(&self.clock),
    }
  }
}

/// Stored-image references are only assigned by [`Catalog::upload_image`].
/// Client input may repeat the spot's own reference but never name another
/// upload.
fn check_image_reference(requested: Option<&str>, current: Option<&str>) -> Result<()> {
  match requested {
    Some(image) if image.starts_with(IMAGE_PATH_PREFIX) && Some(image) != current => Err(
      Error::Invalid(format!("image must be an external URL, not a stored upload: {image}")),
    ),
    _ => Ok(()),
  }
}

impl<S> Catalog<S>
where
  S: SpotStore + BlobStore,
{
  pub fn new(store: Arc<S>, scale: RatingScale, clock: Arc<dyn Clock>) -> Self {
    let aggregator = FactorAggregator::new(Arc::clone(&store), scale);
    Self { store, aggregator, clock }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Spots ─────────────────────────────────────────────────────────────

  pub async fn list_spots(&self) -> Result<Vec<SpotSummary>> {
    let today = self.clock.today();
    let mut out = Vec::new();
    for mut spot in self.store.list_spots().await? {
      spot.factors = self.aggregator.refresh(spot.spot_id, spot.factors, today).await?;
      out.push(SpotSummary::from(&spot));
    }
    Ok(out)
  }

  pub async fn create_spot(&self, input: NewSpot) -> Result<Uuid> {
    if input.name.trim().is_empty() || input.address.trim().is_empty() {
      return Err(Error::Invalid("spot name and address must not be empty".into()));
    }
    check_image_reference(input.image.as_deref(), None)?;
    let spot = Spot::new(input, self.clock.now());
    let id = spot.spot_id;
    self.store.insert_spot(spot).await?;
    tracing::info!(spot_id = %id, "spot created");
    Ok(id)
  }

  pub async fn get_spot(&self, id: Uuid) -> Result<SpotDetail> {
    let mut spot = self.store.get_spot(id).await?.ok_or(Error::SpotNotFound(id))?;
    spot.factors = self
      .aggregator
      .refresh(id, spot.factors, self.clock.today())
      .await?;
    let reviews = self.store.list_reviews(id).await?;
    Ok(SpotDetail { spot, reviews })
  }

  pub async fn update_spot(&self, id: Uuid, patch: SpotPatch) -> Result<Uuid> {
    let blank = |f: &Option<String>| f.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&patch.name) || blank(&patch.address) {
      return Err(Error::Invalid("spot name and address must not be empty".into()));
    }
    if patch.is_empty() {
      return Err(Error::Invalid("no spot fields to update".into()));
    }
    let previous_blob = match patch.image.as_deref() {
      Some(image) => {
        let current = self.store.get_spot(id).await?.ok_or(Error::SpotNotFound(id))?;
        check_image_reference(Some(image), current.image.as_deref())?;
        current.image_blob_id()
      }
      None => None,
    };
    let updated = self
      .store
      .update_spot(id, patch, self.clock.now())
      .await?
      .ok_or(Error::SpotNotFound(id))?;
    if let Some(old) = previous_blob
      && updated.image_blob_id() != Some(old)
    {
      self.store.delete_blob(old).await?;
    }
    tracing::info!(spot_id = %id, "spot updated");
    Ok(id)
  }

  /// Delete a spot, its reviews, and its uploaded image.
  pub async fn delete_spot(&self, id: Uuid) -> Result<Uuid> {
    let spot = self.store.delete_spot(id).await?.ok_or(Error::SpotNotFound(id))?;
    if let Some(blob_id) = spot.image_blob_id() {
      self.store.delete_blob(blob_id).await?;
    }
    tracing::info!(spot_id = %id, "spot deleted");
    Ok(id)
  }

  pub async fn submit_factors(&self, id: Uuid, ratings: FactorRatings) -> Result<Uuid> {
    if ratings.supplied().next().is_none() {
      return Err(Error::Invalid("at least one factor rating is required".into()));
    }
    self.aggregator.submit(id, &ratings, self.clock.today()).await
  }

  // ── Images ────────────────────────────────────────────────────────────

  /// Store an uploaded image and point the spot at it. Returns the new blob
  /// id. A previously uploaded image is deleted.
  pub async fn upload_image(&self, spot_id: Uuid, blob: NewBlob) -> Result<Uuid> {
    let spot = self
      .store
      .get_spot(spot_id)
      .await?
      .ok_or(Error::SpotNotFound(spot_id))?;
    if blob.data.is_empty() {
      return Err(Error::Invalid("image body must not be empty".into()));
    }

    let stored = self.store.put_blob(blob).await?;
    let patch = SpotPatch { image: Some(image_path(stored.blob_id)), ..Default::default() };
    if self.store.update_spot(spot_id, patch, self.clock.now()).await?.is_none() {
      self.store.delete_blob(stored.blob_id).await?;
      return Err(Error::SpotNotFound(spot_id));
    }

    if let Some(old) = spot.image_blob_id() {
      self.store.delete_blob(old).await?;
    }
    tracing::info!(%spot_id, blob_id = %stored.blob_id, "spot image stored");
    Ok(stored.blob_id)
  }

  pub async fn fetch_image(&self, blob_id: Uuid) -> Result<Blob> {
    self
      .store
      .get_blob(blob_id)
      .await?
      .ok_or(Error::ImageNotFound(blob_id))
  }

  // ── Reviews ───────────────────────────────────────────────────────────

  pub async fn create_review(&self, caller: &Identity, input: NewReview) -> Result<Uuid> {
    input.validate()?;
    if self.store.get_spot(input.spot_id).await?.is_none() {
      return Err(Error::SpotNotFound(input.spot_id));
    }
    let review = Review::new(input, caller.user_id.clone(), self.clock.now());
    let id = review.review_id;
    self.store.insert_review(review).await?;
    tracing::info!(review_id = %id, user = %caller.user_id, "review created");
    Ok(id)
  }

  pub async fn get_review(&self, id: Uuid) -> Result<Review> {
    self.store.get_review(id).await?.ok_or(Error::ReviewNotFound(id))
  }

  pub async fn list_reviews(&self, spot_id: Uuid) -> Result<Vec<Review>> {
    if self.store.get_spot(spot_id).await?.is_none() {
      return Err(Error::SpotNotFound(spot_id));
    }
    self.store.list_reviews(spot_id).await
  }

  pub async fn update_review(
    &self,
    caller: &Identity,
    id: Uuid,
    patch: ReviewPatch,
  ) -> Result<Uuid> {
    let review = self.get_review(id).await?;
    access::authorize(&review, caller)?;
    patch.validate()?;
    self
      .store
      .update_review(id, patch, self.clock.now())
      .await?
      .ok_or(Error::ReviewNotFound(id))?;
    tracing::info!(review_id = %id, user = %caller.user_id, "review updated");
    Ok(id)
  }

  pub async fn delete_review(&self, caller: &Identity, id: Uuid) -> Result<Uuid> {
    let review = self.get_review(id).await?;
    access::authorize(&review, caller)?;
    if !self.store.delete_review(id).await? {
      return Err(Error::ReviewNotFound(id));
    }
    tracing::info!(review_id = %id, user = %caller.user_id, "review deleted");
    Ok(id)
  }
}

/// Parse a path identifier. Malformed ids are indistinguishable from missing
/// ones, so callers map `None` to their not-found outcome.
pub fn parse_id(raw: &str) -> Option<Uuid> { Uuid::parse_str(raw).ok() }
