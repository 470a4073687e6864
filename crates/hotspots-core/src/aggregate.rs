//! [`FactorAggregator`] folds submitted ratings into a spot's daily rolling
//! averages and applies the lazy daily reset on the read path.
//!
//! The read-decide-write sequence is not transactional. Two concurrent
//! submissions for the same spot and kind may both read the same snapshot, in
//! which case the later write wins and one sample is lost. Submissions for
//! different kinds, or different spots, never interfere because each kind is
//! persisted as its own record.
//!
//! The read-path reset goes through [`SpotStore::reset_factor`], which never
//! overwrites an entry already stamped today. A reader holding an older
//! snapshot therefore cannot wipe a rating submitted after it looked.

use std::sync::Arc;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Error, Result,
  factor::{FactorKind, FactorRatings, FactorSet, RatingScale},
  store::SpotStore,
};

pub struct FactorAggregator<S> {
  store: Arc<S>,
  scale: RatingScale,
}

impl<S> Clone for FactorAggregator<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), scale: self.scale }
  }
}

impl<S: SpotStore> FactorAggregator<S> {
  pub fn new(store: Arc<S>, scale: RatingScale) -> Self { Self { store, scale } }

  /// Submit one rating for one kind.
  pub async fn submit_factor_rating(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    raw_value: f64,
    today: NaiveDate,
  ) -> Result<Uuid> {
    self
      .submit(spot_id, &FactorRatings::single(kind, raw_value), today)
      .await
  }

  /// Fold every supplied rating into the spot's factor state.
  ///
  /// Fails with [`Error::SpotNotFound`] before any write if the spot is
  /// missing, and with [`Error::Invalid`] before any write if a value is not
  /// a finite number.
  pub async fn submit(
    &self,
    spot_id: Uuid,
    ratings: &FactorRatings,
    today: NaiveDate,
  ) -> Result<Uuid> {
    let current = self
      .store
      .get_factors(spot_id)
      .await?
      .ok_or(Error::SpotNotFound(spot_id))?;

    let updates = ratings
      .supplied()
      .map(|(kind, raw)| {
        let value = self.scale.clamp(raw)?;
        Ok((kind, current.get(kind).blended(value, today)))
      })
      .collect::<Result<Vec<_>>>()?;

    for (kind, entry) in updates {
      tracing::debug!(
        %spot_id,
        %kind,
        average = entry.average,
        samples = entry.sample_count,
        "factor blended"
      );
      if !self.store.save_factor(spot_id, kind, entry).await? {
        return Err(Error::SpotNotFound(spot_id));
      }
    }

    Ok(spot_id)
  }

  /// Apply the daily reset to a factor set that is about to be shown,
  /// persisting every kind that rolled over.
  ///
  /// Kinds the snapshot shows as stale take whatever the store holds after
  /// the reset, so a same-day submission that raced the read is kept.
  pub async fn refresh(
    &self,
    spot_id: Uuid,
    mut factors: FactorSet,
    today: NaiveDate,
  ) -> Result<FactorSet> {
    for kind in factors.stale_kinds(today) {
      tracing::debug!(%spot_id, %kind, %today, "factor reset on read");
      let entry = self
        .store
        .reset_factor(spot_id, kind, today)
        .await?
        .ok_or(Error::SpotNotFound(spot_id))?;
      *factors.get_mut(kind) = entry;
    }
    Ok(factors)
  }
}
