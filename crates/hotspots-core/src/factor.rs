//! Factor ratings: the subjective, per-day rolling averages attached to a
//! spot.
//!
//! Each spot carries one [`FactorEntry`] per [`FactorKind`]. An entry is only
//! meaningful for the calendar day stored in `last_date`; as soon as the date
//! rolls over the entry is treated as empty. The reset is lazy: it happens the
//! next time the entry is read or written, never on a timer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator as _, IntoStaticStr};

use crate::{Error, Result};

// ─── Kind ────────────────────────────────────────────────────────────────────

/// One of the four subjective ratings a spot can receive.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactorKind {
  Availability,
  Noise,
  Temperature,
  Ambiance,
}

impl FactorKind {
  /// All kinds in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}

// ─── Scale ───────────────────────────────────────────────────────────────────

/// The inclusive range raw ratings are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
  pub min: f64,
  pub max: f64,
}

impl Default for RatingScale {
  fn default() -> Self { Self { min: 0.0, max: 5.0 } }
}

impl RatingScale {
  pub fn new(min: f64, max: f64) -> Result<Self> {
    if !min.is_finite() || !max.is_finite() || min >= max {
      return Err(Error::Invalid(format!(
        "rating scale must satisfy min < max, got {min}..={max}"
      )));
    }
    Ok(Self { min, max })
  }

  /// Clamp a raw rating into the scale. Out-of-range values are not
  /// rejected; only non-finite input is.
  pub fn clamp(&self, raw: f64) -> Result<f64> {
    if !raw.is_finite() {
      return Err(Error::Invalid(format!("rating must be a finite number, got {raw}")));
    }
    Ok(raw.clamp(self.min, self.max))
  }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// The rolling average of one factor kind for one spot.
///
/// `average` is the arithmetic mean of the `sample_count` ratings received on
/// `last_date`. An entry that has never been touched has no date.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorEntry {
  pub average:      f64,
  pub sample_count: u32,
  pub last_date:    Option<NaiveDate>,
}

impl FactorEntry {
  /// An empty entry stamped with `today`.
  pub fn reset(today: NaiveDate) -> Self {
    Self { average: 0.0, sample_count: 0, last_date: Some(today) }
  }

  /// `true` if this entry's samples belong to a day other than `today`.
  pub fn is_stale(&self, today: NaiveDate) -> bool {
    self.last_date != Some(today)
  }

  /// The entry as it should be observed on `today`.
  pub fn as_of(&self, today: NaiveDate) -> Self {
    if self.is_stale(today) { Self::reset(today) } else { *self }
  }

  /// Fold one already-clamped rating into the entry, applying the daily reset
  /// first.
  pub fn blended(&self, value: f64, today: NaiveDate) -> Self {
    let current = self.as_of(today);
    let n = f64::from(current.sample_count);
    Self {
      average:      (current.average * n + value) / (n + 1.0),
      sample_count: current.sample_count + 1,
      last_date:    Some(today),
    }
  }
}

// ─── Set ─────────────────────────────────────────────────────────────────────

/// One [`FactorEntry`] per [`FactorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FactorSet {
  pub availability: FactorEntry,
  pub noise:        FactorEntry,
  pub temperature:  FactorEntry,
  pub ambiance:     FactorEntry,
}

impl FactorSet {
  pub fn get(&self, kind: FactorKind) -> &FactorEntry {
    match kind {
      FactorKind::Availability => &self.availability,
      FactorKind::Noise => &self.noise,
      FactorKind::Temperature => &self.temperature,
      FactorKind::Ambiance => &self.ambiance,
    }
  }

  pub fn get_mut(&mut self, kind: FactorKind) -> &mut FactorEntry {
    match kind {
      FactorKind::Availability => &mut self.availability,
      FactorKind::Noise => &mut self.noise,
      FactorKind::Temperature => &mut self.temperature,
      FactorKind::Ambiance => &mut self.ambiance,
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (FactorKind, &FactorEntry)> {
    FactorKind::all().map(move |k| (k, self.get(k)))
  }

  /// Kinds whose entry must be reset before it can be shown for `today`.
  pub fn stale_kinds(&self, today: NaiveDate) -> Vec<FactorKind> {
    self
      .iter()
      .filter(|(_, e)| e.is_stale(today))
      .map(|(k, _)| k)
      .collect()
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A batch of raw ratings for one spot. Absent kinds are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorRatings {
  #[serde(default)]
  pub availability: Option<f64>,
  #[serde(default)]
  pub noise:        Option<f64>,
  #[serde(default)]
  pub temperature:  Option<f64>,
  #[serde(default)]
  pub ambiance:     Option<f64>,
}

impl FactorRatings {
  pub fn single(kind: FactorKind, value: f64) -> Self {
    let mut r = Self::default();
    *r.slot_mut(kind) = Some(value);
    r
  }

  pub fn get(&self, kind: FactorKind) -> Option<f64> {
    match kind {
      FactorKind::Availability => self.availability,
      FactorKind::Noise => self.noise,
      FactorKind::Temperature => self.temperature,
      FactorKind::Ambiance => self.ambiance,
    }
  }

  fn slot_mut(&mut self, kind: FactorKind) -> &mut Option<f64> {
    match kind {
      FactorKind::Availability => &mut self.availability,
      FactorKind::Noise => &mut self.noise,
      FactorKind::Temperature => &mut self.temperature,
      FactorKind::Ambiance => &mut self.ambiance,
    }
  }

  /// The supplied `(kind, raw value)` pairs.
  pub fn supplied(&self) -> impl Iterator<Item = (FactorKind, f64)> + '_ {
    FactorKind::all().filter_map(move |k| self.get(k).map(|v| (k, v)))
  }
}
