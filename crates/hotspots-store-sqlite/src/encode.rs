//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use hotspots_core::{
  factor::{FactorEntry, FactorKind, FactorSet},
  review::Review,
  spot::Spot,
  store::Blob,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(e.to_string()))
}

// ─── FactorKind ──────────────────────────────────────────────────────────────

pub fn encode_kind(k: FactorKind) -> &'static str { k.into() }

pub fn decode_kind(s: &str) -> Result<FactorKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown factor kind: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `spots` row.
pub struct RawSpot {
  pub spot_id:    String,
  pub name:       String,
  pub address:    String,
  pub capacity:   String,
  pub image:      Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

pub const SPOT_COLUMNS: &str =
  "spot_id, name, address, capacity, image, created_at, updated_at";

impl RawSpot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      spot_id:    row.get(0)?,
      name:       row.get(1)?,
      address:    row.get(2)?,
      capacity:   row.get(3)?,
      image:      row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_spot(self, factors: FactorSet) -> Result<Spot> {
    Ok(Spot {
      spot_id: decode_uuid(&self.spot_id)?,
      name: self.name,
      address: self.address,
      capacity: self.capacity,
      image: self.image,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      factors,
    })
  }
}

/// Raw values read directly from a `spot_factors` row.
pub struct RawFactor {
  pub spot_id:      String,
  pub kind:         String,
  pub average:      f64,
  pub sample_count: i64,
  pub last_date:    Option<String>,
}

pub const FACTOR_COLUMNS: &str = "spot_id, kind, average, sample_count, last_date";

impl RawFactor {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      spot_id:      row.get(0)?,
      kind:         row.get(1)?,
      average:      row.get(2)?,
      sample_count: row.get(3)?,
      last_date:    row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<(FactorKind, FactorEntry)> {
    let kind = decode_kind(&self.kind)?;
    let sample_count = u32::try_from(self.sample_count)
      .map_err(|_| Error::Decode(format!("sample count out of range: {}", self.sample_count)))?;
    let last_date = self.last_date.as_deref().map(decode_date).transpose()?;
    Ok((kind, FactorEntry { average: self.average, sample_count, last_date }))
  }
}

/// Fold decoded factor rows into a set. Kinds without a row stay empty.
pub fn assemble_factors(rows: Vec<RawFactor>) -> Result<FactorSet> {
  let mut set = FactorSet::default();
  for raw in rows {
    let (kind, entry) = raw.into_entry()?;
    *set.get_mut(kind) = entry;
  }
  Ok(set)
}

/// Raw values read directly from a `reviews` row.
pub struct RawReview {
  pub review_id:  String,
  pub spot_id:    String,
  pub user_id:    String,
  pub title:      String,
  pub body:       String,
  pub rating:     i64,
  pub created_at: String,
  pub updated_at: String,
}

pub const REVIEW_COLUMNS: &str =
  "review_id, spot_id, user_id, title, body, rating, created_at, updated_at";

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:  row.get(0)?,
      spot_id:    row.get(1)?,
      user_id:    row.get(2)?,
      title:      row.get(3)?,
      body:       row.get(4)?,
      rating:     row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:  decode_uuid(&self.review_id)?,
      spot_id:    decode_uuid(&self.spot_id)?,
      user_id:    self.user_id,
      title:      self.title,
      text:       self.body,
      rating:     u8::try_from(self.rating)
        .map_err(|_| Error::Decode(format!("review rating out of range: {}", self.rating)))?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `blobs` row.
pub struct RawBlob {
  pub blob_id:      String,
  pub filename:     String,
  pub media_type:   String,
  pub content_hash: String,
  pub data:         Vec<u8>,
  pub created_at:   String,
}

impl RawBlob {
  pub fn into_blob(self) -> Result<Blob> {
    Ok(Blob {
      blob_id:      decode_uuid(&self.blob_id)?,
      filename:     self.filename,
      media_type:   self.media_type,
      content_hash: self.content_hash,
      data:         self.data,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
