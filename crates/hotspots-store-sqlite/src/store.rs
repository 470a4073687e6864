//! [`SqliteStore`], the SQLite implementation of [`SpotStore`] and
//! [`BlobStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use hotspots_core::{
  factor::{FactorEntry, FactorKind, FactorSet},
  review::{Review, ReviewPatch},
  spot::{Spot, SpotPatch},
  store::{Blob, BlobStore, NewBlob, SpotStore},
};

use crate::{
  Error, Result,
  encode::{
    FACTOR_COLUMNS, REVIEW_COLUMNS, RawBlob, RawFactor, RawReview, RawSpot, SPOT_COLUMNS,
    assemble_factors, encode_date, encode_dt, encode_kind, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hotspots store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// `true` if `e` is a UNIQUE or PRIMARY KEY violation.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
  match e {
    rusqlite::Error::SqliteFailure(f, _) => {
      f.code == rusqlite::ErrorCode::ConstraintViolation
        && (f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
          || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    }
    _ => false,
  }
}

/// Read a spot row and its factor rows on an open connection.
fn load_spot(
  conn: &rusqlite::Connection,
  id: &str,
) -> rusqlite::Result<Option<(RawSpot, Vec<RawFactor>)>> {
  let spot = conn
    .query_row(
      &format!("SELECT {SPOT_COLUMNS} FROM spots WHERE spot_id = ?1"),
      rusqlite::params![id],
      RawSpot::from_row,
    )
    .optional()?;

  let Some(spot) = spot else { return Ok(None) };

  let mut stmt =
    conn.prepare(&format!("SELECT {FACTOR_COLUMNS} FROM spot_factors WHERE spot_id = ?1"))?;
  let factors = stmt
    .query_map(rusqlite::params![id], RawFactor::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Some((spot, factors)))
}

fn load_review(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<Option<RawReview>> {
  conn
    .query_row(
      &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE review_id = ?1"),
      rusqlite::params![id],
      RawReview::from_row,
    )
    .optional()
}

fn decode_spot(raw: Option<(RawSpot, Vec<RawFactor>)>) -> Result<Option<Spot>> {
  raw
    .map(|(spot, factors)| spot.into_spot(assemble_factors(factors)?))
    .transpose()
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by the tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Spots ─────────────────────────────────────────────────────────────────

  async fn insert_spot_row(&self, spot: Spot) -> Result<()> {
    let id_str      = encode_uuid(spot.spot_id);
    let created_str = encode_dt(spot.created_at);
    let updated_str = encode_dt(spot.updated_at);
    let label       = format!("spot {:?} at {:?}", spot.name, spot.address);
    let factors: Vec<(&'static str, f64, u32, Option<String>)> = spot
      .factors
      .iter()
      .map(|(k, e)| (encode_kind(k), e.average, e.sample_count, e.last_date.map(encode_date)))
      .collect();
    let Spot { name, address, capacity, image, .. } = spot;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match tx.execute(
          "INSERT INTO spots (spot_id, name, address, capacity, image, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, name, address, capacity, image, created_str, updated_str],
        ) {
          Ok(_) => {}
          Err(e) if is_unique_violation(&e) => return Ok(false),
          Err(e) => return Err(e.into()),
        }
        for (kind, average, count, last_date) in factors {
          tx.execute(
            "INSERT INTO spot_factors (spot_id, kind, average, sample_count, last_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![id_str, kind, average, count, last_date],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Duplicate(label));
    }
    Ok(())
  }

  async fn query_spots(&self) -> Result<Vec<Spot>> {
    let (spots, factors): (Vec<RawSpot>, Vec<RawFactor>) = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SPOT_COLUMNS} FROM spots ORDER BY created_at, name"
        ))?;
        let spots = stmt
          .query_map([], RawSpot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!("SELECT {FACTOR_COLUMNS} FROM spot_factors"))?;
        let factors = stmt
          .query_map([], RawFactor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((spots, factors))
      })
      .await?;

    let mut by_spot: HashMap<String, Vec<RawFactor>> = HashMap::new();
    for f in factors {
      by_spot.entry(f.spot_id.clone()).or_default().push(f);
    }

    spots
      .into_iter()
      .map(|raw| {
        let rows = by_spot.remove(&raw.spot_id).unwrap_or_default();
        raw.into_spot(assemble_factors(rows)?)
      })
      .collect()
  }

  async fn query_spot(&self, id: Uuid) -> Result<Option<Spot>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_spot(conn, &id_str)?))
      .await?;
    decode_spot(raw)
  }

  async fn update_spot_row(
    &self,
    id: Uuid,
    patch: SpotPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<Option<Spot>> {
    let id_str     = encode_uuid(id);
    let at_str     = encode_dt(updated_at);
    let label      = format!("another spot with the name and address given for {id}");
    let SpotPatch { name, address, capacity, image } = patch;

    let outcome = self
      .conn
      .call(move |conn| {
        let changed = match conn.execute(
          "UPDATE spots SET
             name       = COALESCE(?2, name),
             address    = COALESCE(?3, address),
             capacity   = COALESCE(?4, capacity),
             image      = CASE WHEN ?5 IS NULL THEN image
                               WHEN ?5 = ''   THEN NULL
                               ELSE ?5 END,
             updated_at = ?6
           WHERE spot_id = ?1",
          rusqlite::params![id_str, name, address, capacity, image, at_str],
        ) {
          Ok(n) => n,
          Err(e) if is_unique_violation(&e) => return Ok(Err(())),
          Err(e) => return Err(e.into()),
        };
        if changed == 0 {
          return Ok(Ok(None));
        }
        Ok(Ok(load_spot(conn, &id_str)?))
      })
      .await?;

    match outcome {
      Ok(raw) => decode_spot(raw),
      Err(()) => Err(Error::Duplicate(label)),
    }
  }

  async fn delete_spot_rows(&self, id: Uuid) -> Result<Option<Spot>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_spot(&tx, &id_str)? else { return Ok(None) };
        tx.execute("DELETE FROM reviews WHERE spot_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM spot_factors WHERE spot_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM spots WHERE spot_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;
    decode_spot(raw)
  }

  // ── Factors ───────────────────────────────────────────────────────────────

  async fn query_factors(&self, spot_id: Uuid) -> Result<Option<FactorSet>> {
    let id_str = encode_uuid(spot_id);
    let rows: Option<Vec<RawFactor>> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM spots WHERE spot_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }
        let mut stmt = conn
          .prepare(&format!("SELECT {FACTOR_COLUMNS} FROM spot_factors WHERE spot_id = ?1"))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawFactor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;
    rows.map(assemble_factors).transpose()
  }

  async fn upsert_factor(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    entry: FactorEntry,
  ) -> Result<bool> {
    let id_str   = encode_uuid(spot_id);
    let kind_str = encode_kind(kind);
    let date_str = entry.last_date.map(encode_date);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO spot_factors (spot_id, kind, average, sample_count, last_date)
           SELECT ?1, ?2, ?3, ?4, ?5
           WHERE EXISTS (SELECT 1 FROM spots WHERE spot_id = ?1)
           ON CONFLICT (spot_id, kind) DO UPDATE SET
             average      = excluded.average,
             sample_count = excluded.sample_count,
             last_date    = excluded.last_date",
          rusqlite::params![id_str, kind_str, entry.average, entry.sample_count, date_str],
        )?)
      })
      .await?;

    tracing::debug!(%spot_id, %kind, changed, "factor row written");
    Ok(changed > 0)
  }

  async fn reset_factor_row(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    today: NaiveDate,
  ) -> Result<Option<FactorEntry>> {
    let id_str   = encode_uuid(spot_id);
    let kind_str = encode_kind(kind);
    let date_str = encode_date(today);

    let (changed, row) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // A row already stamped today holds samples submitted after the
        // caller's snapshot; leave it alone.
        let changed = tx.execute(
          "INSERT INTO spot_factors (spot_id, kind, average, sample_count, last_date)
           SELECT ?1, ?2, 0.0, 0, ?3
           WHERE EXISTS (SELECT 1 FROM spots WHERE spot_id = ?1)
           ON CONFLICT (spot_id, kind) DO UPDATE SET
             average      = 0.0,
             sample_count = 0,
             last_date    = excluded.last_date
           WHERE spot_factors.last_date IS NOT excluded.last_date",
          rusqlite::params![id_str, kind_str, date_str],
        )?;
        let row = tx
          .query_row(
            &format!("SELECT {FACTOR_COLUMNS} FROM spot_factors WHERE spot_id = ?1 AND kind = ?2"),
            rusqlite::params![id_str, kind_str],
            RawFactor::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok((changed, row))
      })
      .await?;

    tracing::debug!(%spot_id, %kind, changed, "factor row reset");
    row.map(|raw| raw.into_entry().map(|(_, entry)| entry)).transpose()
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn insert_review_row(&self, review: Review) -> Result<()> {
    let review_id = review.review_id;
    let id_str      = encode_uuid(review.review_id);
    let spot_str    = encode_uuid(review.spot_id);
    let created_str = encode_dt(review.created_at);
    let updated_str = encode_dt(review.updated_at);
    let Review { user_id, title, text, rating, .. } = review;

    let inserted = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO reviews (
             review_id, spot_id, user_id, title, body, rating, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, spot_str, user_id, title, text, rating, created_str, updated_str
          ],
        ) {
          Ok(_) => Ok(true),
          Err(e) if is_unique_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::Duplicate(format!("review {review_id}")));
    }
    Ok(())
  }

  async fn query_review(&self, id: Uuid) -> Result<Option<Review>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_review(conn, &id_str)?))
      .await?;
    raw.map(RawReview::into_review).transpose()
  }

  async fn query_reviews(&self, spot_id: Uuid) -> Result<Vec<Review>> {
    let id_str = encode_uuid(spot_id);
    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REVIEW_COLUMNS} FROM reviews
           WHERE spot_id = ?1
           ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn update_review_row(
    &self,
    id: Uuid,
    patch: ReviewPatch,
    updated_at: DateTime<Utc>,
  ) -> Result<Option<Review>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(updated_at);
    let ReviewPatch { title, text, rating } = patch;

    let raw = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE reviews SET
             title      = COALESCE(?2, title),
             body       = COALESCE(?3, body),
             rating     = COALESCE(?4, rating),
             updated_at = ?5
           WHERE review_id = ?1",
          rusqlite::params![id_str, title, text, rating, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(load_review(conn, &id_str)?)
      })
      .await?;
    raw.map(RawReview::into_review).transpose()
  }

  async fn delete_review_row(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM reviews WHERE review_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Blobs ─────────────────────────────────────────────────────────────────

  async fn insert_blob(&self, input: NewBlob) -> Result<Blob> {
    let blob = Blob {
      blob_id:      Uuid::new_v4(),
      content_hash: hex::encode(Sha256::digest(&input.data)),
      filename:     input.filename,
      media_type:   input.media_type,
      data:         input.data,
      created_at:   Utc::now(),
    };

    let id_str   = encode_uuid(blob.blob_id);
    let at_str   = encode_dt(blob.created_at);
    let filename = blob.filename.clone();
    let media    = blob.media_type.clone();
    let hash     = blob.content_hash.clone();
    let data     = blob.data.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO blobs (blob_id, filename, media_type, content_hash, data, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, filename, media, hash, data, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(blob_id = %blob.blob_id, bytes = blob.data.len(), "blob stored");
    Ok(blob)
  }

  async fn query_blob(&self, id: Uuid) -> Result<Option<Blob>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawBlob> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT blob_id, filename, media_type, content_hash, data, created_at
             FROM blobs WHERE blob_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawBlob {
                blob_id:      row.get(0)?,
                filename:     row.get(1)?,
                media_type:   row.get(2)?,
                content_hash: row.get(3)?,
                data:         row.get(4)?,
                created_at:   row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;
    raw.map(RawBlob::into_blob).transpose()
  }

  async fn delete_blob_row(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM blobs WHERE blob_id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(changed > 0)
  }
}

// ─── SpotStore impl ──────────────────────────────────────────────────────────

impl SpotStore for SqliteStore {
  async fn insert_spot(&self, spot: Spot) -> hotspots_core::Result<()> {
    self.insert_spot_row(spot).await.map_err(Into::into)
  }

  async fn list_spots(&self) -> hotspots_core::Result<Vec<Spot>> {
    self.query_spots().await.map_err(Into::into)
  }

  async fn get_spot(&self, id: Uuid) -> hotspots_core::Result<Option<Spot>> {
    self.query_spot(id).await.map_err(Into::into)
  }

  async fn update_spot(
    &self,
    id: Uuid,
    patch: SpotPatch,
    updated_at: DateTime<Utc>,
  ) -> hotspots_core::Result<Option<Spot>> {
    self.update_spot_row(id, patch, updated_at).await.map_err(Into::into)
  }

  async fn delete_spot(&self, id: Uuid) -> hotspots_core::Result<Option<Spot>> {
    self.delete_spot_rows(id).await.map_err(Into::into)
  }

  async fn get_factors(&self, spot_id: Uuid) -> hotspots_core::Result<Option<FactorSet>> {
    self.query_factors(spot_id).await.map_err(Into::into)
  }

  async fn save_factor(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    entry: FactorEntry,
  ) -> hotspots_core::Result<bool> {
    self.upsert_factor(spot_id, kind, entry).await.map_err(Into::into)
  }

  async fn reset_factor(
    &self,
    spot_id: Uuid,
    kind: FactorKind,
    today: NaiveDate,
  ) -> hotspots_core::Result<Option<FactorEntry>> {
    self.reset_factor_row(spot_id, kind, today).await.map_err(Into::into)
  }

  async fn insert_review(&self, review: Review) -> hotspots_core::Result<()> {
    self.insert_review_row(review).await.map_err(Into::into)
  }

  async fn get_review(&self, id: Uuid) -> hotspots_core::Result<Option<Review>> {
    self.query_review(id).await.map_err(Into::into)
  }

  async fn list_reviews(&self, spot_id: Uuid) -> hotspots_core::Result<Vec<Review>> {
    self.query_reviews(spot_id).await.map_err(Into::into)
  }

  async fn update_review(
    &self,
    id: Uuid,
    patch: ReviewPatch,
    updated_at: DateTime<Utc>,
  ) -> hotspots_core::Result<Option<Review>> {
    self.update_review_row(id, patch, updated_at).await.map_err(Into::into)
  }

  async fn delete_review(&self, id: Uuid) -> hotspots_core::Result<bool> {
    self.delete_review_row(id).await.map_err(Into::into)
  }
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for SqliteStore {
  async fn put_blob(&self, blob: NewBlob) -> hotspots_core::Result<Blob> {
    self.insert_blob(blob).await.map_err(Into::into)
  }

  async fn get_blob(&self, id: Uuid) -> hotspots_core::Result<Option<Blob>> {
    self.query_blob(id).await.map_err(Into::into)
  }

  async fn delete_blob(&self, id: Uuid) -> hotspots_core::Result<bool> {
    self.delete_blob_row(id).await.map_err(Into::into)
  }
}
