//! SQL schema for the Hotspots SQLite store.
//!
//! Executed on every open. The layout version is recorded in
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS spots (
    spot_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    address     TEXT NOT NULL,
    capacity    TEXT NOT NULL DEFAULT '',
    image       TEXT,              -- external URL or /images/{blob_id}
    created_at  TEXT NOT NULL,     -- ISO 8601 UTC
    updated_at  TEXT NOT NULL,
    UNIQUE (name, address)
);

-- One row per (spot, factor kind); a write to one kind never touches another.
CREATE TABLE IF NOT EXISTS spot_factors (
    spot_id      TEXT NOT NULL REFERENCES spots(spot_id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,    -- 'availability' | 'noise' | 'temperature' | 'ambiance'
    average      REAL NOT NULL DEFAULT 0,
    sample_count INTEGER NOT NULL DEFAULT 0,
    last_date    TEXT,             -- YYYY-MM-DD of the samples, NULL if never rated
    PRIMARY KEY (spot_id, kind)
);

CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    spot_id     TEXT NOT NULL REFERENCES spots(spot_id) ON DELETE CASCADE,
    user_id     TEXT NOT NULL,
    title       TEXT NOT NULL,
    body        TEXT NOT NULL,
    rating      INTEGER NOT NULL,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS blobs (
    blob_id      TEXT PRIMARY KEY,
    filename     TEXT NOT NULL,
    media_type   TEXT NOT NULL,
    content_hash TEXT NOT NULL,    -- SHA-256 hex of data
    data         BLOB NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS reviews_spot_idx ON reviews(spot_id);
CREATE INDEX IF NOT EXISTS reviews_user_idx ON reviews(user_id);

PRAGMA user_version = 1;
";
