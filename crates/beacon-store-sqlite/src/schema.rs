//! SQL schema for the Beacon SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are never deleted. The only UPDATE ever issued clears is_active.
CREATE TABLE IF NOT EXISTS locations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    latitude    INTEGER NOT NULL,   -- units of 1e-8 degree
    longitude   INTEGER NOT NULL,   -- units of 1e-8 degree
    address     TEXT    NOT NULL,
    city        TEXT    NOT NULL,
    state       TEXT    NOT NULL,
    country     TEXT    NOT NULL,
    updated_by  TEXT    NOT NULL,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC, microseconds; server-assigned
    is_active   INTEGER NOT NULL DEFAULT 1,
    CHECK (latitude  BETWEEN  -9000000000 AND  9000000000),
    CHECK (longitude BETWEEN -18000000000 AND 18000000000),
    CHECK (is_active IN (0, 1))
);

-- At most one active row, and O(1) lookup of it.
CREATE UNIQUE INDEX IF NOT EXISTS locations_active_idx
    ON locations(is_active) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS device_sessions (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    device_id         TEXT    NOT NULL UNIQUE,
    last_seen         TEXT    NOT NULL,
    push_subscription TEXT,
    is_active         INTEGER NOT NULL DEFAULT 1
);

PRAGMA user_version = 1;
";
