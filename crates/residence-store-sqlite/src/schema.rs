//! SQL schema for the residence SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS buildings (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL,
    address  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS rooms (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    building_id  INTEGER NOT NULL REFERENCES buildings(id) ON DELETE CASCADE,
    room_number  TEXT NOT NULL,
    capacity     INTEGER NOT NULL
);

-- Dates are ISO 8601 (YYYY-MM-DD) so text comparison is date comparison.
CREATE TABLE IF NOT EXISTS residents (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name      TEXT NOT NULL,
    last_name       TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    room_id         INTEGER REFERENCES rooms(id) ON DELETE SET NULL,
    check_in_date   TEXT NOT NULL,
    check_out_date  TEXT,
    notes_sealed    TEXT,            -- base64(wrapped key) '.' base64(ciphertext)
    CHECK (check_out_date IS NULL OR check_out_date >= check_in_date)
);

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    username       TEXT NOT NULL UNIQUE,
    password_hash  TEXT NOT NULL,
    is_admin       INTEGER NOT NULL DEFAULT 0,
    date_joined    TEXT NOT NULL   -- RFC 3339 UTC
);

-- At most one token per user.
CREATE TABLE IF NOT EXISTS tokens (
    key         TEXT PRIMARY KEY,
    user_id     INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS rooms_building_idx ON rooms(building_id);
CREATE INDEX IF NOT EXISTS residents_room_idx ON residents(room_id);

PRAGMA user_version = 1;
";
