//! SQL schema for the practices & prescriptions store.
//!
//! Applied by `create` rather than on open, so ingesting into an unprovisioned
//! database fails loudly instead of silently creating empty tables.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Reference data, imported once. Keys are normalized postcodes.
CREATE TABLE IF NOT EXISTS postcodes (
    postcode  TEXT PRIMARY KEY,
    latitude  REAL NOT NULL,
    longitude REAL NOT NULL
);

-- One row per practice per period. Rows are never deleted.
CREATE TABLE IF NOT EXISTS addressbook (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    period        TEXT NOT NULL,   -- YYYYMM
    practice_ref  TEXT NOT NULL,
    title         TEXT NOT NULL,
    address_line1 TEXT NOT NULL,
    address_line2 TEXT,
    city          TEXT,
    county        TEXT,
    area          TEXT,
    postcode      TEXT NOT NULL,   -- as supplied, not normalized
    lat           REAL NOT NULL DEFAULT 0,
    lon           REAL NOT NULL DEFAULT 0,
    UNIQUE (period, practice_ref)
);

CREATE TABLE IF NOT EXISTS prescriptions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    sha          TEXT,
    pct          TEXT,
    practice_ref TEXT NOT NULL,
    bnf_code     TEXT,
    bnf_name     TEXT,
    items        INTEGER,
    nic          REAL,
    act_cost     REAL,
    quantity     INTEGER,
    period       TEXT,
    extra        TEXT,
    address_id   INTEGER NOT NULL DEFAULT 0   -- addressbook.id, 0 if unknown
);

CREATE INDEX IF NOT EXISTS prescriptions_practice_idx ON prescriptions(practice_ref);
CREATE INDEX IF NOT EXISTS prescriptions_bnf_code_idx ON prescriptions(bnf_code);
CREATE INDEX IF NOT EXISTS prescriptions_identity_idx ON prescriptions(practice_ref, period);

PRAGMA user_version = 1;
";
