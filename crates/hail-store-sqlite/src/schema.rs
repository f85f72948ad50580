//! SQL schema for the Hail SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per ride. Rows are updated in place as the ride advances but are
-- never deleted.
CREATE TABLE IF NOT EXISTS rides (
    ride_id             TEXT PRIMARY KEY,
    rider_id            TEXT NOT NULL,
    pickup_location     TEXT NOT NULL,
    destination         TEXT NOT NULL,
    status              TEXT NOT NULL,   -- RideStatus::as_str
    driver_id           TEXT,            -- driver columns are all NULL or all set
    driver_name         TEXT,
    driver_vehicle      TEXT,
    fare_cents          INTEGER CHECK (fare_cents >= 0),
    eta_minutes         INTEGER CHECK (eta_minutes > 0),
    pickup_time         TEXT,            -- ISO 8601 UTC
    cancellation_reason TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS rides_rider_idx ON rides(rider_id, created_at);

PRAGMA user_version = 1;
";
