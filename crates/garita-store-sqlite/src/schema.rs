//! SQL schema for the Garita SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per visit span. Created 'activo'; the closure UPDATE is the only
-- mutation ever issued, and only against an 'activo' row.
CREATE TABLE IF NOT EXISTS entries (
    entry_id        TEXT PRIMARY KEY,
    document_number TEXT NOT NULL,
    document_kind   TEXT NOT NULL,   -- 'dni' | 'foreign'
    pass_number     TEXT,
    full_name       TEXT NOT NULL,
    category        TEXT NOT NULL,   -- 'contratista' | 'cliente' | 'visita'
    client          TEXT NOT NULL,
    unit            TEXT NOT NULL,
    state           TEXT NOT NULL,   -- 'activo' | 'cerrado'
    entered_at      TEXT NOT NULL,   -- RFC 3339 UTC, fixed precision
    exited_at       TEXT,
    company         TEXT,
    contact_person  TEXT,
    reason          TEXT,
    notes           TEXT,
    exit_notes      TEXT,
    registered_by   TEXT,
    closed_by       TEXT
);

CREATE INDEX IF NOT EXISTS entries_document_idx ON entries(document_number, entered_at);
CREATE INDEX IF NOT EXISTS entries_scope_idx    ON entries(client, unit, state);
CREATE INDEX IF NOT EXISTS entries_entered_idx  ON entries(entered_at);

CREATE TABLE IF NOT EXISTS clients (
    client_name TEXT PRIMARY KEY
);

-- Unit lists are explicit and ordered; position is the display order.
CREATE TABLE IF NOT EXISTS client_units (
    client_name TEXT NOT NULL REFERENCES clients(client_name) ON DELETE CASCADE,
    position    INTEGER NOT NULL,
    unit_name   TEXT NOT NULL,
    PRIMARY KEY (client_name, position)
);

PRAGMA user_version = 1;
";
