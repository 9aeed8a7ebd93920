//! v001 -- Initial schema creation.
//!
//! Creates the two core tables: `documents` (schemaless JSON bodies keyed by
//! collection + id) and `accounts` (the authentication registry).

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Documents
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,                 -- opaque string id
    body       TEXT NOT NULL,                 -- JSON document body
    updated_at TEXT NOT NULL,                 -- ISO-8601 / RFC-3339

    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection
    ON documents(collection, updated_at);

-- ----------------------------------------------------------------
-- Accounts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS accounts (
    id              TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    email           TEXT NOT NULL UNIQUE,
    password_salt   TEXT NOT NULL,              -- hex, empty for provider/guest
    password_digest TEXT NOT NULL,              -- hex blake3, empty likewise
    display_name    TEXT NOT NULL,
    is_anonymous    INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    photo_url       TEXT,
    created_at      TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
