//! SQL schema for the Vouch SQLite stores.

/// Keyed JSON documents grouped by collection. Bodies are opaque to SQL.
pub const DOCUMENTS: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    key         TEXT NOT NULL,
    body        TEXT NOT NULL,   -- JSON
    updated_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (collection, key)
);

PRAGMA user_version = 1;
";

/// Single-device string key-value items.
pub const LOCAL_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS local_items (
    key    TEXT PRIMARY KEY,
    value  TEXT NOT NULL
);
";
