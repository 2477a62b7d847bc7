//! SQL schema for the Discuss SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Arguments are append-only. AUTOINCREMENT keeps ids strictly increasing
-- and never reused, which is what the feeds order by.
-- in_response_to deliberately has no foreign key: responses may dangle.
CREATE TABLE IF NOT EXISTS arguments (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    author_id      INTEGER NOT NULL,
    body           TEXT    NOT NULL CHECK (length(body) > 0),
    title          TEXT,
    in_response_to INTEGER,
    span_start     INTEGER,
    span_end       INTEGER,
    created_at     TEXT    NOT NULL,   -- RFC 3339 UTC; server-assigned
    CHECK ((span_start IS NULL) = (span_end IS NULL)),
    CHECK (span_start IS NULL OR span_start <= span_end)
);

-- Tag names are not unique.
CREATE TABLE IF NOT EXISTS tags (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS argument_tags (
    argument_id INTEGER NOT NULL REFERENCES arguments(id),
    tag_id      INTEGER NOT NULL REFERENCES tags(id)
);

-- One row per (user, argument); toggled, never updated.
CREATE TABLE IF NOT EXISTS votes (
    user_id     INTEGER NOT NULL,
    argument_id INTEGER NOT NULL REFERENCES arguments(id),
    PRIMARY KEY (user_id, argument_id)
);

CREATE INDEX IF NOT EXISTS arguments_parent_idx  ON arguments(in_response_to);
CREATE INDEX IF NOT EXISTS arguments_author_idx  ON arguments(author_id);
CREATE INDEX IF NOT EXISTS argument_tags_arg_idx ON argument_tags(argument_id);
CREATE INDEX IF NOT EXISTS votes_argument_idx    ON votes(argument_id);

PRAGMA user_version = 1;
";
