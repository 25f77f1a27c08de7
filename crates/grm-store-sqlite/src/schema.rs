//! SQL schema for the GRM SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    role          TEXT NOT NULL DEFAULT 'user',
    status        TEXT NOT NULL DEFAULT 'active',
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Grievances are never deleted. Only the lifecycle columns (status, SLA
-- stamps, history_json, updated_at) are ever updated after insert.
CREATE TABLE IF NOT EXISTS grievances (
    grievance_id      TEXT PRIMARY KEY,
    report_id         TEXT NOT NULL UNIQUE,   -- G-####
    reporter_name     TEXT,
    reporter_phone    TEXT,
    reporter_email    TEXT,
    category          TEXT NOT NULL DEFAULT 'Other',
    description       TEXT NOT NULL,
    status            TEXT NOT NULL DEFAULT 'open',
    priority          TEXT NOT NULL DEFAULT 'Low',
    assigned_to       TEXT,
    district          TEXT,
    chiefdom          TEXT,
    village           TEXT,
    gps_json          TEXT,                   -- {\"lat\":..,\"lng\":..} or NULL
    attachments_json  TEXT NOT NULL DEFAULT '[]',
    submitted_at      TEXT NOT NULL,
    first_response_at TEXT,
    resolved_at       TEXT,
    history_json      TEXT NOT NULL DEFAULT '[]',
    created_by        TEXT,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Content is archived, never deleted. Snapshots taken on approval live in
-- versions_json.
CREATE TABLE IF NOT EXISTS content (
    content_id    TEXT PRIMARY KEY,
    slug          TEXT NOT NULL UNIQUE,
    title         TEXT NOT NULL,
    summary       TEXT,
    body          TEXT,
    category      TEXT,
    tags_json     TEXT NOT NULL DEFAULT '[]',
    status        TEXT NOT NULL DEFAULT 'draft',
    visibility    TEXT NOT NULL DEFAULT 'internal',
    version       INTEGER NOT NULL DEFAULT 1,
    versions_json TEXT NOT NULL DEFAULT '[]',
    created_by    TEXT,
    updated_by    TEXT,
    published_by  TEXT,
    published_at  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

-- Bearer sessions; only the SHA-256 of the token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS grievances_status_idx  ON grievances(status);
CREATE INDEX IF NOT EXISTS grievances_created_idx ON grievances(created_at);
CREATE INDEX IF NOT EXISTS content_status_idx     ON content(status);
CREATE INDEX IF NOT EXISTS sessions_user_idx      ON sessions(user_id);

PRAGMA user_version = 1;
";
