//! Error type for `grm-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] grm_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Two creations computed the same report id; the UNIQUE constraint
  /// rejected the second insert.
  #[error("report id collision")]
  ReportIdCollision,

  #[error("email already registered: {0}")]
  DuplicateEmail(String),

  #[error("slug already in use: {0}")]
  DuplicateSlug(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// `true` if `err` is SQLite rejecting a write on a UNIQUE/PRIMARY KEY
/// constraint.
pub(crate) fn is_constraint_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.code == rusqlite::ErrorCode::ConstraintViolation
  )
}
