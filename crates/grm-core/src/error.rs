//! Error types for `grm-core`.

use thiserror::Error;

use crate::status::ALLOWED_STATUSES;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid status. Allowed: {allowed}", allowed = ALLOWED_STATUSES)]
  InvalidStatus(String),

  #[error("Description is required")]
  MissingDescription,

  #[error("unknown category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown priority: {0:?}")]
  UnknownPriority(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown user status: {0:?}")]
  UnknownUserStatus(String),

  #[error("Password must be at least {min} characters", min = crate::user::MIN_PASSWORD_LEN)]
  PasswordTooShort,

  #[error("Email is required")]
  MissingEmail,

  #[error("Title is required")]
  MissingTitle,

  #[error("Slug is required")]
  MissingSlug,

  #[error("unknown content status: {0:?}")]
  UnknownContentStatus(String),

  #[error("unknown visibility: {0:?}")]
  UnknownVisibility(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
