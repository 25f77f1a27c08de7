//! Bearer-token sessions, password hashing, and the [`CurrentUser`]
//! extractor.
//!
//! Tokens are 32 random bytes handed to the client as unpadded base64url.
//! The store only ever sees the SHA-256 hex digest of a token.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use grm_core::{
  store::GrmStore,
  user::{Role, Session, User},
};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

use crate::{AppState, error::ApiError};

/// Session lifetime when none is configured.
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Knobs for issuing sessions.
#[derive(Debug, Clone)]
pub struct SessionSettings {
  pub ttl: Duration,
}

impl Default for SessionSettings {
  fn default() -> Self {
    Self {
      ttl: Duration::days(DEFAULT_SESSION_TTL_DAYS),
    }
  }
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// `true` if `password` matches the PHC string `hash`. A malformed hash
/// never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// A freshly issued bearer token and the session that backs it.
pub struct IssuedToken {
  pub token:   String,
  pub session: Session,
}

pub fn issue_token(user: &User, settings: &SessionSettings, now: DateTime<Utc>) -> IssuedToken {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  let token = B64.encode(bytes);

  IssuedToken {
    session: Session {
      token_hash: hash_token(&token),
      user_id:    user.id,
      created_at: now,
      expires_at: now + settings.ttl,
    },
    token,
  }
}

/// SHA-256 hex digest of a bearer token; the only form the store keeps.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated user behind the request's bearer token.
pub struct CurrentUser {
  pub user:       User,
  pub token_hash: String,
}

impl CurrentUser {
  /// Reject with 403 unless the user's role passes `allowed`.
  pub fn require(&self, allowed: impl Fn(Role) -> bool) -> Result<(), ApiError> {
    if allowed(self.user.role) {
      Ok(())
    } else {
      tracing::warn!(user = %self.user.email, role = %self.user.role, "insufficient permissions");
      Err(ApiError::Forbidden)
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("Not authorized, token missing".into()))?;
    let token_hash = hash_token(token);

    let session = state
      .store
      .get_session(&token_hash)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| {
        tracing::warn!("unknown bearer token");
        ApiError::Unauthorized("Invalid or expired token".into())
      })?;

    if session.is_expired(Utc::now()) {
      if let Err(e) = state.store.delete_session(&token_hash).await {
        tracing::warn!(error = %e, "failed to purge expired session");
      }
      return Err(ApiError::Unauthorized("Invalid or expired token".into()));
    }

    let user = state
      .store
      .get_user(session.user_id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized("User no longer exists".into()))?;

    if !user.is_active() {
      return Err(ApiError::Unauthorized("Account disabled".into()));
    }

    Ok(CurrentUser { user, token_hash })
  }
}
