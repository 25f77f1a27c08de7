//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/login` | Body: `{"email":"...","password":"..."}`; returns a bearer token |
//! | `GET`  | `/auth/me` | The authenticated user |
//! | `POST` | `/auth/logout` | Revokes the presented token |

use axum::{Json, extract::State};
use chrono::Utc;
use grm_core::{store::GrmStore, user::normalize_email};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{CurrentUser, issue_token, verify_password},
  error::ApiError,
  extract::AppJson,
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  AppJson(body): AppJson<LoginBody>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let invalid = || ApiError::Unauthorized("Invalid credentials".into());

  let email = normalize_email(&body.email).map_err(|_| invalid())?;
  let creds = state
    .store
    .get_credentials(&email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(invalid)?;

  if !verify_password(&body.password, &creds.password_hash) {
    tracing::warn!(%email, "failed login");
    return Err(invalid());
  }
  if !creds.user.is_active() {
    tracing::warn!(%email, "login attempt on disabled account");
    return Err(ApiError::Unauthorized("Account disabled".into()));
  }

  let issued = issue_token(&creds.user, &state.sessions, Utc::now());
  state
    .store
    .create_session(issued.session)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%email, "login");
  Ok(Json(json!({
    "success": true,
    "token": issued.token,
    "user": creds.user,
  })))
}

/// `GET /auth/me`
pub async fn me(current: CurrentUser) -> Json<Value> {
  Json(json!({ "success": true, "user": current.user }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .delete_session(&current.token_hash)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(json!({ "success": true, "message": "Logged out" })))
}
