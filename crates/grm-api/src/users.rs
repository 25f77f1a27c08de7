//! Handlers for `/users` endpoints. Admin only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users` | All users, oldest first |
//! | `POST`   | `/users` | Body: [`CreateBody`]; 409 if the email is taken |
//! | `GET`    | `/users/:id` | 404 if not found |
//! | `PUT`    | `/users/:id` | Body: [`UpdateBody`]; absent fields are left unchanged |
//! | `DELETE` | `/users/:id` | Also revokes the user's sessions |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use grm_core::{
  store::GrmStore,
  user::{
    NewUser, Role, UNNAMED_USER, UserPatch, UserStatus, check_password_len,
    normalize_email,
  },
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  auth::{CurrentUser, hash_password},
  error::ApiError,
  extract::{AppJson, AppPath},
};

fn not_found() -> ApiError { ApiError::NotFound("User not found".into()) }

fn hash(password: &str) -> Result<String, ApiError> {
  check_password_len(password)?;
  hash_password(password).map_err(|e| ApiError::PasswordHash(e.to_string()))
}

async fn ensure_email_free<S>(
  store: &S,
  email: &str,
  except: Option<Uuid>,
) -> Result<(), ApiError>
where
  S: GrmStore,
{
  let existing = store.get_credentials(email).await.map_err(ApiError::store)?;
  match existing {
    Some(c) if Some(c.user.id) != except => {
      Err(ApiError::Conflict("User already exists".into()))
    }
    _ => Ok(()),
  }
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "users": users })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:     Option<String>,
  pub email:    String,
  pub password: String,
  pub role:     Option<Role>,
}

/// `POST /users`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppJson(body): AppJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;

  let email = normalize_email(&body.email)?;
  ensure_email_free(state.store.as_ref(), &email, None).await?;
  let password_hash = hash(&body.password)?;

  let name = body
    .name
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
    .unwrap_or_else(|| UNNAMED_USER.to_owned());

  let user = state
    .store
    .create_user(NewUser {
      name,
      email,
      password_hash,
      role: body.role.unwrap_or_default(),
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(email = %user.email, role = %user.role, by = %current.user.email, "user created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "user": user })),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;
  let user = state
    .store
    .get_user(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  Ok(Json(json!({ "success": true, "user": user })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub role:     Option<Role>,
  pub status:   Option<UserStatus>,
  pub password: Option<String>,
}

/// `PUT /users/:id`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
  AppJson(body): AppJson<UpdateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;

  let email = body.email.as_deref().map(normalize_email).transpose()?;
  if let Some(email) = &email {
    ensure_email_free(state.store.as_ref(), email, Some(id)).await?;
  }
  let password_hash = body.password.as_deref().map(hash).transpose()?;

  let patch = UserPatch {
    name: body
      .name
      .map(|n| n.trim().to_owned())
      .filter(|n| !n.is_empty()),
    email,
    role: body.role,
    status: body.status,
    password_hash,
  };

  let user = state
    .store
    .update_user(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;

  tracing::info!(email = %user.email, by = %current.user.email, "user updated");
  Ok(Json(json!({ "success": true, "user": user })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/:id`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;

  let deleted = state.store.delete_user(id).await.map_err(ApiError::store)?;
  if !deleted {
    return Err(not_found());
  }

  tracing::info!(user_id = %id, by = %current.user.email, "user deleted");
  Ok(Json(json!({ "success": true, "message": "User deleted" })))
}
