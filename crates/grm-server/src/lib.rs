//! HTTP server assembly for the GRM portal.
//!
//! Wires the JSON API from `grm-api` under `/api`, adds a liveness check,
//! request tracing and CORS, and seeds the first administrator.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::{Json, Router, http::HeaderValue, routing::get};
use grm_api::{AppState, SessionSettings, api_router};
use grm_core::{
  store::GrmStore,
  user::{NewUser, Role, User, normalize_email},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GRM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  #[serde(default = "default_session_ttl_days")]
  pub session_ttl_days: i64,
  /// Empty means any origin.
  #[serde(default)]
  pub allowed_origins:  Vec<String>,
  pub bootstrap_admin:  Option<BootstrapAdmin>,
}

/// The administrator created on first start, while no users exist.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapAdmin {
  #[serde(default = "default_admin_name")]
  pub name:          String,
  pub email:         String,
  /// argon2 PHC string, see `--hash-password`.
  pub password_hash: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 5000 }
fn default_store_path() -> PathBuf { PathBuf::from("grm.db") }
fn default_session_ttl_days() -> i64 { grm_api::auth::DEFAULT_SESSION_TTL_DAYS }
fn default_admin_name() -> String { "Administrator".to_owned() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      session_ttl_days: default_session_ttl_days(),
      allowed_origins:  Vec::new(),
      bootstrap_admin:  None,
    }
  }
}

impl ServerConfig {
  pub fn session_settings(&self) -> anyhow::Result<SessionSettings> {
    anyhow::ensure!(
      self.session_ttl_days > 0,
      "session_ttl_days must be positive, got {}",
      self.session_ttl_days
    );
    Ok(SessionSettings {
      ttl: chrono::Duration::days(self.session_ttl_days),
    })
  }

  fn cors_layer(&self) -> anyhow::Result<CorsLayer> {
    let origin = if self.allowed_origins.is_empty() {
      AllowOrigin::from(Any)
    } else {
      let origins = self
        .allowed_origins
        .iter()
        .map(|o| {
          HeaderValue::from_str(o).with_context(|| format!("invalid origin {o:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
      AllowOrigin::list(origins)
    };

    Ok(
      CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any),
    )
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(store: Arc<S>, config: &ServerConfig) -> anyhow::Result<Router>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let state = AppState::new(store, config.session_settings()?);

  Ok(
    Router::new()
      .route("/health", get(health))
      .nest("/api", api_router(state))
      .layer(TraceLayer::new_for_http())
      .layer(config.cors_layer()?),
  )
}

async fn health() -> Json<Value> { Json(json!({ "success": true, "status": "ok" })) }

// ─── Bootstrap ────────────────────────────────────────────────────────────────

/// Create the configured administrator if the user table is empty.
///
/// Returns the created user, or `None` when nothing was done.
pub async fn bootstrap_admin<S>(
  store: &S,
  admin: Option<&BootstrapAdmin>,
) -> anyhow::Result<Option<User>>
where
  S: GrmStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let Some(admin) = admin else {
    return Ok(None);
  };
  if store.count_users().await? > 0 {
    return Ok(None);
  }

  let user = store
    .create_user(NewUser {
      name:          admin.name.trim().to_owned(),
      email:         normalize_email(&admin.email)?,
      password_hash: admin.password_hash.clone(),
      role:          Role::Admin,
    })
    .await?;

  tracing::info!(email = %user.email, "bootstrap administrator created");
  Ok(Some(user))
}
