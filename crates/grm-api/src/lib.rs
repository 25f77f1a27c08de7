//! JSON REST API for the GRM portal.
//!
//! Exposes an axum [`Router`] backed by any [`grm_core::store::GrmStore`].
//! TLS, CORS and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", grm_api::api_router(state))
//! ```

pub mod auth;
pub mod content;
pub mod error;
pub mod extract;
pub mod grievances;
pub mod sessions;
pub mod track;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use grm_core::store::GrmStore;

pub use auth::SessionSettings;
pub use error::ApiError;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S: GrmStore> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionSettings>,
}

impl<S: GrmStore> AppState<S> {
  pub fn new(store: Arc<S>, sessions: SessionSettings) -> Self {
    Self {
      store,
      sessions: Arc::new(sessions),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Grievances
    .route("/grievances", get(grievances::list::<S>).post(grievances::create::<S>))
    .route("/grievances/{id}", get(grievances::get_one::<S>))
    .route("/grievances/{id}/status", put(grievances::update::<S>))
    // Public tracking
    .route("/track/{report_id}", get(track::handler::<S>))
    // Auth
    .route("/auth/login", post(sessions::login::<S>))
    .route("/auth/me", get(sessions::me))
    .route("/auth/logout", post(sessions::logout::<S>))
    // Content
    .route("/content/public", get(content::public_list::<S>))
    .route("/content/public/{slug}", get(content::public_get::<S>))
    .route("/content", get(content::list::<S>).post(content::create::<S>))
    .route(
      "/content/{id}",
      get(content::get_one::<S>)
        .put(content::update::<S>)
        .delete(content::archive::<S>),
    )
    .route("/content/{id}/submit", put(content::submit::<S>))
    .route("/content/{id}/approve", put(content::approve::<S>))
    .route("/content/{id}/publish", put(content::publish::<S>))
    .route("/content/{id}/revert/{version}", put(content::revert::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::delete_one::<S>),
    )
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
