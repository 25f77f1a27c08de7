//! Handlers for `/content` endpoints.
//!
//! | Method   | Path | Roles | Notes |
//! |----------|------|-------|-------|
//! | `GET`    | `/content/public` | public | Published, public items |
//! | `GET`    | `/content/public/:slug` | public | 404 unless published and public |
//! | `GET`    | `/content` | any | optional `status`, `visibility` |
//! | `GET`    | `/content/:id` | any | by UUID, falling back to slug |
//! | `POST`   | `/content` | any | Body: [`CreateBody`]; always a draft |
//! | `PUT`    | `/content/:id` | any | Body: [`UpdateBody`] |
//! | `PUT`    | `/content/:id/submit` | any | → `in_review` |
//! | `PUT`    | `/content/:id/approve` | admin | → `published`, new version |
//! | `PUT`    | `/content/:id/publish` | admin | → `published` |
//! | `PUT`    | `/content/:id/revert/:version` | any | restore a snapshot |
//! | `DELETE` | `/content/:id` | any | archives; nothing is deleted |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use grm_core::{
  content::{
    self, Content, ContentPatch, ContentQuery, ContentStatus, ContentSummary,
    NewContent, Visibility,
  },
  store::GrmStore,
  user::Role,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  auth::CurrentUser,
  error::ApiError,
  extract::{AppJson, AppPath, AppQuery},
};

fn not_found() -> ApiError { ApiError::NotFound("Not found".into()) }

fn summaries(items: Vec<Content>) -> Vec<ContentSummary> {
  items.into_iter().map(ContentSummary::from).collect()
}

async fn load<S>(state: &AppState<S>, id: Uuid) -> Result<Content, ApiError>
where
  S: GrmStore,
{
  state
    .store
    .get_content(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)
}

async fn save<S>(state: &AppState<S>, content: &Content) -> Result<(), ApiError>
where
  S: GrmStore,
{
  let saved = state
    .store
    .save_content(content)
    .await
    .map_err(ApiError::store)?;
  if saved { Ok(()) } else { Err(not_found()) }
}

// ─── Public ───────────────────────────────────────────────────────────────────

/// `GET /content/public`
pub async fn public_list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let items = state
    .store
    .list_content(&ContentQuery::public())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "items": summaries(items) })))
}

/// `GET /content/public/:slug`
pub async fn public_get<S>(
  State(state): State<AppState<S>>,
  AppPath(slug): AppPath<String>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let item = state
    .store
    .get_content_by_slug(&slug)
    .await
    .map_err(ApiError::store)?
    .filter(Content::is_public)
    .ok_or_else(not_found)?;
  Ok(Json(json!({ "success": true, "item": item })))
}

// ─── Internal reads ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub status:     Option<String>,
  pub visibility: Option<String>,
}

/// `GET /content[?status=...][&visibility=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = ContentQuery {
    status:     params.status.as_deref().map(ContentStatus::from_label).transpose()?,
    visibility: params.visibility.as_deref().map(Visibility::from_label).transpose()?,
  };
  let items = state
    .store
    .list_content(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(json!({ "success": true, "items": summaries(items) })))
}

/// `GET /content/:id`; `id` may also be a slug.
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _current: CurrentUser,
  AppPath(key): AppPath<String>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let by_id = match Uuid::parse_str(&key) {
    Ok(id) => state.store.get_content(id).await.map_err(ApiError::store)?,
    Err(_) => None,
  };
  let item = match by_id {
    Some(item) => item,
    None => state
      .store
      .get_content_by_slug(&key)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(not_found)?,
  };
  Ok(Json(json!({ "success": true, "item": item })))
}

// ─── Create & edit ────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /content`. Unknown fields, including
/// `status`, are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct CreateBody {
  #[serde(default)]
  pub slug:       String,
  #[serde(default)]
  pub title:      String,
  pub summary:    Option<String>,
  pub body:       Option<String>,
  pub category:   Option<String>,
  #[serde(default)]
  pub tags:       Vec<String>,
  pub visibility: Option<Visibility>,
}

/// `POST /content`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppJson(body): AppJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewContent {
    slug:       body.slug,
    title:      body.title,
    summary:    body.summary,
    body:       body.body,
    category:   body.category,
    tags:       body.tags,
    visibility: body.visibility.unwrap_or_default(),
    created_by: Some(current.user.id),
  }
  .normalized()?;

  let taken = state
    .store
    .get_content_by_slug(&input.slug)
    .await
    .map_err(ApiError::store)?;
  if taken.is_some() {
    return Err(ApiError::Conflict("Slug already in use".into()));
  }

  let created = state
    .store
    .create_content(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(slug = %created.slug, by = %current.user.email, "content created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "content": created })),
  ))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub title:      Option<String>,
  pub summary:    Option<String>,
  pub body:       Option<String>,
  pub category:   Option<String>,
  pub tags:       Option<Vec<String>>,
  pub visibility: Option<Visibility>,
}

/// `PUT /content/:id`
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
  let record = load(&state, id).await?;
  let patch = ContentPatch {
    title:      body.title,
    summary:    body.summary,
    body:       body.body,
    category:   body.category,
    tags:       body.tags,
    visibility: body.visibility,
  };
  let updated = content::edit(&record, patch, current.user.id, Utc::now())?;
  save(&state, &updated).await?;

  Ok(Json(json!({ "success": true, "content": updated })))
}

// ─── Workflow ─────────────────────────────────────────────────────────────────

/// `PUT /content/:id/submit`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = load(&state, id).await?;
  let updated = content::submit_for_review(&record, current.user.id, Utc::now());
  save(&state, &updated).await?;

  tracing::info!(slug = %updated.slug, by = %current.user.email, "content submitted for review");
  Ok(Json(json!({ "success": true, "content": updated })))
}

/// `PUT /content/:id/approve`
pub async fn approve<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;
  let record = load(&state, id).await?;
  let updated = content::approve(&record, current.user.id, Utc::now());
  save(&state, &updated).await?;

  tracing::info!(
    slug = %updated.slug,
    version = updated.version,
    by = %current.user.email,
    "content approved"
  );
  Ok(Json(json!({ "success": true, "content": updated })))
}

/// `PUT /content/:id/publish`
pub async fn publish<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::is_admin)?;
  let record = load(&state, id).await?;
  let updated = content::publish(&record, current.user.id, Utc::now());
  save(&state, &updated).await?;

  tracing::info!(slug = %updated.slug, by = %current.user.email, "content published");
  Ok(Json(json!({ "success": true, "content": updated })))
}

/// `PUT /content/:id/revert/:version`
pub async fn revert<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath((id, version)): AppPath<(Uuid, u32)>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = load(&state, id).await?;
  let updated = content::revert_to_version(&record, version, current.user.id, Utc::now())
    .ok_or_else(|| ApiError::NotFound("Version not found".into()))?;
  save(&state, &updated).await?;

  tracing::info!(slug = %updated.slug, version, by = %current.user.email, "content reverted");
  Ok(Json(json!({ "success": true, "content": updated })))
}

/// `DELETE /content/:id`
pub async fn archive<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let record = load(&state, id).await?;
  let updated = content::archive(&record, current.user.id, Utc::now());
  save(&state, &updated).await?;

  tracing::info!(slug = %updated.slug, by = %current.user.email, "content archived");
  Ok(Json(json!({
    "success": true,
    "message": "Content archived",
    "content": updated,
  })))
}
