//! Handlers for `/grievances` endpoints.
//!
//! | Method | Path | Roles | Notes |
//! |--------|------|-------|-------|
//! | `GET`  | `/grievances` | admin, supervisor, officer, analyst | optional `status`, `category`, `priority`, `district`, `limit`, `offset` |
//! | `POST` | `/grievances` | admin, supervisor, officer | Body: [`CreateBody`]; status is always `open` |
//! | `GET`  | `/grievances/:id` | admin, supervisor, officer, analyst | 404 if not found |
//! | `PUT`  | `/grievances/:id/status` | admin, supervisor, officer | Body: `{"status":"..."}` |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use grm_core::{
  grievance::{Attachment, Category, Gps, GrievanceQuery, NewGrievance, Priority},
  status::{normalize_status, update_status},
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

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Accepts legacy synonyms, e.g. `pending`.
  pub status:   Option<String>,
  /// Category label, e.g. `Land Dispute`.
  pub category: Option<String>,
  pub priority: Option<String>,
  pub district: Option<String>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

impl ListParams {
  fn into_query(self) -> Result<GrievanceQuery, ApiError> {
    Ok(GrievanceQuery {
      status:   self.status.as_deref().map(normalize_status).transpose()?,
      category: self.category.as_deref().map(Category::from_label).transpose()?,
      priority: self.priority.as_deref().map(Priority::from_label).transpose()?,
      district: self.district,
      limit:    self.limit,
      offset:   self.offset,
    })
  }
}

/// `GET /grievances[?status=...][&category=...][&priority=...][&district=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppQuery(params): AppQuery<ListParams>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::can_view_grievances)?;

  let results = state
    .store
    .list_grievances(&params.into_query()?)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(json!({
    "success": true,
    "data": { "count": results.len(), "results": results },
  })))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /grievances/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::can_view_grievances)?;

  let report = state
    .store
    .get_grievance(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;

  Ok(Json(json!({ "success": true, "report": report })))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /grievances`.
///
/// Unknown fields are ignored, including any `status` the caller sends.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub reporter_name:  Option<String>,
  pub reporter_phone: Option<String>,
  pub reporter_email: Option<String>,
  pub category:       Option<Category>,
  #[serde(default)]
  pub description:    String,
  pub priority:       Option<Priority>,
  pub assigned_to:    Option<Uuid>,
  pub district:       Option<String>,
  pub chiefdom:       Option<String>,
  pub village:        Option<String>,
  pub gps:            Option<Gps>,
  #[serde(default)]
  pub attachments:    Vec<Attachment>,
}

impl CreateBody {
  fn into_new(self, created_by: Uuid) -> NewGrievance {
    NewGrievance {
      reporter_name:  self.reporter_name,
      reporter_phone: self.reporter_phone,
      reporter_email: self.reporter_email,
      category:       self.category.unwrap_or_default(),
      description:    self.description,
      priority:       self.priority.unwrap_or_default(),
      assigned_to:    self.assigned_to,
      district:       self.district,
      chiefdom:       self.chiefdom,
      village:        self.village,
      gps:            self.gps,
      attachments:    self.attachments,
      created_by:     Some(created_by),
    }
  }
}

/// `POST /grievances`; returns 201 and the stored record.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppJson(body): AppJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::can_manage_grievances)?;

  let input = body.into_new(current.user.id).normalized()?;
  let report = state
    .store
    .create_grievance(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(report_id = %report.report_id, by = %current.user.email, "grievance created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "success": true, "report": report })),
  ))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
}

/// `PUT /grievances/:id/status`, body: `{"status":"..."}`.
///
/// The status is validated before the record is even looked up, so an
/// invalid status is a 400 regardless of whether the record exists.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  current: CurrentUser,
  AppPath(id): AppPath<Uuid>,
  AppJson(body): AppJson<StatusBody>,
) -> Result<Json<Value>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  current.require(Role::can_manage_grievances)?;
  normalize_status(&body.status)?;

  let record = state
    .store
    .get_grievance(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;

  let updated = update_status(&record, &body.status, &current.user.actor(), Utc::now())?;

  let saved = state
    .store
    .save_grievance(&updated)
    .await
    .map_err(ApiError::store)?;
  if !saved {
    return Err(ApiError::NotFound("Record not found".into()));
  }

  tracing::info!(
    report_id = %updated.report_id,
    from = %record.status,
    to = %updated.status,
    by = %current.user.email,
    "grievance status changed"
  );
  Ok(Json(json!({ "success": true, "report": updated })))
}
