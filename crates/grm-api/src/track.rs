//! Handler for the public `GET /track/:report_id` endpoint.
//!
//! Reporters follow their case with the `G-####` id they were given. The
//! public view carries lifecycle data only: no reporter details and no staff
//! names from the audit trail.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use grm_core::{
  grievance::{Category, Grievance},
  status::GrievanceStatus,
  store::GrmStore,
};
use serde::Serialize;

use crate::{AppState, error::ApiError, extract::AppPath};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
  pub report_id:         String,
  pub status:            GrievanceStatus,
  pub category:          Category,
  pub submitted_at:      DateTime<Utc>,
  pub first_response_at: Option<DateTime<Utc>>,
  pub resolved_at:       Option<DateTime<Utc>>,
  pub history:           Vec<TrackingStep>,
}

#[derive(Debug, Serialize)]
pub struct TrackingStep {
  pub status: Option<String>,
  pub action: Option<String>,
  pub date:   Option<DateTime<Utc>>,
}

impl From<Grievance> for TrackingView {
  fn from(g: Grievance) -> Self {
    TrackingView {
      report_id:         g.report_id,
      status:            g.status,
      category:          g.category,
      submitted_at:      g.submitted_at,
      first_response_at: g.first_response_at,
      resolved_at:       g.resolved_at,
      history:           g
        .status_history
        .into_iter()
        .filter(|e| e.is_complete())
        .map(|e| TrackingStep {
          status: e.status,
          action: e.action,
          date:   e.date,
        })
        .collect(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
  pub success: bool,
  pub report:  TrackingView,
}

/// `GET /track/:report_id`
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  AppPath(report_id): AppPath<String>,
) -> Result<Json<TrackResponse>, ApiError>
where
  S: GrmStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let report_id = report_id.trim().to_uppercase();
  let report = state
    .store
    .get_grievance_by_report_id(&report_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Record not found".into()))?;

  Ok(Json(TrackResponse {
    success: true,
    report:  report.into(),
  }))
}
