//! Grievance records: the case entity tracked through its status lifecycle.
//!
//! A grievance is created `open` with an empty audit trail and is afterwards
//! only changed through [`crate::status::update_status`]. Everything besides
//! the status, the SLA stamps and the trail is inert descriptive data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, status::GrievanceStatus};

// ─── Classification ──────────────────────────────────────────────────────────

/// What the grievance is about.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum Category {
  #[serde(rename = "Land Dispute")]
  #[strum(serialize = "Land Dispute")]
  LandDispute,
  #[serde(rename = "Project Complaint")]
  #[strum(serialize = "Project Complaint")]
  ProjectComplaint,
  #[serde(rename = "Gender Issue")]
  #[strum(serialize = "Gender Issue")]
  GenderIssue,
  #[serde(rename = "Environmental Issue")]
  #[strum(serialize = "Environmental Issue")]
  EnvironmentalIssue,
  #[serde(rename = "Operational Issue")]
  #[strum(serialize = "Operational Issue")]
  OperationalIssue,
  #[default]
  Other,
}

impl Category {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownCategory(s.to_owned()))
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
pub enum Priority {
  #[default]
  Low,
  Medium,
  High,
}

impl Priority {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownPriority(s.to_owned()))
  }
}

// ─── Attachments & location ──────────────────────────────────────────────────

/// A supporting file already uploaded elsewhere; only the reference is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
  pub url:      String,
  pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gps {
  pub lat: f64,
  pub lng: f64,
}

// ─── Audit trail ─────────────────────────────────────────────────────────────

/// One entry of a grievance's status audit trail.
///
/// Every field is optional because trails written by older deployments may
/// be missing any of them. Entries without an action or a date are treated
/// as corrupt and dropped on the next status update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub action: Option<String>,
  #[serde(default)]
  pub by:     Option<String>,
  #[serde(default)]
  pub date:   Option<DateTime<Utc>>,
}

impl StatusHistoryEntry {
  pub fn new(
    status: GrievanceStatus,
    action: impl Into<String>,
    by: impl Into<String>,
    date: DateTime<Utc>,
  ) -> Self {
    Self {
      status: Some(status.as_str().to_owned()),
      action: Some(action.into()),
      by:     Some(by.into()),
      date:   Some(date),
    }
  }

  /// `true` if the entry carries a non-empty action and a date.
  pub fn is_complete(&self) -> bool {
    self.action.as_deref().is_some_and(|a| !a.is_empty()) && self.date.is_some()
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted grievance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grievance {
  pub id:                Uuid,
  /// Human-readable `G-####` identifier, assigned once at creation.
  pub report_id:         String,
  pub reporter_name:     Option<String>,
  pub reporter_phone:    Option<String>,
  pub reporter_email:    Option<String>,
  pub category:          Category,
  pub description:       String,
  pub status:            GrievanceStatus,
  pub priority:          Priority,
  pub assigned_to:       Option<Uuid>,
  pub district:          Option<String>,
  pub chiefdom:          Option<String>,
  pub village:           Option<String>,
  pub gps:               Option<Gps>,
  pub attachments:       Vec<Attachment>,
  pub submitted_at:      DateTime<Utc>,
  /// Set on the first transition into `in_progress`; never changed after.
  pub first_response_at: Option<DateTime<Utc>>,
  /// Set on the first transition into `resolved`; never changed after.
  pub resolved_at:       Option<DateTime<Utc>>,
  pub status_history:    Vec<StatusHistoryEntry>,
  pub created_by:        Option<Uuid>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

impl Grievance {
  /// Build a freshly-submitted record: status `open`, empty trail, no SLA
  /// stamps.
  pub fn open(
    id: Uuid,
    report_id: String,
    input: NewGrievance,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      report_id,
      reporter_name: input.reporter_name,
      reporter_phone: input.reporter_phone,
      reporter_email: input.reporter_email,
      category: input.category,
      description: input.description,
      status: GrievanceStatus::Open,
      priority: input.priority,
      assigned_to: input.assigned_to,
      district: input.district,
      chiefdom: input.chiefdom,
      village: input.village,
      gps: input.gps,
      attachments: input.attachments,
      submitted_at: now,
      first_response_at: None,
      resolved_at: None,
      status_history: Vec::new(),
      created_by: input.created_by,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Input for creating a grievance. There is deliberately no status field:
/// new grievances always start `open`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewGrievance {
  pub reporter_name:  Option<String>,
  pub reporter_phone: Option<String>,
  pub reporter_email: Option<String>,
  pub category:       Category,
  pub description:    String,
  pub priority:       Priority,
  pub assigned_to:    Option<Uuid>,
  pub district:       Option<String>,
  pub chiefdom:       Option<String>,
  pub village:        Option<String>,
  pub gps:            Option<Gps>,
  pub attachments:    Vec<Attachment>,
  pub created_by:     Option<Uuid>,
}

impl NewGrievance {
  pub fn new(description: impl Into<String>) -> Self {
    Self {
      description: description.into(),
      ..Self::default()
    }
  }

  /// Trim free-text fields, lower-case the email, drop blanks, and reject a
  /// missing description.
  pub fn normalized(mut self) -> Result<Self> {
    self.description = self.description.trim().to_owned();
    if self.description.is_empty() {
      return Err(Error::MissingDescription);
    }
    self.reporter_name = tidy(self.reporter_name);
    self.reporter_phone = tidy(self.reporter_phone);
    self.reporter_email = tidy(self.reporter_email).map(|e| e.to_lowercase());
    self.district = tidy(self.district);
    self.chiefdom = tidy(self.chiefdom);
    self.village = tidy(self.village);
    Ok(self)
  }
}

fn tidy(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// The report identifier for the record created after `existing` records:
/// `G-` followed by `existing + 1`, zero-padded to four digits.
pub fn next_report_id(existing: u64) -> String {
  format!("G-{:04}", existing + 1)
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Filters for listing grievances. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct GrievanceQuery {
  pub status:   Option<GrievanceStatus>,
  pub category: Option<Category>,
  pub priority: Option<Priority>,
  pub district: Option<String>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}
