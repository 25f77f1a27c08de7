//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with fixed nanosecond
//! precision so that they sort lexicographically. Structured fields (GPS,
//! attachments, status history) are stored as compact JSON. UUIDs are stored
//! as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use grm_core::{
  content::{Content, ContentStatus, ContentVersion, Visibility},
  grievance::{
    Attachment, Category, Gps, Grievance, NewGrievance, Priority,
    StatusHistoryEntry,
  },
  status::normalize_status,
  user::{Credentials, Role, Session, User, UserStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_gps(gps: Option<Gps>) -> Result<Option<String>> {
  gps.map(|g| serde_json::to_string(&g)).transpose().map_err(Error::from)
}

pub fn encode_attachments(attachments: &[Attachment]) -> Result<String> {
  Ok(serde_json::to_string(attachments)?)
}

pub fn encode_history(history: &[StatusHistoryEntry]) -> Result<String> {
  Ok(serde_json::to_string(history)?)
}

/// Decode a stored trail. Whole `null` entries, which older deployments
/// could leave behind, are dropped rather than failing the row.
pub fn decode_history(json: &str) -> Result<Vec<StatusHistoryEntry>> {
  let entries: Vec<Option<StatusHistoryEntry>> = serde_json::from_str(json)?;
  Ok(entries.into_iter().flatten().collect())
}

// ─── Column list & row mapping ───────────────────────────────────────────────

/// Column list shared by every grievance `SELECT`, in [`RawGrievance`] order.
pub const GRIEVANCE_COLUMNS: &str = "
  grievance_id, report_id, reporter_name, reporter_phone, reporter_email,
  category, description, status, priority, assigned_to,
  district, chiefdom, village, gps_json, attachments_json,
  submitted_at, first_response_at, resolved_at, history_json, created_by,
  created_at, updated_at";

pub const USER_COLUMNS: &str =
  "user_id, name, email, role, status, created_at, updated_at";

/// Raw strings read directly from a `grievances` row.
pub struct RawGrievance {
  pub grievance_id:      String,
  pub report_id:         String,
  pub reporter_name:     Option<String>,
  pub reporter_phone:    Option<String>,
  pub reporter_email:    Option<String>,
  pub category:          String,
  pub description:       String,
  pub status:            String,
  pub priority:          String,
  pub assigned_to:       Option<String>,
  pub district:          Option<String>,
  pub chiefdom:          Option<String>,
  pub village:           Option<String>,
  pub gps_json:          Option<String>,
  pub attachments_json:  String,
  pub submitted_at:      String,
  pub first_response_at: Option<String>,
  pub resolved_at:       Option<String>,
  pub history_json:      String,
  pub created_by:        Option<String>,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawGrievance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      grievance_id:      row.get(0)?,
      report_id:         row.get(1)?,
      reporter_name:     row.get(2)?,
      reporter_phone:    row.get(3)?,
      reporter_email:    row.get(4)?,
      category:          row.get(5)?,
      description:       row.get(6)?,
      status:            row.get(7)?,
      priority:          row.get(8)?,
      assigned_to:       row.get(9)?,
      district:          row.get(10)?,
      chiefdom:          row.get(11)?,
      village:           row.get(12)?,
      gps_json:          row.get(13)?,
      attachments_json:  row.get(14)?,
      submitted_at:      row.get(15)?,
      first_response_at: row.get(16)?,
      resolved_at:       row.get(17)?,
      history_json:      row.get(18)?,
      created_by:        row.get(19)?,
      created_at:        row.get(20)?,
      updated_at:        row.get(21)?,
    })
  }

  pub fn into_grievance(self) -> Result<Grievance> {
    let gps = self
      .gps_json
      .as_deref()
      .map(serde_json::from_str::<Gps>)
      .transpose()?;

    Ok(Grievance {
      id:                decode_uuid(&self.grievance_id)?,
      report_id:         self.report_id,
      reporter_name:     self.reporter_name,
      reporter_phone:    self.reporter_phone,
      reporter_email:    self.reporter_email,
      category:          Category::from_label(&self.category)?,
      description:       self.description,
      // Rows written before statuses were normalised may hold a synonym.
      status:            normalize_status(&self.status)?,
      priority:          Priority::from_label(&self.priority)?,
      assigned_to:       decode_opt_uuid(self.assigned_to)?,
      district:          self.district,
      chiefdom:          self.chiefdom,
      village:           self.village,
      gps,
      attachments:       serde_json::from_str(&self.attachments_json)?,
      submitted_at:      decode_dt(&self.submitted_at)?,
      first_response_at: decode_opt_dt(self.first_response_at)?,
      resolved_at:       decode_opt_dt(self.resolved_at)?,
      status_history:    decode_history(&self.history_json)?,
      created_by:        decode_opt_uuid(self.created_by)?,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
    })
  }
}

/// Column values for inserting a new grievance, minus the report id, which
/// is only known inside the insert transaction.
pub struct NewGrievanceRow {
  pub grievance_id:     String,
  pub reporter_name:    Option<String>,
  pub reporter_phone:   Option<String>,
  pub reporter_email:   Option<String>,
  pub category:         &'static str,
  pub description:      String,
  pub status:           &'static str,
  pub priority:         &'static str,
  pub assigned_to:      Option<String>,
  pub district:         Option<String>,
  pub chiefdom:         Option<String>,
  pub village:          Option<String>,
  pub gps_json:         Option<String>,
  pub attachments_json: String,
  pub history_json:     String,
  pub created_by:       Option<String>,
  pub now:              String,
}

impl NewGrievanceRow {
  /// Encode the row a freshly-opened grievance would occupy.
  pub fn encode(id: Uuid, input: &NewGrievance, now: DateTime<Utc>) -> Result<Self> {
    let opened = Grievance::open(id, String::new(), input.clone(), now);
    Ok(Self {
      grievance_id:     encode_uuid(opened.id),
      reporter_name:    opened.reporter_name,
      reporter_phone:   opened.reporter_phone,
      reporter_email:   opened.reporter_email,
      category:         opened.category.as_str(),
      description:      opened.description,
      status:           opened.status.as_str(),
      priority:         opened.priority.as_str(),
      assigned_to:      opened.assigned_to.map(encode_uuid),
      district:         opened.district,
      chiefdom:         opened.chiefdom,
      village:          opened.village,
      gps_json:         encode_gps(opened.gps)?,
      attachments_json: encode_attachments(&opened.attachments)?,
      history_json:     encode_history(&opened.status_history)?,
      created_by:       opened.created_by.map(encode_uuid),
      now:              encode_dt(now),
    })
  }
}

pub const CONTENT_COLUMNS: &str = "
  content_id, slug, title, summary, body,
  category, tags_json, status, visibility, version,
  versions_json, created_by, updated_by, published_by, published_at,
  created_at, updated_at";

/// Raw values read directly from a `content` row.
pub struct RawContent {
  pub content_id:    String,
  pub slug:          String,
  pub title:         String,
  pub summary:       Option<String>,
  pub body:          Option<String>,
  pub category:      Option<String>,
  pub tags_json:     String,
  pub status:        String,
  pub visibility:    String,
  pub version:       i64,
  pub versions_json: String,
  pub created_by:    Option<String>,
  pub updated_by:    Option<String>,
  pub published_by:  Option<String>,
  pub published_at:  Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawContent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      content_id:    row.get(0)?,
      slug:          row.get(1)?,
      title:         row.get(2)?,
      summary:       row.get(3)?,
      body:          row.get(4)?,
      category:      row.get(5)?,
      tags_json:     row.get(6)?,
      status:        row.get(7)?,
      visibility:    row.get(8)?,
      version:       row.get(9)?,
      versions_json: row.get(10)?,
      created_by:    row.get(11)?,
      updated_by:    row.get(12)?,
      published_by:  row.get(13)?,
      published_at:  row.get(14)?,
      created_at:    row.get(15)?,
      updated_at:    row.get(16)?,
    })
  }

  pub fn into_content(self) -> Result<Content> {
    let versions: Vec<ContentVersion> = serde_json::from_str(&self.versions_json)?;
    Ok(Content {
      id:           decode_uuid(&self.content_id)?,
      slug:         self.slug,
      title:        self.title,
      summary:      self.summary,
      body:         self.body,
      category:     self.category,
      tags:         serde_json::from_str(&self.tags_json)?,
      status:       ContentStatus::from_label(&self.status)?,
      visibility:   Visibility::from_label(&self.visibility)?,
      version:      u32::try_from(self.version).unwrap_or(1),
      versions,
      created_by:   decode_opt_uuid(self.created_by)?,
      updated_by:   decode_opt_uuid(self.updated_by)?,
      published_by: decode_opt_uuid(self.published_by)?,
      published_at: decode_opt_dt(self.published_at)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Column values for writing a content row. `content_id`, `slug`,
/// `created_by` and `created_at` are only used on insert.
pub struct ContentRow {
  pub content_id:    String,
  pub slug:          String,
  pub title:         String,
  pub summary:       Option<String>,
  pub body:          Option<String>,
  pub category:      Option<String>,
  pub tags_json:     String,
  pub status:        &'static str,
  pub visibility:    &'static str,
  pub version:       i64,
  pub versions_json: String,
  pub created_by:    Option<String>,
  pub updated_by:    Option<String>,
  pub published_by:  Option<String>,
  pub published_at:  Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl ContentRow {
  pub fn encode(c: &Content) -> Result<Self> {
    Ok(Self {
      content_id:    encode_uuid(c.id),
      slug:          c.slug.clone(),
      title:         c.title.clone(),
      summary:       c.summary.clone(),
      body:          c.body.clone(),
      category:      c.category.clone(),
      tags_json:     serde_json::to_string(&c.tags)?,
      status:        c.status.as_str(),
      visibility:    c.visibility.as_str(),
      version:       i64::from(c.version),
      versions_json: serde_json::to_string(&c.versions)?,
      created_by:    c.created_by.map(encode_uuid),
      updated_by:    c.updated_by.map(encode_uuid),
      published_by:  c.published_by.map(encode_uuid),
      published_at:  c.published_at.map(encode_dt),
      created_at:    encode_dt(c.created_at),
      updated_at:    encode_dt(c.updated_at),
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub email:      String,
  pub role:       String,
  pub status:     String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      role:       row.get(3)?,
      status:     row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         decode_uuid(&self.user_id)?,
      name:       self.name,
      email:      self.email,
      role:       Role::from_label(&self.role)?,
      status:     UserStatus::from_label(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// A `users` row plus the password hash column.
pub struct RawCredentials {
  pub user:          RawUser,
  pub password_hash: String,
}

impl RawCredentials {
  pub fn into_credentials(self) -> Result<Credentials> {
    Ok(Credentials {
      user:          self.user.into_user()?,
      password_hash: self.password_hash,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      token_hash: self.token_hash,
      user_id:    decode_uuid(&self.user_id)?,
      created_at: decode_dt(&self.created_at)?,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}
