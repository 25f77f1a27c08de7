//! The grievance status engine.
//!
//! Status values arriving from clients (and found in old audit trails) may be
//! legacy synonyms such as `"pending"` or `"escalated"`. They are mapped onto
//! the four canonical statuses before anything is accepted or stored.
//!
//! [`update_status`] is a pure read-modify-write step: it validates the
//! requested status, heals the audit trail, stamps SLA milestones, and
//! returns a new [`Grievance`] value for the caller to persist with a single
//! save. The input record is never touched, so a rejected update leaves no
//! trace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
  Error, Result,
  grievance::{Grievance, StatusHistoryEntry},
};

/// Comma-separated list of accepted canonical statuses, for error messages.
pub const ALLOWED_STATUSES: &str = "open, in_progress, resolved, closed";

/// The fixed status enumeration of a grievance.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GrievanceStatus {
  #[default]
  Open,
  InProgress,
  Resolved,
  Closed,
}

impl GrievanceStatus {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Map a legacy synonym onto its canonical token. Any other token, canonical
/// or not, is returned unchanged.
pub fn canonical_token(raw: &str) -> &str {
  match raw {
    "pending" => "open",
    "reviewing" | "escalated" => "in_progress",
    "rejected" => "closed",
    other => other,
  }
}

/// Normalise a raw status value. Matching is case-sensitive.
pub fn normalize_status(raw: &str) -> Result<GrievanceStatus> {
  canonical_token(raw)
    .parse()
    .map_err(|_| Error::InvalidStatus(raw.to_owned()))
}

// ─── Actor ───────────────────────────────────────────────────────────────────

/// Whoever is performing a status change, as far as the audit trail cares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
  pub name:  Option<String>,
  pub email: Option<String>,
}

impl Actor {
  /// An actor with neither a name nor a contact address.
  pub fn system() -> Self { Self::default() }

  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name:  Some(name.into()),
      email: None,
    }
  }

  /// The name recorded in the audit trail: display name, then contact
  /// email, then `"System"`. Blank values are skipped.
  pub fn display_name(&self) -> &str {
    [self.name.as_deref(), self.email.as_deref()]
      .into_iter()
      .flatten()
      .find(|s| !s.trim().is_empty())
      .unwrap_or("System")
  }
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Apply a status change to `record`, returning the updated record.
///
/// Fails with [`Error::InvalidStatus`] before doing anything else if `raw`
/// does not normalise onto a known status.
pub fn update_status(
  record: &Grievance,
  raw: &str,
  actor: &Actor,
  now: DateTime<Utc>,
) -> Result<Grievance> {
  let status = normalize_status(raw)?;

  let mut history: Vec<StatusHistoryEntry> = record
    .status_history
    .iter()
    .filter(|entry| entry.is_complete())
    .cloned()
    .map(|mut entry| {
      entry.status = entry.status.map(|s| canonical_token(&s).to_owned());
      entry
    })
    .collect();

  let first_response_at = match (status, record.first_response_at) {
    (GrievanceStatus::InProgress, None) => Some(now),
    (_, existing) => existing,
  };
  let resolved_at = match (status, record.resolved_at) {
    (GrievanceStatus::Resolved, None) => Some(now),
    (_, existing) => existing,
  };

  history.push(StatusHistoryEntry::new(
    status,
    format!("Status changed to {status}"),
    actor.display_name(),
    now,
  ));

  Ok(Grievance {
    status,
    first_response_at,
    resolved_at,
    status_history: history,
    updated_at: now,
    ..record.clone()
  })
}

#[cfg(test)]
mod tests {
  use chrono::Duration;
  use uuid::Uuid;

  use super::*;
  use crate::grievance::{NewGrievance, next_report_id};

  fn record() -> Grievance {
    Grievance::open(
      Uuid::new_v4(),
      next_report_id(0),
      NewGrievance::new("neighbour fenced off shared well"),
      Utc::now(),
    )
  }

  // ── Normalisation ─────────────────────────────────────────────────────

  #[test]
  fn known_tokens_normalize_into_enum() {
    let cases = [
      ("pending", GrievanceStatus::Open),
      ("reviewing", GrievanceStatus::InProgress),
      ("escalated", GrievanceStatus::InProgress),
      ("rejected", GrievanceStatus::Closed),
      ("open", GrievanceStatus::Open),
      ("in_progress", GrievanceStatus::InProgress),
      ("resolved", GrievanceStatus::Resolved),
      ("closed", GrievanceStatus::Closed),
    ];
    for (raw, expected) in cases {
      assert_eq!(normalize_status(raw).unwrap(), expected, "raw = {raw}");
    }
  }

  #[test]
  fn unknown_tokens_are_rejected() {
    for raw in ["", "not_a_status", "Open", "PENDING", " open", "in progress"] {
      assert!(
        matches!(normalize_status(raw), Err(Error::InvalidStatus(ref r)) if r == raw),
        "raw = {raw:?}"
      );
    }
  }

  #[test]
  fn invalid_status_message_lists_allowed_values() {
    let msg = normalize_status("bogus").unwrap_err().to_string();
    assert_eq!(msg, "Invalid status. Allowed: open, in_progress, resolved, closed");
  }

  // ── Actor ─────────────────────────────────────────────────────────────

  #[test]
  fn actor_display_name_fallbacks() {
    assert_eq!(Actor::named("Jane").display_name(), "Jane");
    let email_only = Actor {
      name:  Some("  ".into()),
      email: Some("jane@example.org".into()),
    };
    assert_eq!(email_only.display_name(), "jane@example.org");
    assert_eq!(Actor::system().display_name(), "System");
  }

  // ── Update ────────────────────────────────────────────────────────────

  #[test]
  fn escalated_by_jane() {
    let now = Utc::now();
    let updated = update_status(&record(), "escalated", &Actor::named("Jane"), now).unwrap();

    assert_eq!(updated.status, GrievanceStatus::InProgress);
    assert_eq!(updated.first_response_at, Some(now));
    assert_eq!(updated.resolved_at, None);
    assert_eq!(updated.status_history.len(), 1);

    let entry = &updated.status_history[0];
    assert_eq!(entry.status.as_deref(), Some("in_progress"));
    assert_eq!(entry.action.as_deref(), Some("Status changed to in_progress"));
    assert_eq!(entry.by.as_deref(), Some("Jane"));
    assert_eq!(entry.date, Some(now));
  }

  #[test]
  fn first_response_is_stamped_once() {
    let t1 = Utc::now();
    let t2 = t1 + Duration::minutes(5);
    let actor = Actor::named("Officer");

    let once = update_status(&record(), "in_progress", &actor, t1).unwrap();
    let twice = update_status(&once, "in_progress", &actor, t2).unwrap();

    assert_eq!(twice.first_response_at, Some(t1));
    assert_eq!(twice.status_history.len(), 2);
    assert_eq!(twice.status_history[1].date, Some(t2));
  }

  #[test]
  fn resolved_at_is_stamped_once() {
    let t1 = Utc::now();
    let t2 = t1 + Duration::hours(1);
    let t3 = t2 + Duration::hours(1);
    let actor = Actor::named("Supervisor");

    let resolved = update_status(&record(), "resolved", &actor, t1).unwrap();
    let reopened = update_status(&resolved, "open", &actor, t2).unwrap();
    let again = update_status(&reopened, "resolved", &actor, t3).unwrap();

    assert_eq!(again.resolved_at, Some(t1));
    assert_eq!(again.first_response_at, None);
  }

  #[test]
  fn corrupt_entries_are_dropped_before_append() {
    let now = Utc::now();
    let earlier = now - Duration::days(1);
    let well_formed =
      StatusHistoryEntry::new(GrievanceStatus::Open, "Status changed to open", "Clerk", earlier);

    let mut rec = record();
    rec.status_history = vec![
      StatusHistoryEntry {
        status: Some("open".into()),
        action: None,
        by: Some("Clerk".into()),
        date: Some(earlier),
      },
      well_formed.clone(),
    ];

    let updated = update_status(&rec, "closed", &Actor::named("Jane"), now).unwrap();
    assert_eq!(updated.status_history.len(), 2);
    assert_eq!(updated.status_history[0], well_formed);
    assert_eq!(updated.status_history[1].status.as_deref(), Some("closed"));
  }

  #[test]
  fn surviving_entries_are_renormalized() {
    let now = Utc::now();
    let mut rec = record();
    rec.status_history = vec![
      StatusHistoryEntry {
        status: Some("reviewing".into()),
        action: Some("moved to review".into()),
        by: None,
        date: Some(now),
      },
      StatusHistoryEntry {
        status: Some("archived".into()),
        action: Some("legacy archive".into()),
        by: None,
        date: Some(now),
      },
    ];

    let updated = update_status(&rec, "resolved", &Actor::system(), now).unwrap();
    assert_eq!(updated.status_history[0].status.as_deref(), Some("in_progress"));
    // Tokens without a synonym are kept verbatim.
    assert_eq!(updated.status_history[1].status.as_deref(), Some("archived"));
    assert_eq!(updated.status_history[2].by.as_deref(), Some("System"));
  }

  #[test]
  fn invalid_status_leaves_record_untouched() {
    let mut rec = record();
    rec.status_history = vec![StatusHistoryEntry {
      status: Some("open".into()),
      action: None,
      by: None,
      date: None,
    }];
    let before = rec.clone();

    let result = update_status(&rec, "not_a_status", &Actor::named("Jane"), Utc::now());
    assert!(matches!(result, Err(Error::InvalidStatus(_))));
    assert_eq!(rec, before);
  }
}
