//! Portal users, roles and login sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, status::Actor};

pub const MIN_PASSWORD_LEN: usize = 6;

/// What a user is allowed to do.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
  Supervisor,
  Officer,
  Analyst,
  Editor,
  Reviewer,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownRole(s.to_owned()))
  }

  /// Roles that may submit grievances and change their status.
  pub fn can_manage_grievances(self) -> bool {
    matches!(self, Self::Admin | Self::Supervisor | Self::Officer)
  }

  /// Roles that may read the full grievance register.
  pub fn can_view_grievances(self) -> bool {
    self.can_manage_grievances() || self == Self::Analyst
  }

  pub fn is_admin(self) -> bool { self == Self::Admin }
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
  #[default]
  Active,
  Disabled,
}

impl UserStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownUserStatus(s.to_owned()))
  }
}

/// A portal user. The password hash is never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub status:     UserStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_active(&self) -> bool { self.status == UserStatus::Active }

  pub fn actor(&self) -> Actor {
    Actor {
      name:  Some(self.name.clone()),
      email: Some(self.email.clone()),
    }
  }
}

/// A user together with the stored argon2 PHC string, for login checks.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input for creating a user. The password has already been hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

/// A partial update to a user; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub name:          Option<String>,
  pub email:         Option<String>,
  pub role:          Option<Role>,
  pub status:        Option<UserStatus>,
  pub password_hash: Option<String>,
}

/// Default display name for users created without one.
pub const UNNAMED_USER: &str = "Unnamed User";

/// Canonical form of an email address: trimmed and lower-cased. Blank
/// addresses are rejected.
pub fn normalize_email(email: &str) -> Result<String> {
  let email = email.trim().to_lowercase();
  if email.is_empty() {
    return Err(Error::MissingEmail);
  }
  Ok(email)
}

pub fn check_password_len(password: &str) -> Result<()> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(Error::PasswordTooShort);
  }
  Ok(())
}

/// A login session. Only the SHA-256 digest of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

#[cfg(test)]
mod tests {
  use chrono::Duration;

  use super::*;

  #[test]
  fn role_permissions() {
    for role in [Role::Admin, Role::Supervisor, Role::Officer] {
      assert!(role.can_manage_grievances(), "{role}");
      assert!(role.can_view_grievances(), "{role}");
    }
    assert!(!Role::Analyst.can_manage_grievances());
    assert!(Role::Analyst.can_view_grievances());
    for role in [Role::User, Role::Editor, Role::Reviewer] {
      assert!(!role.can_view_grievances(), "{role}");
    }
    assert!(Role::Admin.is_admin());
    assert!(!Role::Supervisor.is_admin());
  }

  #[test]
  fn role_labels() {
    assert_eq!(Role::from_label("officer").unwrap(), Role::Officer);
    assert!(matches!(Role::from_label("root"), Err(Error::UnknownRole(_))));
    assert_eq!(Role::Analyst.as_str(), "analyst");
  }

  #[test]
  fn email_normalization() {
    assert_eq!(normalize_email("  Jane@Example.ORG ").unwrap(), "jane@example.org");
    assert!(matches!(normalize_email("   "), Err(Error::MissingEmail)));
  }

  #[test]
  fn password_length() {
    assert!(check_password_len("12345").is_err());
    assert!(check_password_len("123456").is_ok());
  }

  #[test]
  fn session_expiry() {
    let now = Utc::now();
    let session = Session {
      token_hash: "abc".into(),
      user_id:    Uuid::new_v4(),
      created_at: now,
      expires_at: now + Duration::days(30),
    };
    assert!(!session.is_expired(now));
    assert!(session.is_expired(now + Duration::days(30)));
  }
}
