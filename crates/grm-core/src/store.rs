//! The persistence seam for the GRM portal.

use uuid::Uuid;

use crate::{
  content::{Content, ContentQuery, NewContent},
  grievance::{Grievance, GrievanceQuery, NewGrievance},
  user::{Credentials, NewUser, Session, User, UserPatch},
};

/// Abstraction over a GRM store backend.
///
/// Grievances are written in exactly two ways: [`create_grievance`] inserts a
/// new `open` record with a freshly assigned report id, and
/// [`save_grievance`] atomically replaces a record's mutable lifecycle
/// fields. Grievances are never deleted.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
///
/// [`create_grievance`]: GrmStore::create_grievance
/// [`save_grievance`]: GrmStore::save_grievance
pub trait GrmStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Grievances ────────────────────────────────────────────────────────

  /// Persist a new grievance. The store assigns the UUID, the `G-####`
  /// report id and all timestamps; the returned record is `open` with an
  /// empty trail.
  fn create_grievance(
    &self,
    input: NewGrievance,
  ) -> impl Future<Output = Result<Grievance, Self::Error>> + Send + '_;

  /// Retrieve a grievance by UUID. Returns `None` if not found.
  fn get_grievance(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Grievance>, Self::Error>> + Send + '_;

  /// Retrieve a grievance by its human-readable report id.
  fn get_grievance_by_report_id<'a>(
    &'a self,
    report_id: &'a str,
  ) -> impl Future<Output = Result<Option<Grievance>, Self::Error>> + Send + 'a;

  /// List grievances matching `query`, newest first.
  fn list_grievances<'a>(
    &'a self,
    query: &'a GrievanceQuery,
  ) -> impl Future<Output = Result<Vec<Grievance>, Self::Error>> + Send + 'a;

  /// Total number of grievances ever created.
  fn count_grievances(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Atomically write the status, SLA stamps, audit trail and `updated_at`
  /// of `grievance`. Returns `false` if no record with that id exists.
  fn save_grievance<'a>(
    &'a self,
    grievance: &'a Grievance,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Content ───────────────────────────────────────────────────────────

  /// Persist a new draft. Fails if the slug is already taken.
  fn create_content(
    &self,
    input: NewContent,
  ) -> impl Future<Output = Result<Content, Self::Error>> + Send + '_;

  fn get_content(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Content>, Self::Error>> + Send + '_;

  fn get_content_by_slug<'a>(
    &'a self,
    slug: &'a str,
  ) -> impl Future<Output = Result<Option<Content>, Self::Error>> + Send + 'a;

  /// List content matching `query`, most recently published first, then
  /// most recently updated.
  fn list_content<'a>(
    &'a self,
    query: &'a ContentQuery,
  ) -> impl Future<Output = Result<Vec<Content>, Self::Error>> + Send + 'a;

  /// Overwrite every mutable field of `content`. The id, slug, creator and
  /// creation time are fixed. Returns `false` if no such item exists.
  fn save_content<'a>(
    &'a self,
    content: &'a Content,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Users ─────────────────────────────────────────────────────────────

  fn count_users(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Create a user. Fails if the email address is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by (normalised) email.
  fn get_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Apply `patch` to a user. Returns `None` if the user does not exist.
  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Delete a user and all of their sessions. Returns `false` if the user
  /// did not exist.
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  /// Revoke a session. Returns `false` if it did not exist.
  fn delete_session<'a>(
    &'a self,
    token_hash: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
