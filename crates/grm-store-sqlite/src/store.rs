//! [`SqliteStore`]: the SQLite implementation of [`GrmStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use grm_core::{
  content::{Content, ContentQuery, NewContent},
  grievance::{Grievance, GrievanceQuery, NewGrievance, next_report_id},
  store::GrmStore,
  user::{Credentials, NewUser, Session, User, UserPatch, UserStatus},
};

use crate::{
  encode::{
    CONTENT_COLUMNS, ContentRow, GRIEVANCE_COLUMNS, NewGrievanceRow,
    RawContent, RawCredentials, RawGrievance, RawSession, RawUser,
    USER_COLUMNS, encode_dt, encode_history, encode_uuid,
  },
  error::is_constraint_violation,
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A GRM store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised onto one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Close the underlying connection, flushing any pending work.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self, table: &'static str) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(u64::try_from(n).unwrap_or(0))
  }

  async fn query_grievance(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<Grievance>> {
    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {GRIEVANCE_COLUMNS} FROM grievances WHERE {column} = ?1"),
            rusqlite::params![value],
            RawGrievance::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawGrievance::into_grievance).transpose()
  }

  async fn query_content(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<Content>> {
    let raw: Option<RawContent> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CONTENT_COLUMNS} FROM content WHERE {column} = ?1"),
            rusqlite::params![value],
            RawContent::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContent::into_content).transpose()
  }

  /// Run raw SQL against the connection, for seeding rows the public API
  /// cannot produce.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

// ─── GrmStore impl ───────────────────────────────────────────────────────────

impl GrmStore for SqliteStore {
  type Error = Error;

  // ── Grievances ────────────────────────────────────────────────────────────

  async fn create_grievance(&self, input: NewGrievance) -> Result<Grievance> {
    let id  = Uuid::new_v4();
    let now = Utc::now();
    let row = NewGrievanceRow::encode(id, &input, now)?;

    // Counting and inserting share one IMMEDIATE transaction, so two
    // creations can never read the same count. The UNIQUE constraint on
    // report_id still guards against ids reused after manual row removal.
    let result = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count: i64 =
          tx.query_row("SELECT COUNT(*) FROM grievances", [], |r| r.get(0))?;
        let report_id = next_report_id(u64::try_from(count).unwrap_or(0));

        tx.execute(
          "INSERT INTO grievances (
             grievance_id, report_id, reporter_name, reporter_phone, reporter_email,
             category, description, status, priority, assigned_to,
             district, chiefdom, village, gps_json, attachments_json,
             submitted_at, history_json, created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?16, ?16)",
          rusqlite::params![
            row.grievance_id,
            report_id,
            row.reporter_name,
            row.reporter_phone,
            row.reporter_email,
            row.category,
            row.description,
            row.status,
            row.priority,
            row.assigned_to,
            row.district,
            row.chiefdom,
            row.village,
            row.gps_json,
            row.attachments_json,
            row.now,
            row.history_json,
            row.created_by,
          ],
        )?;
        tx.commit()?;
        Ok(report_id)
      })
      .await;

    let report_id = match result {
      Ok(report_id) => report_id,
      Err(e) if is_constraint_violation(&e) => {
        tracing::warn!(grievance_id = %id, "report id collision on insert");
        return Err(Error::ReportIdCollision);
      }
      Err(e) => return Err(e.into()),
    };

    Ok(Grievance::open(id, report_id, input, now))
  }

  async fn get_grievance(&self, id: Uuid) -> Result<Option<Grievance>> {
    self.query_grievance("grievance_id", encode_uuid(id)).await
  }

  async fn get_grievance_by_report_id(&self, report_id: &str) -> Result<Option<Grievance>> {
    self.query_grievance("report_id", report_id.to_owned()).await
  }

  async fn list_grievances(&self, query: &GrievanceQuery) -> Result<Vec<Grievance>> {
    let status_str   = query.status.map(|s| s.as_str());
    let category_str = query.category.map(|c| c.as_str());
    let priority_str = query.priority.map(|p| p.as_str());
    let district     = query.district.clone();
    // SQLite treats a negative LIMIT as "no limit".
    let limit_val    = query.limit.map_or(-1, |l| l as i64);
    let offset_val   = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawGrievance> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GRIEVANCE_COLUMNS}
           FROM grievances
           WHERE (?1 IS NULL OR status   = ?1)
             AND (?2 IS NULL OR category = ?2)
             AND (?3 IS NULL OR priority = ?3)
             AND (?4 IS NULL OR district = ?4 COLLATE NOCASE)
           ORDER BY created_at DESC, rowid DESC
           LIMIT ?5 OFFSET ?6"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              status_str,
              category_str,
              priority_str,
              district,
              limit_val,
              offset_val,
            ],
            RawGrievance::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawGrievance::into_grievance).collect()
  }

  async fn count_grievances(&self) -> Result<u64> { self.count("grievances").await }

  async fn save_grievance(&self, grievance: &Grievance) -> Result<bool> {
    let id_str             = encode_uuid(grievance.id);
    let status_str         = grievance.status.as_str();
    let first_response_str = grievance.first_response_at.map(encode_dt);
    let resolved_str       = grievance.resolved_at.map(encode_dt);
    let history_str        = encode_history(&grievance.status_history)?;
    let updated_str        = encode_dt(grievance.updated_at);

    // One UPDATE statement: readers see either the old lifecycle state or
    // the new one, never a mix.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE grievances
           SET status = ?2, first_response_at = ?3, resolved_at = ?4,
               history_json = ?5, updated_at = ?6
           WHERE grievance_id = ?1",
          rusqlite::params![
            id_str,
            status_str,
            first_response_str,
            resolved_str,
            history_str,
            updated_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Content ───────────────────────────────────────────────────────────────

  async fn create_content(&self, input: NewContent) -> Result<Content> {
    let content = Content::draft(Uuid::new_v4(), input, Utc::now());
    let row     = ContentRow::encode(&content)?;

    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO content (
             content_id, slug, title, summary, body,
             category, tags_json, status, visibility, version,
             versions_json, created_by, updated_by, published_by, published_at,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                     ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
          rusqlite::params![
            row.content_id,
            row.slug,
            row.title,
            row.summary,
            row.body,
            row.category,
            row.tags_json,
            row.status,
            row.visibility,
            row.version,
            row.versions_json,
            row.created_by,
            row.updated_by,
            row.published_by,
            row.published_at,
            row.created_at,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(content),
      Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateSlug(content.slug)),
      Err(e) => Err(e.into()),
    }
  }

  async fn get_content(&self, id: Uuid) -> Result<Option<Content>> {
    self.query_content("content_id", encode_uuid(id)).await
  }

  async fn get_content_by_slug(&self, slug: &str) -> Result<Option<Content>> {
    self.query_content("slug", slug.to_owned()).await
  }

  async fn list_content(&self, query: &ContentQuery) -> Result<Vec<Content>> {
    let status_str     = query.status.map(|s| s.as_str());
    let visibility_str = query.visibility.map(|v| v.as_str());

    let raws: Vec<RawContent> = self
      .conn
      .call(move |conn| {
        // Unpublished items have a NULL published_at, which sorts last
        // under DESC.
        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTENT_COLUMNS}
           FROM content
           WHERE (?1 IS NULL OR status     = ?1)
             AND (?2 IS NULL OR visibility = ?2)
           ORDER BY published_at DESC, updated_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, visibility_str],
            RawContent::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContent::into_content).collect()
  }

  async fn save_content(&self, content: &Content) -> Result<bool> {
    let row = ContentRow::encode(content)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE content
           SET title = ?2, summary = ?3, body = ?4, category = ?5,
               tags_json = ?6, status = ?7, visibility = ?8, version = ?9,
               versions_json = ?10, updated_by = ?11, published_by = ?12,
               published_at = ?13, updated_at = ?14
           WHERE content_id = ?1",
          rusqlite::params![
            row.content_id,
            row.title,
            row.summary,
            row.body,
            row.category,
            row.tags_json,
            row.status,
            row.visibility,
            row.version,
            row.versions_json,
            row.updated_by,
            row.published_by,
            row.published_at,
            row.updated_at,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn count_users(&self) -> Result<u64> { self.count("users").await }

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now  = Utc::now();
    let user = User {
      id:         Uuid::new_v4(),
      name:       input.name,
      email:      input.email,
      role:       input.role,
      status:     UserStatus::Active,
      created_at: now,
      updated_at: now,
    };

    let id_str     = encode_uuid(user.id);
    let name       = user.name.clone();
    let email      = user.email.clone();
    let hash       = input.password_hash;
    let role_str   = user.role.as_str();
    let status_str = user.status.as_str();
    let at_str     = encode_dt(now);

    let result = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, name, email, password_hash, role, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, name, email, hash, role_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await;

    match result {
      Ok(()) => Ok(user),
      Err(e) if is_constraint_violation(&e) => Err(Error::DuplicateEmail(user.email)),
      Err(e) => Err(e.into()),
    }
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            rusqlite::params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let raw: Option<RawCredentials> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1"),
            rusqlite::params![email],
            |row| {
              Ok(RawCredentials {
                user:          RawUser::from_row(row)?,
                password_hash: row.get(7)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCredentials::into_credentials).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, rowid"
        ))?;
        let rows = stmt
          .query_map([], RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>> {
    let id_str     = encode_uuid(id);
    let role_str   = patch.role.map(|r| r.as_str());
    let status_str = patch.status.map(|s| s.as_str());
    let email      = patch.email.clone();
    let at_str     = encode_dt(Utc::now());

    let result = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE users
           SET name          = COALESCE(?2, name),
               email         = COALESCE(?3, email),
               role          = COALESCE(?4, role),
               status        = COALESCE(?5, status),
               password_hash = COALESCE(?6, password_hash),
               updated_at    = ?7
           WHERE user_id = ?1",
          rusqlite::params![
            id_str,
            patch.name,
            patch.email,
            role_str,
            status_str,
            patch.password_hash,
            at_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        // Disabling a user or changing their password ends their sessions.
        if status_str == Some(UserStatus::Disabled.as_str()) || patch.password_hash.is_some() {
          tx.execute(
            "DELETE FROM sessions WHERE user_id = ?1",
            rusqlite::params![id_str],
          )?;
        }
        let raw = tx.query_row(
          &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
          rusqlite::params![id_str],
          RawUser::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await;

    match result {
      Ok(raw) => raw.map(RawUser::into_user).transpose(),
      Err(e) if is_constraint_violation(&e) => {
        Err(Error::DuplicateEmail(email.unwrap_or_default()))
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Sessions ──────────────────────────────────────────────────────────────

  async fn create_session(&self, session: Session) -> Result<()> {
    let user_id_str = encode_uuid(session.user_id);
    let created_str = encode_dt(session.created_at);
    let expires_str = encode_dt(session.expires_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token_hash, user_id_str, created_str, expires_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token_hash: &str) -> Result<Option<Session>> {
    let token_hash = token_hash.to_owned();

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT token_hash, user_id, created_at, expires_at
             FROM sessions WHERE token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn delete_session(&self, token_hash: &str) -> Result<bool> {
    let token_hash = token_hash.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }
}
