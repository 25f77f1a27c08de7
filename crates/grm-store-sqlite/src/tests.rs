//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use grm_core::{
  content::{
    ContentPatch, ContentQuery, ContentStatus, NewContent, Visibility,
    approve, archive, edit,
  },
  grievance::{
    Attachment, Category, Gps, GrievanceQuery, NewGrievance, Priority,
    StatusHistoryEntry,
  },
  status::{Actor, GrievanceStatus, update_status},
  store::GrmStore,
  user::{NewUser, Role, Session, UserPatch, UserStatus},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn land_dispute(description: &str) -> NewGrievance {
  NewGrievance {
    reporter_name: Some("Fatmata Sesay".into()),
    category: Category::LandDispute,
    district: Some("Kenema".into()),
    ..NewGrievance::new(description)
  }
}

// ─── Grievance creation ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_sequential_report_ids() {
  let s = store().await;

  let a = s.create_grievance(land_dispute("first")).await.unwrap();
  let b = s.create_grievance(land_dispute("second")).await.unwrap();
  let c = s.create_grievance(land_dispute("third")).await.unwrap();

  assert_eq!(a.report_id, "G-0001");
  assert_eq!(b.report_id, "G-0002");
  assert_eq!(c.report_id, "G-0003");
  assert_eq!(s.count_grievances().await.unwrap(), 3);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_report_ids() {
  let s = store().await;

  let handles: Vec<_> = (0..16)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move {
        s.create_grievance(land_dispute(&format!("case {i}")))
          .await
          .unwrap()
          .report_id
      })
    })
    .collect();

  let mut ids = Vec::new();
  for h in handles {
    ids.push(h.await.unwrap());
  }
  ids.sort();
  ids.dedup();
  assert_eq!(ids.len(), 16);
  assert_eq!(ids.first().map(String::as_str), Some("G-0001"));
  assert_eq!(ids.last().map(String::as_str), Some("G-0016"));
}

#[tokio::test]
async fn created_record_round_trips_open_with_empty_trail() {
  let s = store().await;
  let input = NewGrievance {
    reporter_email: Some("reporter@example.org".into()),
    priority: Priority::High,
    gps: Some(Gps { lat: 7.8767, lng: -11.1875 }),
    attachments: vec![Attachment {
      url:      "https://files.example.org/deed.pdf".into(),
      filename: "deed.pdf".into(),
    }],
    ..land_dispute("boundary stones moved")
  };

  let created = s.create_grievance(input).await.unwrap();
  let fetched = s.get_grievance(created.id).await.unwrap().unwrap();

  assert_eq!(fetched.status, GrievanceStatus::Open);
  assert!(fetched.status_history.is_empty());
  assert!(fetched.first_response_at.is_none());
  assert!(fetched.resolved_at.is_none());
  assert_eq!(fetched.report_id, created.report_id);
  assert_eq!(fetched.category, Category::LandDispute);
  assert_eq!(fetched.priority, Priority::High);
  assert_eq!(fetched.gps, Some(Gps { lat: 7.8767, lng: -11.1875 }));
  assert_eq!(fetched.attachments.len(), 1);
  assert_eq!(fetched.reporter_email.as_deref(), Some("reporter@example.org"));
}

#[tokio::test]
async fn get_grievance_missing_returns_none() {
  let s = store().await;
  assert!(s.get_grievance(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_grievance_by_report_id("G-0404").await.unwrap().is_none());
}

#[tokio::test]
async fn get_grievance_by_report_id() {
  let s = store().await;
  s.create_grievance(land_dispute("one")).await.unwrap();
  let two = s.create_grievance(land_dispute("two")).await.unwrap();

  let fetched = s.get_grievance_by_report_id("G-0002").await.unwrap().unwrap();
  assert_eq!(fetched.id, two.id);
  assert_eq!(fetched.description, "two");
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_is_newest_first_and_filterable() {
  let s = store().await;
  let a = s.create_grievance(land_dispute("a")).await.unwrap();
  let b = s
    .create_grievance(NewGrievance {
      category: Category::EnvironmentalIssue,
      district: Some("Bo".into()),
      ..NewGrievance::new("b")
    })
    .await
    .unwrap();
  let c = s.create_grievance(land_dispute("c")).await.unwrap();

  let all = s.list_grievances(&GrievanceQuery::default()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|g| g.id).collect();
  assert_eq!(ids, vec![c.id, b.id, a.id]);

  let land = s
    .list_grievances(&GrievanceQuery {
      category: Some(Category::LandDispute),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(land.len(), 2);

  let bo = s
    .list_grievances(&GrievanceQuery {
      district: Some("bo".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(bo.len(), 1);
  assert_eq!(bo[0].id, b.id);

  let page = s
    .list_grievances(&GrievanceQuery {
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.len(), 1);
  assert_eq!(page[0].id, b.id);
}

#[tokio::test]
async fn list_filters_by_status() {
  let s = store().await;
  let a = s.create_grievance(land_dispute("a")).await.unwrap();
  s.create_grievance(land_dispute("b")).await.unwrap();

  let updated = update_status(&a, "resolved", &Actor::named("Jane"), Utc::now()).unwrap();
  assert!(s.save_grievance(&updated).await.unwrap());

  let resolved = s
    .list_grievances(&GrievanceQuery {
      status: Some(GrievanceStatus::Resolved),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(resolved.len(), 1);
  assert_eq!(resolved[0].id, a.id);
}

// ─── Status updates ──────────────────────────────────────────────────────────

#[tokio::test]
async fn save_persists_status_stamps_and_trail() {
  let s = store().await;
  let created = s.create_grievance(land_dispute("x")).await.unwrap();

  let updated =
    update_status(&created, "escalated", &Actor::named("Jane"), Utc::now()).unwrap();
  assert!(s.save_grievance(&updated).await.unwrap());

  let fetched = s.get_grievance(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, GrievanceStatus::InProgress);
  assert!(fetched.first_response_at.is_some());
  assert_eq!(fetched.status_history.len(), 1);
  assert_eq!(fetched.status_history[0].by.as_deref(), Some("Jane"));
  assert_eq!(
    fetched.status_history[0].action.as_deref(),
    Some("Status changed to in_progress")
  );
}

#[tokio::test]
async fn save_missing_grievance_returns_false() {
  let s = store().await;
  let created = s.create_grievance(land_dispute("x")).await.unwrap();
  let mut ghost = created.clone();
  ghost.id = Uuid::new_v4();
  assert!(!s.save_grievance(&ghost).await.unwrap());
}

#[tokio::test]
async fn stored_corrupt_trail_is_healed_by_next_update() {
  let s = store().await;
  let mut created = s.create_grievance(land_dispute("x")).await.unwrap();

  let good = StatusHistoryEntry::new(
    GrievanceStatus::Open,
    "Status changed to open",
    "Clerk",
    Utc::now() - Duration::days(2),
  );
  created.status_history = vec![
    StatusHistoryEntry {
      status: Some("pending".into()),
      ..Default::default()
    },
    good.clone(),
  ];
  assert!(s.save_grievance(&created).await.unwrap());

  let stored = s.get_grievance(created.id).await.unwrap().unwrap();
  assert_eq!(stored.status_history.len(), 2);

  let healed = update_status(&stored, "closed", &Actor::named("Jane"), Utc::now()).unwrap();
  s.save_grievance(&healed).await.unwrap();

  let fetched = s.get_grievance(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.status_history.len(), 2);
  assert_eq!(fetched.status_history[0], good);
  assert_eq!(fetched.status_history[1].status.as_deref(), Some("closed"));
}

#[tokio::test]
async fn null_trail_entries_are_skipped_and_healed() {
  let s = store().await;
  let created = s.create_grievance(land_dispute("x")).await.unwrap();
  s.execute_raw(
    r#"UPDATE grievances SET history_json = '[null,{"status":"pending","action":"Status changed to open","by":"Clerk","date":"2024-01-01T00:00:00Z"}]'"#,
  )
  .await
  .unwrap();

  let stored = s.get_grievance(created.id).await.unwrap().unwrap();
  assert_eq!(stored.status_history.len(), 1);

  let updated = update_status(&stored, "resolved", &Actor::named("Jane"), Utc::now()).unwrap();
  assert!(s.save_grievance(&updated).await.unwrap());

  let fetched = s.get_grievance(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, GrievanceStatus::Resolved);
  assert_eq!(fetched.status_history.len(), 2);
  assert_eq!(fetched.status_history[0].status.as_deref(), Some("open"));
  assert_eq!(fetched.status_history[0].by.as_deref(), Some("Clerk"));
  assert_eq!(fetched.status_history[1].status.as_deref(), Some("resolved"));
}

#[tokio::test]
async fn reused_report_id_is_a_collision() {
  let s = store().await;
  s.create_grievance(land_dispute("one")).await.unwrap();
  s.create_grievance(land_dispute("two")).await.unwrap();

  // With G-0001 gone the count is 1 again, so the next id would be G-0002.
  s.execute_raw("DELETE FROM grievances WHERE report_id = 'G-0001'")
    .await
    .unwrap();

  let err = s.create_grievance(land_dispute("three")).await.unwrap_err();
  assert!(matches!(err, Error::ReportIdCollision));
  assert_eq!(s.count_grievances().await.unwrap(), 1);
}

// ─── Users ───────────────────────────────────────────────────────────────────

fn new_user(email: &str, role: Role) -> NewUser {
  NewUser {
    name:          "Jane Officer".into(),
    email:         email.into(),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    role,
  }
}

#[tokio::test]
async fn create_and_fetch_user() {
  let s = store().await;
  let user = s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();
  assert_eq!(user.status, UserStatus::Active);

  let fetched = s.get_user(user.id).await.unwrap().unwrap();
  assert_eq!(fetched, user);

  let creds = s.get_credentials("jane@example.org").await.unwrap().unwrap();
  assert_eq!(creds.user.id, user.id);
  assert!(creds.password_hash.starts_with("$argon2id$"));

  assert_eq!(s.count_users().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();
  let err = s
    .create_user(new_user("jane@example.org", Role::Analyst))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateEmail(ref e) if e == "jane@example.org"));
}

#[tokio::test]
async fn update_user_applies_patch() {
  let s = store().await;
  let user = s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();

  let patched = s
    .update_user(user.id, UserPatch {
      role: Some(Role::Supervisor),
      ..Default::default()
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(patched.role, Role::Supervisor);
  assert_eq!(patched.name, user.name);
  assert_eq!(patched.email, user.email);

  assert!(
    s.update_user(Uuid::new_v4(), UserPatch::default())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn update_user_to_taken_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("a@example.org", Role::Officer)).await.unwrap();
  let b = s.create_user(new_user("b@example.org", Role::Officer)).await.unwrap();

  let err = s
    .update_user(b.id, UserPatch {
      email: Some("a@example.org".into()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateEmail(_)));
}

// ─── Sessions ────────────────────────────────────────────────────────────────

fn session_for(user_id: Uuid, hash: &str) -> Session {
  let now = Utc::now();
  Session {
    token_hash: hash.into(),
    user_id,
    created_at: now,
    expires_at: now + Duration::days(30),
  }
}

#[tokio::test]
async fn session_lifecycle() {
  let s = store().await;
  let user = s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();

  s.create_session(session_for(user.id, "h1")).await.unwrap();
  let fetched = s.get_session("h1").await.unwrap().unwrap();
  assert_eq!(fetched.user_id, user.id);

  assert!(s.delete_session("h1").await.unwrap());
  assert!(!s.delete_session("h1").await.unwrap());
  assert!(s.get_session("h1").await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_user_removes_sessions() {
  let s = store().await;
  let user = s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();
  s.create_session(session_for(user.id, "h1")).await.unwrap();

  assert!(s.delete_user(user.id).await.unwrap());
  assert!(s.get_user(user.id).await.unwrap().is_none());
  assert!(s.get_session("h1").await.unwrap().is_none());
  assert!(!s.delete_user(user.id).await.unwrap());
}

#[tokio::test]
async fn disabling_user_revokes_sessions() {
  let s = store().await;
  let user = s.create_user(new_user("jane@example.org", Role::Officer)).await.unwrap();
  s.create_session(session_for(user.id, "h1")).await.unwrap();

  s.update_user(user.id, UserPatch {
    status: Some(UserStatus::Disabled),
    ..Default::default()
  })
  .await
  .unwrap();

  assert!(s.get_session("h1").await.unwrap().is_none());
}

// ─── Content ─────────────────────────────────────────────────────────────────

fn notice(slug: &str) -> NewContent {
  NewContent {
    slug: slug.into(),
    title: format!("Notice {slug}"),
    body: Some("Community meeting on Friday".into()),
    tags: vec!["meeting".into()],
    ..Default::default()
  }
}

#[tokio::test]
async fn content_round_trips() {
  let s = store().await;
  let created = s.create_content(notice("town-hall")).await.unwrap();

  let by_id = s.get_content(created.id).await.unwrap().unwrap();
  assert_eq!(by_id, created);
  assert_eq!(by_id.status, ContentStatus::Draft);
  assert_eq!(by_id.version, 1);

  let by_slug = s.get_content_by_slug("town-hall").await.unwrap().unwrap();
  assert_eq!(by_slug.id, created.id);

  assert!(s.get_content(Uuid::new_v4()).await.unwrap().is_none());
  assert!(s.get_content_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_slug_is_rejected() {
  let s = store().await;
  s.create_content(notice("town-hall")).await.unwrap();
  let err = s.create_content(notice("town-hall")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateSlug(ref slug) if slug == "town-hall"));
}

#[tokio::test]
async fn save_content_persists_versions() {
  let s = store().await;
  let by = Uuid::new_v4();
  let created = s.create_content(notice("town-hall")).await.unwrap();

  let published = approve(&created, by, Utc::now());
  assert!(s.save_content(&published).await.unwrap());

  let fetched = s.get_content(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, published);
  assert_eq!(fetched.version, 2);
  assert_eq!(fetched.versions.len(), 1);
  assert_eq!(fetched.published_by, Some(by));

  let mut ghost = published.clone();
  ghost.id = Uuid::new_v4();
  assert!(!s.save_content(&ghost).await.unwrap());
}

#[tokio::test]
async fn public_listing_shows_only_published_public_content() {
  let s = store().await;
  let by = Uuid::new_v4();
  let t0 = Utc::now() - Duration::days(3);

  let make_public = ContentPatch {
    visibility: Some(Visibility::Public),
    ..Default::default()
  };

  let older = s.create_content(notice("older")).await.unwrap();
  let older = approve(&edit(&older, make_public.clone(), by, t0).unwrap(), by, t0);
  s.save_content(&older).await.unwrap();

  let newer = s.create_content(notice("newer")).await.unwrap();
  let newer = approve(&edit(&newer, make_public.clone(), by, t0).unwrap(), by, Utc::now());
  s.save_content(&newer).await.unwrap();

  let internal = s.create_content(notice("internal")).await.unwrap();
  s.save_content(&approve(&internal, by, Utc::now())).await.unwrap();

  let retired = s.create_content(notice("retired")).await.unwrap();
  let retired = archive(&approve(&edit(&retired, make_public, by, t0).unwrap(), by, t0), by, t0);
  s.save_content(&retired).await.unwrap();

  s.create_content(notice("draft")).await.unwrap();

  let public = s.list_content(&ContentQuery::public()).await.unwrap();
  let slugs: Vec<_> = public.iter().map(|c| c.slug.as_str()).collect();
  assert_eq!(slugs, ["newer", "older"]);

  let all = s.list_content(&ContentQuery::default()).await.unwrap();
  assert_eq!(all.len(), 5);
  // Never-published items come after everything published.
  assert_eq!(all.last().map(|c| c.slug.as_str()), Some("draft"));

  let drafts = s
    .list_content(&ContentQuery {
      status: Some(ContentStatus::Draft),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(drafts.len(), 1);
}
