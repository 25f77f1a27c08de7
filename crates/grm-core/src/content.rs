//! Published content: news items, notices and pages shown on the public site.
//!
//! Content moves through `draft` → `in_review` → `published` → `archived`.
//! Each approval bumps the version number and snapshots the text into
//! `versions`, so an earlier approved text can be restored later. As with
//! grievances, every transition is a pure function returning a new value for
//! the caller to save.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status & visibility ─────────────────────────────────────────────────────

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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContentStatus {
  #[default]
  Draft,
  InReview,
  Published,
  Archived,
}

impl ContentStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownContentStatus(s.to_owned()))
  }
}

/// Who may see published content. Internal content never reaches the public
/// endpoints, whatever its status.
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
pub enum Visibility {
  #[default]
  Internal,
  Public,
}

impl Visibility {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn from_label(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownVisibility(s.to_owned()))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Snapshot of the text taken when a piece of content is approved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVersion {
  pub version:    u32,
  pub title:      String,
  pub summary:    Option<String>,
  pub body:       Option<String>,
  pub updated_by: Option<Uuid>,
  pub updated_at: DateTime<Utc>,
  #[serde(default)]
  pub note:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
  pub id:           Uuid,
  /// Lower-case, hyphenated; unique across all content.
  pub slug:         String,
  pub title:        String,
  pub summary:      Option<String>,
  pub body:         Option<String>,
  pub category:     Option<String>,
  pub tags:         Vec<String>,
  pub status:       ContentStatus,
  pub visibility:   Visibility,
  pub version:      u32,
  pub versions:     Vec<ContentVersion>,
  pub created_by:   Option<Uuid>,
  pub updated_by:   Option<Uuid>,
  pub published_by: Option<Uuid>,
  pub published_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Content {
  /// A new draft at version 1 with no snapshots.
  pub fn draft(id: Uuid, input: NewContent, now: DateTime<Utc>) -> Self {
    Self {
      id,
      slug: input.slug,
      title: input.title,
      summary: input.summary,
      body: input.body,
      category: input.category,
      tags: input.tags,
      status: ContentStatus::Draft,
      visibility: input.visibility,
      version: 1,
      versions: Vec::new(),
      created_by: input.created_by,
      updated_by: input.created_by,
      published_by: None,
      published_at: None,
      created_at: now,
      updated_at: now,
    }
  }

  /// `true` if the public endpoints may show this item.
  pub fn is_public(&self) -> bool {
    self.status == ContentStatus::Published && self.visibility == Visibility::Public
  }
}

/// A content item as shown in listings: everything except the snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
  pub id:           Uuid,
  pub slug:         String,
  pub title:        String,
  pub summary:      Option<String>,
  pub body:         Option<String>,
  pub category:     Option<String>,
  pub tags:         Vec<String>,
  pub status:       ContentStatus,
  pub visibility:   Visibility,
  pub version:      u32,
  pub published_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl From<Content> for ContentSummary {
  fn from(c: Content) -> Self {
    Self {
      id:           c.id,
      slug:         c.slug,
      title:        c.title,
      summary:      c.summary,
      body:         c.body,
      category:     c.category,
      tags:         c.tags,
      status:       c.status,
      visibility:   c.visibility,
      version:      c.version,
      published_at: c.published_at,
      created_at:   c.created_at,
      updated_at:   c.updated_at,
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input for creating content. New content is always a draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContent {
  pub slug:       String,
  pub title:      String,
  pub summary:    Option<String>,
  pub body:       Option<String>,
  pub category:   Option<String>,
  pub tags:       Vec<String>,
  pub visibility: Visibility,
  pub created_by: Option<Uuid>,
}

impl NewContent {
  /// Slugify the slug, trim text fields, and reject a missing slug or title.
  pub fn normalized(mut self) -> Result<Self> {
    self.slug = slugify(&self.slug);
    if self.slug.is_empty() {
      return Err(Error::MissingSlug);
    }
    self.title = self.title.trim().to_owned();
    if self.title.is_empty() {
      return Err(Error::MissingTitle);
    }
    self.summary = tidy(self.summary);
    self.category = tidy(self.category);
    self.tags = tidy_tags(self.tags);
    Ok(self)
  }
}

/// An edit to content text or metadata; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
  pub title:      Option<String>,
  pub summary:    Option<String>,
  pub body:       Option<String>,
  pub category:   Option<String>,
  pub tags:       Option<Vec<String>>,
  pub visibility: Option<Visibility>,
}

/// Lower-case `raw` and collapse every run of characters outside `[a-z0-9]`
/// into a single hyphen, with no hyphen at either end.
pub fn slugify(raw: &str) -> String {
  let mut slug = String::with_capacity(raw.len());
  for c in raw.to_lowercase().chars() {
    if c.is_ascii_lowercase() || c.is_ascii_digit() {
      slug.push(c);
    } else if !slug.is_empty() && !slug.ends_with('-') {
      slug.push('-');
    }
  }
  if slug.ends_with('-') {
    slug.pop();
  }
  slug
}

fn tidy(value: Option<String>) -> Option<String> {
  value
    .map(|v| v.trim().to_owned())
    .filter(|v| !v.is_empty())
}

fn tidy_tags(tags: Vec<String>) -> Vec<String> {
  tags
    .into_iter()
    .map(|t| t.trim().to_owned())
    .filter(|t| !t.is_empty())
    .collect()
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

fn touched(record: &Content, by: Uuid, now: DateTime<Utc>) -> Content {
  Content {
    updated_by: Some(by),
    updated_at: now,
    ..record.clone()
  }
}

/// Apply `patch` to `record`. A blank title is rejected.
pub fn edit(
  record: &Content,
  patch: ContentPatch,
  by: Uuid,
  now: DateTime<Utc>,
) -> Result<Content> {
  let mut next = touched(record, by, now);
  if let Some(title) = patch.title {
    let title = title.trim();
    if title.is_empty() {
      return Err(Error::MissingTitle);
    }
    title.clone_into(&mut next.title);
  }
  if patch.summary.is_some() {
    next.summary = tidy(patch.summary);
  }
  if patch.body.is_some() {
    next.body = patch.body;
  }
  if patch.category.is_some() {
    next.category = tidy(patch.category);
  }
  if let Some(tags) = patch.tags {
    next.tags = tidy_tags(tags);
  }
  if let Some(visibility) = patch.visibility {
    next.visibility = visibility;
  }
  Ok(next)
}

pub fn submit_for_review(record: &Content, by: Uuid, now: DateTime<Utc>) -> Content {
  Content {
    status: ContentStatus::InReview,
    ..touched(record, by, now)
  }
}

/// Publish `record` as a new version, snapshotting its current text.
pub fn approve(record: &Content, by: Uuid, now: DateTime<Utc>) -> Content {
  let version = record.version.max(1) + 1;
  let mut next = Content {
    status: ContentStatus::Published,
    published_by: Some(by),
    published_at: Some(now),
    version,
    ..touched(record, by, now)
  };
  next.versions.push(ContentVersion {
    version,
    title: record.title.clone(),
    summary: record.summary.clone(),
    body: record.body.clone(),
    updated_by: Some(by),
    updated_at: now,
    note: None,
  });
  next
}

/// Publish `record` as is, without a new version.
pub fn publish(record: &Content, by: Uuid, now: DateTime<Utc>) -> Content {
  Content {
    status: ContentStatus::Published,
    published_by: Some(by),
    published_at: Some(now),
    ..touched(record, by, now)
  }
}

/// Archiving is the only way content leaves the site; rows are never
/// deleted.
pub fn archive(record: &Content, by: Uuid, now: DateTime<Utc>) -> Content {
  Content {
    status: ContentStatus::Archived,
    ..touched(record, by, now)
  }
}

/// Restore the text of snapshot `version`. Returns `None` if there is no
/// such snapshot. The snapshot list itself is left as is.
pub fn revert_to_version(
  record: &Content,
  version: u32,
  by: Uuid,
  now: DateTime<Utc>,
) -> Option<Content> {
  let snapshot = record.versions.iter().find(|v| v.version == version)?;
  Some(Content {
    title: snapshot.title.clone(),
    summary: snapshot.summary.clone(),
    body: snapshot.body.clone(),
    version,
    ..touched(record, by, now)
  })
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Filters for listing content. Results are most recently published first,
/// then most recently updated.
#[derive(Debug, Clone, Default)]
pub struct ContentQuery {
  pub status:     Option<ContentStatus>,
  pub visibility: Option<Visibility>,
}

impl ContentQuery {
  /// What the public site may list.
  pub fn public() -> Self {
    Self {
      status:     Some(ContentStatus::Published),
      visibility: Some(Visibility::Public),
    }
  }
}
