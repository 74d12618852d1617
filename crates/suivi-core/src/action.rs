//! Action types: the to-do items tracked for a person, and the attribution
//! records naming who authored them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, ser::SerializeStruct};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of an action. This is the source of truth for completion;
/// the legacy `is_done` flag is derived from it.
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
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
  #[default]
  NotStarted,
  InProgress,
  Done,
}

impl ActionStatus {
  pub fn is_done(self) -> bool { matches!(self, Self::Done) }

  /// Parse a wire status, returning `None` for anything outside the three
  /// known values.
  pub fn parse(raw: &str) -> Option<Self> { raw.parse().ok() }
}

// ─── Attribution ─────────────────────────────────────────────────────────────

/// Which kind of actor authored an action.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActorKind {
  Person,
  Counselor,
}

/// The author of an action, carrying the id of the person or counselor it
/// points to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Actor {
  Person(String),
  Counselor(String),
}

impl Actor {
  pub fn new(kind: ActorKind, creator_id: impl Into<String>) -> Self {
    match kind {
      ActorKind::Person => Self::Person(creator_id.into()),
      ActorKind::Counselor => Self::Counselor(creator_id.into()),
    }
  }

  pub fn kind(&self) -> ActorKind {
    match self {
      Self::Person(_) => ActorKind::Person,
      Self::Counselor(_) => ActorKind::Counselor,
    }
  }

  pub fn creator_id(&self) -> &str {
    match self {
      Self::Person(id) | Self::Counselor(id) => id,
    }
  }
}

/// A durable attribution record. One exists per distinct [`Actor`]; its id is
/// independent of the person or counselor it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRef {
  pub actor_id: Uuid,
  pub creator:  Actor,
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// A to-do item owned by a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
  pub action_id:            Uuid,
  pub person_id:            String,
  pub content:              String,
  pub comment:              Option<String>,
  pub status:               ActionStatus,
  pub visible_to_counselor: bool,
  pub created_at:           DateTime<Utc>,
  pub limit_date:           Option<DateTime<Utc>>,
  pub last_update:          DateTime<Utc>,
  /// When the action last reached [`ActionStatus::Done`]; cleared when it
  /// leaves that status.
  pub completed_at:         Option<DateTime<Utc>>,
  pub creator:              ActorRef,
}

impl Action {
  /// Legacy completion flag, always derived from `status`.
  pub fn is_done(&self) -> bool { self.status.is_done() }
}

// Serialised by hand so the derived `is_done` flag travels with the status for
// clients that still read the boolean.
impl Serialize for Action {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Action", 12)?;
    s.serialize_field("action_id", &self.action_id)?;
    s.serialize_field("person_id", &self.person_id)?;
    s.serialize_field("content", &self.content)?;
    s.serialize_field("comment", &self.comment)?;
    s.serialize_field("status", &self.status)?;
    s.serialize_field("is_done", &self.is_done())?;
    s.serialize_field("visible_to_counselor", &self.visible_to_counselor)?;
    s.serialize_field("created_at", &self.created_at)?;
    s.serialize_field("limit_date", &self.limit_date)?;
    s.serialize_field("last_update", &self.last_update)?;
    s.serialize_field("completed_at", &self.completed_at)?;
    s.serialize_field("creator", &self.creator)?;
    s.end()
  }
}

/// Caller input to [`crate::lifecycle::ActionLifecycle::create`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAction {
  pub content:      String,
  #[serde(default)]
  pub comment:      Option<String>,
  /// Explicit initial status. Takes precedence over `is_done`.
  #[serde(default)]
  pub status:       Option<ActionStatus>,
  /// Legacy clients send a boolean instead of a status.
  #[serde(default)]
  pub is_done:      bool,
  pub creator_kind: ActorKind,
}

impl CreateAction {
  /// The initial status: the explicit one if given, otherwise derived from
  /// the legacy flag.
  pub fn initial_status(&self) -> ActionStatus {
    match (self.status, self.is_done) {
      (Some(status), _) => status,
      (None, true) => ActionStatus::Done,
      (None, false) => ActionStatus::NotStarted,
    }
  }
}

/// Per-person action counts shown on the counselor's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonActionSummary {
  pub person_id:  String,
  pub first_name: String,
  pub last_name:  String,
  pub todo_count: u32,
  pub done_count: u32,
}
