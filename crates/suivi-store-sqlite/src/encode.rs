//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that SQL string comparison orders them
//! chronologically. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use suivi_core::{
  action::{Action, ActionStatus, Actor, ActorKind, ActorRef},
  appointment::Appointment,
  person::{Counselor, Person},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ────────────────────────────────────────────────────────────────────

pub fn encode_status(s: ActionStatus) -> &'static str { s.into() }

pub fn decode_status(s: &str) -> Result<ActionStatus> {
  ActionStatus::parse(s).ok_or_else(|| Error::Decode {
    column: "status",
    value:  s.to_owned(),
  })
}

pub fn encode_actor_kind(k: ActorKind) -> &'static str { k.into() }

pub fn decode_actor_kind(s: &str) -> Result<ActorKind> {
  s.parse().map_err(|_| Error::Decode {
    column: "creator_kind",
    value:  s.to_owned(),
  })
}

// ─── Raw rows ─────────────────────────────────────────────────────────────────

pub struct RawCounselor {
  pub counselor_id: String,
  pub first_name:   String,
  pub last_name:    String,
}

impl RawCounselor {
  pub fn into_counselor(self) -> Counselor {
    Counselor {
      counselor_id: self.counselor_id,
      first_name:   self.first_name,
      last_name:    self.last_name,
    }
  }
}

pub const PERSON_COLUMNS: &str = "person_id, first_name, last_name, created_at, \
   push_token, push_token_updated_at, counselor_id";

pub struct RawPerson {
  pub person_id:             String,
  pub first_name:            String,
  pub last_name:             String,
  pub created_at:            String,
  pub push_token:            Option<String>,
  pub push_token_updated_at: Option<String>,
  pub counselor_id:          String,
}

impl RawPerson {
  /// Read a row selected with [`PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:             row.get(0)?,
      first_name:            row.get(1)?,
      last_name:             row.get(2)?,
      created_at:            row.get(3)?,
      push_token:            row.get(4)?,
      push_token_updated_at: row.get(5)?,
      counselor_id:          row.get(6)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:             self.person_id,
      first_name:            self.first_name,
      last_name:             self.last_name,
      created_at:            decode_dt(&self.created_at)?,
      push_token:            self.push_token,
      push_token_updated_at: decode_opt_dt(self.push_token_updated_at)?,
      counselor_id:          self.counselor_id,
    })
  }
}

pub struct RawActor {
  pub actor_id:     String,
  pub creator_id:   String,
  pub creator_kind: String,
}

impl RawActor {
  pub fn into_actor_ref(self) -> Result<ActorRef> {
    let kind = decode_actor_kind(&self.creator_kind)?;
    Ok(ActorRef {
      actor_id: decode_uuid(&self.actor_id)?,
      creator:  Actor::new(kind, self.creator_id),
    })
  }
}

pub const ACTION_COLUMNS: &str = "a.action_id, a.person_id, a.content, a.comment, \
   a.status, a.visible_to_counselor, a.created_at, a.limit_date, a.last_update, \
   a.completed_at, r.actor_id, r.creator_id, r.creator_kind";

pub struct RawAction {
  pub action_id:            String,
  pub person_id:            String,
  pub content:              String,
  pub comment:              Option<String>,
  pub status:               String,
  pub visible_to_counselor: bool,
  pub created_at:           String,
  pub limit_date:           Option<String>,
  pub last_update:          String,
  pub completed_at:         Option<String>,
  pub actor:                RawActor,
}

impl RawAction {
  /// Read a row selected with [`ACTION_COLUMNS`] from `actions a JOIN actors r`.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      action_id:            row.get(0)?,
      person_id:            row.get(1)?,
      content:              row.get(2)?,
      comment:              row.get(3)?,
      status:               row.get(4)?,
      visible_to_counselor: row.get(5)?,
      created_at:           row.get(6)?,
      limit_date:           row.get(7)?,
      last_update:          row.get(8)?,
      completed_at:         row.get(9)?,
      actor:                RawActor {
        actor_id:     row.get(10)?,
        creator_id:   row.get(11)?,
        creator_kind: row.get(12)?,
      },
    })
  }

  pub fn into_action(self) -> Result<Action> {
    Ok(Action {
      action_id:            decode_uuid(&self.action_id)?,
      person_id:            self.person_id,
      content:              self.content,
      comment:              self.comment,
      status:               decode_status(&self.status)?,
      visible_to_counselor: self.visible_to_counselor,
      created_at:           decode_dt(&self.created_at)?,
      limit_date:           decode_opt_dt(self.limit_date)?,
      last_update:          decode_dt(&self.last_update)?,
      completed_at:         decode_opt_dt(self.completed_at)?,
      creator:              self.actor.into_actor_ref()?,
    })
  }
}

pub const APPOINTMENT_COLUMNS: &str = "appointment_id, title, subtitle, comment, \
   modality, date, duration_seconds, soft_deleted, person_id, counselor_id";

pub struct RawAppointment {
  pub appointment_id:   String,
  pub title:            String,
  pub subtitle:         String,
  pub comment:          Option<String>,
  pub modality:         String,
  pub date:             String,
  pub duration_seconds: i64,
  pub soft_deleted:     bool,
  pub person_id:        String,
  pub counselor_id:     String,
}

impl RawAppointment {
  /// Read a row selected with [`APPOINTMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment_id:   row.get(0)?,
      title:            row.get(1)?,
      subtitle:         row.get(2)?,
      comment:          row.get(3)?,
      modality:         row.get(4)?,
      date:             row.get(5)?,
      duration_seconds: row.get(6)?,
      soft_deleted:     row.get(7)?,
      person_id:        row.get(8)?,
      counselor_id:     row.get(9)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    let duration = TimeDelta::try_seconds(self.duration_seconds).ok_or_else(|| Error::Decode {
      column: "duration_seconds",
      value:  self.duration_seconds.to_string(),
    })?;

    Ok(Appointment {
      appointment_id: decode_uuid(&self.appointment_id)?,
      title: self.title,
      subtitle: self.subtitle,
      comment: self.comment,
      modality: self.modality,
      date: decode_dt(&self.date)?,
      duration,
      soft_deleted: self.soft_deleted,
      person_id: self.person_id,
      counselor_id: self.counselor_id,
    })
  }
}
