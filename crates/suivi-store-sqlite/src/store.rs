//! Store trait implementations over one `tokio_rusqlite` connection.

use std::path::Path;

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use suivi_core::{
  action::{Action, ActionStatus, Actor, ActorRef, PersonActionSummary},
  appointment::Appointment,
  person::{Counselor, NewPerson, Person},
  store::{
    ActionStore, ActorStore, AppointmentStore, CounselorStore, PersonStore,
    RegistrationStore,
  },
};

use crate::{
  Error, Result,
  encode::{
    ACTION_COLUMNS, APPOINTMENT_COLUMNS, PERSON_COLUMNS, RawAction, RawActor,
    RawAppointment, RawCounselor, RawPerson, encode_actor_kind, encode_dt,
    encode_status, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A store backed by a single SQLite file.
///
/// Clones share the same background connection.
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

  /// Open a fresh in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
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

  async fn list_appointments(
    &self,
    owner_column: &'static str,
    owner_id: &str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> Result<Vec<Appointment>> {
    let owner_id = owner_id.to_owned();
    let from_str = encode_dt(from);

    let raws: Vec<RawAppointment> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {APPOINTMENT_COLUMNS}
           FROM appointments
           WHERE {owner_column} = ?1
             AND date >= ?2
             AND (?3 OR soft_deleted = 0)
           ORDER BY date ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_id, from_str, include_deleted],
            RawAppointment::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAppointment::into_appointment).collect()
  }
}

// ─── People ──────────────────────────────────────────────────────────────────

impl PersonStore for SqliteStore {
  type Error = Error;

  async fn get_person(&self, person_id: &str) -> Result<Option<Person>> {
    let id = person_id.to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
              rusqlite::params![id],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_persons_by_counselor(&self, counselor_id: &str) -> Result<Vec<Person>> {
    let id = counselor_id.to_owned();

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS} FROM persons WHERE counselor_id = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }
}

impl CounselorStore for SqliteStore {
  type Error = Error;

  async fn get_counselor(&self, counselor_id: &str) -> Result<Option<Counselor>> {
    let id = counselor_id.to_owned();

    let raw: Option<RawCounselor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT counselor_id, first_name, last_name FROM counselors
               WHERE counselor_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawCounselor {
                  counselor_id: row.get(0)?,
                  first_name:   row.get(1)?,
                  last_name:    row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawCounselor::into_counselor))
  }
}

// ─── Actors ──────────────────────────────────────────────────────────────────

impl ActorStore for SqliteStore {
  type Error = Error;

  async fn find_or_create_actor(&self, creator: &Actor) -> Result<ActorRef> {
    let new_id      = encode_uuid(Uuid::new_v4());
    let creator_id  = creator.creator_id().to_owned();
    let kind_str    = encode_actor_kind(creator.kind());

    let raw: RawActor = self
      .conn
      .call(move |conn| {
        // The UNIQUE (creator_id, creator_kind) constraint makes this a no-op
        // when the actor already exists.
        conn.execute(
          "INSERT OR IGNORE INTO actors (actor_id, creator_id, creator_kind)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![new_id, creator_id, kind_str],
        )?;
        Ok(conn.query_row(
          "SELECT actor_id, creator_id, creator_kind FROM actors
           WHERE creator_id = ?1 AND creator_kind = ?2",
          rusqlite::params![creator_id, kind_str],
          |row| {
            Ok(RawActor {
              actor_id:     row.get(0)?,
              creator_id:   row.get(1)?,
              creator_kind: row.get(2)?,
            })
          },
        )?)
      })
      .await?;

    raw.into_actor_ref()
  }

  async fn find_actor(&self, creator: &Actor) -> Result<Option<ActorRef>> {
    let creator_id = creator.creator_id().to_owned();
    let kind_str   = encode_actor_kind(creator.kind());

    let raw: Option<RawActor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT actor_id, creator_id, creator_kind FROM actors
               WHERE creator_id = ?1 AND creator_kind = ?2",
              rusqlite::params![creator_id, kind_str],
              |row| {
                Ok(RawActor {
                  actor_id:     row.get(0)?,
                  creator_id:   row.get(1)?,
                  creator_kind: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawActor::into_actor_ref).transpose()
  }
}

// ─── Actions ─────────────────────────────────────────────────────────────────

impl ActionStore for SqliteStore {
  type Error = Error;

  async fn add_action(&self, action: &Action) -> Result<()> {
    let action_id_str    = encode_uuid(action.action_id);
    let person_id        = action.person_id.clone();
    let content          = action.content.clone();
    let comment          = action.comment.clone();
    let status_str       = encode_status(action.status);
    let visible          = action.visible_to_counselor;
    let created_at_str   = encode_dt(action.created_at);
    let limit_date_str   = action.limit_date.map(encode_dt);
    let last_update_str  = encode_dt(action.last_update);
    let completed_at_str = action.completed_at.map(encode_dt);
    let actor_id_str     = encode_uuid(action.creator.actor_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO actions (
             action_id, person_id, content, comment, status,
             visible_to_counselor, created_at, limit_date, last_update,
             completed_at, actor_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            action_id_str,
            person_id,
            content,
            comment,
            status_str,
            visible,
            created_at_str,
            limit_date_str,
            last_update_str,
            completed_at_str,
            actor_id_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_action(&self, action_id: Uuid) -> Result<Option<Action>> {
    let id_str = encode_uuid(action_id);

    let raw: Option<RawAction> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACTION_COLUMNS}
                 FROM actions a JOIN actors r ON r.actor_id = a.actor_id
                 WHERE a.action_id = ?1"
              ),
              rusqlite::params![id_str],
              RawAction::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAction::into_action).transpose()
  }

  async fn list_actions_by_person(&self, person_id: &str) -> Result<Vec<Action>> {
    let id = person_id.to_owned();

    let raws: Vec<RawAction> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTION_COLUMNS}
           FROM actions a JOIN actors r ON r.actor_id = a.actor_id
           WHERE a.person_id = ?1
           ORDER BY a.rowid"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawAction::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAction::into_action).collect()
  }

  async fn update_status(
    &self,
    action_id: Uuid,
    status: ActionStatus,
    at: DateTime<Utc>,
  ) -> Result<()> {
    let id_str     = encode_uuid(action_id);
    let status_str = encode_status(status);
    let at_str     = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE actions
           SET status       = ?2,
               last_update  = ?3,
               completed_at = CASE WHEN ?2 = 'done' THEN ?3 ELSE NULL END
           WHERE action_id = ?1",
          rusqlite::params![id_str, status_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update_legacy_done(&self, action_id: Uuid, done: bool, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(action_id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        // SET expressions read the pre-update row.
        conn.execute(
          "UPDATE actions
           SET status = CASE
                 WHEN ?2 THEN 'done'
                 WHEN status = 'done' THEN 'not_started'
                 ELSE status
               END,
               completed_at = CASE
                 WHEN ?2 AND status = 'done' THEN completed_at
                 WHEN ?2 THEN ?3
                 WHEN status = 'done' THEN NULL
                 ELSE completed_at
               END,
               last_update = ?3
           WHERE action_id = ?1",
          rusqlite::params![id_str, done, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn summary_by_counselor(&self, counselor_id: &str) -> Result<Vec<PersonActionSummary>> {
    let id = counselor_id.to_owned();

    let rows: Vec<PersonActionSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT
             p.person_id, p.first_name, p.last_name,
             COUNT(a.action_id) - COUNT(CASE WHEN a.status = 'done' THEN 1 END) AS todo,
             COUNT(CASE WHEN a.status = 'done' THEN 1 END)                      AS done
           FROM persons p
           LEFT JOIN actions a ON a.person_id = p.person_id
           WHERE p.counselor_id = ?1
           GROUP BY p.person_id, p.first_name, p.last_name
           ORDER BY p.last_name ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], |row| {
            Ok(PersonActionSummary {
              person_id:  row.get(0)?,
              first_name: row.get(1)?,
              last_name:  row.get(2)?,
              todo_count: row.get(3)?,
              done_count: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(rows)
  }
}

// ─── Appointments ────────────────────────────────────────────────────────────

impl AppointmentStore for SqliteStore {
  type Error = Error;

  async fn add_appointment(&self, appointment: &Appointment) -> Result<()> {
    let id_str       = encode_uuid(appointment.appointment_id);
    let title        = appointment.title.clone();
    let subtitle     = appointment.subtitle.clone();
    let comment      = appointment.comment.clone();
    let modality     = appointment.modality.clone();
    let date_str     = encode_dt(appointment.date);
    let duration     = appointment.duration.num_seconds();
    let soft_deleted = appointment.soft_deleted;
    let person_id    = appointment.person_id.clone();
    let counselor_id = appointment.counselor_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
          ),
          rusqlite::params![
            id_str,
            title,
            subtitle,
            comment,
            modality,
            date_str,
            duration,
            soft_deleted,
            person_id,
            counselor_id,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_appointment(&self, appointment_id: Uuid) -> Result<Option<Appointment>> {
    let id_str = encode_uuid(appointment_id);

    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"
              ),
              rusqlite::params![id_str],
              RawAppointment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn list_appointments_by_person(
    &self,
    person_id: &str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> Result<Vec<Appointment>> {
    self
      .list_appointments("person_id", person_id, from, include_deleted)
      .await
  }

  async fn list_appointments_by_counselor(
    &self,
    counselor_id: &str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> Result<Vec<Appointment>> {
    self
      .list_appointments("counselor_id", counselor_id, from, include_deleted)
      .await
  }

  async fn soft_delete_appointment(&self, appointment_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(appointment_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE appointments SET soft_deleted = 1 WHERE appointment_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

impl RegistrationStore for SqliteStore {
  type Error = Error;

  async fn add_counselor(&self, counselor: &Counselor) -> Result<()> {
    let id         = counselor.counselor_id.clone();
    let first_name = counselor.first_name.clone();
    let last_name  = counselor.last_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO counselors (counselor_id, first_name, last_name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id, first_name, last_name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id:             input.person_id,
      first_name:            input.first_name,
      last_name:             input.last_name,
      // Stored at microsecond precision.
      created_at:            Utc::now().trunc_subsecs(6),
      push_token:            None,
      push_token_updated_at: None,
      counselor_id:          input.counselor_id,
    };

    let id           = person.person_id.clone();
    let first_name   = person.first_name.clone();
    let last_name    = person.last_name.clone();
    let at_str       = encode_dt(person.created_at);
    let counselor_id = person.counselor_id.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO persons (person_id, first_name, last_name, created_at, counselor_id)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id, first_name, last_name, at_str, counselor_id],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn update_push_token(
    &self,
    person_id: &str,
    token: Option<String>,
  ) -> Result<Option<Person>> {
    let id     = person_id.to_owned();
    let at_str = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE persons SET push_token = ?2, push_token_updated_at = ?3
           WHERE person_id = ?1",
          rusqlite::params![id, token, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_person(person_id).await
  }
}
