//! Collaborator traits the core reads and writes through.
//!
//! Each trait is narrow and implemented by storage backends (e.g.
//! `suivi-store-sqlite`). Higher layers depend on these abstractions, not on
//! any concrete backend. All methods return `Send` futures so the traits can be
//! used in multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  action::{Action, ActionStatus, Actor, ActorRef, PersonActionSummary},
  appointment::Appointment,
  person::{Counselor, NewPerson, Person},
};

// ─── People ──────────────────────────────────────────────────────────────────

pub trait PersonStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person<'a>(
    &'a self,
    person_id: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  /// All persons followed by a counselor, in no particular order.
  fn list_persons_by_counselor<'a>(
    &'a self,
    counselor_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;
}

pub trait CounselorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Retrieve a counselor by id. Returns `None` if not found.
  fn get_counselor<'a>(
    &'a self,
    counselor_id: &'a str,
  ) -> impl Future<Output = Result<Option<Counselor>, Self::Error>> + Send + 'a;
}

// ─── Actions ─────────────────────────────────────────────────────────────────

pub trait ActionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a fully-built action.
  fn add_action<'a>(
    &'a self,
    action: &'a Action,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_action(
    &self,
    action_id: Uuid,
  ) -> impl Future<Output = Result<Option<Action>, Self::Error>> + Send + '_;

  /// All actions owned by a person, in no particular order.
  fn list_actions_by_person<'a>(
    &'a self,
    person_id: &'a str,
  ) -> impl Future<Output = Result<Vec<Action>, Self::Error>> + Send + 'a;

  /// Set the status and `last_update`. `completed_at` becomes `at` when the
  /// status is `Done` and is cleared otherwise.
  fn update_status(
    &self,
    action_id: Uuid,
    status: ActionStatus,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Legacy boolean write. `true` stores `Done`; `false` moves a `Done` action
  /// back to `NotStarted` and leaves other statuses alone. Always sets
  /// `last_update`.
  fn update_legacy_done(
    &self,
    action_id: Uuid,
    done: bool,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Grouped todo/done counts for every person a counselor follows, ordered
  /// by last name ascending.
  fn summary_by_counselor<'a>(
    &'a self,
    counselor_id: &'a str,
  ) -> impl Future<Output = Result<Vec<PersonActionSummary>, Self::Error>> + Send + 'a;
}

pub trait ActorStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Upsert by natural key: return the existing record for `creator` or create
  /// one.
  fn find_or_create_actor<'a>(
    &'a self,
    creator: &'a Actor,
  ) -> impl Future<Output = Result<ActorRef, Self::Error>> + Send + 'a;

  fn find_actor<'a>(
    &'a self,
    creator: &'a Actor,
  ) -> impl Future<Output = Result<Option<ActorRef>, Self::Error>> + Send + 'a;
}

// ─── Appointments ────────────────────────────────────────────────────────────

pub trait AppointmentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn add_appointment<'a>(
    &'a self,
    appointment: &'a Appointment,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_appointment(
    &self,
    appointment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// Appointments of a person dated at or after `from`.
  fn list_appointments_by_person<'a>(
    &'a self,
    person_id: &'a str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + 'a;

  /// Appointments of a counselor dated at or after `from`, ordered by date.
  fn list_appointments_by_counselor<'a>(
    &'a self,
    counselor_id: &'a str,
    from: DateTime<Utc>,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + 'a;

  /// Flag an appointment as deleted. Touches no other field and succeeds on an
  /// already-deleted appointment.
  fn soft_delete_appointment(
    &self,
    appointment_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Writes owned by the registration flow. The core never calls these; they
/// exist so a backend can be populated through the same abstraction.
pub trait RegistrationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn add_counselor<'a>(
    &'a self,
    counselor: &'a Counselor,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Register a person; `created_at` is set by the store.
  fn add_person(
    &self,
    person: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Replace a person's push token and stamp `push_token_updated_at`.
  /// Returns `None` if the person does not exist.
  fn update_push_token<'a>(
    &'a self,
    person_id: &'a str,
    token: Option<String>,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Every store the core components need, behind one bound.
pub trait Store:
  PersonStore + CounselorStore + ActionStore + ActorStore + AppointmentStore
{
}

impl<T> Store for T where
  T: PersonStore + CounselorStore + ActionStore + ActorStore + AppointmentStore
{
}
