//! Dashboard read models for the person's and the counselor's home screens.
//!
//! Never stored, always derived from actions and appointments at read time.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
  Error, Result,
  action::Action,
  appointment::Appointment,
  person::{Counselor, Person},
  store::{ActionStore, AppointmentStore, CounselorStore, PersonStore},
};

/// How many pending actions the person's home displays.
pub const HOME_PENDING_ACTIONS: usize = 2;

/// The person's home screen.
#[derive(Debug, Clone, Serialize)]
pub struct PersonHome {
  /// The most recently updated pending actions, newest first.
  pub actions:      Vec<Action>,
  /// Number of done actions, whether or not they are displayed.
  pub done_count:   usize,
  pub counselor:    Counselor,
  /// Upcoming, non-deleted appointments.
  pub appointments: Vec<Appointment>,
}

/// The counselor's view of one person: every action, untruncated.
#[derive(Debug, Clone, Serialize)]
pub struct CounselorHome {
  pub person:  Person,
  pub actions: Vec<Action>,
}

/// The `limit` most recently updated actions that are not done, newest first.
///
/// The sort is stable, so actions with equal `last_update` keep their input
/// order.
pub fn most_recent_pending(actions: &[Action], limit: usize) -> Vec<Action> {
  let mut pending: Vec<&Action> = actions.iter().filter(|a| !a.is_done()).collect();
  pending.sort_by(|a, b| b.last_update.cmp(&a.last_update));
  pending.into_iter().take(limit).cloned().collect()
}

pub struct HomeAggregator<'a, S> {
  store: &'a S,
}

impl<'a, S> HomeAggregator<'a, S>
where
  S: PersonStore + CounselorStore + ActionStore + AppointmentStore,
{
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Build the person's home as of `now`.
  ///
  /// Fails with [`Error::PersonNotFound`] for an unknown person.
  pub async fn person_home(&self, person_id: &str, now: DateTime<Utc>) -> Result<PersonHome> {
    let person = self.person(person_id).await?;

    let counselor = self
      .store
      .get_counselor(&person.counselor_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::CounselorNotFound(person.counselor_id.clone()))?;

    let actions = self
      .store
      .list_actions_by_person(person_id)
      .await
      .map_err(Error::store)?;
    let done_count = actions.iter().filter(|a| a.is_done()).count();

    let mut appointments = self
      .store
      .list_appointments_by_person(person_id, now, false)
      .await
      .map_err(Error::store)?;
    appointments.retain(|a| a.is_upcoming(now));

    Ok(PersonHome {
      actions: most_recent_pending(&actions, HOME_PENDING_ACTIONS),
      done_count,
      counselor,
      appointments,
    })
  }

  /// Build the counselor's view of one person.
  pub async fn counselor_home(&self, person_id: &str) -> Result<CounselorHome> {
    let person = self.person(person_id).await?;
    let actions = self
      .store
      .list_actions_by_person(person_id)
      .await
      .map_err(Error::store)?;
    Ok(CounselorHome { person, actions })
  }

  async fn person(&self, person_id: &str) -> Result<Person> {
    self
      .store
      .get_person(person_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PersonNotFound(person_id.to_owned()))
  }
}
