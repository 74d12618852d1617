//! Appointment creation, listing and soft deletion.
//!
//! An appointment is either active or soft-deleted. Deletion is one-way and
//! only flips the flag; the row is kept.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  appointment::{APPOINTMENT_TITLE, Appointment, CreateAppointment, parse_date, parse_duration},
  notification::{Delivery, NotificationSender, Notifier, PushMessage},
  person::{Counselor, Person},
  store::{AppointmentStore, CounselorStore, PersonStore},
};

pub struct AppointmentScheduler<'a, S, N> {
  store:    &'a S,
  notifier: &'a Notifier<N>,
}

impl<'a, S, N> AppointmentScheduler<'a, S, N>
where
  S: AppointmentStore + PersonStore + CounselorStore,
  N: NotificationSender,
{
  pub fn new(store: &'a S, notifier: &'a Notifier<N>) -> Self {
    Self { store, notifier }
  }

  /// Create an appointment and notify the person.
  ///
  /// The date and duration are parsed strictly; malformed input fails with
  /// [`Error::InvalidDate`] or [`Error::InvalidDuration`] before anything is
  /// written. The counselor must be the person's own counselor.
  pub async fn create(&self, input: CreateAppointment) -> Result<Appointment> {
    let person = self.person(&input.person_id).await?;
    let counselor = self.counselor(&input.counselor_id).await?;

    if person.counselor_id != counselor.counselor_id {
      return Err(Error::CounselorMismatch {
        person_id:    person.person_id,
        counselor_id: counselor.counselor_id,
      });
    }

    let date = parse_date(&input.date)?;
    let duration = parse_duration(&input.duration)?;

    let appointment = Appointment {
      appointment_id: Uuid::new_v4(),
      title: APPOINTMENT_TITLE.to_owned(),
      subtitle: format!("avec {}", counselor.first_name),
      comment: input.comment,
      modality: input.modality,
      date,
      duration,
      soft_deleted: false,
      person_id: person.person_id.clone(),
      counselor_id: counselor.counselor_id,
    };

    self
      .store
      .add_appointment(&appointment)
      .await
      .map_err(Error::store)?;
    tracing::info!(
      appointment_id = %appointment.appointment_id,
      person_id = %appointment.person_id,
      date = %appointment.date,
      "appointment created"
    );

    let appointment_id = appointment.appointment_id;
    self
      .notifier
      .notify(&person, |token| PushMessage::new_appointment(token, appointment_id))
      .await;

    Ok(appointment)
  }

  /// Upcoming, non-deleted appointments of a person.
  pub async fn list_for_person(
    &self,
    person_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Vec<Appointment>> {
    self.person(person_id).await?;

    let mut appointments = self
      .store
      .list_appointments_by_person(person_id, now, false)
      .await
      .map_err(Error::store)?;
    appointments.retain(|a| a.is_upcoming(now));
    Ok(appointments)
  }

  /// Upcoming, non-deleted appointments of a counselor, earliest first.
  pub async fn list_for_counselor(
    &self,
    counselor_id: &str,
    now: DateTime<Utc>,
  ) -> Result<Vec<Appointment>> {
    self.counselor(counselor_id).await?;

    let mut appointments = self
      .store
      .list_appointments_by_counselor(counselor_id, now, false)
      .await
      .map_err(Error::store)?;
    appointments.retain(|a| a.is_upcoming(now));
    appointments.sort_by_key(|a| a.date);
    Ok(appointments)
  }

  /// Flag an appointment as deleted and return it as it was before.
  ///
  /// Idempotent: deleting an already-deleted appointment succeeds.
  pub async fn soft_delete(&self, appointment_id: Uuid) -> Result<Appointment> {
    let before = self.appointment(appointment_id).await?;
    self
      .store
      .soft_delete_appointment(appointment_id)
      .await
      .map_err(Error::store)?;
    tracing::info!(%appointment_id, "appointment soft-deleted");
    Ok(before)
  }

  /// Soft-delete and tell the person, unless it was already deleted.
  ///
  /// Only the deletion itself can fail. Once it is committed, a failed person
  /// lookup is logged and reported as [`Delivery::Failed`].
  pub async fn delete(&self, appointment_id: Uuid) -> Result<Delivery> {
    let before = self.soft_delete(appointment_id).await?;
    if before.soft_deleted {
      return Ok(Delivery::Skipped);
    }

    let person = match self.person(&before.person_id).await {
      Ok(person) => person,
      Err(e) => {
        tracing::warn!(
          %appointment_id,
          person_id = %before.person_id,
          error = %e,
          "appointment deleted but its person could not be loaded"
        );
        return Ok(Delivery::Failed(e.to_string()));
      }
    };
    Ok(
      self
        .notifier
        .notify(&person, |token| PushMessage::deleted_appointment(token, before.date))
        .await,
    )
  }

  /// Push "new appointment" to the person. Only lookups can fail; delivery
  /// problems come back as [`Delivery`].
  pub async fn notify_created(&self, person_id: &str, appointment_id: Uuid) -> Result<Delivery> {
    let person = self.person(person_id).await?;
    Ok(
      self
        .notifier
        .notify(&person, |token| PushMessage::new_appointment(token, appointment_id))
        .await,
    )
  }

  /// Push "appointment deleted" to the appointment's person, quoting its date.
  pub async fn notify_deleted(&self, appointment_id: Uuid) -> Result<Delivery> {
    let appointment = self.appointment(appointment_id).await?;
    let person = self.person(&appointment.person_id).await?;
    Ok(
      self
        .notifier
        .notify(&person, |token| PushMessage::deleted_appointment(token, appointment.date))
        .await,
    )
  }

  async fn person(&self, person_id: &str) -> Result<Person> {
    self
      .store
      .get_person(person_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::PersonNotFound(person_id.to_owned()))
  }

  async fn counselor(&self, counselor_id: &str) -> Result<Counselor> {
    self
      .store
      .get_counselor(counselor_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::CounselorNotFound(counselor_id.to_owned()))
  }

  async fn appointment(&self, appointment_id: Uuid) -> Result<Appointment> {
    self
      .store
      .get_appointment(appointment_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AppointmentNotFound(appointment_id))
  }
}
