//! Best-effort push notifications.
//!
//! [`Notifier`] never returns an error: a missing push token skips the send
//! and a failing sender is logged. The business operation that triggered the
//! notification succeeds either way, and the caller gets a [`Delivery`]
//! describing what happened.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::Person;

// ─── Message ─────────────────────────────────────────────────────────────────

/// What a notification is about; lets the mobile app route the tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
  NewAction,
  NewRendezvous,
  DeletedRendezvous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:   Option<Uuid>,
}

/// A push message addressed to one device registration token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
  pub token: String,
  pub title: String,
  pub body:  String,
  pub data:  NotificationData,
}

impl PushMessage {
  pub fn new_action(token: String, action_id: Uuid) -> Self {
    Self {
      token,
      title: "Nouvelle action".into(),
      body: "Vous avez une nouvelle action".into(),
      data: NotificationData {
        kind: NotificationKind::NewAction,
        id:   Some(action_id),
      },
    }
  }

  pub fn new_appointment(token: String, appointment_id: Uuid) -> Self {
    Self {
      token,
      title: "Nouveau rendez-vous".into(),
      body: "Votre conseiller a programmé un nouveau rendez-vous".into(),
      data: NotificationData {
        kind: NotificationKind::NewRendezvous,
        id:   Some(appointment_id),
      },
    }
  }

  pub fn deleted_appointment(token: String, date: DateTime<Utc>) -> Self {
    Self {
      token,
      title: "Rendez-vous supprimé".into(),
      body: deleted_appointment_body(date),
      data: NotificationData {
        kind: NotificationKind::DeletedRendezvous,
        id:   None,
      },
    }
  }
}

/// `Votre rendez-vous du DD/MM à HH:MM est supprimé`, rendered in UTC.
pub fn deleted_appointment_body(date: DateTime<Utc>) -> String {
  format!(
    "Votre rendez-vous du {} à {} est supprimé",
    date.format("%d/%m"),
    date.format("%H:%M")
  )
}

// ─── Sender ──────────────────────────────────────────────────────────────────

/// Transport to the push service. Implementations may fail freely.
pub trait NotificationSender: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send<'a>(
    &'a self,
    message: &'a PushMessage,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Outcome of a best-effort notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
  Sent,
  /// The person has no push token registered.
  Skipped,
  /// The sender failed; the error text is kept for the caller's benefit.
  Failed(String),
}

/// Wraps a [`NotificationSender`] so that delivery problems never reach the
/// caller as errors.
#[derive(Debug, Clone)]
pub struct Notifier<N> {
  sender: N,
}

impl<N: NotificationSender> Notifier<N> {
  pub fn new(sender: N) -> Self { Self { sender } }

  pub fn sender(&self) -> &N { &self.sender }

  /// Build a message for `person`'s token with `build` and send it.
  ///
  /// Never fails: no token yields [`Delivery::Skipped`], a sender error is
  /// logged and yields [`Delivery::Failed`].
  pub async fn notify<F>(&self, person: &Person, build: F) -> Delivery
  where
    F: FnOnce(String) -> PushMessage,
  {
    let Some(token) = person.push_token() else {
      tracing::debug!(person_id = %person.person_id, "no push token, notification skipped");
      return Delivery::Skipped;
    };

    let message = build(token.to_owned());
    match self.sender.send(&message).await {
      Ok(()) => {
        tracing::debug!(
          person_id = %person.person_id,
          kind = ?message.data.kind,
          "notification sent"
        );
        Delivery::Sent
      }
      Err(e) => {
        tracing::warn!(
          person_id = %person.person_id,
          kind = ?message.data.kind,
          error = %e,
          "notification delivery failed"
        );
        Delivery::Failed(e.to_string())
      }
    }
  }
}
