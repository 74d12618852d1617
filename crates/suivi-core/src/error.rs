//! Error types for `suivi-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::action::ActorKind;

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(String),

  #[error("counselor not found: {0}")]
  CounselorNotFound(String),

  #[error("action not found: {0}")]
  ActionNotFound(Uuid),

  #[error("appointment not found: {0}")]
  AppointmentNotFound(Uuid),

  /// An action references an author that no longer resolves.
  #[error("{kind} {creator_id} referenced by an action does not exist")]
  ActorNotFound { creator_id: String, kind: ActorKind },

  #[error("invalid date {0:?}: expected an RFC 1123 timestamp")]
  InvalidDate(String),

  #[error("invalid duration {0:?}: expected HH:MM:SS")]
  InvalidDuration(String),

  #[error("counselor {counselor_id} does not follow person {person_id}")]
  CounselorMismatch {
    person_id:    String,
    counselor_id: String,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a collaborator error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Whether the error means "the requested entity does not exist".
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::PersonNotFound(_)
        | Self::CounselorNotFound(_)
        | Self::ActionNotFound(_)
        | Self::AppointmentNotFound(_)
    )
  }

  /// Whether the error was caused by malformed caller input.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidDate(_)
        | Self::InvalidDuration(_)
        | Self::CounselorMismatch { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
