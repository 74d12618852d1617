//! People the core reads but never writes: the supported person and their
//! counselor. Both are created by the registration flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A counselor ("conseiller") following one or more persons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counselor {
  pub counselor_id: String,
  pub first_name:   String,
  pub last_name:    String,
}

impl Counselor {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

/// A supported person ("jeune").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id:             String,
  pub first_name:            String,
  pub last_name:             String,
  pub created_at:            DateTime<Utc>,
  /// Push registration token of the person's device, if one was registered.
  pub push_token:            Option<String>,
  pub push_token_updated_at: Option<DateTime<Utc>>,
  /// The owning counselor. Set at registration and not changed afterwards.
  pub counselor_id:          String,
}

impl Person {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// The push token, treating an empty string as "no token".
  pub fn push_token(&self) -> Option<&str> {
    self.push_token.as_deref().filter(|t| !t.is_empty())
  }
}

/// Input for registering a person.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
  pub person_id:    String,
  pub first_name:   String,
  pub last_name:    String,
  pub counselor_id: String,
}
