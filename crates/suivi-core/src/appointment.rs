//! Appointment ("rendez-vous") types and input parsing.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const APPOINTMENT_TITLE: &str = "Rendez-vous conseiller";

/// A meeting between a person and their counselor.
///
/// Appointments are never physically removed. Deleting one flips
/// `soft_deleted`, and there is no way back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
  pub appointment_id: Uuid,
  pub title:          String,
  pub subtitle:       String,
  pub comment:        Option<String>,
  /// Free text, e.g. "par téléphone".
  pub modality:       String,
  pub date:           DateTime<Utc>,
  #[serde(with = "hms")]
  pub duration:       TimeDelta,
  pub soft_deleted:   bool,
  pub person_id:      String,
  pub counselor_id:   String,
}

impl Appointment {
  /// Not deleted and not yet in the past.
  pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
    !self.soft_deleted && self.date >= now
  }
}

/// Raw caller input to [`crate::scheduler::AppointmentScheduler::create`].
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppointment {
  #[serde(default)]
  pub comment:      Option<String>,
  /// RFC 1123 timestamp, e.g. `Sun, 24 Sep 2023 19:30:00 GMT`.
  pub date:         String,
  /// `HH:MM:SS`. Fields are not range-checked, so `00:61:00` is 61 minutes.
  pub duration:     String,
  pub modality:     String,
  pub person_id:    String,
  pub counselor_id: String,
}

/// Parse an RFC 1123 (RFC 2822 family) timestamp into UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc2822(raw.trim())
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// Parse an `HH:MM:SS` duration.
pub fn parse_duration(raw: &str) -> Result<TimeDelta> {
  let invalid = || Error::InvalidDuration(raw.to_owned());

  let parts: Vec<&str> = raw.trim().split(':').collect();
  let [h, m, s] = parts.as_slice() else {
    return Err(invalid());
  };

  let field = |p: &str| -> Result<i64> {
    if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
      return Err(invalid());
    }
    p.parse::<i64>().map_err(|_| invalid())
  };

  let (h, m, s) = (field(h)?, field(m)?, field(s)?);

  let seconds = h
    .checked_mul(3600)
    .and_then(|total| total.checked_add(m.checked_mul(60)?))
    .and_then(|total| total.checked_add(s))
    .ok_or_else(invalid)?;

  TimeDelta::try_seconds(seconds).ok_or_else(invalid)
}

/// Format a duration as `HH:MM:SS`, hours unbounded.
pub fn format_duration(d: TimeDelta) -> String {
  let total = d.num_seconds().max(0);
  format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

/// Serde adapter storing a [`TimeDelta`] as `HH:MM:SS`.
mod hms {
  use chrono::TimeDelta;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  pub fn serialize<S: Serializer>(d: &TimeDelta, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&super::format_duration(*d))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<TimeDelta, D::Error> {
    let raw = String::deserialize(d)?;
    super::parse_duration(&raw).map_err(D::Error::custom)
  }
}
