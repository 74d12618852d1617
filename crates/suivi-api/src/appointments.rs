//! Handlers for appointment endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/persons/{id}/appointments` | Upcoming, non-deleted |
//! | `GET`    | `/counselors/{id}/appointments` | Upcoming, non-deleted, earliest first |
//! | `POST`   | `/appointments` | Body: [`CreateAppointment`]; returns 201 |
//! | `DELETE` | `/appointments/{id}` | Soft delete; 204 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use suivi_core::{
  appointment::{Appointment, CreateAppointment},
  notification::NotificationSender,
  store::Store,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /persons/{id}/appointments`
pub async fn list_for_person<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let appointments = services
    .appointments()
    .list_for_person(&person_id, Utc::now())
    .await?;
  Ok(Json(appointments))
}

/// `GET /counselors/{id}/appointments`
pub async fn list_for_counselor<S, N>(
  State(services): State<AppState<S, N>>,
  Path(counselor_id): Path<String>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let appointments = services
    .appointments()
    .list_for_counselor(&counselor_id, Utc::now())
    .await?;
  Ok(Json(appointments))
}

/// `POST /appointments`
pub async fn create<S, N>(
  State(services): State<AppState<S, N>>,
  Json(body): Json<CreateAppointment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let appointment = services.appointments().create(body).await?;
  Ok((StatusCode::CREATED, Json(appointment)))
}

/// `DELETE /appointments/{id}`
pub async fn delete<S, N>(
  State(services): State<AppState<S, N>>,
  Path(appointment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let delivery = services.appointments().delete(appointment_id).await?;
  tracing::debug!(%appointment_id, ?delivery, "appointment deletion handled");
  Ok(StatusCode::NO_CONTENT)
}
