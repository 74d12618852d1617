//! Handlers for registration and the two home views.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/counselors` | Body: [`Counselor`]; returns 201 |
//! | `POST` | `/persons` | Body: [`NewPerson`]; 404 if the counselor is unknown |
//! | `PUT`  | `/persons/{id}/push-token` | Body: `{"push_token":"..."}`, `null` clears it |
//! | `GET`  | `/persons/{id}/home` | Person's dashboard as of now |
//! | `GET`  | `/persons/{id}/counselor-home` | The person as their counselor sees them |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use suivi_core::{
  home::{CounselorHome, PersonHome},
  notification::NotificationSender,
  person::{Counselor, NewPerson, Person},
  store::{CounselorStore, PersonStore, RegistrationStore, Store},
};

use crate::{AppState, error::ApiError};

// ─── Registration ────────────────────────────────────────────────────────────

/// `POST /counselors`
pub async fn register_counselor<S, N>(
  State(services): State<AppState<S, N>>,
  Json(counselor): Json<Counselor>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + RegistrationStore,
  N: NotificationSender,
{
  services
    .store()
    .add_counselor(&counselor)
    .await
    .map_err(ApiError::internal)?;
  tracing::info!(counselor_id = %counselor.counselor_id, "counselor registered");
  Ok((StatusCode::CREATED, Json(counselor)))
}

/// `POST /persons`
pub async fn register_person<S, N>(
  State(services): State<AppState<S, N>>,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store + RegistrationStore,
  N: NotificationSender,
{
  let store = services.store();

  if store
    .get_counselor(&body.counselor_id)
    .await
    .map_err(ApiError::internal)?
    .is_none()
  {
    return Err(ApiError::NotFound(format!(
      "counselor {} not found",
      body.counselor_id
    )));
  }
  if store
    .get_person(&body.person_id)
    .await
    .map_err(ApiError::internal)?
    .is_some()
  {
    return Err(ApiError::BadRequest(format!(
      "person {} is already registered",
      body.person_id
    )));
  }

  let person = store.add_person(body).await.map_err(ApiError::internal)?;
  tracing::info!(person_id = %person.person_id, "person registered");
  Ok((StatusCode::CREATED, Json(person)))
}

#[derive(Debug, Deserialize)]
pub struct PushTokenBody {
  pub push_token: Option<String>,
}

/// `PUT /persons/{id}/push-token`
pub async fn update_push_token<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
  Json(body): Json<PushTokenBody>,
) -> Result<Json<Person>, ApiError>
where
  S: Store + RegistrationStore,
  N: NotificationSender,
{
  let person = services
    .store()
    .update_push_token(&person_id, body.push_token)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("person {person_id} not found")))?;
  Ok(Json(person))
}

// ─── Home ────────────────────────────────────────────────────────────────────

/// `GET /persons/{id}/home`
pub async fn home<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
) -> Result<Json<PersonHome>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let home = services.home().person_home(&person_id, Utc::now()).await?;
  Ok(Json(home))
}

/// `GET /persons/{id}/counselor-home`
pub async fn counselor_home<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
) -> Result<Json<CounselorHome>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let home = services.home().counselor_home(&person_id).await?;
  Ok(Json(home))
}
