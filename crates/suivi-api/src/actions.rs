//! Handlers for action endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/persons/{id}/actions` | All actions of the person, unordered |
//! | `POST`  | `/persons/{id}/actions` | Body: [`CreateAction`]; returns 201 |
//! | `PATCH` | `/actions/{id}` | Body: [`UpdateActionBody`]; returns the action as stored |
//! | `GET`   | `/counselors/{id}/actions-summary` | Todo/done counts per person |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use suivi_core::{
  action::{Action, CreateAction, PersonActionSummary},
  lifecycle::Transition,
  notification::NotificationSender,
  store::{ActionStore, PersonStore, Store},
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// `GET /persons/{id}/actions`
pub async fn list<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
) -> Result<Json<Vec<Action>>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  Ok(Json(services.actions().list_for(&person_id).await?))
}

/// `POST /persons/{id}/actions`
pub async fn create<S, N>(
  State(services): State<AppState<S, N>>,
  Path(person_id): Path<String>,
  Json(body): Json<CreateAction>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let owner = services
    .store()
    .get_person(&person_id)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("person {person_id} not found")))?;

  let action = services.actions().create(body, &owner).await?;
  Ok((StatusCode::CREATED, Json(action)))
}

/// Either a status (current clients) or the legacy completion flag. When both
/// are sent the status wins.
#[derive(Debug, Deserialize)]
pub struct UpdateActionBody {
  pub status:  Option<String>,
  pub is_done: Option<bool>,
}

/// `PATCH /actions/{id}`
///
/// An unknown status is accepted and changes nothing.
#[allow(deprecated)]
pub async fn update<S, N>(
  State(services): State<AppState<S, N>>,
  Path(action_id): Path<Uuid>,
  Json(body): Json<UpdateActionBody>,
) -> Result<Json<Action>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  let lifecycle = services.actions();
  match (body.status, body.is_done) {
    (Some(status), _) => {
      if lifecycle.transition(action_id, &status).await? == Transition::Ignored {
        tracing::debug!(%action_id, "status update ignored");
      }
    }
    (None, Some(is_done)) => lifecycle.transition_legacy(action_id, is_done).await?,
    (None, None) => {
      return Err(ApiError::BadRequest("expected `status` or `is_done`".into()));
    }
  }

  let action = services
    .store()
    .get_action(action_id)
    .await
    .map_err(ApiError::internal)?
    .ok_or_else(|| ApiError::NotFound(format!("action {action_id} not found")))?;
  Ok(Json(action))
}

/// `GET /counselors/{id}/actions-summary`
pub async fn summary<S, N>(
  State(services): State<AppState<S, N>>,
  Path(counselor_id): Path<String>,
) -> Result<Json<Vec<PersonActionSummary>>, ApiError>
where
  S: Store,
  N: NotificationSender,
{
  Ok(Json(
    services
      .actions()
      .summarize_for_counselor(&counselor_id)
      .await?,
  ))
}
