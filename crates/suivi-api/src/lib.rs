//! JSON REST API for the case-management core.
//!
//! Exposes an axum [`Router`] over [`suivi_core::Services`] for any store
//! backend and push sender. Auth, TLS, and transport concerns are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", suivi_api::api_router(services.clone()))
//! ```

pub mod actions;
pub mod appointments;
pub mod error;
pub mod persons;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use suivi_core::{
  Services,
  notification::NotificationSender,
  store::{RegistrationStore, Store},
};

pub use error::ApiError;

/// Router state: the core services shared across requests.
pub type AppState<S, N> = Arc<Services<S, N>>;

/// Build a fully-materialised API router for `services`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(services: AppState<S, N>) -> Router<()>
where
  S: Store + RegistrationStore + 'static,
  N: NotificationSender + 'static,
{
  Router::new()
    // Registration
    .route("/counselors", post(persons::register_counselor::<S, N>))
    .route("/persons", post(persons::register_person::<S, N>))
    .route("/persons/{id}/push-token", put(persons::update_push_token::<S, N>))
    // Home
    .route("/persons/{id}/home", get(persons::home::<S, N>))
    .route("/persons/{id}/counselor-home", get(persons::counselor_home::<S, N>))
    // Actions
    .route(
      "/persons/{id}/actions",
      get(actions::list::<S, N>).post(actions::create::<S, N>),
    )
    .route("/actions/{id}", patch(actions::update::<S, N>))
    .route("/counselors/{id}/actions-summary", get(actions::summary::<S, N>))
    // Appointments
    .route(
      "/persons/{id}/appointments",
      get(appointments::list_for_person::<S, N>),
    )
    .route(
      "/counselors/{id}/appointments",
      get(appointments::list_for_counselor::<S, N>),
    )
    .route("/appointments", post(appointments::create::<S, N>))
    .route(
      "/appointments/{id}",
      axum::routing::delete(appointments::delete::<S, N>),
    )
    .with_state(services)
}
