//! Wiring for the suivi HTTP server: configuration, push transport, the
//! job-board client, and the top-level router.

pub mod config;
pub mod job_offers;
pub mod push;

use std::sync::Arc;

use axum::{Router, routing::get};
use suivi_core::{
  Services,
  notification::NotificationSender,
  store::{RegistrationStore, Store},
};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
use job_offers::JobOffers;

/// The full application: the JSON API under `/api`, plus `/api/job-offers`
/// when a job board is configured.
pub fn router<S, N>(services: Arc<Services<S, N>>, job_offers: Option<Arc<JobOffers>>) -> Router
where
  S: Store + RegistrationStore + 'static,
  N: NotificationSender + 'static,
{
  let mut api = suivi_api::api_router(services);
  if let Some(offers) = job_offers {
    api = api.merge(
      Router::new()
        .route("/job-offers/{id}", get(job_offers::get_one))
        .with_state(offers),
    );
  }

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
