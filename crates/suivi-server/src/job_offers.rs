//! Job-board access: client-credentials token retrieval behind the token
//! cache, and a single-offer lookup proxied to API callers.

use std::{sync::Arc, time::Duration};

use axum::{
  Json,
  extract::{Path, State},
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use suivi_api::ApiError;
use suivi_core::token::{CachedTokenRetriever, MemoryCache, TokenRetriever};
use thiserror::Error;

use crate::config::JobOfferConfig;

const TOKEN_CACHE_KEY: &str = "job-offers-access-token";

#[derive(Debug, Error)]
pub enum JobOfferError {
  #[error("job-board request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("job board answered {0}")]
  Status(StatusCode),

  #[error("job board issued no access token")]
  NoToken,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token: Option<String>,
}

/// Fetches a fresh access token on every call. Wrap it in
/// [`CachedTokenRetriever`] before use.
pub struct JobOfferClient {
  client: Client,
  config: JobOfferConfig,
}

impl JobOfferClient {
  pub fn new(config: JobOfferConfig) -> Result<Self, JobOfferError> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }
}

impl TokenRetriever for JobOfferClient {
  type Error = JobOfferError;

  async fn get_token(&self) -> Result<Option<String>, JobOfferError> {
    tracing::info!("requesting a job-board access token");
    let resp = self
      .client
      .post(&self.config.token_url)
      .form(&[
        ("grant_type", "client_credentials"),
        ("client_id", self.config.client_id.as_str()),
        ("client_secret", self.config.client_secret.as_str()),
        ("scope", self.config.scope.as_str()),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(JobOfferError::Status(resp.status()));
    }
    let body: TokenResponse = resp.json().await?;
    Ok(body.access_token.filter(|t| !t.is_empty()))
  }
}

/// Single-offer lookups authenticated with a cached token.
pub struct JobOffers {
  tokens: CachedTokenRetriever<JobOfferClient, MemoryCache>,
}

impl JobOffers {
  pub fn new(client: JobOfferClient) -> Self {
    Self {
      tokens: CachedTokenRetriever::new(client, MemoryCache::new(), TOKEN_CACHE_KEY),
    }
  }

  /// The offer as the job board returns it, or `None` if it does not exist.
  pub async fn get_offer(&self, offer_id: &str) -> Result<Option<Value>, JobOfferError> {
    let token = self.tokens.get_token().await?.ok_or(JobOfferError::NoToken)?;
    let client = self.tokens.inner();

    let resp = client
      .client
      .get(client.url(&format!("/offres/{offer_id}")))
      .bearer_auth(token)
      .send()
      .await?;

    match resp.status() {
      StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => Ok(None),
      s if s.is_success() => Ok(Some(resp.json().await?)),
      s => Err(JobOfferError::Status(s)),
    }
  }
}

/// `GET /job-offers/{id}`
pub async fn get_one(
  State(offers): State<Arc<JobOffers>>,
  Path(offer_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
  offers
    .get_offer(&offer_id)
    .await
    .map_err(ApiError::internal)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("job offer {offer_id} not found")))
}
