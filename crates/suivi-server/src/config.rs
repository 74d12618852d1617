//! Runtime configuration, deserialised from `config.toml` and `SUIVI_*`
//! environment variables.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Without it, notifications are logged and dropped.
  pub push:       Option<PushConfig>,
  /// Without it, `/job-offers` is not mounted.
  pub job_offers: Option<JobOfferConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PushConfig {
  pub endpoint: String,
  pub api_key:  String,
}

/// OAuth2 client-credentials access to the job-board API.
#[derive(Debug, Deserialize, Clone)]
pub struct JobOfferConfig {
  pub base_url:      String,
  pub token_url:     String,
  pub client_id:     String,
  pub client_secret: String,
  pub scope:         String,
}

impl ServerConfig {
  /// Layer the optional file at `path` under `SUIVI_`-prefixed environment
  /// variables. Nested keys use `__`, e.g. `SUIVI_PUSH__API_KEY`.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080)?
      .set_default("store_path", "suivi.db")?
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SUIVI")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
