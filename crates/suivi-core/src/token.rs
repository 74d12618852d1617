//! Caching in front of an access-token source.
//!
//! [`CachedTokenRetriever`] is itself a [`TokenRetriever`], so callers cannot
//! tell whether they talk to the real source or the cache. Caching is an
//! optimisation only: cache backend errors degrade to a miss on read and to a
//! no-op on write.

use std::{convert::Infallible, future::Future};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

/// Lifetime of a cached token, matching the ~24h validity of the upstream one.
pub const TOKEN_TTL_MINUTES: i64 = 1440;

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Something that can hand out an access token.
pub trait TokenRetriever: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `Ok(None)` means the source had no token to give.
  fn get_token(&self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;
}

/// A key/value store with per-entry expiry.
pub trait CacheBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Store `value` under `key`; the backend drops it once `ttl` has elapsed.
  fn set<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
    ttl: TimeDelta,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Decorator ───────────────────────────────────────────────────────────────

pub struct CachedTokenRetriever<R, C> {
  inner: R,
  cache: C,
  key:   String,
  ttl:   TimeDelta,
}

impl<R, C> CachedTokenRetriever<R, C>
where
  R: TokenRetriever,
  C: CacheBackend,
{
  /// Cache `inner`'s token under `key` for [`TOKEN_TTL_MINUTES`].
  pub fn new(inner: R, cache: C, key: impl Into<String>) -> Self {
    Self {
      inner,
      cache,
      key: key.into(),
      ttl: TimeDelta::minutes(TOKEN_TTL_MINUTES),
    }
  }

  pub fn inner(&self) -> &R { &self.inner }

  pub fn cache(&self) -> &C { &self.cache }

  pub fn ttl(&self) -> TimeDelta { self.ttl }
}

impl<R, C> TokenRetriever for CachedTokenRetriever<R, C>
where
  R: TokenRetriever,
  C: CacheBackend,
{
  type Error = R::Error;

  async fn get_token(&self) -> Result<Option<String>, R::Error> {
    match self.cache.get(&self.key).await {
      Ok(Some(token)) => return Ok(Some(token)),
      Ok(None) => {}
      Err(e) => {
        tracing::warn!(key = %self.key, error = %e, "token cache read failed, treating as miss");
      }
    }

    let Some(token) = self.inner.get_token().await? else {
      return Ok(None);
    };

    if let Err(e) = self.cache.set(&self.key, &token, self.ttl).await {
      tracing::warn!(key = %self.key, error = %e, "token cache write failed");
    }
    Ok(Some(token))
  }
}

// ─── In-memory backend ───────────────────────────────────────────────────────

/// A process-local [`CacheBackend`]. Expired entries are dropped when read.
#[derive(Debug, Default)]
pub struct MemoryCache {
  entries: DashMap<String, (String, DateTime<Utc>)>,
}

impl MemoryCache {
  pub fn new() -> Self { Self::default() }

  /// Expiry instant of `key`, if present.
  pub fn expires_at(&self, key: &str) -> Option<DateTime<Utc>> {
    self.entries.get(key).map(|entry| entry.1)
  }

  fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
    match self.entries.get(key) {
      None => return None,
      Some(entry) if entry.1 > now => return Some(entry.0.clone()),
      Some(_) => {}
    }
    self.entries.remove_if(key, |_, (_, expires)| *expires <= now);
    None
  }
}

impl CacheBackend for MemoryCache {
  type Error = Infallible;

  async fn get(&self, key: &str) -> Result<Option<String>, Infallible> {
    Ok(self.get_at(key, Utc::now()))
  }

  async fn set(&self, key: &str, value: &str, ttl: TimeDelta) -> Result<(), Infallible> {
    self
      .entries
      .insert(key.to_owned(), (value.to_owned(), Utc::now() + ttl));
    Ok(())
  }
}
