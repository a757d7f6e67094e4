// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behaviour
//!
//! - Key sets are cached per JWKS URL with a configurable TTL
//! - Refreshes are single-flight: concurrent misses for one URL share one fetch,
//!   and callers queued behind a failed fetch get its error instead of retrying
//! - A `kid` missing from a cached set triggers one refresh (rotation pickup),
//!   at most once per `min_refresh_interval`
//! - The fetch is bounded by the HTTP client timeout
//! - A failed fetch never replaces a cached set

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::error::AuthError;

/// Default JWKS cache TTL (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default minimum spacing between `kid`-miss refreshes.
pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Default JWKS fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// JWKS cache entry.
#[derive(Clone)]
struct CacheEntry {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Outcome of the last failed fetch for one URL.
struct FailedFetch {
    at: Instant,
    error: AuthError,
}

/// Per-URL refresh lock; holds the last failure until a fetch succeeds.
type Flight = Arc<Mutex<Option<FailedFetch>>>;

/// JWKS manager with caching.
#[derive(Clone)]
pub struct JwksManager {
    cache_ttl: Duration,
    min_refresh_interval: Duration,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    /// One refresh lock per JWKS URL
    refresh_locks: Arc<StdMutex<HashMap<String, Flight>>>,
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a JWKS manager whose fetches time out after `fetch_timeout`.
    pub fn new(fetch_timeout: Duration) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .map_err(|e| AuthError::KeyFetchError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            min_refresh_interval: DEFAULT_MIN_REFRESH_INTERVAL,
            cache: Arc::new(RwLock::new(HashMap::new())),
            refresh_locks: Arc::new(StdMutex::new(HashMap::new())),
            client,
        })
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Create with a custom minimum interval between `kid`-miss refreshes.
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Get the key set published at `jwks_url`, from cache when fresh.
    pub async fn key_set(&self, jwks_url: &Url) -> Result<Arc<JwkSet>, AuthError> {
        let (entry, _) = self.fresh_entry(jwks_url).await?;
        Ok(entry.jwks)
    }

    /// Get a key set that should contain `kid`.
    ///
    /// When the cached set lacks `kid` and was not fetched by this call, it
    /// is refreshed once so freshly rotated keys are picked up. The returned
    /// set may still lack `kid`; verification reports that as
    /// [`AuthError::KeyNotFound`].
    #[tracing::instrument(skip(self, jwks_url), fields(jwks.url = %jwks_url))]
    pub async fn key_set_for_kid(&self, jwks_url: &Url, kid: &str) -> Result<Arc<JwkSet>, AuthError> {
        let (entry, fetched_now) = self.fresh_entry(jwks_url).await?;
        if entry.jwks.find(kid).is_some() || fetched_now {
            return Ok(entry.jwks);
        }

        if entry.fetched_at.elapsed() < self.min_refresh_interval {
            tracing::debug!("kid not in cached JWKS; refreshed too recently to retry");
            return Ok(entry.jwks);
        }

        tracing::debug!("kid not in cached JWKS; refreshing");
        let seen = entry.fetched_at;
        let refreshed = self
            .refresh_single_flight(jwks_url, |cached| cached.fetched_at > seen)
            .await?;
        Ok(refreshed.jwks)
    }

    /// Force refresh the cached key set for `jwks_url`.
    ///
    /// Joins a fetch already in flight for the URL instead of starting another.
    pub async fn refresh(&self, jwks_url: &Url) -> Result<(), AuthError> {
        let started = Instant::now();
        self.refresh_single_flight(jwks_url, |cached| cached.fetched_at >= started)
            .await?;
        Ok(())
    }

    /// Check if a key set for `jwks_url` is currently cached and valid.
    pub async fn is_cached(&self, jwks_url: &Url) -> bool {
        let cache = self.cache.read().await;
        cache
            .get(jwks_url.as_str())
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
    }

    /// Cached entry if still within TTL, otherwise a single-flight refresh.
    /// The flag tells whether this call observed a newly fetched set.
    async fn fresh_entry(&self, jwks_url: &Url) -> Result<(CacheEntry, bool), AuthError> {
        if let Some(entry) = self.cached(jwks_url).await {
            tracing::debug!(jwks.url = %jwks_url, "JWKS cache hit");
            return Ok((entry, false));
        }

        let requested_at = Instant::now();
        let entry = self
            .refresh_single_flight(jwks_url, |cached| {
                cached.fetched_at.elapsed() < self.cache_ttl
            })
            .await?;
        let fetched_now = entry.fetched_at >= requested_at;
        Ok((entry, fetched_now))
    }

    async fn cached(&self, jwks_url: &Url) -> Option<CacheEntry> {
        let cache = self.cache.read().await;
        cache
            .get(jwks_url.as_str())
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .cloned()
    }

    /// Fetch under the per-URL refresh lock.
    ///
    /// After acquiring the lock the cache is checked again with `reusable`,
    /// so callers that queued behind an in-flight fetch reuse its result.
    /// A fetch that failed while a caller was queued is reported to that
    /// caller as-is.
    async fn refresh_single_flight<F>(&self, jwks_url: &Url, reusable: F) -> Result<CacheEntry, AuthError>
    where
        F: Fn(&CacheEntry) -> bool,
    {
        let lock = self.refresh_lock(jwks_url);
        let queued_at = Instant::now();
        let mut flight = lock.lock().await;

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(jwks_url.as_str()).filter(|e| reusable(e)) {
                return Ok(entry.clone());
            }
        }

        if let Some(failed) = flight.as_ref().filter(|f| f.at > queued_at) {
            tracing::debug!(jwks.url = %jwks_url, "Sharing JWKS fetch failure with queued caller");
            return Err(failed.error.clone());
        }

        match self.fetch_jwks(jwks_url).await {
            Ok(jwks) => {
                *flight = None;
                Ok(self.store(jwks_url, Arc::new(jwks)).await)
            }
            Err(error) => {
                *flight = Some(FailedFetch {
                    at: Instant::now(),
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    fn refresh_lock(&self, jwks_url: &Url) -> Flight {
        let mut locks = self
            .refresh_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(jwks_url.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    async fn store(&self, jwks_url: &Url, jwks: Arc<JwkSet>) -> CacheEntry {
        let entry = CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        };
        let mut cache = self.cache.write().await;
        cache.insert(jwks_url.to_string(), entry.clone());
        entry
    }

    /// Fetch JWKS from the endpoint.
    async fn fetch_jwks(&self, jwks_url: &Url) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(jwks_url.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(jwks.url = %jwks_url, error = %e, "JWKS fetch failed");
                AuthError::KeyFetchError(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::warn!(
                jwks.url = %jwks_url,
                http.status_code = response.status().as_u16(),
                "JWKS fetch failed; unexpected response status"
            );
            return Err(AuthError::KeyFetchError(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetchError(e.to_string()))?;

        tracing::info!(jwks.url = %jwks_url, keys = jwks.keys.len(), "JWKS refreshed");
        Ok(jwks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{jwks_json, PRIMARY_KID, ROTATED_KID};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JWKS_PATH: &str = "/.well-known/jwks.json";

    fn jwks_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}{JWKS_PATH}", server.uri())).unwrap()
    }

    fn manager() -> JwksManager {
        JwksManager::new(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn custom_cache_ttl() {
        let manager = manager().with_cache_ttl(Duration::from_secs(60));
        assert_eq!(manager.cache_ttl, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn cache_initially_empty() {
        let manager = manager();
        let url = Url::parse("https://tenant.example.com/.well-known/jwks.json").unwrap();
        assert!(!manager.is_cached(&url).await);
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_refetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        let first = manager.key_set(&url).await.unwrap();
        let second = manager.key_set(&url).await.unwrap();

        assert!(first.find(PRIMARY_KID).is_some());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(manager.is_cached(&url).await);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_json(&[PRIMARY_KID]))
                    .set_delay(Duration::from_millis(200)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let url = url.clone();
            tasks.spawn(async move { manager.key_set(&url).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .expect(2)
            .mount(&server)
            .await;

        let manager = manager().with_cache_ttl(Duration::ZERO);
        let url = jwks_url(&server);
        manager.key_set(&url).await.unwrap();
        manager.key_set(&url).await.unwrap();
    }

    #[tokio::test]
    async fn unknown_kid_triggers_one_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID, ROTATED_KID])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager().with_min_refresh_interval(Duration::ZERO);
        let url = jwks_url(&server);
        manager.key_set(&url).await.unwrap();

        let jwks = manager.key_set_for_kid(&url, ROTATED_KID).await.unwrap();
        assert!(jwks.find(ROTATED_KID).is_some());
    }

    #[tokio::test]
    async fn unknown_kid_refresh_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        for _ in 0..3 {
            let jwks = manager.key_set_for_kid(&url, "unknown").await.unwrap();
            assert!(jwks.find("unknown").is_none());
        }
    }

    #[tokio::test]
    async fn error_status_is_key_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = manager().key_set(&jwks_url(&server)).await;
        assert!(matches!(result, Err(AuthError::KeyFetchError(_))));
    }

    #[tokio::test]
    async fn invalid_body_is_key_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let result = manager().key_set(&jwks_url(&server)).await;
        assert!(matches!(result, Err(AuthError::KeyFetchError(_))));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_json(&[PRIMARY_KID]))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let manager = JwksManager::new(Duration::from_millis(200)).unwrap();
        let result = manager.key_set(&jwks_url(&server)).await;
        assert!(matches!(result, Err(AuthError::KeyFetchError(_))));
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(jwks_json(&[PRIMARY_KID]))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let manager = manager.clone();
            let url = url.clone();
            tasks.spawn(async move { manager.refresh(&url).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(result.unwrap().is_ok());
        }
        assert!(manager.is_cached(&url).await);
    }

    #[tokio::test]
    async fn concurrent_misses_during_outage_share_one_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..6 {
            let manager = manager.clone();
            let url = url.clone();
            tasks.spawn(async move { manager.key_set(&url).await });
        }
        while let Some(result) = tasks.join_next().await {
            assert!(matches!(result.unwrap(), Err(AuthError::KeyFetchError(_))));
        }
        assert!(!manager.is_cached(&url).await);
    }

    #[tokio::test]
    async fn later_miss_retries_after_failed_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        assert!(manager.key_set(&url).await.is_err());
        assert!(manager.key_set(&url).await.unwrap().find(PRIMARY_KID).is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_cached_set() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_json(&[PRIMARY_KID])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let manager = manager();
        let url = jwks_url(&server);
        manager.key_set(&url).await.unwrap();

        assert!(manager.refresh(&url).await.is_err());
        assert!(manager.is_cached(&url).await);
        assert!(manager.key_set(&url).await.unwrap().find(PRIMARY_KID).is_some());
    }
}
