use crate::datasources::{seasonal_forecast, ForecastProvider};
use crate::error::{CropOpsError, Result};
use crate::models::{Location, WeatherAggregate};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Rules look three days ahead, anything shorter is unusable.
pub const MIN_FORECAST_DAYS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub aggregate: Arc<WeatherAggregate>,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedForecast {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Time-bounded cache in front of a [`ForecastProvider`].
///
/// Concurrent misses for the same key wait on a per-key guard so only one
/// request reaches the provider. Failed lookups are never cached.
pub struct WeatherCache<P> {
    provider: P,
    settings: CacheSettings,
    entries: RwLock<HashMap<String, CachedForecast>>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<P: ForecastProvider> WeatherCache<P> {
    pub fn new(provider: P, settings: CacheSettings) -> Self {
        Self {
            provider,
            settings,
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Live entry for the key, if any.
    pub async fn get(&self, key: &str) -> Option<Arc<WeatherAggregate>> {
        let now = Utc::now();
        self.entries
            .read()
            .await
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| Arc::clone(&entry.aggregate))
    }

    /// Store an aggregate under its location key with a fresh expiry.
    pub async fn put(&self, aggregate: WeatherAggregate) -> Arc<WeatherAggregate> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.settings.ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let aggregate = Arc::new(aggregate);

        let entry = CachedForecast {
            aggregate: Arc::clone(&aggregate),
            fetched_at: now,
            expires_at: now + ttl,
        };
        self.entries
            .write()
            .await
            .insert(aggregate.location_key.clone(), entry);
        aggregate
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "Swept expired forecasts");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached or freshly fetched forecast. Provider errors, timeouts and
    /// malformed aggregates all surface as `WeatherUnavailable`.
    pub async fn get_forecast(&self, location: Location) -> Result<Arc<WeatherAggregate>> {
        let key = location.cache_key();

        if let Some(hit) = self.get(&key).await {
            debug!(location_key = %key, "Forecast cache hit");
            return Ok(hit);
        }

        let guard = self.key_guard(&key).await;
        let result = {
            let _held = guard.lock().await;

            // Another caller may have filled the entry while we waited
            match self.get(&key).await {
                Some(hit) => {
                    debug!(location_key = %key, "Forecast filled by concurrent fetch");
                    Ok(hit)
                }
                None => {
                    debug!(location_key = %key, provider = self.provider.name(), "Forecast cache miss");
                    match self.fetch(location).await {
                        Ok(mut aggregate) => {
                            aggregate.location_key = key.clone();
                            Ok(self.put(aggregate).await)
                        }
                        Err(e) => Err(e),
                    }
                }
            }
        };
        self.release_guard(&key, guard).await;

        result
    }

    /// Like [`get_forecast`](Self::get_forecast) but never fails: on
    /// `WeatherUnavailable` the deterministic seasonal series is returned
    /// instead. The substitute is not cached.
    pub async fn get_or_mock(&self, location: Location) -> Arc<WeatherAggregate> {
        match self.get_forecast(location).await {
            Ok(aggregate) => aggregate,
            Err(e) => {
                warn!(
                    location_key = %location.cache_key(),
                    error = %e,
                    "Forecast unavailable, using seasonal estimate"
                );
                Arc::new(seasonal_forecast(location, Utc::now().date_naive()))
            }
        }
    }

    /// Run [`sweep`](Self::sweep) every TTL until the handle is aborted.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()>
    where
        P: 'static,
    {
        let period = self.settings.ttl.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                self.sweep().await;
            }
        })
    }

    async fn fetch(&self, location: Location) -> Result<WeatherAggregate> {
        let fetched = tokio::time::timeout(
            self.settings.fetch_timeout,
            self.provider
                .fetch_forecast(location.latitude, location.longitude),
        )
        .await
        .map_err(|_| {
            CropOpsError::WeatherUnavailable(format!(
                "{} timed out after {:?}",
                self.provider.name(),
                self.settings.fetch_timeout
            ))
        })?;

        let aggregate = fetched.map_err(|e| match e {
            CropOpsError::WeatherUnavailable(msg) => CropOpsError::WeatherUnavailable(msg),
            other => CropOpsError::WeatherUnavailable(other.to_string()),
        })?;

        aggregate.validate(MIN_FORECAST_DAYS).map_err(|msg| {
            CropOpsError::WeatherUnavailable(format!(
                "{} returned invalid data: {}",
                self.provider.name(),
                msg
            ))
        })?;

        Ok(aggregate)
    }

    async fn key_guard(&self, key: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    async fn release_guard(&self, key: &str, guard: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        drop(guard);
        // Every holder drops its clone under this lock, so the last one out sees 1
        if in_flight
            .get(key)
            .is_some_and(|g| Arc::strong_count(g) == 1)
        {
            in_flight.remove(key);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Mode, ScriptedProvider};
    use super::*;
    use crate::models::WeatherSource;

    const DRY: &[f64] = &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];

    fn location() -> Location {
        Location::new(17.385, 78.4867)
    }

    fn cache(mode: Mode, ttl: Duration) -> Arc<WeatherCache<Arc<ScriptedProvider>>> {
        let provider = Arc::new(ScriptedProvider::new(mode));
        Arc::new(WeatherCache::new(
            provider,
            CacheSettings {
                ttl,
                fetch_timeout: Duration::from_millis(200),
            },
        ))
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let cache = cache(Mode::Rain(DRY), Duration::from_secs(3600));

        cache.get_forecast(location()).await.unwrap();
        cache.get_forecast(location()).await.unwrap();

        assert_eq!(cache.provider.calls(), 1);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn nearby_coordinates_share_an_entry() {
        let cache = cache(Mode::Rain(DRY), Duration::from_secs(3600));

        cache.get_forecast(Location::new(17.38501, 78.48668)).await.unwrap();
        let agg = cache
            .get_forecast(Location::new(17.38504, 78.48672))
            .await
            .unwrap();

        assert_eq!(cache.provider.calls(), 1);
        assert_eq!(agg.location_key, "17.3850,78.4867");
    }

    #[tokio::test]
    async fn expired_entries_are_refetched_and_swept() {
        let cache = cache(Mode::Rain(DRY), Duration::ZERO);

        cache.get_forecast(location()).await.unwrap();
        cache.get_forecast(location()).await.unwrap();
        assert_eq!(cache.provider.calls(), 2);

        assert_eq!(cache.sweep().await, 1);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_keeps_live_entries() {
        let cache = cache(Mode::Rain(DRY), Duration::from_secs(3600));
        cache.get_forecast(location()).await.unwrap();
        assert_eq!(cache.sweep().await, 0);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let provider = Arc::new(
            ScriptedProvider::new(Mode::Rain(DRY)).with_delay(Duration::from_millis(50)),
        );
        let cache = Arc::new(WeatherCache::new(Arc::clone(&provider), CacheSettings::default()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.get_forecast(location()).await.map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(provider.calls(), 1);
        assert!(cache.in_flight.lock().await.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_weather_unavailable_and_not_cached() {
        let cache = cache(Mode::Fail, Duration::from_secs(3600));

        let err = cache.get_forecast(location()).await.unwrap_err();
        assert!(matches!(err, CropOpsError::WeatherUnavailable(_)));
        assert!(cache.is_empty().await);

        cache.get_forecast(location()).await.unwrap_err();
        assert_eq!(cache.provider.calls(), 2);
    }

    #[tokio::test]
    async fn slow_provider_times_out() {
        let cache = cache(Mode::Hang, Duration::from_secs(3600));
        let err = cache.get_forecast(location()).await.unwrap_err();
        assert!(matches!(err, CropOpsError::WeatherUnavailable(msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn invalid_aggregate_is_rejected() {
        let cache = cache(Mode::Invalid, Duration::from_secs(3600));
        let err = cache.get_forecast(location()).await.unwrap_err();
        assert!(matches!(err, CropOpsError::WeatherUnavailable(msg) if msg.contains("invalid")));
    }

    #[tokio::test]
    async fn get_or_mock_substitutes_seasonal_series() {
        let cache = cache(Mode::Fail, Duration::from_secs(3600));
        let agg = cache.get_or_mock(location()).await;
        assert_eq!(agg.source, WeatherSource::SeasonalMock);
        assert!(agg.validate(MIN_FORECAST_DAYS).is_ok());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn sweeper_task_removes_expired_entries() {
        let cache = cache(Mode::Rain(DRY), Duration::from_millis(20));
        cache.get_forecast(location()).await.unwrap();

        let handle = Arc::clone(&cache).spawn_sweeper();
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert!(cache.is_empty().await);
    }
}
