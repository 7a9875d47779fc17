pub mod openweathermap;
pub mod seasonal;

pub use openweathermap::OpenWeatherMapClient;
pub use seasonal::{seasonal_forecast, SeasonalProvider};

use crate::error::Result;
use crate::models::WeatherAggregate;
use async_trait::async_trait;
use std::sync::Arc;

/// External forecast lookup. Implementations may suspend on network I/O and
/// are expected to return an error rather than partial data on failure.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<WeatherAggregate>;

    /// Short name used in logs and decision data points
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<P: ForecastProvider + ?Sized> ForecastProvider for Arc<P> {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<WeatherAggregate> {
        (**self).fetch_forecast(latitude, longitude).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
