use super::ForecastProvider;
use crate::config::OpenWeatherMapConfig;
use crate::error::{CropOpsError, Result};
use crate::models::{
    CurrentConditions, DailyForecast, Location, WeatherAggregate, WeatherSource, FORECAST_DAYS,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
    base_url: String,
}

// OpenWeatherMap One Call API response structures
#[derive(Debug, Deserialize)]
struct OwmOneCallResponse {
    current: OwmCurrent,
    #[serde(default)]
    daily: Vec<OwmDaily>,
}

#[derive(Debug, Deserialize)]
struct OwmCurrent {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmDaily {
    dt: i64,
    temp: OwmDailyTemp,
    #[serde(default)]
    rain: Option<f64>, // mm, absent when dry
    #[serde(default)]
    snow: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwmDailyTemp {
    min: f64,
    max: f64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Self {
        Self::with_base_url(config, API_BASE_URL)
    }

    pub fn with_base_url(config: OpenWeatherMapConfig, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn onecall_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/onecall?lat={}&lon={}&exclude=minutely,hourly,alerts&units=metric&appid={}",
            self.base_url, latitude, longitude, self.config.api_key
        )
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self, latitude: f64, longitude: f64) -> Result<bool> {
        let response = self
            .client
            .get(self.onecall_url(latitude, longitude))
            .send()
            .await
            .map_err(|e| CropOpsError::WeatherUnavailable(format!("OpenWeatherMap: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn convert_response(
        &self,
        location: Location,
        response: OwmOneCallResponse,
    ) -> WeatherAggregate {
        let daily_forecast = response
            .daily
            .iter()
            .take(FORECAST_DAYS)
            .map(convert_daily)
            .collect();

        WeatherAggregate {
            location_key: location.cache_key(),
            fetched_at: Utc::now(),
            source: WeatherSource::OpenWeatherMap,
            current: CurrentConditions {
                temp_c: response.current.temp,
                humidity_pct: response.current.humidity,
            },
            daily_forecast,
        }
    }
}

fn convert_daily(day: &OwmDaily) -> DailyForecast {
    let date = DateTime::from_timestamp(day.dt, 0)
        .unwrap_or_else(Utc::now)
        .date_naive();

    // Combine rain and snow precipitation
    let precipitation_mm = day.rain.unwrap_or(0.0) + day.snow.unwrap_or(0.0);

    DailyForecast {
        date,
        temp_max_c: day.temp.max,
        temp_min_c: day.temp.min,
        precipitation_mm,
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherMapClient {
    async fn fetch_forecast(&self, latitude: f64, longitude: f64) -> Result<WeatherAggregate> {
        let response = self
            .client
            .get(self.onecall_url(latitude, longitude))
            .send()
            .await
            .map_err(|e| CropOpsError::WeatherUnavailable(format!("OpenWeatherMap: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropOpsError::WeatherUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmOneCallResponse = response.json().await.map_err(|e| {
            CropOpsError::WeatherUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })?;

        Ok(self.convert_response(Location::new(latitude, longitude), owm_response))
    }

    fn name(&self) -> &'static str {
        "OpenWeatherMap"
    }
}
