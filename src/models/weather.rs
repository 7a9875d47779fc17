use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherSource {
    OpenWeatherMap,
    SeasonalMock,
}

impl WeatherSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherSource::OpenWeatherMap => "OpenWeatherMap",
            WeatherSource::SeasonalMock => "Seasonal Estimate",
        }
    }
}

impl std::fmt::Display for WeatherSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temp_c: f64,
    pub humidity_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_max_c: f64,
    pub temp_min_c: f64,
    pub precipitation_mm: f64,
}

/// Current conditions plus up to a week of daily forecast for one location.
/// Never mutated after it leaves the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAggregate {
    pub location_key: String,
    pub fetched_at: DateTime<Utc>,
    pub source: WeatherSource,
    pub current: CurrentConditions,
    pub daily_forecast: Vec<DailyForecast>,
}

pub const FORECAST_DAYS: usize = 7;

impl WeatherAggregate {
    pub fn next_days(&self, days: usize) -> &[DailyForecast] {
        let n = days.min(self.daily_forecast.len());
        &self.daily_forecast[..n]
    }

    /// Sum of forecast precipitation over the first `days` days.
    pub fn cumulative_rainfall(&self, days: usize) -> f64 {
        self.next_days(days).iter().map(|d| d.precipitation_mm).sum()
    }

    pub fn is_significant_rain(&self, days: usize, threshold_mm: f64) -> bool {
        self.cumulative_rainfall(days) >= threshold_mm
    }

    /// Mean of daily midpoint temperatures.
    pub fn mean_temperature(&self, days: usize) -> Option<f64> {
        let window = self.next_days(days);
        if window.is_empty() {
            return None;
        }
        let sum: f64 = window
            .iter()
            .map(|d| (d.temp_max_c + d.temp_min_c) / 2.0)
            .sum();
        Some(sum / window.len() as f64)
    }

    pub fn max_temperature(&self, days: usize) -> Option<f64> {
        self.next_days(days)
            .iter()
            .map(|d| d.temp_max_c)
            .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    pub fn min_temperature(&self, days: usize) -> Option<f64> {
        self.next_days(days)
            .iter()
            .map(|d| d.temp_min_c)
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Rejects aggregates the rules cannot safely consume.
    pub fn validate(&self, min_days: usize) -> std::result::Result<(), String> {
        if self.daily_forecast.len() < min_days {
            return Err(format!(
                "expected at least {} forecast days, got {}",
                min_days,
                self.daily_forecast.len()
            ));
        }
        if !self.current.temp_c.is_finite() || !self.current.humidity_pct.is_finite() {
            return Err("non-finite current conditions".into());
        }
        for day in &self.daily_forecast {
            if !day.temp_max_c.is_finite()
                || !day.temp_min_c.is_finite()
                || !day.precipitation_mm.is_finite()
            {
                return Err(format!("non-finite values on {}", day.date));
            }
            if day.precipitation_mm < 0.0 {
                return Err(format!("negative precipitation on {}", day.date));
            }
            if day.temp_min_c > day.temp_max_c {
                return Err(format!("min temperature above max on {}", day.date));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::aggregate_with_rain;
    use super::*;

    #[test]
    fn cumulative_rainfall_sums_first_days_only() {
        let agg = aggregate_with_rain(&[5.0, 10.0, 10.0, 40.0, 0.0, 0.0, 0.0]);
        assert_eq!(agg.cumulative_rainfall(3), 25.0);
        assert_eq!(agg.cumulative_rainfall(4), 65.0);
        assert_eq!(agg.cumulative_rainfall(0), 0.0);
    }

    #[test]
    fn cumulative_rainfall_handles_short_forecast() {
        let agg = aggregate_with_rain(&[2.0, 3.0]);
        assert_eq!(agg.cumulative_rainfall(7), 5.0);
    }

    #[test]
    fn significant_rain_threshold_is_inclusive() {
        let agg = aggregate_with_rain(&[10.0, 5.0, 5.0, 0.0]);
        assert!(agg.is_significant_rain(3, 20.0));
        assert!(!agg.is_significant_rain(2, 20.0));
    }

    #[test]
    fn temperature_aggregates() {
        let agg = aggregate_with_rain(&[0.0, 0.0, 0.0]);
        assert_eq!(agg.max_temperature(3), Some(32.0));
        assert_eq!(agg.min_temperature(3), Some(20.0));
        assert_eq!(agg.mean_temperature(1), Some(25.0));
        assert_eq!(agg.mean_temperature(0), None);
    }

    #[test]
    fn validate_rejects_bad_aggregates() {
        assert!(aggregate_with_rain(&[0.0, 1.0, 2.0]).validate(3).is_ok());
        assert!(aggregate_with_rain(&[0.0, 1.0]).validate(3).is_err());
        assert!(aggregate_with_rain(&[0.0, -1.0, 2.0]).validate(3).is_err());

        let mut agg = aggregate_with_rain(&[0.0, 1.0, 2.0]);
        agg.daily_forecast[1].temp_min_c = 45.0;
        assert!(agg.validate(3).is_err());

        let mut agg = aggregate_with_rain(&[0.0, 1.0, 2.0]);
        agg.current.temp_c = f64::NAN;
        assert!(agg.validate(3).is_err());
    }
}
