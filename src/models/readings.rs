use super::crop::GrowthStage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One underground sensor sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilReading {
    pub timestamp: DateTime<Utc>,
    pub moisture_pct: Option<f64>,
    pub soil_temp_c: Option<f64>,
}

impl SoilReading {
    pub fn new(timestamp: DateTime<Utc>, moisture_pct: Option<f64>, soil_temp_c: Option<f64>) -> Self {
        Self {
            timestamp,
            moisture_pct,
            soil_temp_c,
        }
    }
}

/// Mean moisture across readings that carry one.
pub fn average_moisture(readings: &[SoilReading]) -> Option<f64> {
    let values: Vec<f64> = readings.iter().filter_map(|r| r.moisture_pct).collect();

    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Per-field, per-date GDD row. `(field_id, date)` is unique in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyGddRecord {
    pub field_id: i64,
    pub date: NaiveDate,
    pub avg_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub reading_count: u32,
    pub daily_gdd: f64,
    pub cumulative_gdd: f64,
    pub growth_stage: GrowthStage,
}
