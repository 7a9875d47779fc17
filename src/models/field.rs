use super::crop::{Crop, GrowthStage, SoilTexture};
use crate::logic::crop_params;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Coordinates rounded to 4 decimal places (~11 m), used to coalesce nearby lookups.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.4},{:.4}",
            round4(self.latitude),
            round4(self.longitude)
        )
    }
}

fn round4(v: f64) -> f64 {
    // + 0.0 folds -0.0 into 0.0 so both print the same key
    (v * 10_000.0).round() / 10_000.0 + 0.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldState {
    pub id: Option<i64>,
    pub name: String,
    pub crop_name: String,
    pub sowing_date: NaiveDate,
    pub soil_texture: SoilTexture,
    pub base_temperature: f64,
    pub total_gdd_required: f64,
    pub location: Location,
    pub accumulated_gdd: f64,
    pub growth_stage: GrowthStage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FieldState {
    pub fn new(
        name: String,
        crop: Crop,
        sowing_date: NaiveDate,
        soil_texture: SoilTexture,
        location: Location,
    ) -> Self {
        let profile = crop_params::profile(crop);
        let now = Utc::now();
        Self {
            id: None,
            name,
            crop_name: crop.as_str().to_string(),
            sowing_date,
            soil_texture,
            base_temperature: profile.base_temp_c,
            total_gdd_required: profile.total_gdd,
            location,
            accumulated_gdd: 0.0,
            growth_stage: GrowthStage::Initial,
            created_at: now,
            updated_at: now,
        }
    }

    /// Recognized crop for this field, if the stored name maps to one.
    pub fn crop(&self) -> Option<Crop> {
        Crop::from_str(&self.crop_name)
    }

    /// Switch crop and/or sowing date. Any change wipes the derived GDD state
    /// so nothing accumulated for the previous planting carries over.
    /// Returns true when a reset happened.
    pub fn change_crop(&mut self, crop: Crop, sowing_date: NaiveDate) -> bool {
        if self.crop() == Some(crop) && self.sowing_date == sowing_date {
            return false;
        }

        let profile = crop_params::profile(crop);
        self.crop_name = crop.as_str().to_string();
        self.sowing_date = sowing_date;
        self.base_temperature = profile.base_temp_c;
        self.total_gdd_required = profile.total_gdd;
        self.accumulated_gdd = 0.0;
        self.growth_stage = GrowthStage::Initial;
        self.updated_at = Utc::now();
        true
    }

    pub fn days_since_sowing(&self, today: NaiveDate) -> i64 {
        (today - self.sowing_date).num_days().max(0)
    }
}
