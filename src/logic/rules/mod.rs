pub mod critical_moisture;
pub mod engine;
pub mod fallback;
pub mod high_kc;
pub mod high_moisture;
pub mod rain_forecast;
pub mod stable;
pub mod stage_minimum;

pub use engine::IrrigationRuleEngine;

use super::crop_params::{CropProfile, StageParams};
use super::growth_stage::GrowthStageStatus;
use super::water_balance;
use crate::models::{IrrigationDecision, IrrigationInput, RuleId, WeatherAggregate};

/// Moisture at or above this is treated as saturated for every crop and soil.
pub const OPTIMAL_CEILING_PCT: f64 = 85.0;
/// Below this in mid-season the crop is at risk regardless of its band.
pub const CRITICAL_MOISTURE_PCT: f64 = 40.0;
pub const RAIN_DEFERRAL_MM: f64 = 20.0;
pub const RAIN_WINDOW_DAYS: usize = 3;
/// Kc above this marks a high-demand stage.
pub const HIGH_KC: f64 = 1.0;
pub const FALLBACK_DEPTH_MM: f64 = 25.0;

/// Inputs resolved once per decision and shared by every rule.
pub struct RuleContext<'a> {
    pub input: &'a IrrigationInput,
    pub profile: &'static CropProfile,
    pub status: GrowthStageStatus,
    pub params: &'static StageParams,
    pub weather: Option<&'a WeatherAggregate>,
}

impl RuleContext<'_> {
    pub fn moisture(&self) -> f64 {
        self.input.current_moisture_pct
    }

    /// Depth needed to bring the root zone up to `target_pct`.
    pub fn depth_to(&self, target_pct: f64) -> f64 {
        water_balance::required_depth_mm(
            self.input.soil_texture,
            self.profile.root_depth_cm,
            self.moisture(),
            target_pct,
        )
    }

    pub fn forecast_rain_mm(&self) -> Option<f64> {
        self.weather
            .map(|w| w.cumulative_rainfall(RAIN_WINDOW_DAYS))
    }
}

/// One prioritized irrigation rule
pub trait IrrigationRule: Send + Sync {
    /// Tag emitted when this rule decides
    fn id(&self) -> RuleId;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Return a decision if the rule's condition holds
    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision>;
}
