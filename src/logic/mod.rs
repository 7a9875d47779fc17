pub mod calculations;
pub mod crop_params;
pub mod gdd_tracker;
pub mod growth_stage;
pub mod irrigation;
pub mod rules;
pub mod water_balance;
pub mod weather_cache;

pub use calculations::{compute_daily_gdd, compute_daily_gdd_with_cutoff, compute_soil_gdd};
pub use gdd_tracker::{BackfillReport, GddTracker};
pub use growth_stage::{compute_growth_stage, GrowthStageStatus};
pub use irrigation::IrrigationService;
pub use rules::IrrigationRuleEngine;
pub use weather_cache::{CacheSettings, WeatherCache};
