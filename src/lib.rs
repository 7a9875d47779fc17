//! Irrigation decisions for individual fields, driven by soil sensors,
//! growing-degree-day crop development and a cached weather forecast.

pub mod config;
pub mod datasources;
pub mod db;
pub mod error;
pub mod logic;
pub mod models;

pub use error::{CropOpsError, Result};
pub use logic::{
    compute_daily_gdd, compute_growth_stage, BackfillReport, GddTracker, GrowthStageStatus,
    IrrigationRuleEngine, IrrigationService, WeatherCache,
};
