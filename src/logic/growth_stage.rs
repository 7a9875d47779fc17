use super::calculations::round1;
use super::crop_params::{self, CropProfile};
use crate::error::Result;
use crate::models::GrowthStage;
use serde::{Deserialize, Serialize};

/// Map progress (percent of the crop's GDD requirement) to a stage.
/// Lower bounds are inclusive: 15.0 is already Development.
pub fn stage_of(progress_pct: f64) -> GrowthStage {
    if progress_pct < 15.0 {
        GrowthStage::Initial
    } else if progress_pct < 40.0 {
        GrowthStage::Development
    } else if progress_pct < 75.0 {
        GrowthStage::MidSeason
    } else if progress_pct < 95.0 {
        GrowthStage::LateSeason
    } else {
        GrowthStage::HarvestReady
    }
}

/// Unrounded progress toward maturity in percent. Not capped.
fn raw_progress_pct(accumulated_gdd: f64, total_gdd: f64) -> f64 {
    if total_gdd <= 0.0 {
        return 0.0;
    }
    accumulated_gdd.max(0.0) * 100.0 / total_gdd
}

/// Progress toward maturity, rounded to one decimal for display. Not capped.
pub fn progress_pct(accumulated_gdd: f64, total_gdd: f64) -> f64 {
    round1(raw_progress_pct(accumulated_gdd, total_gdd))
}

/// Stage for a cumulative GDD value. Thresholds apply to the exact ratio,
/// never to the rounded display value.
pub fn stage_for_gdd(accumulated_gdd: f64, total_gdd: f64) -> GrowthStage {
    stage_of(raw_progress_pct(accumulated_gdd, total_gdd))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrowthStageStatus {
    pub stage: GrowthStage,
    /// Rounded and capped at 100 for display; the stage uses the exact ratio.
    pub progress_pct: f64,
    pub days_to_maturity: u32,
}

pub fn compute_growth_stage(
    crop_name: &str,
    accumulated_gdd: f64,
    days_elapsed: u32,
) -> Result<GrowthStageStatus> {
    let profile = crop_params::lookup(crop_name)?;
    Ok(growth_stage_for(profile, accumulated_gdd, days_elapsed))
}

pub fn growth_stage_for(
    profile: &CropProfile,
    accumulated_gdd: f64,
    days_elapsed: u32,
) -> GrowthStageStatus {
    GrowthStageStatus {
        stage: stage_for_gdd(accumulated_gdd, profile.total_gdd),
        progress_pct: progress_pct(accumulated_gdd, profile.total_gdd).min(100.0),
        days_to_maturity: days_to_maturity(profile, accumulated_gdd, days_elapsed),
    }
}

/// Remaining GDD divided by the observed daily rate. Before any heat has
/// accrued, the nominal season length scaled by remaining progress is used.
fn days_to_maturity(profile: &CropProfile, accumulated_gdd: f64, days_elapsed: u32) -> u32 {
    let remaining = profile.total_gdd - accumulated_gdd.max(0.0);
    if remaining <= 0.0 {
        return 0;
    }

    if accumulated_gdd > 0.0 && days_elapsed > 0 {
        let daily_rate = accumulated_gdd / days_elapsed as f64;
        return (remaining / daily_rate).ceil() as u32;
    }

    let remaining_share = remaining / profile.total_gdd;
    (profile.season_days as f64 * remaining_share).ceil() as u32
}
