use crate::models::SoilReading;

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Calculate Growing Degree Days from a daily max/min (simple average method).
/// Never negative; rounded to one decimal.
pub fn compute_daily_gdd(temp_max: f64, temp_min: f64, base_temp: f64) -> f64 {
    let gdd = (temp_max + temp_min) / 2.0 - base_temp;
    if gdd > 0.0 {
        round1(gdd)
    } else {
        0.0
    }
}

/// Threshold variant: max is capped at the crop's upper cutoff and min is
/// raised to the base before averaging. A collapsed window yields 0.
pub fn compute_daily_gdd_with_cutoff(
    temp_max: f64,
    temp_min: f64,
    base_temp: f64,
    upper_temp: f64,
) -> f64 {
    let max = temp_max.min(upper_temp);
    let min = temp_min.max(base_temp);

    if min >= max {
        return 0.0;
    }
    compute_daily_gdd(max, min, base_temp)
}

/// Intraday soil-temperature statistics for one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilTempSummary {
    pub avg_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub reading_count: u32,
    pub daily_gdd: f64,
}

/// Soil-temperature variant. Returns None when no reading carries a
/// temperature, so callers can skip the date instead of writing a false zero.
pub fn compute_soil_gdd(readings: &[SoilReading], base_temp: f64) -> Option<SoilTempSummary> {
    let temps: Vec<f64> = readings
        .iter()
        .filter_map(|r| r.soil_temp_c)
        .filter(|t| t.is_finite())
        .collect();

    if temps.is_empty() {
        return None;
    }

    let avg = temps.iter().sum::<f64>() / temps.len() as f64;
    let min = temps.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = temps.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let daily_gdd = if avg > base_temp {
        round1(avg - base_temp)
    } else {
        0.0
    };

    Some(SoilTempSummary {
        avg_temp: round1(avg),
        min_temp: min,
        max_temp: max,
        reading_count: temps.len() as u32,
        daily_gdd,
    })
}
