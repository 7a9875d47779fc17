use super::{
    critical_moisture::CriticalMoistureRule, fallback, high_kc::HighKcRule,
    high_moisture::HighMoistureRule, rain_forecast::RainForecastRule,
    stable::StableConditionsRule, stage_minimum::StageMinimumRule, IrrigationRule, RuleContext,
    RAIN_WINDOW_DAYS,
};
use crate::logic::crop_params::{self, REGISTRY_VERSION};
use crate::logic::growth_stage::growth_stage_for;
use crate::models::{
    IrrigationDecision, IrrigationInput, RuleId, Urgency, WeatherAggregate,
};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Evaluates the irrigation rules in fixed priority order; the first rule
/// that applies decides. Pure: no I/O, no clock beyond the `today` argument.
pub struct IrrigationRuleEngine {
    rules: Vec<Box<dyn IrrigationRule>>,
}

impl IrrigationRuleEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn IrrigationRule>> = vec![
            Box::new(HighMoistureRule),
            Box::new(RainForecastRule),
            Box::new(CriticalMoistureRule),
            Box::new(StageMinimumRule),
            Box::new(HighKcRule),
            Box::new(StableConditionsRule),
        ];

        Self { rules }
    }

    /// Decide for one field. `weather: None` means the forecast could not be
    /// obtained and routes to the fallback path.
    pub fn decide(
        &self,
        input: &IrrigationInput,
        weather: Option<&WeatherAggregate>,
        today: NaiveDate,
    ) -> IrrigationDecision {
        let profile = match crop_params::lookup(&input.crop_name) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(crop = %input.crop_name, "{}", e);
                return IrrigationDecision::skip(
                    RuleId::UnsupportedCrop,
                    Urgency::None,
                    0.0,
                    0,
                    format!(
                        "Crop '{}' is not supported. No recommendation can be made.",
                        input.crop_name
                    ),
                );
            }
        };

        let days_elapsed = (today - input.sowing_date).num_days().max(0) as u32;
        let status = growth_stage_for(profile, input.accumulated_gdd, days_elapsed);
        let ctx = RuleContext {
            input,
            profile,
            status,
            params: profile.stage(status.stage),
            weather,
        };

        let decision = match weather {
            Some(_) => self
                .rules
                .iter()
                .find_map(|rule| rule.evaluate(&ctx))
                .unwrap_or_else(|| StableConditionsRule.decide(&ctx)),
            None => {
                warn!(crop = %input.crop_name, "No forecast available, using fallback path");
                HighMoistureRule
                    .evaluate(&ctx)
                    .unwrap_or_else(|| fallback::evaluate(&ctx))
            }
        };

        debug!(
            rule = %decision.rule_triggered,
            irrigate = decision.should_irrigate,
            depth_mm = decision.recommended_depth_mm,
            stage = %status.stage,
            "Irrigation decision"
        );

        annotate(decision, &ctx)
    }

    pub fn list_rules(&self) -> Vec<(RuleId, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for IrrigationRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn annotate(decision: IrrigationDecision, ctx: &RuleContext) -> IrrigationDecision {
    let decision = decision
        .with_stage(ctx.status.stage)
        .with_data_point("Soil Moisture", format!("{:.0}%", ctx.moisture()), "Field Sensor")
        .with_data_point(
            "Growth Stage",
            format!("{} ({:.1}%)", ctx.status.stage, ctx.status.progress_pct),
            "GDD Tracker",
        )
        .with_data_point(
            "Stage Band",
            format!(
                "{:.0}-{:.0}%",
                ctx.params.moisture_min_pct, ctx.params.moisture_max_pct
            ),
            "Crop Registry",
        )
        .with_data_point("Kc", format!("{:.2}", ctx.params.kc), "Crop Registry")
        .with_data_point(
            "Days to Maturity",
            ctx.status.days_to_maturity,
            "GDD Tracker",
        )
        .with_data_point("Registry Version", REGISTRY_VERSION, "Crop Registry");

    match ctx.weather {
        Some(weather) => decision.with_data_point(
            "Forecast Rain",
            format!(
                "{:.1} mm / {} days",
                weather.cumulative_rainfall(RAIN_WINDOW_DAYS),
                RAIN_WINDOW_DAYS
            ),
            weather.source.as_str(),
        ),
        None => decision.with_data_point("Forecast Rain", "unavailable", "Weather Cache"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::water_balance::{MAX_DEPTH_MM, MIN_DEPTH_MM};
    use crate::models::weather::fixtures::aggregate_with_rain;
    use crate::models::{GrowthStage, IrrigationMethod, Location, SoilTexture};

    const DRY: &[f64] = &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    const WET: &[f64] = &[10.0, 10.0, 5.0, 0.0, 0.0, 0.0, 0.0];

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 10).unwrap()
    }

    fn input(crop: &str, soil: SoilTexture, gdd: f64, moisture: f64) -> IrrigationInput {
        IrrigationInput {
            crop_name: crop.to_string(),
            soil_texture: soil,
            current_moisture_pct: moisture,
            sowing_date: NaiveDate::from_ymd_opt(2024, 6, 20).unwrap(),
            accumulated_gdd: gdd,
            location: Location::new(17.385, 78.4867),
        }
    }

    // rice needs 2000 GDD, 1000 sits mid-season
    fn rice_mid(moisture: f64) -> IrrigationInput {
        input("rice", SoilTexture::ClayLoam, 1000.0, moisture)
    }

    // maize needs 1400 GDD, 700 sits mid-season (band 55-80, Kc 1.2)
    fn maize_mid(moisture: f64) -> IrrigationInput {
        input("maize", SoilTexture::Loam, 700.0, moisture)
    }

    fn decide(input: &IrrigationInput, rain: Option<&[f64]>) -> IrrigationDecision {
        let weather = rain.map(aggregate_with_rain);
        IrrigationRuleEngine::new().decide(input, weather.as_ref(), today())
    }

    #[test]
    fn skip_at_ceiling() {
        let d = decide(&rice_mid(86.0), Some(DRY));
        assert!(!d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::HighMoisture);
        assert_eq!(d.confidence, 0.95);
        assert_eq!(d.next_check_hours, 48);
    }

    #[test]
    fn ceiling_beats_rain_forecast() {
        let d = decide(&maize_mid(90.0), Some(WET));
        assert_eq!(d.rule_triggered, RuleId::HighMoisture);
    }

    #[test]
    fn critical_mid_season() {
        let d = decide(&rice_mid(35.0), Some(DRY));
        assert_eq!(d.growth_stage, Some(GrowthStage::MidSeason));
        assert!(d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::CriticalLowMoistureMidSeason);
        assert_eq!(d.rule_triggered.as_str(), "CRITICAL_LOW_MOISTURE_MID_SEASON");
        assert!((MIN_DEPTH_MM..=MAX_DEPTH_MM).contains(&d.recommended_depth_mm));
        assert_eq!(d.method, Some(IrrigationMethod::Drip));
        assert_eq!(d.next_check_hours, 168);
        assert_eq!(d.urgency, Urgency::Critical);
    }

    #[test]
    fn critical_mid_season_not_deferred_by_rain() {
        // 35% is under rice's mid-season minimum, so rain cannot defer it
        let d = decide(&rice_mid(35.0), Some(WET));
        assert_eq!(d.rule_triggered, RuleId::CriticalLowMoistureMidSeason);
    }

    #[test]
    fn rain_deferral() {
        let d = decide(&maize_mid(60.0), Some(WET));
        assert!(!d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::SufficientRainForecast);
        assert_eq!(d.confidence, 0.85);
        assert_eq!(d.next_check_hours, 72);
    }

    #[test]
    fn rain_just_under_threshold_does_not_defer() {
        let d = decide(&maize_mid(60.0), Some(&[10.0, 5.0, 4.9, 30.0, 0.0, 0.0, 0.0]));
        assert_ne!(d.rule_triggered, RuleId::SufficientRainForecast);
    }

    #[test]
    fn below_stage_minimum_high_kc_uses_drip() {
        let d = decide(&maize_mid(50.0), Some(DRY));
        assert!(d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::BelowStageMinimum);
        assert_eq!(d.method, Some(IrrigationMethod::Drip));
        assert_eq!(d.next_check_hours, 120);
        // loam 90 mm available, 80 - 50 = 30 points -> 27 mm
        assert!((d.recommended_depth_mm - 27.0).abs() < 1e-9);
    }

    #[test]
    fn below_stage_minimum_low_kc_uses_sprinkler() {
        // 400 GDD is development for maize (Kc 0.75, min 55)
        let d = decide(&input("maize", SoilTexture::Loam, 400.0, 50.0), Some(DRY));
        assert_eq!(d.growth_stage, Some(GrowthStage::Development));
        assert_eq!(d.rule_triggered, RuleId::BelowStageMinimum);
        assert_eq!(d.method, Some(IrrigationMethod::Sprinkler));
        assert_eq!(d.confidence, 0.85);
    }

    #[test]
    fn high_kc_moderate_moisture_tops_up() {
        let d = decide(&maize_mid(60.0), Some(DRY));
        assert!(d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::HighKcModerateMoisture);
        assert_eq!(d.method, Some(IrrigationMethod::Drip));
        assert_eq!(d.next_check_hours, 96);
        assert_eq!(d.confidence, 0.75);
        // 7.5 point deficit is under 10 mm, clamped to the floor
        assert_eq!(d.recommended_depth_mm, MIN_DEPTH_MM);
    }

    #[test]
    fn stable_conditions_default() {
        let d = decide(&maize_mid(70.0), Some(DRY));
        assert!(!d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::StableConditions);
        assert_eq!(d.confidence, 0.65);
        assert_eq!(d.next_check_hours, 24);
    }

    #[test]
    fn low_kc_stage_in_band_is_stable() {
        // initial maize, Kc 0.3: rule 5 never applies
        let d = decide(&input("maize", SoilTexture::Sandy, 50.0, 52.0), Some(DRY));
        assert_eq!(d.growth_stage, Some(GrowthStage::Initial));
        assert_eq!(d.rule_triggered, RuleId::StableConditions);
    }

    #[test]
    fn unsupported_crop() {
        let d = decide(&input("kiwi", SoilTexture::Loam, 500.0, 30.0), Some(DRY));
        assert_eq!(d.confidence, 0.0);
        assert_eq!(d.rule_triggered, RuleId::UnsupportedCrop);
        assert_eq!(d.rule_triggered.as_str(), "UNSUPPORTED_CROP");
        assert!(!d.should_irrigate);
        assert!(d.growth_stage.is_none());
        assert!(d.data_points.is_empty());
    }

    #[test]
    fn weather_failure_fallback_irrigates_conservatively() {
        let d = decide(&maize_mid(50.0), None);
        assert!(d.should_irrigate);
        assert!(d.rule_triggered.as_str().starts_with("FALLBACK_"));
        assert!(d.confidence <= 0.6);
        assert_eq!(d.recommended_depth_mm, 25.0);
        assert_eq!(d.method, Some(IrrigationMethod::Sprinkler));
        assert!(d.is_degraded());
    }

    #[test]
    fn weather_failure_fallback_skips_when_adequate() {
        let d = decide(&maize_mid(60.0), None);
        assert!(!d.should_irrigate);
        assert_eq!(d.rule_triggered, RuleId::FallbackAdequateMoisture);
        assert_eq!(d.confidence, 0.5);
    }

    #[test]
    fn fallback_bypasses_critical_rule() {
        let d = decide(&rice_mid(35.0), None);
        assert_eq!(d.rule_triggered, RuleId::FallbackLowMoisture);
        assert_eq!(d.recommended_depth_mm, 25.0);
    }

    #[test]
    fn fallback_still_honours_ceiling() {
        let d = decide(&maize_mid(90.0), None);
        assert_eq!(d.rule_triggered, RuleId::HighMoisture);
    }

    #[test]
    fn decisions_are_deterministic() {
        let engine = IrrigationRuleEngine::new();
        let weather = aggregate_with_rain(WET);
        for moisture in [20.0, 35.0, 50.0, 60.0, 70.0, 86.0] {
            let input = maize_mid(moisture);
            let first = engine.decide(&input, Some(&weather), today());
            for _ in 0..5 {
                let again = engine.decide(&input, Some(&weather), today());
                assert_eq!(again.rule_triggered, first.rule_triggered);
                assert_eq!(again.recommended_depth_mm, first.recommended_depth_mm);
            }
        }
    }

    #[test]
    fn depth_always_in_bounds_when_irrigating() {
        let engine = IrrigationRuleEngine::new();
        let weather = aggregate_with_rain(DRY);
        for crop in ["rice", "wheat", "maize", "tomato", "potato", "cotton"] {
            for soil in [SoilTexture::Sandy, SoilTexture::Loam, SoilTexture::ClayLoam] {
                for gdd in [0.0, 400.0, 800.0, 1200.0, 2500.0] {
                    for moisture in [0.0, 10.0, 39.0, 52.0, 64.0] {
                        let d = engine.decide(&input(crop, soil, gdd, moisture), Some(&weather), today());
                        if d.should_irrigate {
                            assert!(
                                (MIN_DEPTH_MM..=MAX_DEPTH_MM).contains(&d.recommended_depth_mm),
                                "{} {:?} {} {} -> {}",
                                crop,
                                soil,
                                gdd,
                                moisture,
                                d.recommended_depth_mm
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn decisions_carry_forecast_data_point() {
        let d = decide(&maize_mid(70.0), Some(WET));
        let rain = d
            .data_points
            .iter()
            .find(|p| p.label == "Forecast Rain")
            .unwrap();
        assert!(rain.value.starts_with("25.0 mm"));
    }

    #[test]
    fn rules_listed_in_priority_order() {
        let engine = IrrigationRuleEngine::new();
        let ids: Vec<RuleId> = engine.list_rules().into_iter().map(|(id, _)| id).collect();
        assert_eq!(
            ids,
            vec![
                RuleId::HighMoisture,
                RuleId::SufficientRainForecast,
                RuleId::CriticalLowMoistureMidSeason,
                RuleId::BelowStageMinimum,
                RuleId::HighKcModerateMoisture,
                RuleId::StableConditions,
            ]
        );
    }
}
