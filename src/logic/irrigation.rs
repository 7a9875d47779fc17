use super::rules::IrrigationRuleEngine;
use super::weather_cache::WeatherCache;
use crate::datasources::ForecastProvider;
use crate::db::FieldStore;
use crate::error::{CropOpsError, Result};
use crate::models::{average_moisture, IrrigationDecision, IrrigationInput};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Glues the forecast cache to the rule engine. One instance serves many
/// fields concurrently; nothing here holds per-field state.
pub struct IrrigationService<P> {
    cache: Arc<WeatherCache<P>>,
    engine: IrrigationRuleEngine,
}

impl<P: ForecastProvider> IrrigationService<P> {
    pub fn new(cache: Arc<WeatherCache<P>>) -> Self {
        Self {
            cache,
            engine: IrrigationRuleEngine::new(),
        }
    }

    pub fn cache(&self) -> &Arc<WeatherCache<P>> {
        &self.cache
    }

    pub fn engine(&self) -> &IrrigationRuleEngine {
        &self.engine
    }

    /// Never fails: an unreachable forecast routes to the fallback rules and
    /// an unknown crop yields the zero-confidence skip.
    pub async fn decide_irrigation(&self, input: &IrrigationInput) -> IrrigationDecision {
        let today = Utc::now().date_naive();

        match self.cache.get_forecast(input.location).await {
            Ok(weather) => self.engine.decide(input, Some(&weather), today),
            Err(e) => {
                warn!(
                    crop = %input.crop_name,
                    location_key = %input.location.cache_key(),
                    error = %e,
                    "Deciding without forecast"
                );
                self.engine.decide(input, None, today)
            }
        }
    }

    /// Build the input from stored state and decide. Moisture is the mean of
    /// readings in the last `window_hours`; GDD comes from the newest daily
    /// record, or the field row when nothing has been tracked yet.
    pub async fn decide_for_field<S: FieldStore>(
        &self,
        store: &S,
        field_id: i64,
        window_hours: u32,
    ) -> Result<IrrigationDecision> {
        let field = store.get_field_state(field_id)?;

        let since = Utc::now() - Duration::hours(window_hours as i64);
        let readings = store.get_recent_soil_readings(field_id, since)?;
        let moisture = average_moisture(&readings).ok_or(CropOpsError::NoSensorData {
            field_id,
            window_hours,
        })?;

        let accumulated_gdd = store
            .get_latest_gdd_record(field_id)?
            .map(|r| r.cumulative_gdd)
            .unwrap_or(field.accumulated_gdd);

        let input = IrrigationInput {
            crop_name: field.crop_name.clone(),
            soil_texture: field.soil_texture,
            current_moisture_pct: moisture,
            sowing_date: field.sowing_date,
            accumulated_gdd,
            location: field.location,
        };

        let decision = self.decide_irrigation(&input).await;
        info!(
            field_id,
            field = %field.name,
            rule = %decision.rule_triggered,
            irrigate = decision.should_irrigate,
            "Irrigation decision for field"
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::logic::weather_cache::testing::{Mode, ScriptedProvider};
    use crate::logic::weather_cache::CacheSettings;
    use crate::models::{Crop, FieldState, Location, RuleId, SoilReading, SoilTexture};
    use chrono::NaiveDate;

    const DRY: &[f64] = &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
    const WET: &[f64] = &[10.0, 10.0, 5.0, 0.0, 0.0, 0.0, 0.0];

    fn service(mode: Mode) -> IrrigationService<Arc<ScriptedProvider>> {
        let provider = Arc::new(ScriptedProvider::new(mode));
        let settings = CacheSettings {
            fetch_timeout: std::time::Duration::from_millis(200),
            ..CacheSettings::default()
        };
        IrrigationService::new(Arc::new(WeatherCache::new(provider, settings)))
    }

    fn maize_mid(moisture: f64) -> IrrigationInput {
        IrrigationInput {
            crop_name: "maize".into(),
            soil_texture: SoilTexture::Loam,
            current_moisture_pct: moisture,
            sowing_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            accumulated_gdd: 700.0,
            location: Location::new(17.385, 78.4867),
        }
    }

    fn seeded_db(moistures: &[f64]) -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let field = FieldState::new(
            "North Plot".into(),
            Crop::Maize,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            SoilTexture::Loam,
            Location::new(17.385, 78.4867),
        );
        let id = db.create_field(&field).unwrap();
        db.update_field_progress(id, 700.0, crate::models::GrowthStage::MidSeason)
            .unwrap();

        let now = Utc::now();
        for (i, m) in moistures.iter().enumerate() {
            let reading = SoilReading::new(
                now - Duration::minutes(10 * (i as i64 + 1)),
                Some(*m),
                Some(24.0),
            );
            db.insert_soil_reading(id, &reading).unwrap();
        }
        (db, id)
    }

    #[tokio::test]
    async fn uses_forecast_when_available() {
        let svc = service(Mode::Rain(WET));
        let d = svc.decide_irrigation(&maize_mid(60.0)).await;
        assert_eq!(d.rule_triggered, RuleId::SufficientRainForecast);
    }

    #[tokio::test]
    async fn provider_failure_routes_to_fallback() {
        let svc = service(Mode::Fail);
        let d = svc.decide_irrigation(&maize_mid(50.0)).await;
        assert!(d.rule_triggered.is_fallback());
        assert!(d.confidence <= 0.6);
    }

    #[tokio::test]
    async fn timeout_routes_to_fallback() {
        let svc = service(Mode::Hang);
        let d = svc.decide_irrigation(&maize_mid(60.0)).await;
        assert_eq!(d.rule_triggered, RuleId::FallbackAdequateMoisture);
    }

    #[tokio::test]
    async fn unsupported_crop_never_errors() {
        let svc = service(Mode::Rain(DRY));
        let mut input = maize_mid(50.0);
        input.crop_name = "kiwi".into();
        let d = svc.decide_irrigation(&input).await;
        assert_eq!(d.rule_triggered, RuleId::UnsupportedCrop);
        assert_eq!(d.confidence, 0.0);
    }

    #[tokio::test]
    async fn decisions_share_cached_forecast() {
        let provider = Arc::new(ScriptedProvider::new(Mode::Rain(DRY)));
        let cache = Arc::new(WeatherCache::new(Arc::clone(&provider), CacheSettings::default()));
        let svc = IrrigationService::new(cache);

        for moisture in [50.0, 60.0, 70.0] {
            svc.decide_irrigation(&maize_mid(moisture)).await;
        }
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn decide_for_field_averages_window() {
        let (db, id) = seeded_db(&[48.0, 52.0]);
        let svc = service(Mode::Rain(DRY));

        let d = svc.decide_for_field(&db, id, 6).await.unwrap();

        // mean 50 is below maize mid-season minimum of 55
        assert_eq!(d.rule_triggered, RuleId::BelowStageMinimum);
        let moisture = d
            .data_points
            .iter()
            .find(|p| p.label == "Soil Moisture")
            .unwrap();
        assert_eq!(moisture.value, "50%");
    }

    #[tokio::test]
    async fn decide_for_field_without_readings_errors() {
        let (db, id) = seeded_db(&[]);
        let svc = service(Mode::Rain(DRY));

        let err = svc.decide_for_field(&db, id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            CropOpsError::NoSensorData {
                window_hours: 6,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn decide_for_unknown_field_errors() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(Mode::Rain(DRY));
        assert!(svc.decide_for_field(&db, 42, 6).await.is_err());
    }
}
