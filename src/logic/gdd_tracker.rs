use super::calculations::compute_soil_gdd;
use super::crop_params;
use super::growth_stage::stage_for_gdd;
use crate::db::FieldStore;
use crate::error::{CropOpsError, Result};
use crate::models::{DailyGddRecord, FieldState};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Outcome of a GDD run. Records are kept even when persisting them failed.
#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub records: Vec<DailyGddRecord>,
    pub skipped_dates: Vec<NaiveDate>,
    pub persist_failures: Vec<(NaiveDate, String)>,
}

impl BackfillReport {
    pub fn final_cumulative_gdd(&self) -> Option<f64> {
        self.records.last().map(|r| r.cumulative_gdd)
    }

    pub fn is_fully_persisted(&self) -> bool {
        self.persist_failures.is_empty()
    }
}

/// Accumulates daily GDD from soil-temperature readings for one field at a time.
///
/// A run walks dates in ascending order because each cumulative value depends
/// on the previous day. Different fields share nothing and may run in parallel.
pub struct GddTracker<S> {
    store: S,
}

impl<S: FieldStore> GddTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Recompute `start..=end` day by day and upsert each record. Idempotent
    /// per date: re-running the same range rewrites the same rows.
    pub fn backfill(&self, field_id: i64, start: NaiveDate, end: NaiveDate) -> Result<BackfillReport> {
        let field = self.store.get_field_state(field_id)?;
        validate_range(&field, start, end)?;
        let base_temp = base_temperature(&field)?;

        let mut cumulative = self.cumulative_before(field_id, &field, start)?;
        let mut report = BackfillReport::default();

        let mut date = start;
        while date <= end {
            match self.compute_day(&field, field_id, date, base_temp, cumulative)? {
                Some(record) => {
                    cumulative = record.cumulative_gdd;
                    if let Err(e) = self.store.upsert_gdd_record(&record) {
                        warn!(field_id, %date, error = %e, "Failed to persist GDD record");
                        report.persist_failures.push((date, e.to_string()));
                    }
                    report.records.push(record);
                }
                None => {
                    debug!(field_id, %date, "No soil temperature readings, skipping date");
                    report.skipped_dates.push(date);
                }
            }

            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }

        tracing::info!(
            field_id,
            computed = report.records.len(),
            skipped = report.skipped_dates.len(),
            failures = report.persist_failures.len(),
            "GDD backfill complete"
        );
        Ok(report)
    }

    /// Incremental daily update for a single date, carrying the latest stored
    /// cumulative value forward. Returns None when the date had no readings.
    pub fn record_day(&self, field_id: i64, date: NaiveDate) -> Result<Option<DailyGddRecord>> {
        let report = self.backfill(field_id, date, date)?;
        if let Some((_, err)) = report.persist_failures.first() {
            warn!(field_id, %date, error = %err, "Daily GDD computed but not persisted");
        }
        Ok(report.records.into_iter().next())
    }

    fn cumulative_before(&self, field_id: i64, field: &FieldState, start: NaiveDate) -> Result<f64> {
        if start <= field.sowing_date {
            return Ok(0.0);
        }

        // Days without readings have no row; carry the newest value before them.
        Ok(self
            .store
            .get_gdd_record_before(field_id, start)?
            .filter(|r| r.date >= field.sowing_date)
            .map(|r| r.cumulative_gdd)
            .unwrap_or(0.0))
    }

    fn compute_day(
        &self,
        field: &FieldState,
        field_id: i64,
        date: NaiveDate,
        base_temp: f64,
        cumulative_before: f64,
    ) -> Result<Option<DailyGddRecord>> {
        let readings = self.store.get_soil_readings_for_date(field_id, date)?;
        let Some(summary) = compute_soil_gdd(&readings, base_temp) else {
            return Ok(None);
        };

        let cumulative = super::calculations::round1(cumulative_before + summary.daily_gdd);
        let stage = stage_for_gdd(cumulative, field.total_gdd_required);

        Ok(Some(DailyGddRecord {
            field_id,
            date,
            avg_temp: summary.avg_temp,
            min_temp: summary.min_temp,
            max_temp: summary.max_temp,
            reading_count: summary.reading_count,
            daily_gdd: summary.daily_gdd,
            cumulative_gdd: cumulative,
            growth_stage: stage,
        }))
    }
}

fn validate_range(field: &FieldState, start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(CropOpsError::InvalidDateRange(format!(
            "end {} is before start {}",
            end, start
        )));
    }
    if start < field.sowing_date {
        return Err(CropOpsError::InvalidDateRange(format!(
            "start {} is before sowing date {}",
            start, field.sowing_date
        )));
    }
    Ok(())
}

fn base_temperature(field: &FieldState) -> Result<f64> {
    // Registry is authoritative; the stored copy only matters for unknown crops
    let profile = crop_params::lookup(&field.crop_name)?;
    Ok(profile.base_temp_c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Crop, GrowthStage, Location, SoilReading, SoilTexture};
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TestStore {
        field: Option<FieldState>,
        readings: HashMap<NaiveDate, Vec<SoilReading>>,
        records: Mutex<BTreeMap<NaiveDate, DailyGddRecord>>,
        fail_upserts: bool,
    }

    impl FieldStore for TestStore {
        fn get_field_state(&self, field_id: i64) -> Result<FieldState> {
            self.field
                .clone()
                .ok_or_else(|| CropOpsError::NotFound(format!("field {}", field_id)))
        }

        fn get_recent_soil_readings(&self, _: i64, _: DateTime<Utc>) -> Result<Vec<SoilReading>> {
            Ok(self.readings.values().flatten().cloned().collect())
        }

        fn get_soil_readings_for_date(&self, _: i64, date: NaiveDate) -> Result<Vec<SoilReading>> {
            Ok(self.readings.get(&date).cloned().unwrap_or_default())
        }

        fn upsert_gdd_record(&self, record: &DailyGddRecord) -> Result<()> {
            if self.fail_upserts {
                return Err(CropOpsError::InvalidData("disk full".into()));
            }
            self.records.lock().unwrap().insert(record.date, record.clone());
            Ok(())
        }

        fn get_gdd_record(&self, _: i64, date: NaiveDate) -> Result<Option<DailyGddRecord>> {
            Ok(self.records.lock().unwrap().get(&date).cloned())
        }

        fn get_latest_gdd_record(&self, _: i64) -> Result<Option<DailyGddRecord>> {
            Ok(self.records.lock().unwrap().values().last().cloned())
        }

        fn get_gdd_record_before(&self, _: i64, date: NaiveDate) -> Result<Option<DailyGddRecord>> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .range(..date)
                .next_back()
                .map(|(_, r)| r.clone()))
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn readings_for(d: u32, temps: &[f64]) -> Vec<SoilReading> {
        temps
            .iter()
            .enumerate()
            .map(|(i, t)| {
                SoilReading::new(
                    Utc.with_ymd_and_hms(2024, 6, d, 6 + i as u32, 0, 0).unwrap(),
                    Some(50.0),
                    Some(*t),
                )
            })
            .collect()
    }

    fn store_with(days: &[(u32, &[f64])]) -> TestStore {
        let field = FieldState::new(
            "Plot".into(),
            Crop::Rice,
            day(1),
            SoilTexture::ClayLoam,
            Location::new(17.385, 78.4867),
        );
        TestStore {
            field: Some(field),
            readings: days.iter().map(|(d, t)| (day(*d), readings_for(*d, t))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn backfill_accumulates_in_order() {
        let store = store_with(&[(1, &[20.0, 24.0]), (2, &[25.0]), (3, &[18.0, 22.0])]);
        let tracker = GddTracker::new(store);

        let report = tracker.backfill(1, day(1), day(3)).unwrap();

        let cumulative: Vec<f64> = report.records.iter().map(|r| r.cumulative_gdd).collect();
        assert_eq!(cumulative, vec![12.0, 27.0, 37.0]);
        assert!(report.is_fully_persisted());
        assert_eq!(report.final_cumulative_gdd(), Some(37.0));
    }

    #[test]
    fn cumulative_is_monotonic_with_cold_days() {
        let store = store_with(&[(1, &[22.0]), (2, &[4.0, 6.0]), (3, &[9.0]), (4, &[21.0])]);
        let tracker = GddTracker::new(store);

        let report = tracker.backfill(1, day(1), day(4)).unwrap();

        for pair in report.records.windows(2) {
            assert!(pair[1].cumulative_gdd >= pair[0].cumulative_gdd);
        }
        assert!(report.records.iter().all(|r| r.daily_gdd >= 0.0));
        assert_eq!(report.records[1].daily_gdd, 0.0);
    }

    #[test]
    fn days_without_readings_are_skipped() {
        let store = store_with(&[(1, &[20.0]), (3, &[20.0])]);
        let tracker = GddTracker::new(store);

        let report = tracker.backfill(1, day(1), day(3)).unwrap();

        assert_eq!(report.skipped_dates, vec![day(2)]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].cumulative_gdd, 20.0);
        assert!(tracker.store().get_gdd_record(1, day(2)).unwrap().is_none());
    }

    #[test]
    fn backfill_is_idempotent() {
        let store = store_with(&[(1, &[20.0]), (2, &[21.0])]);
        let tracker = GddTracker::new(store);

        let first = tracker.backfill(1, day(1), day(2)).unwrap();
        let second = tracker.backfill(1, day(1), day(2)).unwrap();

        assert_eq!(first.records, second.records);
        assert_eq!(tracker.store().records.lock().unwrap().len(), 2);
    }

    #[test]
    fn partial_backfill_continues_from_prior_day() {
        let store = store_with(&[(1, &[20.0]), (2, &[21.0]), (3, &[22.0])]);
        let tracker = GddTracker::new(store);
        tracker.backfill(1, day(1), day(2)).unwrap();

        let record = tracker.record_day(1, day(3)).unwrap().unwrap();
        assert_eq!(record.cumulative_gdd, 10.0 + 11.0 + 12.0);
    }

    #[test]
    fn repeated_record_day_after_gap_keeps_cumulative() {
        // rice base 10: 30 °C gives 20 GDD per day, day 2 has no readings
        let tracker = GddTracker::new(store_with(&[(1, &[30.0]), (3, &[30.0, 30.0])]));
        tracker.backfill(1, day(1), day(2)).unwrap();

        let first = tracker.record_day(1, day(3)).unwrap().unwrap();
        let second = tracker.record_day(1, day(3)).unwrap().unwrap();

        assert_eq!(first.cumulative_gdd, 40.0);
        assert_eq!(second.cumulative_gdd, 40.0);
    }

    #[test]
    fn rebackfilling_middle_of_range_after_gap() {
        let store = store_with(&[(1, &[30.0]), (3, &[30.0]), (4, &[30.0]), (5, &[30.0])]);
        let tracker = GddTracker::new(store);
        let full = tracker.backfill(1, day(1), day(5)).unwrap();
        assert_eq!(full.final_cumulative_gdd(), Some(80.0));

        let middle = tracker.backfill(1, day(3), day(4)).unwrap();
        let cumulative: Vec<f64> = middle.records.iter().map(|r| r.cumulative_gdd).collect();
        assert_eq!(cumulative, vec![40.0, 60.0]);
        assert_eq!(
            tracker.store().get_gdd_record(1, day(5)).unwrap().unwrap().cumulative_gdd,
            80.0
        );
    }

    #[test]
    fn rejects_end_before_start() {
        let tracker = GddTracker::new(store_with(&[]));
        assert!(matches!(
            tracker.backfill(1, day(5), day(4)),
            Err(CropOpsError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn rejects_start_before_sowing() {
        let tracker = GddTracker::new(store_with(&[]));
        let before_sowing = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        assert!(matches!(
            tracker.backfill(1, before_sowing, day(3)),
            Err(CropOpsError::InvalidDateRange(_))
        ));
    }

    #[test]
    fn persistence_failure_still_returns_records() {
        let mut store = store_with(&[(1, &[20.0]), (2, &[22.0])]);
        store.fail_upserts = true;
        let tracker = GddTracker::new(store);

        let report = tracker.backfill(1, day(1), day(2)).unwrap();

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.persist_failures.len(), 2);
        assert_eq!(report.final_cumulative_gdd(), Some(22.0));
    }

    #[test]
    fn records_carry_stage() {
        let store = store_with(&[(1, &[20.0])]);
        let tracker = GddTracker::new(store);
        let report = tracker.backfill(1, day(1), day(1)).unwrap();
        assert_eq!(report.records[0].growth_stage, GrowthStage::Initial);
    }

    #[test]
    fn unsupported_crop_is_rejected() {
        let mut store = store_with(&[(1, &[20.0])]);
        if let Some(field) = store.field.as_mut() {
            field.crop_name = "kiwi".into();
        }
        let tracker = GddTracker::new(store);
        assert!(matches!(
            tracker.backfill(1, day(1), day(1)),
            Err(CropOpsError::UnsupportedCrop(_))
        ));
    }
}
