mod connection;
mod migrations;
mod queries;

pub use connection::Database;

use crate::error::Result;
use crate::models::{DailyGddRecord, FieldState, SoilReading};
use chrono::{DateTime, NaiveDate, Utc};

/// Field configuration, sensor readings and GDD history as seen by the engine.
/// The engine only ever reads copies and hands back new records to upsert.
pub trait FieldStore: Send + Sync {
    fn get_field_state(&self, field_id: i64) -> Result<FieldState>;

    /// Readings with `timestamp >= since`, newest first.
    fn get_recent_soil_readings(
        &self,
        field_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SoilReading>>;

    /// All readings whose UTC timestamp falls on `date`.
    fn get_soil_readings_for_date(&self, field_id: i64, date: NaiveDate)
        -> Result<Vec<SoilReading>>;

    /// Insert or replace the row for `(record.field_id, record.date)`.
    fn upsert_gdd_record(&self, record: &DailyGddRecord) -> Result<()>;

    fn get_gdd_record(&self, field_id: i64, date: NaiveDate) -> Result<Option<DailyGddRecord>>;

    fn get_latest_gdd_record(&self, field_id: i64) -> Result<Option<DailyGddRecord>>;

    /// Newest record dated strictly before `date`.
    fn get_gdd_record_before(
        &self,
        field_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyGddRecord>>;
}
