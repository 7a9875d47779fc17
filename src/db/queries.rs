use super::FieldStore;
use crate::db::Database;
use crate::error::{CropOpsError, Result};
use crate::models::{DailyGddRecord, FieldState, GrowthStage, Location, SoilReading, SoilTexture};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Row};
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

// Field Queries

impl Database {
    pub fn create_field(&self, field: &FieldState) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO fields
                    (name, crop_name, sowing_date, soil_texture, base_temperature, total_gdd_required,
                     latitude, longitude, accumulated_gdd, growth_stage, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    field.name,
                    field.crop_name,
                    field.sowing_date.format(DATE_FORMAT).to_string(),
                    format!("{:?}", field.soil_texture),
                    field.base_temperature,
                    field.total_gdd_required,
                    field.location.latitude,
                    field.location.longitude,
                    field.accumulated_gdd,
                    field.growth_stage.as_key(),
                    ts(&field.created_at),
                    ts(&field.updated_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_default_field(&self) -> Result<Option<FieldState>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM fields ORDER BY id LIMIT 1", [], row_to_field)
                .optional()
                .map_err(Into::into)
        })
    }

    /// Persist a field. When the stored crop or sowing date differs from the
    /// new one, derived GDD state is reset and the old history dropped.
    /// Returns true when that reset happened.
    pub fn save_field(&self, field: &FieldState) -> Result<bool> {
        let id = field
            .id
            .ok_or_else(|| CropOpsError::InvalidData("Field has no ID".into()))?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (stored_crop, stored_sowing): (String, String) = tx
                .query_row(
                    "SELECT crop_name, sowing_date FROM fields WHERE id = ?1",
                    [id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or_else(|| CropOpsError::NotFound(format!("field {}", id)))?;

            let sowing = field.sowing_date.format(DATE_FORMAT).to_string();
            let reset = !stored_crop.eq_ignore_ascii_case(&field.crop_name) || stored_sowing != sowing;

            let (accumulated, stage) = if reset {
                tracing::info!(field_id = id, crop = %field.crop_name, "Crop changed, resetting GDD history");
                tx.execute("DELETE FROM gdd_records WHERE field_id = ?1", [id])?;
                (0.0, GrowthStage::Initial)
            } else {
                (field.accumulated_gdd, field.growth_stage)
            };

            tx.execute(
                r#"
                UPDATE fields SET
                    name = ?1, crop_name = ?2, sowing_date = ?3, soil_texture = ?4,
                    base_temperature = ?5, total_gdd_required = ?6, latitude = ?7, longitude = ?8,
                    accumulated_gdd = ?9, growth_stage = ?10, updated_at = ?11
                WHERE id = ?12
                "#,
                params![
                    field.name,
                    field.crop_name,
                    sowing,
                    format!("{:?}", field.soil_texture),
                    field.base_temperature,
                    field.total_gdd_required,
                    field.location.latitude,
                    field.location.longitude,
                    accumulated,
                    stage.as_key(),
                    ts(&Utc::now()),
                    id,
                ],
            )?;

            tx.commit()?;
            Ok(reset)
        })
    }

    /// Sync the derived progress columns after a GDD run.
    pub fn update_field_progress(
        &self,
        field_id: i64,
        accumulated_gdd: f64,
        stage: GrowthStage,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE fields SET accumulated_gdd = ?1, growth_stage = ?2, updated_at = ?3 WHERE id = ?4",
                params![accumulated_gdd, stage.as_key(), ts(&Utc::now()), field_id],
            )?;
            Ok(())
        })
    }
}

fn row_to_field(row: &Row) -> rusqlite::Result<FieldState> {
    let texture_str: String = row.get("soil_texture")?;
    let stage_str: String = row.get("growth_stage")?;
    let sowing_str: String = row.get("sowing_date")?;
    let created_at_str: String = row.get("created_at")?;
    let updated_at_str: String = row.get("updated_at")?;

    let soil_texture = SoilTexture::from_str(&texture_str).unwrap_or_else(|| {
        warn!(
            soil_texture = %texture_str,
            "Unknown soil_texture in database, defaulting to Loam"
        );
        SoilTexture::Loam
    });
    let growth_stage = GrowthStage::from_key(&stage_str).unwrap_or_else(|| {
        warn!(growth_stage = %stage_str, "Unknown growth_stage in database, defaulting to INITIAL");
        GrowthStage::Initial
    });

    Ok(FieldState {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        crop_name: row.get("crop_name")?,
        sowing_date: parse_date(&sowing_str)?,
        soil_texture,
        base_temperature: row.get("base_temperature")?,
        total_gdd_required: row.get("total_gdd_required")?,
        location: Location::new(row.get("latitude")?, row.get("longitude")?),
        accumulated_gdd: row.get("accumulated_gdd")?,
        growth_stage,
        created_at: parse_ts(&created_at_str),
        updated_at: parse_ts(&updated_at_str),
    })
}

// Soil Reading Queries

impl Database {
    pub fn insert_soil_reading(&self, field_id: i64, reading: &SoilReading) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT OR REPLACE INTO soil_readings
                    (field_id, timestamp, reading_date, moisture_pct, soil_temp_c)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    field_id,
                    ts(&reading.timestamp),
                    reading.timestamp.date_naive().format(DATE_FORMAT).to_string(),
                    reading.moisture_pct,
                    reading.soil_temp_c,
                ],
            )?;
            Ok(())
        })
    }
}

fn row_to_reading(row: &Row) -> rusqlite::Result<SoilReading> {
    let timestamp_str: String = row.get("timestamp")?;
    Ok(SoilReading {
        timestamp: parse_ts(&timestamp_str),
        moisture_pct: row.get("moisture_pct")?,
        soil_temp_c: row.get("soil_temp_c")?,
    })
}

// GDD Record Queries

fn row_to_gdd_record(row: &Row) -> rusqlite::Result<DailyGddRecord> {
    let date_str: String = row.get("date")?;
    let stage_str: String = row.get("growth_stage")?;

    Ok(DailyGddRecord {
        field_id: row.get("field_id")?,
        date: parse_date(&date_str)?,
        avg_temp: row.get("avg_temp")?,
        min_temp: row.get("min_temp")?,
        max_temp: row.get("max_temp")?,
        reading_count: row.get("reading_count")?,
        daily_gdd: row.get("daily_gdd")?,
        cumulative_gdd: row.get("cumulative_gdd")?,
        growth_stage: GrowthStage::from_key(&stage_str).unwrap_or(GrowthStage::Initial),
    })
}

impl FieldStore for Database {
    fn get_field_state(&self, field_id: i64) -> Result<FieldState> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM fields WHERE id = ?1", [field_id], row_to_field)
                .optional()?
                .ok_or_else(|| CropOpsError::NotFound(format!("field {}", field_id)))
        })
    }

    fn get_recent_soil_readings(
        &self,
        field_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<SoilReading>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM soil_readings WHERE field_id = ?1 AND timestamp >= ?2 ORDER BY timestamp DESC",
            )?;
            let readings = stmt
                .query_map(params![field_id, ts(&since)], row_to_reading)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(readings)
        })
    }

    fn get_soil_readings_for_date(
        &self,
        field_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SoilReading>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM soil_readings WHERE field_id = ?1 AND reading_date = ?2 ORDER BY timestamp",
            )?;
            let readings = stmt
                .query_map(
                    params![field_id, date.format(DATE_FORMAT).to_string()],
                    row_to_reading,
                )?
                .filter_map(|r| r.ok())
                .collect();
            Ok(readings)
        })
    }

    fn upsert_gdd_record(&self, record: &DailyGddRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO gdd_records
                    (field_id, date, avg_temp, min_temp, max_temp, reading_count,
                     daily_gdd, cumulative_gdd, growth_stage, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(field_id, date) DO UPDATE SET
                    avg_temp = excluded.avg_temp,
                    min_temp = excluded.min_temp,
                    max_temp = excluded.max_temp,
                    reading_count = excluded.reading_count,
                    daily_gdd = excluded.daily_gdd,
                    cumulative_gdd = excluded.cumulative_gdd,
                    growth_stage = excluded.growth_stage,
                    updated_at = excluded.updated_at
                "#,
                params![
                    record.field_id,
                    record.date.format(DATE_FORMAT).to_string(),
                    record.avg_temp,
                    record.min_temp,
                    record.max_temp,
                    record.reading_count,
                    record.daily_gdd,
                    record.cumulative_gdd,
                    record.growth_stage.as_key(),
                    ts(&Utc::now()),
                ],
            )?;
            Ok(())
        })
    }

    fn get_gdd_record(&self, field_id: i64, date: NaiveDate) -> Result<Option<DailyGddRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM gdd_records WHERE field_id = ?1 AND date = ?2",
                params![field_id, date.format(DATE_FORMAT).to_string()],
                row_to_gdd_record,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    fn get_latest_gdd_record(&self, field_id: i64) -> Result<Option<DailyGddRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM gdd_records WHERE field_id = ?1 ORDER BY date DESC LIMIT 1",
                [field_id],
                row_to_gdd_record,
            )
            .optional()
            .map_err(Into::into)
        })
    }

    fn get_gdd_record_before(
        &self,
        field_id: i64,
        date: NaiveDate,
    ) -> Result<Option<DailyGddRecord>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM gdd_records WHERE field_id = ?1 AND date < ?2 ORDER BY date DESC LIMIT 1",
                params![field_id, date.format(DATE_FORMAT).to_string()],
                row_to_gdd_record,
            )
            .optional()
            .map_err(Into::into)
        })
    }
}

trait OptionalExt<T> {
    fn optional(self) -> rusqlite::Result<Option<T>>;
}

impl<T> OptionalExt<T> for rusqlite::Result<T> {
    fn optional(self) -> rusqlite::Result<Option<T>> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
