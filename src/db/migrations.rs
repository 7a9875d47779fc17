use crate::db::Database;
use crate::error::Result;

const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS fields (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        crop_name TEXT NOT NULL,
        sowing_date TEXT NOT NULL,
        soil_texture TEXT NOT NULL,
        base_temperature REAL NOT NULL,
        total_gdd_required REAL NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL,
        accumulated_gdd REAL NOT NULL DEFAULT 0,
        growth_stage TEXT NOT NULL DEFAULT 'INITIAL',
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS soil_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        field_id INTEGER NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        timestamp TEXT NOT NULL,
        reading_date TEXT NOT NULL,
        moisture_pct REAL,
        soil_temp_c REAL,
        UNIQUE(field_id, timestamp)
    );

    CREATE TABLE IF NOT EXISTS gdd_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        field_id INTEGER NOT NULL REFERENCES fields(id) ON DELETE CASCADE,
        date TEXT NOT NULL,
        avg_temp REAL NOT NULL,
        min_temp REAL NOT NULL,
        max_temp REAL NOT NULL,
        reading_count INTEGER NOT NULL,
        daily_gdd REAL NOT NULL,
        cumulative_gdd REAL NOT NULL,
        growth_stage TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        UNIQUE(field_id, date)
    );

    CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );
    "#,
    // Migration 2: Add indexes
    r#"
    CREATE INDEX IF NOT EXISTS idx_soil_readings_field_date
        ON soil_readings(field_id, reading_date);
    CREATE INDEX IF NOT EXISTS idx_soil_readings_timestamp
        ON soil_readings(timestamp);
    CREATE INDEX IF NOT EXISTS idx_gdd_records_field_date
        ON gdd_records(field_id, date);
    "#,
];

pub fn run(db: &Database) -> Result<()> {
    db.with_conn_mut(|conn| {
        // Ensure schema_migrations table exists
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        // Get current version
        let current_version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        // Apply pending migrations
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i32;
            if version > current_version {
                tracing::info!("Applying migration {}", version);
                let tx = conn.transaction()?;
                tx.execute_batch(migration)?;
                tx.execute(
                    "INSERT INTO schema_migrations (version) VALUES (?1)",
                    [version],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    })
}
