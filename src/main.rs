mod cli;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use cropops::config::Config;
use cropops::datasources::{ForecastProvider, OpenWeatherMapClient, SeasonalProvider};
use cropops::db::{Database, FieldStore};
use cropops::logic::crop_params;
use cropops::models::{FieldState, SoilReading};
use cropops::{compute_growth_stage, GddTracker, IrrigationService, WeatherCache};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Init = cli.command {
        Config::setup_interactive(cli.config.clone())?;
        return Ok(());
    }

    if !Config::exists(cli.config.as_ref()) {
        anyhow::bail!("No configuration found. Run `cropops init` or copy config/config.yaml.example to config/config.yaml");
    }
    let config = Config::load(cli.config.clone())?;

    let db_path = Config::db_path(cli.data_dir.as_ref())?;
    let db = Database::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;
    let field = ensure_field(&db, &config)?;
    let field_id = field.id.context("field row has no id")?;

    match cli.command {
        // handled before the config was loaded
        Commands::Init => {}
        Commands::Check => run_check(&config, &db, &field).await?,
        Commands::Decide => run_decide(&config, &db, field_id).await?,
        Commands::Backfill { from, to } => {
            let start = from.unwrap_or(field.sowing_date);
            let end = to.unwrap_or_else(|| Utc::now().date_naive() - Duration::days(1));
            run_backfill(&db, field_id, start, end)?;
        }
        Commands::Record { moisture, temp } => {
            if moisture.is_none() && temp.is_none() {
                anyhow::bail!("Provide at least one of --moisture or --temp");
            }
            let reading = SoilReading::new(Utc::now(), moisture, temp);
            db.insert_soil_reading(field_id, &reading)?;
            println!("Recorded reading for {}", field.name);

            if temp.is_some() {
                let tracker = GddTracker::new(db.clone());
                if let Some(record) = tracker.record_day(field_id, reading.timestamp.date_naive())? {
                    db.update_field_progress(field_id, record.cumulative_gdd, record.growth_stage)?;
                    println!(
                        "GDD today: {:.1} (cumulative {:.1}, {})",
                        record.daily_gdd, record.cumulative_gdd, record.growth_stage
                    );
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Create the configured field on first run, or bring the stored row in line
/// with the config. A crop or sowing change resets tracked GDD.
fn ensure_field(db: &Database, config: &Config) -> anyhow::Result<FieldState> {
    let desired = config.field.to_field_state()?;

    let id = match db.get_default_field()? {
        None => {
            let id = db.create_field(&desired)?;
            info!(field_id = id, name = %desired.name, "Created field from config");
            id
        }
        Some(mut field) => {
            let id = field.id.context("stored field has no id")?;
            field.name = desired.name;
            field.soil_texture = desired.soil_texture;
            field.location = desired.location;
            field.change_crop(config.field.crop()?, desired.sowing_date);

            if db.save_field(&field)? {
                warn!(field_id = id, crop = %field.crop_name, "Crop or sowing date changed, GDD history cleared");
            }
            id
        }
    };

    Ok(db.get_field_state(id)?)
}

fn forecast_provider(config: &Config) -> Arc<dyn ForecastProvider> {
    match config.active_openweathermap() {
        Some(owm) => Arc::new(OpenWeatherMapClient::new(owm.clone())),
        None => {
            info!("OpenWeatherMap not configured, using seasonal estimates");
            Arc::new(SeasonalProvider)
        }
    }
}

async fn run_check(config: &Config, db: &Database, field: &FieldState) -> anyhow::Result<()> {
    println!("Config OK");
    println!("  Field:   {} ({}, {})", field.name, field.crop_name, field.soil_texture);
    println!("  Sown:    {}", field.sowing_date);
    println!("  Location: {}", field.location.cache_key());
    println!("  Database: {}", db.path().display());

    let profile = crop_params::lookup(&field.crop_name)?;
    let days = field.days_since_sowing(Utc::now().date_naive()) as u32;
    let status = compute_growth_stage(&field.crop_name, field.accumulated_gdd, days)?;
    println!(
        "  Stage:   {} ({:.1}% of {:.0} GDD, ~{} days to maturity)",
        status.stage, status.progress_pct, profile.total_gdd, status.days_to_maturity
    );

    match config.active_openweathermap() {
        Some(owm) => {
            let client = OpenWeatherMapClient::new(owm.clone());
            let loc = field.location;
            match client.test_connection(loc.latitude, loc.longitude).await {
                Ok(true) => println!("  OpenWeatherMap: OK"),
                Ok(false) => println!("  OpenWeatherMap: REJECTED (check api_key)"),
                Err(e) => println!("  OpenWeatherMap: OFFLINE ({})", e),
            }
        }
        None => println!("  OpenWeatherMap: not configured (seasonal estimates)"),
    }

    Ok(())
}

async fn run_decide(config: &Config, db: &Database, field_id: i64) -> anyhow::Result<()> {
    let cache = Arc::new(WeatherCache::new(
        forecast_provider(config),
        config.weather_cache.settings(),
    ));
    let service = IrrigationService::new(cache);

    let decision = service
        .decide_for_field(db, field_id, config.sensors.moisture_window_hours)
        .await?;

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn run_backfill(
    db: &Database,
    field_id: i64,
    start: chrono::NaiveDate,
    end: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let tracker = GddTracker::new(db.clone());
    let report = tracker.backfill(field_id, start, end)?;

    // Only advance the field row when this run ends at the newest stored day
    if let Some(last) = report.records.last() {
        let latest = db.get_latest_gdd_record(field_id)?;
        if latest.as_ref().map(|r| r.date) == Some(last.date) {
            db.update_field_progress(field_id, last.cumulative_gdd, last.growth_stage)?;
        }
    }

    println!(
        "Backfilled {} to {}: {} days computed, {} without readings",
        start,
        end,
        report.records.len(),
        report.skipped_dates.len()
    );
    if let Some(total) = report.final_cumulative_gdd() {
        println!("Cumulative GDD: {:.1}", total);
    }
    for (date, err) in &report.persist_failures {
        eprintln!("  not saved {}: {}", date, err);
    }

    Ok(())
}
