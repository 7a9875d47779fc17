use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cropops", version, about = "Field irrigation decisions from soil sensors and forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run interactive setup
    Init,
    /// Validate config and test the forecast provider
    Check,
    /// Decide whether the configured field needs water now
    Decide,
    /// Recompute daily GDD for a date range
    Backfill {
        /// First date (YYYY-MM-DD), defaults to the sowing date
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Store one soil sensor reading taken now
    Record {
        /// Volumetric moisture, percent
        #[arg(long)]
        moisture: Option<f64>,
        /// Soil temperature, °C
        #[arg(long)]
        temp: Option<f64>,
    },
}
