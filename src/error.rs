use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropOpsError {
    #[error("Unsupported crop: {0}")]
    UnsupportedCrop(String),

    #[error("No sensor data for field {field_id} in the last {window_hours}h")]
    NoSensorData { field_id: i64, window_hours: u32 },

    #[error("Weather unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, CropOpsError>;
