use crate::error::{CropOpsError, Result};
use crate::logic::CacheSettings;
use crate::models::{Crop, FieldState, Location, SoilTexture};
use chrono::NaiveDate;
use dialoguer::{Input, Password, Select};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub field: FieldConfig,
    #[serde(default)]
    pub openweathermap: Option<OpenWeatherMapConfig>,
    #[serde(default)]
    pub weather_cache: WeatherCacheConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldConfig {
    pub name: String,
    pub crop: String,
    pub sowing_date: NaiveDate,
    pub soil_texture: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl FieldConfig {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }

    pub fn crop(&self) -> Result<Crop> {
        Crop::from_str(&self.crop).ok_or_else(|| CropOpsError::UnsupportedCrop(self.crop.clone()))
    }

    pub fn soil_texture(&self) -> Result<SoilTexture> {
        SoilTexture::from_str(&self.soil_texture).ok_or_else(|| {
            CropOpsError::Config(format!(
                "unknown soil_texture '{}' (expected Sandy, Loam or ClayLoam)",
                self.soil_texture
            ))
        })
    }

    /// Fresh field row for this configuration, with no accumulated GDD.
    pub fn to_field_state(&self) -> Result<FieldState> {
        Ok(FieldState::new(
            self.name.clone(),
            self.crop()?,
            self.sowing_date,
            self.soil_texture()?,
            self.location(),
        ))
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct OpenWeatherMapConfig {
    pub api_key: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl std::fmt::Debug for OpenWeatherMapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapConfig")
            .field("api_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherCacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for WeatherCacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl WeatherCacheConfig {
    pub fn settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: Duration::from_secs(self.ttl_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorsConfig {
    #[serde(default = "default_moisture_window_hours")]
    pub moisture_window_hours: u32,
}

fn default_moisture_window_hours() -> u32 {
    6
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            moisture_window_hours: default_moisture_window_hours(),
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(CropOpsError::Config(format!(
                "Config file not found at {:?}. Run `cropops init` to set up.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| CropOpsError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&config_str)
    }

    /// Parse YAML after `${VAR}` substitution.
    pub fn parse(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| CropOpsError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.field.soil_texture()?;
        if !(-90.0..=90.0).contains(&self.field.latitude)
            || !(-180.0..=180.0).contains(&self.field.longitude)
        {
            return Err(CropOpsError::Config(format!(
                "field coordinates out of range: {}, {}",
                self.field.latitude, self.field.longitude
            )));
        }
        if self.weather_cache.fetch_timeout_secs == 0 {
            return Err(CropOpsError::Config(
                "weather_cache.fetch_timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// OpenWeatherMap settings when present, enabled and keyed.
    pub fn active_openweathermap(&self) -> Option<&OpenWeatherMapConfig> {
        self.openweathermap
            .as_ref()
            .filter(|owm| owm.enabled && !owm.api_key.is_empty())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("cropops").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Returns true if a config file can be found in any standard location.
    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/cropops/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine config directory".into()))?
            .join("cropops");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive(config_override: Option<PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up CropOps!");
        println!();

        println!("Field");
        let name: String = Input::new()
            .with_prompt("  Field name")
            .default("North Plot".into())
            .interact_text()
            .map_err(input_error)?;

        let crop_names: Vec<&str> = Crop::ALL.iter().map(|c| c.as_str()).collect();
        let crop_idx = Select::new()
            .with_prompt("  Crop")
            .items(&crop_names)
            .default(0)
            .interact()
            .map_err(input_error)?;

        let sowing_date: NaiveDate = Input::new()
            .with_prompt("  Sowing date (YYYY-MM-DD)")
            .default(chrono::Utc::now().date_naive())
            .interact_text()
            .map_err(input_error)?;

        let textures: Vec<&str> = SoilTexture::ALL.iter().map(|t| t.as_str()).collect();
        let texture_idx = Select::new()
            .with_prompt("  Soil texture")
            .items(&textures)
            .default(1)
            .interact()
            .map_err(input_error)?;

        let latitude: f64 = Input::new()
            .with_prompt("  Latitude")
            .default(17.385)
            .interact_text()
            .map_err(input_error)?;

        let longitude: f64 = Input::new()
            .with_prompt("  Longitude")
            .default(78.4867)
            .interact_text()
            .map_err(input_error)?;

        println!();

        println!("OpenWeatherMap (leave API key blank to use seasonal estimates)");
        let owm_api_key: String = Password::new()
            .with_prompt("  API key")
            .allow_empty_password(true)
            .interact()
            .map_err(input_error)?;

        let openweathermap = if owm_api_key.is_empty() {
            None
        } else {
            Some(OpenWeatherMapConfig {
                api_key: owm_api_key,
                enabled: true,
            })
        };

        println!();

        let config = Config {
            field: FieldConfig {
                name,
                crop: crop_names[crop_idx].to_string(),
                sowing_date,
                soil_texture: textures[texture_idx].to_string(),
                latitude,
                longitude,
            },
            openweathermap,
            weather_cache: WeatherCacheConfig::default(),
            sensors: SensorsConfig::default(),
        };

        let config_path = match config_override {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        config.write_to(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| CropOpsError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# CropOps Configuration\n# Generated by `cropops init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return content.to_string();
        };

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("CROPOPS_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropOpsError::Config("Cannot determine data directory".into()))?
            .join("cropops");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropops.db"))
    }
}

fn input_error(e: dialoguer::Error) -> CropOpsError {
    CropOpsError::Config(format!("Input error: {}", e))
}
