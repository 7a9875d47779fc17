use super::crop::{GrowthStage, SoilTexture};
use super::field::Location;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Tag of the rule that produced a decision. The serialized form is the
/// observable contract consumers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    UnsupportedCrop,
    HighMoisture,
    SufficientRainForecast,
    CriticalLowMoistureMidSeason,
    BelowStageMinimum,
    HighKcModerateMoisture,
    StableConditions,
    FallbackLowMoisture,
    FallbackAdequateMoisture,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::UnsupportedCrop => "UNSUPPORTED_CROP",
            RuleId::HighMoisture => "HIGH_MOISTURE",
            RuleId::SufficientRainForecast => "SUFFICIENT_RAIN_FORECAST",
            RuleId::CriticalLowMoistureMidSeason => "CRITICAL_LOW_MOISTURE_MID_SEASON",
            RuleId::BelowStageMinimum => "BELOW_STAGE_MINIMUM",
            RuleId::HighKcModerateMoisture => "HIGH_KC_MODERATE_MOISTURE",
            RuleId::StableConditions => "STABLE_CONDITIONS",
            RuleId::FallbackLowMoisture => "FALLBACK_LOW_MOISTURE",
            RuleId::FallbackAdequateMoisture => "FALLBACK_ADEQUATE_MOISTURE",
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.as_str().starts_with("FALLBACK_")
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Urgency {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::None => "None",
            Urgency::Low => "Low",
            Urgency::Medium => "Medium",
            Urgency::High => "High",
            Urgency::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IrrigationMethod {
    Drip,
    Sprinkler,
}

impl IrrigationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrrigationMethod::Drip => "Drip",
            IrrigationMethod::Sprinkler => "Sprinkler",
        }
    }
}

impl std::fmt::Display for IrrigationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
    pub source: String,
}

impl DataPoint {
    pub fn new(label: &str, value: impl std::fmt::Display, source: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            source: source.to_string(),
        }
    }
}

/// Everything the engine needs to decide for one field at one moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationInput {
    pub crop_name: String,
    pub soil_texture: SoilTexture,
    pub current_moisture_pct: f64,
    pub sowing_date: NaiveDate,
    pub accumulated_gdd: f64,
    pub location: Location,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrigationDecision {
    pub should_irrigate: bool,
    pub recommended_depth_mm: f64,
    pub urgency: Urgency,
    pub confidence: f64,
    pub rule_triggered: RuleId,
    pub next_check_hours: u32,
    pub reason: String,
    pub method: Option<IrrigationMethod>,
    pub growth_stage: Option<GrowthStage>,
    pub data_points: Vec<DataPoint>,
    pub created_at: DateTime<Utc>,
}

impl IrrigationDecision {
    pub fn skip(
        rule: RuleId,
        urgency: Urgency,
        confidence: f64,
        next_check_hours: u32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            should_irrigate: false,
            recommended_depth_mm: 0.0,
            urgency,
            confidence: confidence.clamp(0.0, 1.0),
            rule_triggered: rule,
            next_check_hours,
            reason: reason.into(),
            method: None,
            growth_stage: None,
            data_points: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn irrigate(
        rule: RuleId,
        urgency: Urgency,
        confidence: f64,
        next_check_hours: u32,
        depth_mm: f64,
        method: IrrigationMethod,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            should_irrigate: true,
            recommended_depth_mm: depth_mm,
            method: Some(method),
            ..Self::skip(rule, urgency, confidence, next_check_hours, reason)
        }
    }

    pub fn with_stage(mut self, stage: GrowthStage) -> Self {
        self.growth_stage = Some(stage);
        self
    }

    pub fn with_data_point(
        mut self,
        label: &str,
        value: impl std::fmt::Display,
        source: &str,
    ) -> Self {
        self.data_points.push(DataPoint::new(label, value, source));
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.rule_triggered.is_fallback() || self.rule_triggered == RuleId::UnsupportedCrop
    }
}
