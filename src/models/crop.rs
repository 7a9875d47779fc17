use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crop {
    Rice,
    Wheat,
    Maize,
    Tomato,
    Potato,
    Cotton,
}

impl Crop {
    pub const ALL: [Crop; 6] = [
        Crop::Rice,
        Crop::Wheat,
        Crop::Maize,
        Crop::Tomato,
        Crop::Potato,
        Crop::Cotton,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Crop::Rice => "Rice",
            Crop::Wheat => "Wheat",
            Crop::Maize => "Maize",
            Crop::Tomato => "Tomato",
            Crop::Potato => "Potato",
            Crop::Cotton => "Cotton",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "rice" | "paddy" => Some(Crop::Rice),
            "wheat" => Some(Crop::Wheat),
            "maize" | "corn" => Some(Crop::Maize),
            "tomato" => Some(Crop::Tomato),
            "potato" => Some(Crop::Potato),
            "cotton" => Some(Crop::Cotton),
            _ => None,
        }
    }
}

impl std::fmt::Display for Crop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phenological stage derived from cumulative GDD as a share of the crop's requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrowthStage {
    Initial,
    Development,
    MidSeason,
    LateSeason,
    HarvestReady,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 5] = [
        GrowthStage::Initial,
        GrowthStage::Development,
        GrowthStage::MidSeason,
        GrowthStage::LateSeason,
        GrowthStage::HarvestReady,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthStage::Initial => "Initial",
            GrowthStage::Development => "Development",
            GrowthStage::MidSeason => "Mid-Season",
            GrowthStage::LateSeason => "Late Season",
            GrowthStage::HarvestReady => "Harvest Ready",
        }
    }

    /// Stable storage key, matches the serde representation.
    pub fn as_key(&self) -> &'static str {
        match self {
            GrowthStage::Initial => "INITIAL",
            GrowthStage::Development => "DEVELOPMENT",
            GrowthStage::MidSeason => "MID_SEASON",
            GrowthStage::LateSeason => "LATE_SEASON",
            GrowthStage::HarvestReady => "HARVEST_READY",
        }
    }

    pub fn from_key(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.as_key() == s)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilTexture {
    Sandy,
    Loam,
    ClayLoam,
}

impl SoilTexture {
    pub const ALL: [SoilTexture; 3] = [SoilTexture::Sandy, SoilTexture::Loam, SoilTexture::ClayLoam];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilTexture::Sandy => "Sandy",
            SoilTexture::Loam => "Loam",
            SoilTexture::ClayLoam => "Clay Loam",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sandy" | "sand" => Some(SoilTexture::Sandy),
            "loam" => Some(SoilTexture::Loam),
            "clayloam" | "clay loam" | "clay_loam" => Some(SoilTexture::ClayLoam),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
