use crate::models::SoilTexture;

/// Smallest and largest single irrigation event the engine will recommend.
pub const MIN_DEPTH_MM: f64 = 10.0;
pub const MAX_DEPTH_MM: f64 = 50.0;

/// Volumetric water-holding bounds of a soil texture, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilWaterProperties {
    pub field_capacity_pct: f64,
    pub wilting_point_pct: f64,
}

impl SoilWaterProperties {
    pub fn for_texture(texture: SoilTexture) -> Self {
        match texture {
            SoilTexture::Sandy => Self {
                field_capacity_pct: 17.0,
                wilting_point_pct: 7.0,
            },
            SoilTexture::Loam => Self {
                field_capacity_pct: 28.0,
                wilting_point_pct: 13.0,
            },
            SoilTexture::ClayLoam => Self {
                field_capacity_pct: 36.0,
                wilting_point_pct: 20.0,
            },
        }
    }

    /// Plant-available water held in the root zone, in mm.
    pub fn available_water_mm(&self, rooting_depth_cm: f64) -> f64 {
        (self.field_capacity_pct - self.wilting_point_pct) * (rooting_depth_cm / 10.0)
    }
}

/// Depth of water needed to lift moisture from `current_pct` to `target_pct`,
/// clamped to a sane single-event volume. Zero or negative deficits get the floor.
pub fn required_depth_mm(
    texture: SoilTexture,
    rooting_depth_cm: f64,
    current_pct: f64,
    target_pct: f64,
) -> f64 {
    let available = SoilWaterProperties::for_texture(texture).available_water_mm(rooting_depth_cm);
    let depth = (target_pct - current_pct) / 100.0 * available;

    if depth.is_nan() {
        return MIN_DEPTH_MM;
    }
    depth.clamp(MIN_DEPTH_MM, MAX_DEPTH_MM)
}
