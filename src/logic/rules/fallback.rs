use super::{RuleContext, FALLBACK_DEPTH_MM};
use crate::models::{IrrigationDecision, IrrigationMethod, RuleId, Urgency};

/// Degraded path used when no forecast could be obtained. The forecast-driven
/// rules are bypassed; the decision rests on the stage minimum alone and
/// carries lower confidence than any regular rule.
pub fn evaluate(ctx: &RuleContext) -> IrrigationDecision {
    let min = ctx.params.moisture_min_pct;

    if ctx.moisture() < min {
        IrrigationDecision::irrigate(
            RuleId::FallbackLowMoisture,
            Urgency::Medium,
            0.6,
            24,
            FALLBACK_DEPTH_MM,
            IrrigationMethod::Sprinkler,
            format!(
                "Weather forecast unavailable. Soil moisture ({:.0}%) is below the {} \
                 minimum of {:.0}%, applying a conservative {:.0} mm.",
                ctx.moisture(),
                ctx.status.stage,
                min,
                FALLBACK_DEPTH_MM
            ),
        )
    } else {
        IrrigationDecision::skip(
            RuleId::FallbackAdequateMoisture,
            Urgency::Low,
            0.5,
            24,
            format!(
                "Weather forecast unavailable. Soil moisture ({:.0}%) is at or above the {} \
                 minimum of {:.0}%, holding off until the forecast is back.",
                ctx.moisture(),
                ctx.status.stage,
                min
            ),
        )
    }
}
