use super::{IrrigationRule, RuleContext, RAIN_DEFERRAL_MM, RAIN_WINDOW_DAYS};
use crate::models::{IrrigationDecision, RuleId, Urgency};

/// Defer irrigation when enough rain is forecast and the crop is not yet
/// below its stage minimum.
///
/// Conditions:
/// - Forecast rain over the next 3 days >= 20 mm
/// - Current moisture >= stage minimum
pub struct RainForecastRule;

impl IrrigationRule for RainForecastRule {
    fn id(&self) -> RuleId {
        RuleId::SufficientRainForecast
    }

    fn name(&self) -> &'static str {
        "Sufficient Rain Forecast"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        let weather = ctx.weather?;
        if !weather.is_significant_rain(RAIN_WINDOW_DAYS, RAIN_DEFERRAL_MM) {
            return None;
        }
        if ctx.moisture() < ctx.params.moisture_min_pct {
            return None;
        }

        let rain = weather.cumulative_rainfall(RAIN_WINDOW_DAYS);
        Some(IrrigationDecision::skip(
            self.id(),
            Urgency::Low,
            0.85,
            72,
            format!(
                "{:.0} mm of rain is forecast over the next {} days and soil moisture \
                 ({:.0}%) is above the {} minimum of {:.0}%. Let the rain do the work.",
                rain,
                RAIN_WINDOW_DAYS,
                ctx.moisture(),
                ctx.status.stage,
                ctx.params.moisture_min_pct
            ),
        ))
    }
}
