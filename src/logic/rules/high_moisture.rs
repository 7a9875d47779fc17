use super::{IrrigationRule, RuleContext, OPTIMAL_CEILING_PCT};
use crate::models::{IrrigationDecision, RuleId, Urgency};

/// Skip when the root zone is already at or above the optimal ceiling.
///
/// Does not depend on the forecast, so it also runs when weather is unavailable.
pub struct HighMoistureRule;

impl IrrigationRule for HighMoistureRule {
    fn id(&self) -> RuleId {
        RuleId::HighMoisture
    }

    fn name(&self) -> &'static str {
        "High Moisture"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        let moisture = ctx.moisture();
        if moisture < OPTIMAL_CEILING_PCT {
            return None;
        }

        Some(IrrigationDecision::skip(
            self.id(),
            Urgency::None,
            0.95,
            48,
            format!(
                "Soil moisture ({:.0}%) is at or above the {:.0}% ceiling. \
                 Irrigating now would waterlog the root zone.",
                moisture, OPTIMAL_CEILING_PCT
            ),
        ))
    }
}
