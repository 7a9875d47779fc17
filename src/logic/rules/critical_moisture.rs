use super::{IrrigationRule, RuleContext, CRITICAL_MOISTURE_PCT};
use crate::models::{GrowthStage, IrrigationDecision, IrrigationMethod, RuleId, Urgency};

/// Mid-season is the most water-sensitive stage. Below the critical level the
/// field is refilled to the stage ceiling by drip, whatever the forecast says.
pub struct CriticalMoistureRule;

impl IrrigationRule for CriticalMoistureRule {
    fn id(&self) -> RuleId {
        RuleId::CriticalLowMoistureMidSeason
    }

    fn name(&self) -> &'static str {
        "Critical Low Moisture (Mid-Season)"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        if ctx.status.stage != GrowthStage::MidSeason || ctx.moisture() >= CRITICAL_MOISTURE_PCT {
            return None;
        }

        let depth = ctx.depth_to(ctx.params.moisture_max_pct);
        Some(IrrigationDecision::irrigate(
            self.id(),
            Urgency::Critical,
            0.95,
            168,
            depth,
            IrrigationMethod::Drip,
            format!(
                "Soil moisture ({:.0}%) is below the critical {:.0}% during mid-season, \
                 when yield is most sensitive to water stress. Apply {:.0} mm by drip now.",
                ctx.moisture(),
                CRITICAL_MOISTURE_PCT,
                depth
            ),
        ))
    }
}
