use super::{IrrigationRule, RuleContext, HIGH_KC};
use crate::models::{IrrigationDecision, IrrigationMethod, RuleId, Urgency};

/// During high-demand stages (Kc > 1.0) keep moisture in the upper half of the
/// band with a light drip top-up to the band midpoint.
pub struct HighKcRule;

impl IrrigationRule for HighKcRule {
    fn id(&self) -> RuleId {
        RuleId::HighKcModerateMoisture
    }

    fn name(&self) -> &'static str {
        "High Kc, Moderate Moisture"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        let mid = ctx.params.moisture_mid_pct();
        if ctx.params.kc <= HIGH_KC || ctx.moisture() >= mid {
            return None;
        }

        let depth = ctx.depth_to(mid);
        Some(IrrigationDecision::irrigate(
            self.id(),
            Urgency::Medium,
            0.75,
            96,
            depth,
            IrrigationMethod::Drip,
            format!(
                "Crop water demand is high (Kc {:.2}) and moisture ({:.0}%) is below the \
                 band midpoint of {:.0}%. A light {:.0} mm drip top-up keeps the crop \
                 ahead of demand.",
                ctx.params.kc,
                ctx.moisture(),
                mid,
                depth
            ),
        ))
    }
}
