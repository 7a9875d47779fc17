use super::{IrrigationRule, RuleContext};
use crate::models::{IrrigationDecision, RuleId, Urgency};

/// Default: nothing else applied, check again tomorrow.
pub struct StableConditionsRule;

impl IrrigationRule for StableConditionsRule {
    fn id(&self) -> RuleId {
        RuleId::StableConditions
    }

    fn name(&self) -> &'static str {
        "Stable Conditions"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        Some(self.decide(ctx))
    }
}

impl StableConditionsRule {
    /// Always applies; also the engine's terminal case.
    pub fn decide(&self, ctx: &RuleContext) -> IrrigationDecision {
        IrrigationDecision::skip(
            self.id(),
            Urgency::None,
            0.65,
            24,
            format!(
                "Soil moisture ({:.0}%) is within the {} band ({:.0}-{:.0}%). No irrigation needed.",
                ctx.moisture(),
                ctx.status.stage,
                ctx.params.moisture_min_pct,
                ctx.params.moisture_max_pct
            ),
        )
    }
}
