use super::{IrrigationRule, RuleContext, HIGH_KC};
use crate::models::{IrrigationDecision, IrrigationMethod, RuleId, Urgency};

/// Refill to the stage ceiling when moisture drops below the stage minimum.
/// High-demand stages get drip, the rest sprinkler.
pub struct StageMinimumRule;

impl IrrigationRule for StageMinimumRule {
    fn id(&self) -> RuleId {
        RuleId::BelowStageMinimum
    }

    fn name(&self) -> &'static str {
        "Below Stage Minimum"
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<IrrigationDecision> {
        let min = ctx.params.moisture_min_pct;
        if ctx.moisture() >= min {
            return None;
        }

        let method = if ctx.params.kc > HIGH_KC {
            IrrigationMethod::Drip
        } else {
            IrrigationMethod::Sprinkler
        };
        let depth = ctx.depth_to(ctx.params.moisture_max_pct);

        Some(IrrigationDecision::irrigate(
            self.id(),
            Urgency::High,
            0.85,
            120,
            depth,
            method,
            format!(
                "Soil moisture ({:.0}%) is below the {} minimum of {:.0}%. \
                 Apply {:.0} mm by {} to restore the root zone.",
                ctx.moisture(),
                ctx.status.stage,
                min,
                depth,
                method.as_str().to_lowercase()
            ),
        ))
    }
}
