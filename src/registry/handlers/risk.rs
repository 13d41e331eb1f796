use crate::error::NodeError;
use crate::registry::{
    Activation, CONTROL_OUT, DataType, HandlerContext, NodeHandler, NodeKind, NodeOutcome,
    PortSpec, ResolvedInputs,
};
use crate::strategy::NodeDefinition;
use async_trait::async_trait;

static GUARD_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::input("maxSpread", DataType::Number, true),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("allowed", DataType::Boolean),
    PortSpec::output("spread", DataType::Number),
];

/// Lets control through only while the live spread stays within `maxSpread`.
pub struct GuardHandler;

#[async_trait]
impl NodeHandler for GuardHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::RiskGuard
    }

    fn ports(&self) -> &'static [PortSpec] {
        GUARD_PORTS
    }

    fn validate_config(&self, node: &NodeDefinition) -> Result<(), String> {
        match node.config_value("maxSpread").map(|v| v.as_f64()) {
            Some(Some(max)) if max < 0.0 => {
                Err(format!("maxSpread must not be negative, found {}", max))
            }
            _ => Ok(()),
        }
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let pair = inputs.string("pair")?;
        let max_spread = inputs.number("maxSpread")?;
        let snapshot = ctx.market_data().spread(pair).await?;
        let spread = snapshot.data.width();
        let allowed = spread <= max_spread;

        let activation = if allowed {
            Activation::Only(CONTROL_OUT)
        } else {
            Activation::Nothing
        };
        let mut outcome = NodeOutcome::activating(activation)
            .with_output("allowed", allowed)
            .with_output("spread", spread);
        outcome.note_snapshot(&snapshot, "spread", pair);
        if !allowed {
            outcome.warn(format!(
                "risk guard blocked '{}': spread {} exceeds maxSpread {}",
                pair, spread, max_spread
            ));
        }
        Ok(outcome)
    }
}
