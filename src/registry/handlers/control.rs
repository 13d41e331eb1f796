use crate::error::NodeError;
use crate::registry::{
    CONTROL_OUT, HandlerContext, NodeHandler, NodeKind, NodeOutcome, PortSpec, ResolvedInputs,
};
use crate::strategy::NodeDefinition;
use async_trait::async_trait;

static START_PORTS: &[PortSpec] = &[PortSpec::control_out(CONTROL_OUT)];

/// Entry point of the control walk. Emits the control signal and nothing else.
pub struct StartHandler;

#[async_trait]
impl NodeHandler for StartHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::ControlStart
    }

    fn ports(&self) -> &'static [PortSpec] {
        START_PORTS
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        _inputs: &ResolvedInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        Ok(NodeOutcome::signal())
    }
}
