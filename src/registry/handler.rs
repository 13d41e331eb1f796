use super::NodeKind;
use super::ports::{PortDirection, PortSpec};
use crate::context::ExecutionContext;
use crate::error::NodeError;
use crate::exchange::ExchangeAdapter;
use crate::market::{MarketDataProvider, Snapshot};
use crate::report::{ActionIntent, ActionOutcome};
use crate::strategy::{EdgeKind, NodeDefinition, Value};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

/// Defines the contract for executing a specific node type.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn ports(&self) -> &'static [PortSpec];

    /// Checks the node's static config before anything runs.
    fn validate_config(&self, _node: &NodeDefinition) -> Result<(), String> {
        Ok(())
    }

    async fn run(
        &self,
        node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError>;

    fn port(&self, id: &str) -> Option<&'static PortSpec> {
        self.ports().iter().find(|p| p.id == id)
    }

    fn input_port(&self, id: &str) -> Option<&'static PortSpec> {
        self.ports()
            .iter()
            .find(|p| p.id == id && p.direction == PortDirection::Input)
    }

    fn output_port(&self, id: &str) -> Option<&'static PortSpec> {
        self.ports()
            .iter()
            .find(|p| p.id == id && p.direction == PortDirection::Output)
    }

    /// A node without a control input is never reached by the control walk.
    /// It only runs when a scheduled node consumes one of its outputs.
    fn is_detached_source(&self) -> bool {
        self.kind() != NodeKind::ControlStart
            && !self
                .ports()
                .iter()
                .any(|p| p.direction == PortDirection::Input && p.kind == EdgeKind::Control)
    }
}

/// Tunables shared by all handlers of one executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSettings {
    pub default_depth: u32,
    /// Candle interval in minutes.
    pub default_ohlc_interval: u32,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            default_depth: 10,
            default_ohlc_interval: 1,
        }
    }
}

pub struct HandlerContext<'a> {
    pub execution: &'a ExecutionContext,
    pub settings: &'a HandlerSettings,
}

impl HandlerContext<'_> {
    pub fn market_data(&self) -> &dyn MarketDataProvider {
        self.execution.market_data.as_ref()
    }

    pub fn actions(&self) -> &dyn ExchangeAdapter {
        self.execution.actions.as_ref()
    }
}

/// A node's inputs after config values were overlaid with wired data edge values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedInputs {
    values: BTreeMap<String, Value>,
}

impl ResolvedInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, port: &str, value: Value) {
        self.values.insert(port.to_string(), value);
    }

    pub fn with(mut self, port: &str, value: impl Into<Value>) -> Self {
        self.insert(port, value.into());
        self
    }

    /// Returns the value on `port`; `null` counts as absent.
    pub fn get(&self, port: &str) -> Option<&Value> {
        self.values.get(port).filter(|v| !v.is_null())
    }

    pub fn require(&self, port: &str) -> Result<&Value, NodeError> {
        self.get(port)
            .ok_or_else(|| NodeError::MissingInput(port.to_string()))
    }

    pub fn number(&self, port: &str) -> Result<f64, NodeError> {
        let value = self.require(port)?;
        value
            .as_number()
            .ok_or_else(|| invalid(port, "number", value))
    }

    pub fn optional_number(&self, port: &str) -> Result<Option<f64>, NodeError> {
        match self.get(port) {
            Some(value) => value
                .as_number()
                .map(Some)
                .ok_or_else(|| invalid(port, "number", value)),
            None => Ok(None),
        }
    }

    pub fn string(&self, port: &str) -> Result<&str, NodeError> {
        let value = self.require(port)?;
        value.as_str().ok_or_else(|| invalid(port, "string", value))
    }

    pub fn optional_string(&self, port: &str) -> Result<Option<&str>, NodeError> {
        match self.get(port) {
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| invalid(port, "string", value)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_map(self) -> BTreeMap<String, Value> {
        self.values
    }
}

fn invalid(port: &str, expected: &str, found: &Value) -> NodeError {
    NodeError::InvalidInput {
        port: port.to_string(),
        expected: expected.to_string(),
        found: found.clone(),
    }
}

/// Which outgoing control ports a finished node activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    All,
    Only(&'static str),
    Nothing,
}

impl Activation {
    pub fn activates(&self, port: &str) -> bool {
        match self {
            Activation::All => true,
            Activation::Only(active) => *active == port,
            Activation::Nothing => false,
        }
    }
}

/// Side-effect bookkeeping produced by action nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEffect {
    pub intent: ActionIntent,
    pub validation: Option<ActionOutcome>,
    pub live: Option<ActionOutcome>,
}

/// What a handler reports back after a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    pub outputs: BTreeMap<String, Value>,
    pub activation: Activation,
    pub warnings: Vec<String>,
    pub effect: Option<ActionEffect>,
}

impl NodeOutcome {
    /// An outcome that activates every outgoing control edge.
    pub fn signal() -> Self {
        Self::activating(Activation::All)
    }

    pub fn activating(activation: Activation) -> Self {
        Self {
            outputs: BTreeMap::new(),
            activation,
            warnings: Vec::new(),
            effect: None,
        }
    }

    pub fn with_output(mut self, port: &str, value: impl Into<Value>) -> Self {
        self.outputs.insert(port.to_string(), value.into());
        self
    }

    pub fn with_effect(mut self, effect: ActionEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Adds a fallback warning when the provider served a stale snapshot.
    pub fn note_snapshot<T>(&mut self, snapshot: &Snapshot<T>, kind: &str, pair: &str) {
        if snapshot.stale {
            self.warn(format!(
                "used a fallback {} snapshot for '{}'",
                kind, pair
            ));
        }
    }
}
