use crate::error::NodeError;
use crate::registry::{
    Activation, CONTROL_FALSE, CONTROL_TRUE, DataType, HandlerContext, NodeHandler, NodeKind,
    NodeOutcome, PortSpec, ResolvedInputs,
};
use crate::strategy::{NodeDefinition, Value};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

static IF_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("condition", DataType::Number, true),
    PortSpec::input("comparator", DataType::String, true),
    PortSpec::input("threshold", DataType::Number, true),
    PortSpec::control_out(CONTROL_TRUE),
    PortSpec::control_out(CONTROL_FALSE),
    PortSpec::output("result", DataType::Boolean),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    GreaterThan,
    GreaterThanOrEqual,
    SmallerThan,
    SmallerThanOrEqual,
    Equal,
    NotEqual,
}

impl Comparator {
    pub fn apply(&self, left: f64, right: f64) -> bool {
        match self {
            Comparator::GreaterThan => left > right,
            Comparator::GreaterThanOrEqual => left >= right,
            Comparator::SmallerThan => left < right,
            Comparator::SmallerThanOrEqual => left <= right,
            Comparator::Equal => left == right,
            Comparator::NotEqual => left != right,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanOrEqual => ">=",
            Comparator::SmallerThan => "<",
            Comparator::SmallerThanOrEqual => "<=",
            Comparator::Equal => "==",
            Comparator::NotEqual => "!=",
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" | "gt" => Ok(Comparator::GreaterThan),
            ">=" | "gte" => Ok(Comparator::GreaterThanOrEqual),
            "<" | "lt" => Ok(Comparator::SmallerThan),
            "<=" | "lte" => Ok(Comparator::SmallerThanOrEqual),
            "==" | "=" | "eq" => Ok(Comparator::Equal),
            "!=" | "neq" => Ok(Comparator::NotEqual),
            other => Err(format!("unknown comparator '{}'", other)),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Two-way branch: activates `control:true` when `condition <comparator> threshold`
/// holds and `control:false` otherwise.
pub struct IfHandler;

#[async_trait]
impl NodeHandler for IfHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::LogicIf
    }

    fn ports(&self) -> &'static [PortSpec] {
        IF_PORTS
    }

    fn validate_config(&self, node: &NodeDefinition) -> Result<(), String> {
        match node.config_value("comparator") {
            Some(serde_json::Value::String(s)) => s.parse::<Comparator>().map(|_| ()),
            Some(other) => Err(format!("comparator must be a string, found {}", other)),
            None => Ok(()),
        }
    }

    async fn run(
        &self,
        _node: &NodeDefinition,
        inputs: &ResolvedInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let condition = inputs.number("condition")?;
        let threshold = inputs.number("threshold")?;
        let comparator = inputs
            .string("comparator")?
            .parse::<Comparator>()
            .map_err(|_| NodeError::InvalidInput {
                port: "comparator".to_string(),
                expected: "one of >, >=, <, <=, ==, !=".to_string(),
                found: inputs
                    .get("comparator")
                    .cloned()
                    .unwrap_or(Value::Null),
            })?;

        let holds = comparator.apply(condition, threshold);
        let branch = if holds { CONTROL_TRUE } else { CONTROL_FALSE };
        Ok(NodeOutcome::activating(Activation::Only(branch)).with_output("result", holds))
    }
}
