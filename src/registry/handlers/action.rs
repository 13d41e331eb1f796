use crate::context::ExecutionMode;
use crate::error::{ExchangeError, NodeError};
use crate::exchange::{OrderRequest, OrderSide, OrderType};
use crate::registry::{
    ActionEffect, CONTROL_OUT, DataType, HandlerContext, NodeHandler, NodeKind, NodeOutcome,
    PortSpec, ResolvedInputs,
};
use crate::report::{ActionIntent, ActionKind, ActionOutcome};
use crate::strategy::{NodeDefinition, Value};
use async_trait::async_trait;
use serde_json::json;
use std::future::Future;
use std::str::FromStr;

static PLACE_ORDER_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("pair", DataType::String, true),
    PortSpec::input("side", DataType::String, true),
    PortSpec::input("volume", DataType::Number, true),
    PortSpec::input("orderType", DataType::String, false),
    PortSpec::input("price", DataType::Number, false),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("status", DataType::String),
];

static CANCEL_ORDER_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("txid", DataType::String, true),
    PortSpec::control_out(CONTROL_OUT),
    PortSpec::output("status", DataType::String),
];

static LOG_INTENT_PORTS: &[PortSpec] = &[
    PortSpec::control_in(),
    PortSpec::input("value", DataType::Any, false),
    PortSpec::input("message", DataType::String, false),
    PortSpec::control_out(CONTROL_OUT),
];

fn parse_config<T: FromStr<Err = String>>(node: &NodeDefinition, key: &str) -> Result<(), String> {
    match node.config_value(key) {
        Some(serde_json::Value::String(s)) => s.parse::<T>().map(|_| ()),
        Some(other) => Err(format!("{} must be a string, found {}", key, other)),
        None => Ok(()),
    }
}

fn parse_input<T: FromStr<Err = String>>(
    inputs: &ResolvedInputs,
    port: &str,
) -> Result<T, NodeError> {
    inputs
        .string(port)?
        .parse::<T>()
        .map_err(|reason| NodeError::InvalidInput {
            port: port.to_string(),
            expected: reason,
            found: inputs.get(port).cloned().unwrap_or(Value::Null),
        })
}

/// Runs the mode-dependent part of an action: validation in dry-run, the real call in live mode.
/// The adapter call that does not apply to the current mode is never constructed.
async fn dispatch<V, VF, L, LF>(
    node: &NodeDefinition,
    ctx: &HandlerContext<'_>,
    action: ActionKind,
    params: serde_json::Value,
    validate: V,
    live: L,
) -> NodeOutcome
where
    V: FnOnce() -> VF,
    VF: Future<Output = Result<serde_json::Value, ExchangeError>>,
    L: FnOnce() -> LF,
    LF: Future<Output = Result<serde_json::Value, ExchangeError>>,
{
    let mut intent = ActionIntent {
        node_id: node.id.clone(),
        action,
        params,
        executed: false,
    };

    let (status, validation, live_outcome) = match ctx.execution.mode {
        ExecutionMode::DryRun if ctx.execution.validate => {
            let outcome = ActionOutcome::from_response(&node.id, action, validate().await);
            let status = if outcome.is_ok() { "validated" } else { "rejected" };
            (status, Some(outcome), None)
        }
        ExecutionMode::DryRun => ("simulated", None, None),
        ExecutionMode::Live => {
            let outcome = ActionOutcome::from_response(&node.id, action, live().await);
            intent.executed = outcome.is_ok();
            let status = if outcome.is_ok() { "submitted" } else { "failed" };
            (status, None, Some(outcome))
        }
    };

    NodeOutcome::signal()
        .with_output("status", status)
        .with_effect(ActionEffect {
            intent,
            validation,
            live: live_outcome,
        })
}

/// Builds an order intent. Only live mode ever places it.
pub struct PlaceOrderHandler;

impl PlaceOrderHandler {
    fn order(inputs: &ResolvedInputs) -> Result<OrderRequest, NodeError> {
        let order_type = match inputs.get("orderType") {
            Some(_) => parse_input::<OrderType>(inputs, "orderType")?,
            None => OrderType::Market,
        };
        let price = inputs.optional_number("price")?;
        if order_type == OrderType::Limit && price.is_none() {
            return Err(NodeError::MissingInput("price".to_string()));
        }

        Ok(OrderRequest {
            pair: inputs.string("pair")?.to_string(),
            side: parse_input::<OrderSide>(inputs, "side")?,
            order_type,
            volume: inputs.number("volume")?,
            price,
        })
    }
}

#[async_trait]
impl NodeHandler for PlaceOrderHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::ActionPlaceOrder
    }

    fn ports(&self) -> &'static [PortSpec] {
        PLACE_ORDER_PORTS
    }

    fn validate_config(&self, node: &NodeDefinition) -> Result<(), String> {
        parse_config::<OrderSide>(node, "side")?;
        parse_config::<OrderType>(node, "orderType")?;
        match node.config_value("volume").and_then(Value::from_json) {
            Some(v) => match v.as_number() {
                Some(n) if n > 0.0 => Ok(()),
                _ => Err(format!("volume must be a positive number, found {}", v)),
            },
            None => Ok(()),
        }
    }

    async fn run(
        &self,
        node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let order = Self::order(inputs)?;
        let params = order.params();
        let actions = ctx.actions();
        Ok(dispatch(
            node,
            ctx,
            ActionKind::PlaceOrder,
            params,
            || actions.validate_order(&order),
            || actions.place_order(&order),
        )
        .await)
    }
}

pub struct CancelOrderHandler;

#[async_trait]
impl NodeHandler for CancelOrderHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::ActionCancelOrder
    }

    fn ports(&self) -> &'static [PortSpec] {
        CANCEL_ORDER_PORTS
    }

    async fn run(
        &self,
        node: &NodeDefinition,
        inputs: &ResolvedInputs,
        ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let txid = inputs.string("txid")?;
        let actions = ctx.actions();
        Ok(dispatch(
            node,
            ctx,
            ActionKind::CancelOrder,
            json!({ "txid": txid }),
            || actions.validate_cancel(txid),
            || actions.cancel_order(txid),
        )
        .await)
    }
}

/// Audit-only record of whatever flows into it. Never touches the exchange.
pub struct LogIntentHandler;

#[async_trait]
impl NodeHandler for LogIntentHandler {
    fn kind(&self) -> NodeKind {
        NodeKind::ActionLogIntent
    }

    fn ports(&self) -> &'static [PortSpec] {
        LOG_INTENT_PORTS
    }

    async fn run(
        &self,
        node: &NodeDefinition,
        inputs: &ResolvedInputs,
        _ctx: &HandlerContext<'_>,
    ) -> Result<NodeOutcome, NodeError> {
        let params = json!({
            "message": inputs.optional_string("message")?,
            "value": inputs.get("value"),
        });
        Ok(NodeOutcome::signal().with_effect(ActionEffect {
            intent: ActionIntent {
                node_id: node.id.clone(),
                action: ActionKind::LogIntent,
                params,
                executed: false,
            },
            validation: None,
            live: None,
        }))
    }
}
