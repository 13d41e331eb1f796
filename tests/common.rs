//! Common test utilities for building strategies and running them.
use serde_json::json;
use std::sync::Arc;
use stratflow::prelude::*;

/// Runs `strategy` with a default executor, blocking on the future.
#[allow(dead_code)]
pub fn run(strategy: &Strategy, ctx: &ExecutionContext) -> ExecutionResult {
    tokio_test::block_on(Executor::new().execute(strategy, ctx))
}

/// A dry-run context over the sample market and the given exchange.
#[allow(dead_code)]
pub fn dry_run(exchange: &Arc<PaperExchange>) -> ExecutionContext {
    ExecutionContext::dry_run(Arc::new(MarketFixture::sample()), exchange.clone())
}

#[allow(dead_code)]
pub fn live(exchange: &Arc<PaperExchange>) -> ExecutionContext {
    ExecutionContext::live(Arc::new(MarketFixture::sample()), exchange.clone())
}

#[allow(dead_code)]
pub fn start(id: &str) -> NodeDefinition {
    NodeDefinition::new(id, "control.start")
}

#[allow(dead_code)]
pub fn log_intent(id: &str) -> NodeDefinition {
    NodeDefinition::new(id, "action.logIntent").with_config("message", json!(id))
}

#[allow(dead_code)]
pub fn ticker(id: &str, pair: &str) -> NodeDefinition {
    NodeDefinition::new(id, "data.kraken.ticker").with_config("pair", json!(pair))
}

/// A fully configured `logic.if`; `condition` may still be overridden by a data edge.
#[allow(dead_code)]
pub fn branch(id: &str, condition: f64, comparator: &str, threshold: f64) -> NodeDefinition {
    NodeDefinition::new(id, "logic.if")
        .with_config("condition", json!(condition))
        .with_config("comparator", json!(comparator))
        .with_config("threshold", json!(threshold))
}

#[allow(dead_code)]
pub fn market_buy(id: &str, volume: f64) -> NodeDefinition {
    NodeDefinition::new(id, "action.placeOrder")
        .with_config("pair", json!("XBTUSD"))
        .with_config("side", json!("buy"))
        .with_config("volume", json!(volume))
}

#[allow(dead_code)]
pub fn flow(id: &str, source: &str, target: &str) -> EdgeDefinition {
    EdgeDefinition::control(id, source, CONTROL_OUT, target)
}

/// Creates the breakout strategy used across the suites.
///
/// Logic: `start -> ticker -> check`, where `check` compares the XBTUSD price
/// against `threshold`. `control:true` leads to `order-template` (market buy),
/// `control:false` leads to `log-below`.
#[allow(dead_code)]
pub fn breakout_strategy(threshold: f64) -> Strategy {
    Strategy::new("breakout")
        .with_node(start("start"))
        .with_node(ticker("ticker", "XBTUSD"))
        .with_node(
            NodeDefinition::new("check", "logic.if")
                .with_config("comparator", json!(">"))
                .with_config("threshold", json!(threshold)),
        )
        .with_node(market_buy("order-template", 0.01))
        .with_node(log_intent("log-below"))
        .with_edge(flow("e-start", "start", "ticker"))
        .with_edge(flow("e-ticker", "ticker", "check"))
        .with_edge(EdgeDefinition::data(
            "d-price", "ticker", "price", "check", "condition",
        ))
        .with_edge(EdgeDefinition::control(
            "e-true",
            "check",
            CONTROL_TRUE,
            "order-template",
        ))
        .with_edge(EdgeDefinition::control(
            "e-false",
            "check",
            CONTROL_FALSE,
            "log-below",
        ))
}

/// The breakout strategy as an editor would save it.
#[allow(dead_code)]
pub const BREAKOUT_STRATEGY_JSON: &str = r#"{
    "version": "1",
    "metadata": {
        "name": "breakout",
        "description": "Buy XBTUSD above 90k",
        "createdAt": "2025-06-01T12:00:00Z",
        "updatedAt": "2025-06-02T08:30:00Z"
    },
    "nodes": [
        { "id": "start", "type": "control.start", "position": { "x": 0, "y": 0 } },
        { "id": "ticker", "type": "data.kraken.ticker", "config": { "pair": "XBTUSD" } },
        { "id": "threshold", "type": "data.constant", "config": { "value": "90000", "valueType": "number" } },
        { "id": "check", "type": "logic.if", "config": { "comparator": ">" } },
        { "id": "order-template", "type": "action.placeOrder",
          "config": { "pair": "XBTUSD", "side": "buy", "volume": "0.01", "orderType": "market" } },
        { "id": "log-below", "type": "action.logIntent", "config": { "message": "below threshold" } }
    ],
    "edges": [
        { "id": "e1", "kind": "control", "source": "start", "sourcePort": "control:out", "target": "ticker", "targetPort": "control:in" },
        { "id": "e2", "kind": "control", "source": "ticker", "sourcePort": "control:out", "target": "check", "targetPort": "control:in" },
        { "id": "e3", "kind": "control", "source": "check", "sourcePort": "control:true", "target": "order-template", "targetPort": "control:in" },
        { "id": "e4", "kind": "control", "source": "check", "sourcePort": "control:false", "target": "log-below", "targetPort": "control:in" },
        { "id": "d1", "kind": "data", "source": "ticker", "sourcePort": "price", "target": "check", "targetPort": "condition" },
        { "id": "d2", "kind": "data", "source": "threshold", "sourcePort": "value", "target": "check", "targetPort": "threshold" }
    ]
}"#;

/// Market fixture JSON with a single pair that is served from a fallback cache.
#[allow(dead_code)]
pub const STALE_MARKET_JSON: &str = r#"{
    "tickers": { "XBTUSD": { "last": 90135.6, "bid": 90135.5, "ask": 90135.7, "volume": 1520.4 } },
    "spreads": { "XBTUSD": { "bid": 90135.5, "ask": 90135.7 } },
    "stale": ["XBTUSD"]
}"#;

#[allow(dead_code)]
pub fn approx(actual: Option<&Value>, expected: f64) -> bool {
    actual
        .and_then(Value::as_number)
        .is_some_and(|n| (n - expected).abs() < 1e-9)
}
