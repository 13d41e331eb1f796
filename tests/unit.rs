//! Unit tests for core stratflow types.
mod common;
use common::*;
use serde_json::json;
use stratflow::error::{ExchangeError, MarketDataError};
use stratflow::prelude::*;
use stratflow::registry::handlers::Comparator;
use stratflow::registry::{DataType, ResolvedInputs};
use stratflow::report::{ActionKind, ActionOutcome, OutcomeStatus};

#[test]
fn test_value_display() {
    assert_eq!(format!("{}", Value::Number(42.0)), "42");
    assert_eq!(format!("{}", Value::Number(0.25)), "0.25");
    assert_eq!(format!("{}", Value::Bool(true)), "true");
    assert_eq!(format!("{}", Value::Series(vec![1.0, 2.0, 3.0])), "[3 points]");
    assert_eq!(format!("{}", Value::Null), "null");
}

#[test]
fn test_value_from_config_json() {
    assert_eq!(Value::from_json(&json!(1.5)), Some(Value::Number(1.5)));
    assert_eq!(Value::from_json(&json!("XBTUSD")), Some(Value::from("XBTUSD")));
    assert_eq!(
        Value::from_json(&json!([1, 2.5])),
        Some(Value::Series(vec![1.0, 2.5]))
    );
    assert_eq!(Value::from_json(&json!(["a"])), None);
    assert_eq!(Value::from_json(&json!({ "a": 1 })), None);
}

#[test]
fn test_numeric_strings_coerce() {
    assert_eq!(Value::from(" 0.01 ").as_number(), Some(0.01));
    assert_eq!(Value::from("abc").as_number(), None);
    assert_eq!(Value::from("true").as_bool(), Some(true));
    assert_eq!(Value::Number(1.0).as_str(), None);
}

#[test]
fn test_comparator_parsing() {
    assert_eq!(">".parse::<Comparator>(), Ok(Comparator::GreaterThan));
    assert_eq!("lte".parse::<Comparator>(), Ok(Comparator::SmallerThanOrEqual));
    assert_eq!(" == ".parse::<Comparator>(), Ok(Comparator::Equal));
    assert!("~".parse::<Comparator>().is_err());

    assert!(Comparator::GreaterThanOrEqual.apply(2.0, 2.0));
    assert!(!Comparator::NotEqual.apply(2.0, 2.0));
    assert_eq!(Comparator::SmallerThan.to_string(), "<");
}

#[test]
fn test_registry_covers_every_node_kind() {
    let registry = HandlerRegistry::new();
    assert!(registry.verify().is_empty());
    assert_eq!(registry.type_names().len(), NodeKind::ALL.len());
    assert_eq!(registry.type_names().len(), 12);
    assert_eq!(
        registry.kind_of("data.kraken.assetPairs"),
        Some(NodeKind::DataKrakenAssetPairs)
    );
    assert_eq!(NodeKind::from_type_name("risk.guard"), Some(NodeKind::RiskGuard));
    assert_eq!(NodeKind::from_type_name("risk.stop"), None);
}

#[test]
fn test_registry_type_mapping() {
    let mut registry = HandlerRegistry::new();
    assert!(registry.map_type("if", "logic.if"));
    assert!(!registry.map_type("stop", "risk.stop"));

    assert_eq!(registry.kind_of("if"), Some(NodeKind::LogicIf));
    assert!(!registry.contains("stop"));
    assert!(registry.verify().is_empty());
}

#[test]
fn test_only_constants_are_detached_sources() {
    let registry = HandlerRegistry::new();
    let detached: Vec<_> = NodeKind::ALL
        .iter()
        .filter(|kind| {
            registry
                .resolve(kind.as_str())
                .is_some_and(|h| h.is_detached_source())
        })
        .collect();
    assert_eq!(detached, vec![&NodeKind::DataConstant]);
}

#[test]
fn test_data_type_compatibility() {
    assert!(DataType::Number.can_feed(DataType::Number));
    assert!(DataType::String.can_feed(DataType::Number));
    assert!(DataType::Boolean.can_feed(DataType::Any));
    assert!(DataType::Any.can_feed(DataType::Series));
    assert!(!DataType::Number.can_feed(DataType::String));
    assert!(!DataType::Series.can_feed(DataType::Number));
}

#[test]
fn test_resolved_inputs_accessors() {
    let inputs = ResolvedInputs::new()
        .with("pair", "XBTUSD")
        .with("volume", "0.5")
        .with("price", Value::Null);

    assert_eq!(inputs.string("pair").ok(), Some("XBTUSD"));
    assert_eq!(inputs.number("volume").ok(), Some(0.5));
    assert_eq!(inputs.optional_number("price").ok(), Some(None));
    assert!(matches!(
        inputs.number("pair"),
        Err(NodeError::InvalidInput { .. })
    ));
    assert!(matches!(
        inputs.require("side"),
        Err(NodeError::MissingInput(port)) if port == "side"
    ));
}

#[test]
fn test_action_outcome_from_response() {
    let placed = ActionOutcome::from_response(
        "order",
        ActionKind::PlaceOrder,
        Ok(json!({ "txid": ["OABC-1", "OABC-2"] })),
    );
    assert!(placed.is_ok());
    assert_eq!(placed.detail, "OABC-1, OABC-2");

    let rejected = ActionOutcome::from_response(
        "order",
        ActionKind::PlaceOrder,
        Err(ExchangeError::Rejected("EOrder:Invalid price".to_string())),
    );
    assert_eq!(rejected.status, OutcomeStatus::Error);
    assert!(rejected.detail.contains("EOrder:Invalid price"));
    assert!(rejected.response.is_none());
}

#[test]
fn test_error_code_wire_names() {
    assert_eq!(
        serde_json::to_value(ErrorCode::MissingRequiredInput).ok(),
        Some(json!("MISSING_REQUIRED_INPUT"))
    );
    assert_eq!(ErrorCode::OrderValidationFailed.to_string(), "ORDER_VALIDATION_FAILED");
    assert!(ErrorCode::CycleDetected.is_structural());
    assert!(!ErrorCode::NodeExecutionFailed.is_structural());
}

#[test]
fn test_node_error_messages() {
    let error = NodeError::from(MarketDataError::Unavailable {
        kind: "ticker".to_string(),
        pair: "DOGEUSD".to_string(),
    });
    assert_eq!(
        error.to_string(),
        "Market data request failed: No ticker data available for pair 'DOGEUSD'"
    );
}

#[test]
fn test_execution_options_from_json() {
    let options = ExecutionOptions::from_json(
        r#"{ "mode": "live", "failOnValidationError": true }"#,
    )
    .expect("valid options");
    assert_eq!(options.mode, ExecutionMode::Live);
    assert!(options.fail_on_validation_error);
    assert!(!options.validate);
    assert_eq!(options.target_node_id, None);

    assert_eq!(
        ExecutionOptions::from_json("{}").ok(),
        Some(ExecutionOptions::default())
    );
    assert!(ExecutionOptions::from_json(r#"{ "mode": "paper" }"#).is_err());
}

#[test]
fn test_order_request_description() {
    let order = OrderRequest {
        pair: "XBTUSD".to_string(),
        side: OrderSide::Sell,
        order_type: OrderType::Limit,
        volume: 0.5,
        price: Some(91_000.0),
    };
    assert_eq!(order.describe(), "sell 0.5 XBTUSD @ limit 91000");
    assert_eq!("buy".parse::<OrderSide>(), Ok(OrderSide::Buy));
    assert!("hold".parse::<OrderSide>().is_err());
}

#[test]
fn test_order_request_params() {
    let mut order = OrderRequest {
        pair: "XBTUSD".to_string(),
        side: OrderSide::Buy,
        order_type: OrderType::Market,
        volume: 0.01,
        price: None,
    };
    assert_eq!(
        order.params(),
        json!({ "pair": "XBTUSD", "side": "buy", "orderType": "market", "volume": 0.01 })
    );

    order.order_type = OrderType::Limit;
    order.price = Some(89_500.0);
    assert_eq!(order.params()["orderType"], json!("limit"));
    assert_eq!(order.params()["price"], json!(89_500.0));
    assert_eq!(serde_json::to_value(&order).ok(), Some(order.params()));
}

#[test]
fn test_strategy_json_keeps_positions() {
    let strategy = Strategy::from_json(BREAKOUT_STRATEGY_JSON).expect("valid strategy json");
    assert_eq!(strategy.nodes.len(), 6);
    assert_eq!(strategy.edges.len(), 6);

    let start_node = strategy.node("start").expect("start node");
    assert!(start_node.position.is_some());
    assert_eq!(
        strategy.metadata.description.as_deref(),
        Some("Buy XBTUSD above 90k")
    );

    let built = breakout_strategy(1.0);
    assert_eq!(built.node("ticker").map(|n| n.node_type.as_str()), Some("data.kraken.ticker"));
}

#[test]
fn test_fixture_from_json() {
    let market = MarketFixture::from_json(STALE_MARKET_JSON).expect("valid fixture");
    assert!(market.stale.contains("XBTUSD"));
    assert!(market.tickers.contains_key("XBTUSD"));
    assert!(MarketFixture::from_json("{ not json").is_err());
    assert!(MarketFixture::from_file("does/not/exist.json").is_err());
}
