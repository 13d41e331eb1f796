//! Validator tests
//!
//! Each structural error code, reported before any node runs.
//!
mod common;
use common::*;
use serde_json::json;
use stratflow::prelude::*;

fn validate(strategy: &Strategy) -> Vec<StructuralError> {
    let registry = HandlerRegistry::new();
    Validator::new(&registry).validate(strategy)
}

fn codes(errors: &[StructuralError]) -> Vec<ErrorCode> {
    errors.iter().map(|e| e.code).collect()
}

#[cfg(test)]
mod node_tests {
    use super::*;

    #[test]
    fn test_valid_strategy_has_no_errors() {
        assert!(validate(&breakout_strategy(90_000.0)).is_empty());
        let parsed = Strategy::from_json(BREAKOUT_STRATEGY_JSON).expect("valid strategy json");
        assert!(validate(&parsed).is_empty());
    }

    #[test]
    fn test_unknown_node_type() {
        let strategy = breakout_strategy(1.0).with_node(NodeDefinition::new("x", "data.coinbase.ticker"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::UnknownNodeType]);
        assert_eq!(errors[0].node_id.as_deref(), Some("x"));
        assert!(errors[0].message.contains("data.coinbase.ticker"));
    }

    #[test]
    fn test_duplicate_node_id() {
        let strategy = breakout_strategy(1.0).with_node(log_intent("check"));
        let errors = validate(&strategy);

        assert!(codes(&errors).contains(&ErrorCode::DuplicateNodeId));
        assert!(errors
            .iter()
            .any(|e| e.code == ErrorCode::DuplicateNodeId && e.node_id.as_deref() == Some("check")));
    }

    #[test]
    fn test_invalid_config_is_reported_per_node() {
        let strategy = Strategy::new("bad-config")
            .with_node(start("start"))
            .with_node(branch("check", 1.0, "~", 2.0))
            .with_node(market_buy("order", -1.0))
            .with_edge(flow("e1", "start", "check"))
            .with_edge(EdgeDefinition::control("e2", "check", CONTROL_TRUE, "order"));
        let errors = validate(&strategy);

        assert_eq!(
            codes(&errors),
            vec![ErrorCode::InvalidConfig, ErrorCode::InvalidConfig]
        );
        assert_eq!(errors[0].node_id.as_deref(), Some("check"));
        assert_eq!(errors[1].node_id.as_deref(), Some("order"));
    }

    #[test]
    fn test_constant_with_unknown_value_type() {
        let strategy = Strategy::new("constant")
            .with_node(
                NodeDefinition::new("c", "data.constant")
                    .with_config("value", json!("1"))
                    .with_config("valueType", json!("decimal")),
            );
        assert_eq!(codes(&validate(&strategy)), vec![ErrorCode::InvalidConfig]);
    }
}

#[cfg(test)]
mod edge_tests {
    use super::*;

    #[test]
    fn test_edge_to_missing_node_is_dangling() {
        let strategy = breakout_strategy(1.0).with_edge(flow("e-ghost", "check", "ghost"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::DanglingEdge]);
        assert_eq!(errors[0].edge_id.as_deref(), Some("e-ghost"));
        assert!(errors[0].message.contains("ghost"));
    }

    #[test]
    fn test_undeclared_port_is_dangling() {
        let strategy = breakout_strategy(1.0).with_edge(EdgeDefinition::data(
            "d-bad", "ticker", "lastTrade", "check", "threshold",
        ));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::DanglingEdge]);
        assert!(errors[0].message.contains("lastTrade"));
    }

    #[test]
    fn test_data_edge_into_control_port_is_a_kind_mismatch() {
        let strategy = breakout_strategy(1.0)
            .with_node(log_intent("sink"))
            .with_edge(EdgeDefinition::data("d-bad", "ticker", "price", "sink", CONTROL_IN));
        assert_eq!(codes(&validate(&strategy)), vec![ErrorCode::PortKindMismatch]);
    }

    #[test]
    fn test_incompatible_data_types_are_a_kind_mismatch() {
        let strategy = breakout_strategy(1.0)
            .with_node(
                NodeDefinition::new("spread", "data.kraken.ohlc").with_config("pair", json!("XBTUSD")),
            )
            .with_edge(flow("e-ohlc", "start", "spread"))
            .with_edge(EdgeDefinition::data(
                "d-series", "spread", "candles", "order-template", "volume",
            ));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::PortKindMismatch]);
        assert!(errors[0].message.contains("series"));
    }

    #[test]
    fn test_second_edge_into_same_input_is_rejected() {
        let strategy = breakout_strategy(1.0)
            .with_node(ticker("other", "ETHUSD"))
            .with_edge(flow("e-other", "start", "other"))
            .with_edge(EdgeDefinition::data(
                "d-second", "other", "price", "check", "condition",
            ));
        let errors = validate(&strategy);

        assert_eq!(
            codes(&errors),
            vec![ErrorCode::DuplicatePortConnection, ErrorCode::MissingRequiredInput]
        );
        assert_eq!(errors[0].edge_id.as_deref(), Some("d-second"));
        assert!(errors[0].message.contains("d-price"));
        assert!(errors[1].message.contains("fed by 2 edges"));
    }

    #[test]
    fn test_many_control_edges_into_one_node_are_fine() {
        let strategy = breakout_strategy(1.0)
            .with_node(log_intent("join"))
            .with_edge(flow("e-j1", "order-template", "join"))
            .with_edge(flow("e-j2", "log-below", "join"));
        assert!(validate(&strategy).is_empty());
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_missing_required_input() {
        let strategy = Strategy::new("missing")
            .with_node(start("start"))
            .with_node(NodeDefinition::new("guard", "risk.guard").with_config("pair", json!("XBTUSD")))
            .with_edge(flow("e1", "start", "guard"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::MissingRequiredInput]);
        assert_eq!(errors[0].node_id.as_deref(), Some("guard"));
        assert!(errors[0].message.contains("maxSpread"));
    }

    #[test]
    fn test_edge_from_node_outside_the_run_does_not_satisfy_input() {
        let mut strategy = breakout_strategy(1.0)
            .with_node(ticker("island", "XBTUSD"))
            .with_edge(EdgeDefinition::data(
                "d-island", "island", "price", "check", "condition",
            ));
        strategy.edges.retain(|e| e.id != "d-price");
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::MissingRequiredInput]);
        assert_eq!(errors[0].node_id.as_deref(), Some("check"));
        assert!(errors[0].message.contains("'island', which never runs"));
    }

    #[test]
    fn test_edge_from_node_outside_the_target_scope_does_not_satisfy_input() {
        let strategy = Strategy::new("side-feed")
            .with_node(start("start"))
            .with_node(ticker("ticker", "XBTUSD"))
            .with_node(log_intent("note"))
            .with_node(NodeDefinition::new("guard", "risk.guard").with_config("pair", json!("XBTUSD")))
            .with_node(ticker("side", "ETHUSD"))
            .with_edge(flow("e1", "start", "ticker"))
            .with_edge(flow("e2", "ticker", "guard"))
            .with_edge(flow("e3", "start", "side"))
            .with_edge(flow("e4", "side", "note"))
            .with_edge(EdgeDefinition::data("d1", "side", "price", "guard", "maxSpread"));
        let registry = HandlerRegistry::new();

        assert!(validate(&strategy).is_empty());
        let errors = Validator::new(&registry)
            .with_target(Some("guard"))
            .validate(&strategy);
        assert_eq!(codes(&errors), vec![ErrorCode::MissingRequiredInput]);
        assert!(errors[0].message.contains("maxSpread"));
    }

    #[test]
    fn test_unusable_config_value_does_not_satisfy_input() {
        let strategy = Strategy::new("object-pair")
            .with_node(start("start"))
            .with_node(
                NodeDefinition::new("ticker", "data.kraken.ticker")
                    .with_config("pair", json!({ "base": "XBT", "quote": "USD" })),
            )
            .with_edge(flow("e1", "start", "ticker"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::MissingRequiredInput]);
        assert!(errors[0].message.contains("cannot use"));
    }

    #[test]
    fn test_unreachable_nodes_are_not_checked_for_inputs() {
        let strategy = breakout_strategy(1.0)
            .with_node(NodeDefinition::new("island", "data.kraken.ticker"));
        assert!(validate(&strategy).is_empty());
    }

    #[test]
    fn test_control_cycle_is_detected() {
        let strategy = breakout_strategy(1.0).with_edge(flow("e-back", "order-template", "ticker"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::CycleDetected]);
        assert!(errors[0].message.contains("->"));
    }

    #[test]
    fn test_cycle_among_unreachable_nodes_is_ignored() {
        let strategy = breakout_strategy(1.0)
            .with_node(log_intent("island-a"))
            .with_node(log_intent("island-b"))
            .with_edge(flow("e-ab", "island-a", "island-b"))
            .with_edge(flow("e-ba", "island-b", "island-a"));
        assert!(validate(&strategy).is_empty());
    }

    #[test]
    fn test_data_back_edge_is_not_a_cycle() {
        let strategy = Strategy::new("data-loop")
            .with_node(start("start"))
            .with_node(ticker("t", "XBTUSD"))
            .with_node(market_buy("order", 0.01))
            .with_edge(flow("e1", "start", "t"))
            .with_edge(flow("e2", "t", "order"))
            .with_edge(EdgeDefinition::data("d1", "order", "status", "t", "pair"));
        assert!(validate(&strategy).is_empty());
    }

    #[test]
    fn test_self_loop_is_detected() {
        let strategy = breakout_strategy(1.0).with_edge(flow("e-self", "log-below", "log-below"));
        let errors = validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::CycleDetected]);
        assert!(errors[0].message.contains("log-below -> log-below"));
    }

    #[test]
    fn test_unknown_target_is_reported() {
        let registry = HandlerRegistry::new();
        let errors = Validator::new(&registry)
            .with_target(Some("nowhere"))
            .validate(&breakout_strategy(1.0));

        assert_eq!(codes(&errors), vec![ErrorCode::InvalidTarget]);
        assert!(errors[0].message.contains("nowhere"));
    }

    #[test]
    fn test_unreachable_target_is_reported() {
        let registry = HandlerRegistry::new();
        let strategy = breakout_strategy(1.0).with_node(log_intent("island"));
        let errors = Validator::new(&registry)
            .with_target(Some("island"))
            .validate(&strategy);

        assert_eq!(codes(&errors), vec![ErrorCode::InvalidTarget]);
    }

    #[test]
    fn test_errors_are_reported_in_a_stable_order() {
        let strategy = breakout_strategy(1.0)
            .with_node(NodeDefinition::new("b-unknown", "nope"))
            .with_node(NodeDefinition::new("a-unknown", "nope"))
            .with_edge(flow("z-edge", "start", "ghost"))
            .with_edge(flow("a-edge", "start", "phantom"));
        let errors = validate(&strategy);

        let subjects: Vec<_> = errors
            .iter()
            .map(|e| e.node_id.as_deref().or(e.edge_id.as_deref()).unwrap_or_default())
            .collect();
        assert_eq!(subjects, vec!["a-unknown", "b-unknown", "a-edge", "z-edge"]);
        assert_eq!(validate(&strategy), errors);
    }
}
