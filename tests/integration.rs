//! Integration tests for stratflow
//!
//! End-to-end runs from saved strategy JSON to the serialized report.
//!
mod common;
use common::*;
use std::fs;
use std::sync::Arc;
use stratflow::prelude::*;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_saved_strategy_runs_end_to_end() {
        let strategy = Strategy::from_json(BREAKOUT_STRATEGY_JSON).expect("valid strategy json");
        let exchange = Arc::new(PaperExchange::read_only());
        let ctx = dry_run(&exchange).with_validation(true);

        let result = run(&strategy, &ctx);

        assert!(result.success, "errors: {:?}", result.errors);
        assert_eq!(
            result.visited(),
            vec!["threshold", "start", "ticker", "check", "log-below", "order-template"]
        );
        assert_eq!(result.nodes_executed, 5);
        assert_eq!(result.action_intents.len(), 1);
        assert_eq!(exchange.calls().validate_order, 1);
        assert_eq!(exchange.calls().mutating(), 0);
        assert!(result.started_at <= result.completed_at);
    }

    #[test]
    fn test_report_json_shape() {
        let strategy = Strategy::from_json(BREAKOUT_STRATEGY_JSON).expect("valid strategy json");
        let exchange = Arc::new(PaperExchange::new());
        let result = run(&strategy, &dry_run(&exchange));

        let json = result.to_json_pretty().expect("report serializes");
        let report: serde_json::Value = serde_json::from_str(&json).expect("report is json");

        assert_eq!(report["success"], serde_json::json!(true));
        assert_eq!(report["mode"], serde_json::json!("dry-run"));
        assert_eq!(report["nodesExecuted"], serde_json::json!(5));
        assert!(report["actionIntents"].is_array());
        assert!(report.get("krakenValidations").is_none());
        assert!(report.get("liveActions").is_none());

        let first = &report["log"][0];
        assert_eq!(first["nodeId"], serde_json::json!("threshold"));
        assert_eq!(first["nodeType"], serde_json::json!("data.constant"));
        assert_eq!(first["status"], serde_json::json!("executed"));
        assert_eq!(first["outputs"]["value"], serde_json::json!(90000.0));

        let intent = &report["actionIntents"][0];
        assert_eq!(intent["action"], serde_json::json!("placeOrder"));
        assert_eq!(intent["executed"], serde_json::json!(false));
        assert_eq!(intent["params"]["pair"], serde_json::json!("XBTUSD"));
    }

    #[test]
    fn test_failed_report_json_carries_error_codes() {
        let strategy = breakout_strategy(1.0).with_edge(flow("e-ghost", "check", "ghost"));
        let exchange = Arc::new(PaperExchange::new());
        let result = run(&strategy, &dry_run(&exchange));

        let report = serde_json::to_value(&result).expect("report serializes");
        assert_eq!(report["success"], serde_json::json!(false));
        assert_eq!(report["nodesExecuted"], serde_json::json!(0));
        assert_eq!(report["errors"][0]["code"], serde_json::json!("DANGLING_EDGE"));
        assert_eq!(report["errors"][0]["edgeId"], serde_json::json!("e-ghost"));
    }

    #[test]
    fn test_summary_lists_every_visited_node() {
        let exchange = Arc::new(PaperExchange::new());
        let result = run(&breakout_strategy(90_000.0), &dry_run(&exchange));
        let summary = ReportFormatter::format_summary(&result);

        assert!(summary.starts_with("dry-run run succeeded (4 of 5 nodes executed)"));
        assert!(summary.contains("+ ticker (data.kraken.ticker)"));
        assert!(summary.contains("price=90135.6"));
        assert!(summary.contains("- log-below (action.logIntent)"));
        assert!(summary.contains("intents:"));
    }

    #[test]
    fn test_summary_of_failed_run() {
        let exchange = Arc::new(PaperExchange::new().failing("connection reset"));
        let result = run(&breakout_strategy(90_000.0), &live(&exchange));
        let summary = ReportFormatter::format_summary(&result);

        assert!(summary.starts_with("live run failed"));
        assert!(summary.contains("! order-template (action.placeOrder)"));
        assert!(summary.contains("error [NODE_EXECUTION_FAILED] order-template:"));
    }

    #[test]
    fn test_fixture_files_on_disk() {
        let dir = std::env::temp_dir().join(format!("stratflow-it-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create temp dir");
        let market_path = dir.join("market.json");
        fs::write(&market_path, STALE_MARKET_JSON).expect("write market fixture");

        let market = MarketFixture::from_file(market_path.to_str().expect("utf-8 path"))
            .expect("fixture loads");
        let exchange = Arc::new(PaperExchange::new());
        let ctx = ExecutionContext::dry_run(Arc::new(market), exchange)
            .with_target("check");
        let result = run(&breakout_strategy(90_000.0), &ctx);

        assert!(result.success);
        assert_eq!(result.visited(), vec!["start", "ticker", "check"]);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.node_id.as_deref() == Some("ticker")));

        fs::remove_dir_all(&dir).ok();
    }
}
