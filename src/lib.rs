//! # Stratflow - Strategy Graph Execution Engine
//!
//! **Stratflow** runs trading strategies that are described as typed node-and-edge
//! graphs. It validates a submitted graph, walks it in a deterministic order that
//! follows control-flow branching, dispatches each node to the handler of its type,
//! and gathers everything that happened into one structured report.
//!
//! ## Core Workflow
//!
//! 1.  **Load a Strategy**: Deserialize a [`Strategy`](strategy::Strategy) from JSON or build it in code.
//! 2.  **Pick Collaborators**: Supply a [`MarketDataProvider`](market::MarketDataProvider) and an
//!     [`ExchangeAdapter`](exchange::ExchangeAdapter) through an [`ExecutionContext`](context::ExecutionContext).
//! 3.  **Execute**: Use `Executor::builder()` to configure an executor and call `execute`.
//!     In dry-run mode action nodes only record intents; nothing reaches the exchange
//!     apart from optional read-only validation calls.
//! 4.  **Inspect**: Read the [`ExecutionResult`](report::ExecutionResult) directly, serialize it,
//!     or render it with [`ReportFormatter`](report::ReportFormatter).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stratflow::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let strategy = Strategy::new("breakout")
//!     .with_node(NodeDefinition::new("start", "control.start"))
//!     .with_node(NodeDefinition::new("ticker", "data.kraken.ticker").with_config("pair", json!("XBTUSD")))
//!     .with_node(
//!         NodeDefinition::new("above", "logic.if")
//!             .with_config("comparator", json!(">"))
//!             .with_config("threshold", json!(90000)),
//!     )
//!     .with_node(
//!         NodeDefinition::new("buy", "action.placeOrder")
//!             .with_config("pair", json!("XBTUSD"))
//!             .with_config("side", json!("buy"))
//!             .with_config("volume", json!(0.01)),
//!     )
//!     .with_edge(EdgeDefinition::control("e1", "start", CONTROL_OUT, "ticker"))
//!     .with_edge(EdgeDefinition::control("e2", "ticker", CONTROL_OUT, "above"))
//!     .with_edge(EdgeDefinition::data("d1", "ticker", "price", "above", "condition"))
//!     .with_edge(EdgeDefinition::control("e3", "above", CONTROL_TRUE, "buy"));
//!
//! let ctx = ExecutionContext::dry_run(
//!     Arc::new(MarketFixture::sample()),
//!     Arc::new(PaperExchange::read_only()),
//! );
//!
//! let executor = Executor::builder().build();
//! let result = executor.execute(&strategy, &ctx).await;
//!
//! println!("{}", ReportFormatter::format_summary(&result));
//! assert!(result.action_intents.iter().all(|intent| !intent.executed));
//! # }
//! ```

pub mod context;
pub mod data;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod market;
pub mod prelude;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod strategy;
pub mod validator;
