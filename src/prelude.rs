//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the stratflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use stratflow::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run_example() -> Result<()> {
//! let strategy = Strategy::from_json(&std::fs::read_to_string("path/to/strategy.json")?)?;
//! let market = MarketFixture::from_file("path/to/market.json")?;
//!
//! let ctx = ExecutionContext::dry_run(Arc::new(market), Arc::new(PaperExchange::read_only()))
//!     .with_validation(true);
//! let result = Executor::new().execute(&strategy, &ctx).await;
//!
//! println!("{}", ReportFormatter::format_summary(&result));
//! # Ok(())
//! # }
//! ```

// Engine
pub use crate::executor::{Executor, ExecutorBuilder};
pub use crate::validator::Validator;

// Strategy model
pub use crate::strategy::{EdgeDefinition, EdgeKind, NodeDefinition, Strategy, Value};

// Registry and ports
pub use crate::registry::{
    CONTROL_FALSE, CONTROL_IN, CONTROL_OUT, CONTROL_TRUE, HandlerRegistry, NodeHandler, NodeKind,
};

// Run configuration and collaborators
pub use crate::context::{ExecutionContext, ExecutionMode, ExecutionOptions};
pub use crate::data::{MarketFixture, PaperExchange};
pub use crate::exchange::{ExchangeAdapter, OrderRequest, OrderSide, OrderType};
pub use crate::market::MarketDataProvider;

// Report
pub use crate::report::{ExecutionResult, NodeStatus, ReportFormatter};

// Error types
pub use crate::error::{ErrorCode, NodeError, StructuralError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
