use crate::exchange::ExchangeAdapter;
use crate::market::MarketDataProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Whether action nodes may produce side effects on the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Action nodes record intents only; mutating adapter calls are never made.
    #[default]
    DryRun,
    /// Action nodes call the adapter's mutating operations.
    Live,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::DryRun => write!(f, "dry-run"),
            ExecutionMode::Live => write!(f, "live"),
        }
    }
}

/// Serializable run options, e.g. loaded from a JSON file next to the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    #[serde(default)]
    pub mode: ExecutionMode,
    /// In dry-run mode, send order intents through the adapter's read-only validation calls.
    #[serde(default)]
    pub validate: bool,
    /// Treat a rejected validation as a runtime error of the action node.
    #[serde(default)]
    pub fail_on_validation_error: bool,
    /// Restrict the run to the control ancestors of this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
}

impl ExecutionOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything a single run needs besides the strategy itself.
///
/// Collaborators are injected here rather than read from global state, so two
/// runs with different credentials or providers never interfere.
#[derive(Clone)]
pub struct ExecutionContext {
    pub mode: ExecutionMode,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub actions: Arc<dyn ExchangeAdapter>,
    pub validate: bool,
    pub fail_on_validation_error: bool,
    pub target_node_id: Option<String>,
}

impl ExecutionContext {
    pub fn dry_run(
        market_data: Arc<dyn MarketDataProvider>,
        actions: Arc<dyn ExchangeAdapter>,
    ) -> Self {
        Self {
            mode: ExecutionMode::DryRun,
            market_data,
            actions,
            validate: false,
            fail_on_validation_error: false,
            target_node_id: None,
        }
    }

    pub fn live(
        market_data: Arc<dyn MarketDataProvider>,
        actions: Arc<dyn ExchangeAdapter>,
    ) -> Self {
        Self {
            mode: ExecutionMode::Live,
            ..Self::dry_run(market_data, actions)
        }
    }

    pub fn from_options(
        options: ExecutionOptions,
        market_data: Arc<dyn MarketDataProvider>,
        actions: Arc<dyn ExchangeAdapter>,
    ) -> Self {
        Self {
            mode: options.mode,
            market_data,
            actions,
            validate: options.validate,
            fail_on_validation_error: options.fail_on_validation_error,
            target_node_id: options.target_node_id,
        }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_fail_on_validation_error(mut self, fail: bool) -> Self {
        self.fail_on_validation_error = fail;
        self
    }

    pub fn with_target(mut self, node_id: impl Into<String>) -> Self {
        self.target_node_id = Some(node_id.into());
        self
    }

    pub fn is_live(&self) -> bool {
        self.mode == ExecutionMode::Live
    }

    pub fn target(&self) -> Option<&str> {
        self.target_node_id.as_deref()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("mode", &self.mode)
            .field("validate", &self.validate)
            .field("fail_on_validation_error", &self.fail_on_validation_error)
            .field("target_node_id", &self.target_node_id)
            .finish_non_exhaustive()
    }
}
