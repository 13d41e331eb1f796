use crate::strategy::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Machine-readable classification of every error entry a run can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Structural
    UnknownNodeType,
    DanglingEdge,
    PortKindMismatch,
    DuplicatePortConnection,
    MissingRequiredInput,
    CycleDetected,
    DuplicateNodeId,
    InvalidConfig,
    InvalidTarget,

    // Runtime
    NodeExecutionFailed,
    OrderValidationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UnknownNodeType => "UNKNOWN_NODE_TYPE",
            ErrorCode::DanglingEdge => "DANGLING_EDGE",
            ErrorCode::PortKindMismatch => "PORT_KIND_MISMATCH",
            ErrorCode::DuplicatePortConnection => "DUPLICATE_PORT_CONNECTION",
            ErrorCode::MissingRequiredInput => "MISSING_REQUIRED_INPUT",
            ErrorCode::CycleDetected => "CYCLE_DETECTED",
            ErrorCode::DuplicateNodeId => "DUPLICATE_NODE_ID",
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::InvalidTarget => "INVALID_TARGET",
            ErrorCode::NodeExecutionFailed => "NODE_EXECUTION_FAILED",
            ErrorCode::OrderValidationFailed => "ORDER_VALIDATION_FAILED",
        }
    }

    /// Structural codes are produced before any node runs.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ErrorCode::NodeExecutionFailed | ErrorCode::OrderValidationFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem with the shape of a strategy, found before execution begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{code}] {message}")]
pub struct StructuralError {
    pub code: ErrorCode,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

impl StructuralError {
    pub fn node(code: ErrorCode, node_id: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: Some(node_id.to_string()),
            edge_id: None,
        }
    }

    pub fn edge(code: ErrorCode, edge_id: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
            edge_id: Some(edge_id.to_string()),
        }
    }

    pub fn global(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            node_id: None,
            edge_id: None,
        }
    }
}

/// Errors raised by a node handler while it runs.
#[derive(Error, Debug, Clone)]
pub enum NodeError {
    #[error("Required input '{0}' is not available")]
    MissingInput(String),

    #[error("Input '{port}' expected {expected}, but found value '{found}'")]
    InvalidInput {
        port: String,
        expected: String,
        found: Value,
    },

    #[error("Invalid node configuration: {0}")]
    InvalidConfig(String),

    #[error("Pair '{0}' is not listed by the market data provider")]
    UnknownPair(String),

    #[error("Market data request failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Exchange request failed: {0}")]
    Exchange(#[from] ExchangeError),
}

/// Errors surfaced by a `MarketDataProvider`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("No {kind} data available for pair '{pair}'")]
    Unavailable { kind: String, pair: String },

    #[error("Market data request for '{pair}' failed: {message}")]
    Request { pair: String, message: String },
}

/// Errors surfaced by an `ExchangeAdapter`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Exchange rejected the request: {0}")]
    Rejected(String),

    #[error("Exchange transport failed: {0}")]
    Transport(String),

    #[error("Operation '{0}' is not permitted by this adapter")]
    NotPermitted(String),
}

/// Errors that can occur while loading fixture data.
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Could not read fixture file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
