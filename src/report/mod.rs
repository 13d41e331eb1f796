use crate::context::ExecutionMode;
use crate::error::{ErrorCode, ExchangeError, StructuralError};
use crate::strategy::Value;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

mod builder;
mod formatter;

pub use builder::ResultBuilder;
pub use formatter::ReportFormatter;

/// Final state of a node in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Executed,
    Skipped,
    Error,
}

/// One visited node, in visitation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub node_id: String,
    pub node_type: String,
    pub inputs: BTreeMap<String, Value>,
    pub outputs: BTreeMap<String, Value>,
    pub duration_ms: u64,
    pub status: NodeStatus,
    /// Why the node was skipped or failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
}

impl From<StructuralError> for ErrorEntry {
    fn from(err: StructuralError) -> Self {
        Self {
            code: err.code,
            message: err.message,
            node_id: err.node_id,
            edge_id: err.edge_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    PlaceOrder,
    CancelOrder,
    LogIntent,
}

/// A recorded description of an order action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionIntent {
    pub node_id: String,
    pub action: ActionKind,
    pub params: serde_json::Value,
    /// `true` only when a live call reached the exchange and succeeded.
    pub executed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// The adapter's answer to a validation or live call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub node_id: String,
    pub action: ActionKind,
    pub status: OutcomeStatus,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl ActionOutcome {
    pub fn from_response(
        node_id: &str,
        action: ActionKind,
        response: Result<serde_json::Value, ExchangeError>,
    ) -> Self {
        match response {
            Ok(body) => Self {
                node_id: node_id.to_string(),
                action,
                status: OutcomeStatus::Ok,
                detail: describe_response(&body),
                response: Some(body),
            },
            Err(e) => Self {
                node_id: node_id.to_string(),
                action,
                status: OutcomeStatus::Error,
                detail: e.to_string(),
                response: None,
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == OutcomeStatus::Ok
    }
}

/// Prefers the exchange's own order description, then the txid list.
fn describe_response(body: &serde_json::Value) -> String {
    if let Some(order) = body.pointer("/descr/order").and_then(|v| v.as_str()) {
        return order.to_string();
    }
    match body.get("txid") {
        Some(serde_json::Value::Array(ids)) if !ids.is_empty() => ids
            .iter()
            .filter_map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        Some(serde_json::Value::String(id)) => id.clone(),
        _ => "accepted".to_string(),
    }
}

/// The structured trace of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub nodes_executed: usize,
    pub log: Vec<LogEntry>,
    pub errors: Vec<ErrorEntry>,
    pub warnings: Vec<WarningEntry>,
    pub action_intents: Vec<ActionIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kraken_validations: Option<Vec<ActionOutcome>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_actions: Option<Vec<ActionOutcome>>,
}

impl ExecutionResult {
    pub fn entry(&self, node_id: &str) -> Option<&LogEntry> {
        self.log.iter().find(|e| e.node_id == node_id)
    }

    pub fn status_of(&self, node_id: &str) -> Option<NodeStatus> {
        self.entry(node_id).map(|e| e.status)
    }

    /// Node ids in visitation order.
    pub fn visited(&self) -> Vec<&str> {
        self.log.iter().map(|e| e.node_id.as_str()).collect()
    }

    /// The message a caller should surface when the run failed.
    pub fn primary_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
