use super::{
    ActionIntent, ActionOutcome, ErrorEntry, ExecutionResult, LogEntry, NodeStatus, WarningEntry,
};
use crate::context::{ExecutionContext, ExecutionMode};
use crate::error::{ErrorCode, StructuralError};
use crate::registry::ActionEffect;
use chrono::{DateTime, Utc};

/// Accumulates one run's report in visitation order.
#[derive(Debug)]
pub struct ResultBuilder {
    mode: ExecutionMode,
    started_at: DateTime<Utc>,
    fail_on_validation_error: bool,
    nodes_executed: usize,
    log: Vec<LogEntry>,
    errors: Vec<ErrorEntry>,
    warnings: Vec<WarningEntry>,
    action_intents: Vec<ActionIntent>,
    kraken_validations: Option<Vec<ActionOutcome>>,
    live_actions: Option<Vec<ActionOutcome>>,
}

impl ResultBuilder {
    pub fn for_context(ctx: &ExecutionContext) -> Self {
        let validating = ctx.mode == ExecutionMode::DryRun && ctx.validate;
        Self {
            mode: ctx.mode,
            started_at: Utc::now(),
            fail_on_validation_error: ctx.fail_on_validation_error,
            nodes_executed: 0,
            log: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            action_intents: Vec::new(),
            kraken_validations: validating.then(Vec::new),
            live_actions: ctx.is_live().then(Vec::new),
        }
    }

    /// Closes the report without running anything.
    pub fn fail_structurally(mut self, errors: Vec<StructuralError>) -> ExecutionResult {
        self.errors.extend(errors.into_iter().map(ErrorEntry::from));
        self.log.clear();
        self.nodes_executed = 0;
        self.finish()
    }

    pub fn log(&mut self, entry: LogEntry) {
        if entry.status != NodeStatus::Skipped {
            self.nodes_executed += 1;
        }
        self.log.push(entry);
    }

    pub fn error(&mut self, code: ErrorCode, node_id: &str, message: impl Into<String>) {
        self.errors.push(ErrorEntry {
            code,
            message: message.into(),
            node_id: Some(node_id.to_string()),
            edge_id: None,
        });
    }

    pub fn warning(&mut self, node_id: Option<&str>, message: impl Into<String>) {
        self.warnings.push(WarningEntry {
            node_id: node_id.map(str::to_string),
            message: message.into(),
        });
    }

    /// Files an action node's intent and adapter outcomes.
    ///
    /// Returns the error the node must be failed with, if any: a failed live call
    /// always fails the node, a rejected validation only when the context asks for it.
    pub fn record_action(&mut self, effect: ActionEffect) -> Option<(ErrorCode, String)> {
        let node_id = effect.intent.node_id.clone();
        self.action_intents.push(effect.intent);
        let mut failure = None;

        if let Some(outcome) = effect.validation {
            if !outcome.is_ok() {
                let message =
                    format!("validation of '{}' was rejected: {}", node_id, outcome.detail);
                if self.fail_on_validation_error {
                    failure = Some((ErrorCode::OrderValidationFailed, message));
                } else {
                    self.warning(Some(node_id.as_str()), message);
                }
            }
            if let Some(validations) = self.kraken_validations.as_mut() {
                validations.push(outcome);
            }
        }

        if let Some(outcome) = effect.live {
            if !outcome.is_ok() {
                failure = Some((
                    ErrorCode::NodeExecutionFailed,
                    format!("live action of '{}' failed: {}", node_id, outcome.detail),
                ));
            }
            if let Some(live) = self.live_actions.as_mut() {
                live.push(outcome);
            }
        }

        failure
    }

    pub fn nodes_executed(&self) -> usize {
        self.nodes_executed
    }

    pub fn finish(self) -> ExecutionResult {
        ExecutionResult {
            success: self.errors.is_empty(),
            mode: self.mode,
            started_at: self.started_at,
            completed_at: Utc::now(),
            nodes_executed: self.nodes_executed,
            log: self.log,
            errors: self.errors,
            warnings: self.warnings,
            action_intents: self.action_intents,
            kraken_validations: self.kraken_validations,
            live_actions: self.live_actions,
        }
    }
}
