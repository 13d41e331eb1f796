use super::{ExecutionResult, LogEntry, NodeStatus};
use crate::strategy::Value;
use itertools::Itertools;

/// Formats execution results into human-readable strings
pub struct ReportFormatter;

impl ReportFormatter {
    /// One line per visited node, followed by errors and warnings.
    pub fn format_summary(result: &ExecutionResult) -> String {
        let mut out = format!(
            "{} run {} ({} of {} nodes executed)\n",
            result.mode,
            if result.success { "succeeded" } else { "failed" },
            result.nodes_executed,
            result.log.len()
        );

        for entry in &result.log {
            out.push_str(&Self::format_entry(entry));
            out.push('\n');
        }

        if !result.action_intents.is_empty() {
            out.push_str("intents:\n");
            for intent in &result.action_intents {
                let marker = if intent.executed { "executed" } else { "recorded" };
                out.push_str(&format!(
                    "  {} {:?} {} {}\n",
                    intent.node_id, intent.action, marker, intent.params
                ));
            }
        }

        for error in &result.errors {
            let location = error.node_id.as_deref().or(error.edge_id.as_deref());
            let line = match location {
                Some(id) => format!("error [{}] {}: {}", error.code, id, error.message),
                None => format!("error [{}] {}", error.code, error.message),
            };
            out.push_str(&line);
            out.push('\n');
        }
        for warning in &result.warnings {
            match &warning.node_id {
                Some(id) => out.push_str(&format!("warning {}: {}\n", id, warning.message)),
                None => out.push_str(&format!("warning: {}\n", warning.message)),
            }
        }
        out
    }

    fn format_entry(entry: &LogEntry) -> String {
        let marker = match entry.status {
            NodeStatus::Executed => "+",
            NodeStatus::Skipped => "-",
            NodeStatus::Error => "!",
        };
        let outputs = entry
            .outputs
            .iter()
            .map(|(port, value)| format!("{}={}", port, Self::format_value(value)))
            .join(", ");

        let mut line = format!(
            "{} {} ({}) [{}ms]",
            marker, entry.node_id, entry.node_type, entry.duration_ms
        );
        if !outputs.is_empty() {
            line.push_str(&format!(" -> {}", outputs));
        }
        if let Some(message) = &entry.message {
            line.push_str(&format!(" # {}", message));
        }
        line
    }

    /// Format a value for display.
    fn format_value(value: &Value) -> String {
        match value {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Series(s) if s.len() > 4 => format!(
                "[{} .. {}; {} values]",
                Self::format_value(&Value::Number(s[0])),
                Self::format_value(&Value::Number(s[s.len() - 1])),
                s.len()
            ),
            Value::Series(s) => format!(
                "[{}]",
                s.iter()
                    .map(|n| Self::format_value(&Value::Number(*n)))
                    .join(", ")
            ),
            Value::String(s) => format!("\"{}\"", s),
            Value::Bool(b) => format!("{}", b),
            Value::Null => "null".to_string(),
        }
    }
}
