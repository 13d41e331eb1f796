use crate::context::ExecutionContext;
use crate::error::{ErrorCode, StructuralError};
use crate::registry::{HandlerContext, HandlerRegistry, HandlerSettings, NodeOutcome};
use crate::report::{ExecutionResult, LogEntry, NodeStatus, ResultBuilder};
use crate::scheduler::{Disposition, ExecutionPlan, GraphIndex, Scheduler};
use crate::strategy::{NodeDefinition, Strategy};
use crate::validator::Validator;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

mod inputs;

use inputs::{Produced, Resolution};

/// Validates, schedules and runs strategies.
///
/// An executor holds no per-run state, so one instance can serve many concurrent runs.
#[derive(Clone, Default)]
pub struct Executor {
    registry: HandlerRegistry,
    settings: HandlerSettings,
}

pub struct ExecutorBuilder {
    registry: HandlerRegistry,
    settings: HandlerSettings,
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            settings: HandlerSettings::default(),
        }
    }

    /// Lets strategies use `user_type_name` for the built-in `canonical_type_name`.
    pub fn with_type_mapping(mut self, user_type_name: &str, canonical_type_name: &str) -> Self {
        if !self.registry.map_type(user_type_name, canonical_type_name) {
            warn!(
                user_type = user_type_name,
                canonical_type = canonical_type_name,
                "ignoring type mapping to an unknown node type"
            );
        }
        self
    }

    /// Order book levels requested by depth nodes without a `count`.
    pub fn with_default_depth(mut self, count: u32) -> Self {
        self.settings.default_depth = count.max(1);
        self
    }

    /// Candle interval in minutes for OHLC nodes without an `interval`.
    pub fn with_default_ohlc_interval(mut self, minutes: u32) -> Self {
        self.settings.default_ohlc_interval = minutes.max(1);
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            registry: self.registry,
            settings: self.settings,
        }
    }
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &HandlerSettings {
        &self.settings
    }

    /// Structural errors of `strategy`; empty when it may run.
    pub fn validate(&self, strategy: &Strategy, target: Option<&str>) -> Vec<StructuralError> {
        Validator::new(&self.registry)
            .with_target(target)
            .validate(strategy)
    }

    /// The visitation order of a run in which every branch is taken.
    pub fn schedule(
        &self,
        strategy: &Strategy,
        target: Option<&str>,
    ) -> Result<Vec<String>, Vec<StructuralError>> {
        let errors = self.validate(strategy, target);
        if !errors.is_empty() {
            return Err(errors);
        }
        let index = GraphIndex::new(strategy);
        let scope = index
            .scope(&self.registry, target)
            .map_err(|e| vec![e])?;
        let plan = ExecutionPlan::build(&index, &scope);
        Ok(plan.static_order().into_iter().map(str::to_string).collect())
    }

    /// Runs `strategy` and reports what every visited node did.
    ///
    /// Structural problems abort before any node runs. Runtime failures stay local to
    /// the failing node and whatever depends on it.
    #[instrument(
        skip_all,
        fields(strategy = %strategy.metadata.name, mode = %ctx.mode, target = ?ctx.target())
    )]
    pub async fn execute(&self, strategy: &Strategy, ctx: &ExecutionContext) -> ExecutionResult {
        let mut report = ResultBuilder::for_context(ctx);
        info!(nodes = strategy.nodes.len(), edges = strategy.edges.len(), "starting run");

        let errors = self.validate(strategy, ctx.target());
        if !errors.is_empty() {
            warn!(errors = errors.len(), "strategy rejected by validation");
            return report.fail_structurally(errors);
        }

        let index = GraphIndex::new(strategy);
        let scope = match index.scope(&self.registry, ctx.target()) {
            Ok(scope) => scope,
            Err(error) => return report.fail_structurally(vec![error]),
        };
        if scope.starts.is_empty() {
            warn!("no reachable start node");
            report.warning(None, "strategy has no reachable control.start node; nothing ran");
        }

        let plan = ExecutionPlan::build(&index, &scope);
        let mut scheduler = Scheduler::new(&plan);
        let mut produced = Produced::default();
        let handler_ctx = HandlerContext {
            execution: ctx,
            settings: &self.settings,
        };

        while let Some(visit) = scheduler.next() {
            let Some(node) = index.node(&plan.nodes[visit.index].id) else {
                scheduler.halt(visit.index);
                continue;
            };
            let Some(handler) = self.registry.resolve(&node.node_type) else {
                scheduler.halt(visit.index);
                continue;
            };

            if visit.disposition == Disposition::Skip {
                debug!(node = %node.id, "skipped: no active incoming control edge");
                report.log(skipped(node, "no incoming control edge was activated"));
                continue;
            }

            let inputs = match inputs::resolve(node, handler.as_ref(), &index, &produced) {
                Resolution::Ready { inputs, warnings } => {
                    for message in warnings {
                        report.warning(Some(node.id.as_str()), message);
                    }
                    inputs
                }
                Resolution::Blocked { port, source } => {
                    let message = format!(
                        "required input '{}' depends on '{}', which produced no value",
                        port, source
                    );
                    warn!(node = %node.id, %message, "skipping node");
                    report.warning(Some(node.id.as_str()), message.clone());
                    report.log(skipped(node, &message));
                    scheduler.halt(visit.index);
                    continue;
                }
            };

            let started = Instant::now();
            let result = handler.run(node, &inputs, &handler_ctx).await;
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let mut entry = LogEntry {
                node_id: node.id.clone(),
                node_type: node.node_type.clone(),
                inputs: inputs.into_map(),
                outputs: BTreeMap::new(),
                duration_ms,
                status: NodeStatus::Executed,
                message: None,
            };

            match result {
                Ok(NodeOutcome {
                    outputs,
                    activation,
                    warnings,
                    effect,
                }) => {
                    for message in warnings {
                        warn!(node = %node.id, %message);
                        report.warning(Some(node.id.as_str()), message);
                    }
                    entry.outputs = outputs;
                    let failure = effect.and_then(|effect| report.record_action(effect));

                    match failure {
                        None => {
                            produced.insert(node.id.clone(), entry.outputs.clone());
                            scheduler.complete(visit.index, &activation);
                        }
                        Some((code, message)) => {
                            warn!(node = %node.id, %code, %message, "action failed");
                            report.error(code, &node.id, message.clone());
                            entry.status = NodeStatus::Error;
                            entry.message = Some(message);
                            scheduler.halt(visit.index);
                        }
                    }
                }
                Err(error) => {
                    let message = format!(
                        "Node '{}' ({}) failed: {}",
                        node.id, node.node_type, error
                    );
                    warn!(node = %node.id, %error, "node failed");
                    report.error(ErrorCode::NodeExecutionFailed, &node.id, message.clone());
                    entry.status = NodeStatus::Error;
                    entry.message = Some(message);
                    scheduler.halt(visit.index);
                }
            }

            debug!(
                node = %entry.node_id,
                node_type = %entry.node_type,
                status = ?entry.status,
                duration_ms,
                "visited node"
            );
            report.log(entry);
        }

        for index in scheduler.undecided() {
            report.warning(
                Some(plan.nodes[index].id.as_str()),
                "node was never reached by the control walk",
            );
        }

        let result = report.finish();
        info!(
            success = result.success,
            nodes_executed = result.nodes_executed,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "run finished"
        );
        result
    }
}

fn skipped(node: &NodeDefinition, reason: &str) -> LogEntry {
    LogEntry {
        node_id: node.id.clone(),
        node_type: node.node_type.clone(),
        inputs: BTreeMap::new(),
        outputs: BTreeMap::new(),
        duration_ms: 0,
        status: NodeStatus::Skipped,
        message: Some(reason.to_string()),
    }
}
