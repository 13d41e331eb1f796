use crate::error::{ErrorCode, StructuralError};
use crate::registry::{HandlerRegistry, NodeHandler};
use crate::scheduler::{GraphIndex, Scope};
use crate::strategy::{EdgeDefinition, EdgeKind, Strategy, Value};
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Structural checks run before any node executes.
///
/// Findings come back in a fixed order (node checks, edge checks, target, inputs,
/// cycles), each group sorted by id, so the same strategy always yields the same list.
pub struct Validator<'r> {
    registry: &'r HandlerRegistry,
    target: Option<String>,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r HandlerRegistry) -> Self {
        Self {
            registry,
            target: None,
        }
    }

    pub fn with_target(mut self, target: Option<&str>) -> Self {
        self.target = target.map(str::to_string);
        self
    }

    pub fn validate(&self, strategy: &Strategy) -> Vec<StructuralError> {
        let mut errors = Vec::new();
        let index = GraphIndex::new(strategy);

        self.check_nodes(strategy, &mut errors);
        self.check_edges(strategy, &index, &mut errors);

        match index.scope(self.registry, self.target.as_deref()) {
            Ok(scope) => self.check_required_inputs(&index, &scope, &mut errors),
            Err(invalid_target) => {
                errors.push(invalid_target);
                if let Ok(scope) = index.scope(self.registry, None) {
                    self.check_required_inputs(&index, &scope, &mut errors);
                }
            }
        }

        self.check_cycles(&index, &mut errors);
        errors
    }

    fn handler_for(&self, index: &GraphIndex<'_>, id: &str) -> Option<&Arc<dyn NodeHandler>> {
        index
            .node(id)
            .and_then(|node| self.registry.resolve(&node.node_type))
    }

    fn check_nodes(&self, strategy: &Strategy, errors: &mut Vec<StructuralError>) {
        let mut seen = AHashSet::new();
        for node in strategy.nodes.iter().sorted_by(|a, b| a.id.cmp(&b.id)) {
            if !seen.insert(node.id.as_str()) {
                errors.push(StructuralError::node(
                    ErrorCode::DuplicateNodeId,
                    &node.id,
                    format!("Node id '{}' is used more than once", node.id),
                ));
                continue;
            }

            let Some(handler) = self.registry.resolve(&node.node_type) else {
                errors.push(StructuralError::node(
                    ErrorCode::UnknownNodeType,
                    &node.id,
                    format!("Node '{}' has unknown type '{}'", node.id, node.node_type),
                ));
                continue;
            };

            if let Err(reason) = handler.validate_config(node) {
                errors.push(StructuralError::node(
                    ErrorCode::InvalidConfig,
                    &node.id,
                    format!("Node '{}' has an invalid config: {}", node.id, reason),
                ));
            }
        }
    }

    fn check_edges(
        &self,
        strategy: &Strategy,
        index: &GraphIndex<'_>,
        errors: &mut Vec<StructuralError>,
    ) {
        let mut data_targets: BTreeMap<(&str, &str), &str> = BTreeMap::new();

        for edge in strategy.edges.iter().sorted_by(|a, b| a.id.cmp(&b.id)) {
            let mut missing = Vec::new();
            if !index.contains(&edge.source) {
                missing.push(edge.source.as_str());
            }
            if !index.contains(&edge.target) {
                missing.push(edge.target.as_str());
            }
            if !missing.is_empty() {
                errors.push(StructuralError::edge(
                    ErrorCode::DanglingEdge,
                    &edge.id,
                    format!(
                        "Edge '{}' references missing node(s) {}",
                        edge.id,
                        missing.iter().map(|id| format!("'{}'", id)).join(", ")
                    ),
                ));
                continue;
            }

            if let (Some(source), Some(target)) = (
                self.handler_for(index, &edge.source),
                self.handler_for(index, &edge.target),
            ) {
                if let Some(error) = Self::check_ports(edge, source.as_ref(), target.as_ref()) {
                    errors.push(error);
                    continue;
                }
            }

            if edge.kind == EdgeKind::Data {
                let slot = (edge.target.as_str(), edge.target_port.as_str());
                if let Some(first) = data_targets.get(&slot) {
                    errors.push(StructuralError::edge(
                        ErrorCode::DuplicatePortConnection,
                        &edge.id,
                        format!(
                            "Input '{}' of node '{}' is already fed by edge '{}'",
                            edge.target_port, edge.target, first
                        ),
                    ));
                } else {
                    data_targets.insert(slot, edge.id.as_str());
                }
            }
        }
    }

    fn check_ports(
        edge: &EdgeDefinition,
        source: &dyn NodeHandler,
        target: &dyn NodeHandler,
    ) -> Option<StructuralError> {
        let dangling = |node: &str, port: &str, direction: &str| {
            StructuralError::edge(
                ErrorCode::DanglingEdge,
                &edge.id,
                format!(
                    "Edge '{}' uses {} port '{}' which node '{}' does not declare",
                    edge.id, direction, port, node
                ),
            )
        };
        let Some(out) = source.output_port(&edge.source_port) else {
            return Some(dangling(&edge.source, &edge.source_port, "output"));
        };
        let Some(input) = target.input_port(&edge.target_port) else {
            return Some(dangling(&edge.target, &edge.target_port, "input"));
        };

        let mismatch = |message: String| {
            Some(StructuralError::edge(
                ErrorCode::PortKindMismatch,
                &edge.id,
                message,
            ))
        };
        if out.kind != edge.kind || input.kind != edge.kind {
            return mismatch(format!(
                "{} edge '{}' connects {} port '{}' to {} port '{}'",
                edge.kind, edge.id, out.kind, out.id, input.kind, input.id
            ));
        }
        if let (Some(from), Some(to)) = (out.data_type, input.data_type) {
            if !from.can_feed(to) {
                return mismatch(format!(
                    "Edge '{}' wires {} output '{}' into {} input '{}'",
                    edge.id, from, out.id, to, input.id
                ));
            }
        }
        None
    }

    /// A required input needs a usable config value or exactly one data edge whose
    /// source takes part in the run.
    fn check_required_inputs(
        &self,
        index: &GraphIndex<'_>,
        scope: &Scope<'_>,
        errors: &mut Vec<StructuralError>,
    ) {
        for id in scope.all() {
            let (Some(node), Some(handler)) = (index.node(id), self.handler_for(index, id)) else {
                continue;
            };
            let required = handler
                .ports()
                .iter()
                .filter(|p| p.is_data_input() && p.required);
            for port in required {
                let configured = node.config_value(port.id);
                if configured.and_then(Value::from_json).is_some() {
                    continue;
                }
                let (live, idle): (Vec<&EdgeDefinition>, Vec<&EdgeDefinition>) = index
                    .data_incoming(id)
                    .iter()
                    .copied()
                    .filter(|e| e.target_port == port.id)
                    .partition(|e| scope.contains(&e.source));
                if live.len() == 1 {
                    continue;
                }

                let detail = match (live.len(), idle.is_empty(), configured.is_some()) {
                    (0, false, _) => format!(
                        "only connected to {}, which never runs",
                        idle.iter().map(|e| format!("'{}'", e.source)).join(", ")
                    ),
                    (0, true, true) => "configured with a value it cannot use".to_string(),
                    (0, true, false) => "neither configured nor connected".to_string(),
                    (n, _, _) => format!("not configured and fed by {} edges", n),
                };
                errors.push(StructuralError::node(
                    ErrorCode::MissingRequiredInput,
                    id,
                    format!(
                        "Node '{}' ({}) requires input '{}', which is {}",
                        id, node.node_type, port.id, detail
                    ),
                ));
            }
        }
    }

    /// Depth-first search along control edges from every start node. Each back edge
    /// found yields one error naming the cycle it closes. Nodes no start can reach
    /// never run, so a loop among them is left alone.
    fn check_cycles(&self, index: &GraphIndex<'_>, errors: &mut Vec<StructuralError>) {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Open,
            Done,
        }

        let next_of = |id: &str| {
            index
                .control_outgoing(id)
                .iter()
                .map(|e| e.target.as_str())
                .dedup()
                .collect::<Vec<_>>()
                .into_iter()
        };

        let mut marks: AHashMap<&str, Mark> = AHashMap::new();
        for root in index.starts(self.registry) {
            if marks.contains_key(root) {
                continue;
            }
            let mut path = vec![root];
            let mut stack = vec![(root, next_of(root))];
            marks.insert(root, Mark::Open);

            while let Some((id, children)) = stack.last_mut() {
                let id = *id;
                match children.next() {
                    Some(child) => match marks.get(child) {
                        Some(Mark::Open) => {
                            let start = path.iter().position(|n| *n == child).unwrap_or(0);
                            let cycle = path[start..].iter().chain([&child]).join(" -> ");
                            errors.push(StructuralError::node(
                                ErrorCode::CycleDetected,
                                child,
                                format!("Strategy contains a cycle: {}", cycle),
                            ));
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(child, Mark::Open);
                            path.push(child);
                            stack.push((child, next_of(child)));
                        }
                    },
                    None => {
                        marks.insert(id, Mark::Done);
                        path.pop();
                        stack.pop();
                    }
                }
            }
        }
    }
}
