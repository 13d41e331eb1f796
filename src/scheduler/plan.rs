use crate::error::{ErrorCode, StructuralError};
use crate::registry::{HandlerRegistry, NodeKind};
use crate::strategy::{EdgeDefinition, EdgeKind, NodeDefinition, Strategy};
use ahash::{AHashMap, AHashSet};
use std::collections::{BTreeSet, VecDeque};

/// Id-keyed adjacency over a strategy. Edges with a missing endpoint are left out,
/// and a duplicated node id resolves to its first definition.
#[derive(Debug)]
pub struct GraphIndex<'a> {
    nodes: AHashMap<&'a str, &'a NodeDefinition>,
    control_out: AHashMap<&'a str, Vec<&'a EdgeDefinition>>,
    control_in: AHashMap<&'a str, Vec<&'a EdgeDefinition>>,
    data_in: AHashMap<&'a str, Vec<&'a EdgeDefinition>>,
}

impl<'a> GraphIndex<'a> {
    pub fn new(strategy: &'a Strategy) -> Self {
        let mut nodes = AHashMap::new();
        for node in &strategy.nodes {
            nodes.entry(node.id.as_str()).or_insert(node);
        }

        let mut control_out: AHashMap<&str, Vec<&EdgeDefinition>> = AHashMap::new();
        let mut control_in: AHashMap<&str, Vec<&EdgeDefinition>> = AHashMap::new();
        let mut data_in: AHashMap<&str, Vec<&EdgeDefinition>> = AHashMap::new();
        let known = |id: &str| nodes.contains_key(id);
        for edge in &strategy.edges {
            if !known(&edge.source) || !known(&edge.target) {
                continue;
            }
            match edge.kind {
                EdgeKind::Control => {
                    control_out.entry(edge.source.as_str()).or_default().push(edge);
                    control_in.entry(edge.target.as_str()).or_default().push(edge);
                }
                EdgeKind::Data => data_in.entry(edge.target.as_str()).or_default().push(edge),
            }
        }

        // Edge insertion order must never leak into scheduling.
        for edges in control_out
            .values_mut()
            .chain(control_in.values_mut())
            .chain(data_in.values_mut())
        {
            edges.sort_by(|a, b| {
                (&a.source, &a.target, &a.id).cmp(&(&b.source, &b.target, &b.id))
            });
        }

        Self {
            nodes,
            control_out,
            control_in,
            data_in,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a NodeDefinition> {
        self.nodes.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn control_outgoing(&self, id: &str) -> &[&'a EdgeDefinition] {
        self.control_out.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn control_incoming(&self, id: &str) -> &[&'a EdgeDefinition] {
        self.control_in.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_incoming(&self, id: &str) -> &[&'a EdgeDefinition] {
        self.data_in.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The single data edge wired into `port` of node `id`, if any.
    pub fn data_source(&self, id: &str, port: &str) -> Option<&'a EdgeDefinition> {
        self.data_incoming(id)
            .iter()
            .find(|e| e.target_port == port)
            .copied()
    }

    /// Every `control.start` node, aliases included.
    pub fn starts(&self, registry: &HandlerRegistry) -> BTreeSet<&'a str> {
        self.nodes
            .iter()
            .filter(|(_, node)| {
                registry.kind_of(&node.node_type) == Some(NodeKind::ControlStart)
            })
            .map(|(id, _)| *id)
            .collect()
    }

    /// Nodes reachable from `roots` along control edges, roots included.
    pub fn reachable<I>(&self, roots: I) -> AHashSet<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.walk(roots, true)
    }

    /// Nodes from which `id` is reachable along control edges, `id` included.
    pub fn control_ancestors(&self, id: &'a str) -> AHashSet<&'a str> {
        self.walk([id], false)
    }

    fn walk<I>(&self, roots: I, forward: bool) -> AHashSet<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = AHashSet::new();
        let mut queue: VecDeque<&'a str> = roots.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            let edges = if forward {
                self.control_outgoing(id)
            } else {
                self.control_incoming(id)
            };
            for &edge in edges {
                let next = if forward {
                    edge.target.as_str()
                } else {
                    edge.source.as_str()
                };
                if !seen.contains(next) {
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Works out which nodes take part in a run.
    ///
    /// Without a target that is everything reachable from a start node. With one it is
    /// the reachable control ancestors of the target. Detached sources feeding a scoped
    /// node over a data edge are pulled in, transitively.
    pub fn scope(
        &self,
        registry: &HandlerRegistry,
        target: Option<&str>,
    ) -> Result<Scope<'a>, StructuralError> {
        let all_starts = self.starts(registry);
        let reachable = self.reachable(all_starts.iter().copied());

        let (scheduled, starts): (BTreeSet<&str>, BTreeSet<&str>) = match target {
            None => (reachable.into_iter().collect(), all_starts),
            Some(target) => {
                let Some((&target, _)) = self.nodes.get_key_value(target) else {
                    return Err(StructuralError::node(
                        ErrorCode::InvalidTarget,
                        target,
                        format!("Target node '{}' does not exist", target),
                    ));
                };
                if !reachable.contains(target) {
                    return Err(StructuralError::node(
                        ErrorCode::InvalidTarget,
                        target,
                        format!("Target node '{}' is not reachable from a start node", target),
                    ));
                }
                let ancestors = self.control_ancestors(target);
                (
                    reachable
                        .into_iter()
                        .filter(|id| ancestors.contains(id))
                        .collect(),
                    all_starts
                        .into_iter()
                        .filter(|id| ancestors.contains(id))
                        .collect(),
                )
            }
        };

        let mut detached = BTreeSet::new();
        let mut pending: Vec<&str> = scheduled.iter().copied().collect();
        while let Some(id) = pending.pop() {
            for edge in self.data_incoming(id) {
                let source = edge.source.as_str();
                if scheduled.contains(source) || detached.contains(source) {
                    continue;
                }
                let is_detached = self
                    .node(source)
                    .and_then(|n| registry.resolve(&n.node_type))
                    .is_some_and(|h| h.is_detached_source());
                if is_detached {
                    detached.insert(source);
                    pending.push(source);
                }
            }
        }

        Ok(Scope {
            scheduled,
            detached,
            starts,
        })
    }
}

/// The node sets one run works on, each in ascending id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope<'a> {
    /// Nodes walked along control edges.
    pub scheduled: BTreeSet<&'a str>,
    /// Pure sources visited ahead of the walk.
    pub detached: BTreeSet<&'a str>,
    pub starts: BTreeSet<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn contains(&self, id: &str) -> bool {
        self.scheduled.contains(id) || self.detached.contains(id)
    }

    /// Every node in scope, ascending.
    pub fn all(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.scheduled.union(&self.detached).copied()
    }

    pub fn len(&self) -> usize {
        self.scheduled.len() + self.detached.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    pub id: String,
    pub start: bool,
    pub detached: bool,
    /// Indices into `ExecutionPlan::edges`.
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedEdge {
    pub id: String,
    pub source: usize,
    pub source_port: String,
    pub target: usize,
}

/// Scoped nodes sorted by id and addressed by position, so the position order is
/// the lexicographic id order the walk relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub nodes: Vec<PlannedNode>,
    pub edges: Vec<PlannedEdge>,
}

impl ExecutionPlan {
    pub fn build(index: &GraphIndex<'_>, scope: &Scope<'_>) -> Self {
        let mut nodes: Vec<PlannedNode> = scope
            .all()
            .map(|id| PlannedNode {
                id: id.to_string(),
                start: scope.starts.contains(id),
                detached: scope.detached.contains(id),
                incoming: Vec::new(),
                outgoing: Vec::new(),
            })
            .collect();

        let position: AHashMap<&str, usize> =
            scope.all().enumerate().map(|(i, id)| (id, i)).collect();

        let mut edges = Vec::new();
        for id in &scope.scheduled {
            for edge in index.control_outgoing(id) {
                let (Some(&source), Some(&target)) = (
                    position.get(edge.source.as_str()),
                    position.get(edge.target.as_str()),
                ) else {
                    continue;
                };
                if !scope.scheduled.contains(edge.target.as_str()) {
                    continue;
                }
                let slot = edges.len();
                edges.push(PlannedEdge {
                    id: edge.id.clone(),
                    source,
                    source_port: edge.source_port.clone(),
                    target,
                });
                nodes[source].outgoing.push(slot);
                nodes[target].incoming.push(slot);
            }
        }

        Self { nodes, edges }
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.nodes.binary_search_by(|n| n.id.as_str().cmp(id)).ok()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visitation order when every branch is taken.
    pub fn static_order(&self) -> Vec<&str> {
        let mut scheduler = super::Scheduler::new(self);
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(visit) = scheduler.next() {
            scheduler.complete(visit.index, &crate::registry::Activation::All);
            order.push(self.nodes[visit.index].id.as_str());
        }
        order
    }
}
