//! Branch-aware walk over an [`ExecutionPlan`].
//!
//! Each control edge is pending until its source settles it. A node becomes runnable
//! as soon as one incoming edge is active (OR-join), and is skipped once all of them
//! are dead. Runnable and skipped nodes share one queue ordered by node id, so the
//! visitation order never depends on the order edges were declared in.

use crate::registry::Activation;
use std::collections::{BTreeMap, VecDeque};

mod plan;

pub use plan::{ExecutionPlan, GraphIndex, PlannedEdge, PlannedNode, Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Run,
    /// Every incoming control edge is dead.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visit {
    /// Position in `ExecutionPlan::nodes`.
    pub index: usize,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeState {
    Pending,
    Active,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeState {
    Waiting,
    Queued,
    Visited,
}

pub struct Scheduler<'p> {
    plan: &'p ExecutionPlan,
    edges: Vec<EdgeState>,
    nodes: Vec<NodeState>,
    detached: VecDeque<usize>,
    ready: BTreeMap<usize, Disposition>,
}

impl<'p> Scheduler<'p> {
    pub fn new(plan: &'p ExecutionPlan) -> Self {
        let mut nodes = vec![NodeState::Waiting; plan.nodes.len()];
        let mut detached = VecDeque::new();
        let mut ready = BTreeMap::new();

        for (index, node) in plan.nodes.iter().enumerate() {
            if node.detached {
                detached.push_back(index);
                nodes[index] = NodeState::Queued;
            } else if node.start {
                ready.insert(index, Disposition::Run);
                nodes[index] = NodeState::Queued;
            }
        }

        Self {
            plan,
            edges: vec![EdgeState::Pending; plan.edges.len()],
            nodes,
            detached,
            ready,
        }
    }

    /// Pops the next node to visit. Detached sources come first.
    ///
    /// A `Skip` visit is settled immediately. A `Run` visit must be answered with
    /// [`complete`](Self::complete) or [`halt`](Self::halt) before the walk can
    /// make progress past it.
    pub fn next(&mut self) -> Option<Visit> {
        if let Some(index) = self.detached.pop_front() {
            self.nodes[index] = NodeState::Visited;
            return Some(Visit {
                index,
                disposition: Disposition::Run,
            });
        }

        let (index, disposition) = self.ready.pop_first()?;
        self.nodes[index] = NodeState::Visited;
        if disposition == Disposition::Skip {
            self.halt(index);
        }
        Some(Visit { index, disposition })
    }

    /// Settles the node's outgoing edges according to the ports it activated.
    pub fn complete(&mut self, index: usize, activation: &Activation) {
        let plan = self.plan;
        for &edge in &plan.nodes[index].outgoing {
            let state = if activation.activates(&plan.edges[edge].source_port) {
                EdgeState::Active
            } else {
                EdgeState::Dead
            };
            self.settle(edge, state);
        }
    }

    /// Kills every outgoing edge of a node that was skipped or failed.
    pub fn halt(&mut self, index: usize) {
        let plan = self.plan;
        for &edge in &plan.nodes[index].outgoing {
            self.settle(edge, EdgeState::Dead);
        }
    }

    fn settle(&mut self, edge: usize, state: EdgeState) {
        if self.edges[edge] != EdgeState::Pending {
            return;
        }
        self.edges[edge] = state;

        let target = self.plan.edges[edge].target;
        if self.nodes[target] != NodeState::Waiting {
            return;
        }
        let incoming = &self.plan.nodes[target].incoming;
        let disposition = if incoming
            .iter()
            .any(|&e| self.edges[e] == EdgeState::Active)
        {
            Disposition::Run
        } else if incoming.iter().all(|&e| self.edges[e] == EdgeState::Dead) {
            Disposition::Skip
        } else {
            return;
        };
        self.nodes[target] = NodeState::Queued;
        self.ready.insert(target, disposition);
    }

    /// Positions of nodes the walk never decided. Empty for an acyclic plan.
    pub fn undecided(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, state)| **state == NodeState::Waiting)
            .map(|(index, _)| index)
            .collect()
    }
}
