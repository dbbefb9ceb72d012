// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Dependency Graph
//!
//! Nodes are declared constructs (plus `0.0.0.0/0` once something grants it
//! access). Edges come in two flavours:
//!
//! - **Structural** (`PlacedIn`, `BelongsTo`, `RoutesTo`): the source depends
//!   on the target and must be provisioned after it
//! - **Access** (`Grants`): traffic may flow from source to target; no
//!   ordering implied
//!
//! Nodes are keyed by path string and kept in a `BTreeMap`, edges in
//! declaration order, so the graph and its topological order are
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::pure::{fold_projection, LogLevel, SideEffect};
use crate::domain::{ConstructPath, Port};
use crate::events::{Endpoint, StackEvent};

/// What a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Network,
    ComputeUnit,
    Database,
    LoadBalancer,
    Listener,
    TargetGroup,
    /// Any IPv4 address
    Internet,
}

/// Relationship between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    /// Resource lives inside a network
    PlacedIn,
    /// Listener of a load balancer, target group of a listener
    BelongsTo,
    /// Target group forwards to a compute unit
    RoutesTo { port: u16 },
    /// Source may open connections to the target
    Grants { port: Port },
}

impl EdgeKind {
    /// Structural edges order provisioning
    pub fn is_dependency(&self) -> bool {
        !matches!(self, Self::Grants { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    #[serde(flatten)]
    pub kind: EdgeKind,
}

/// Dependency graph of a stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGraph {
    pub nodes: BTreeMap<String, NodeKind>,
    pub edges: Vec<GraphEdge>,
}

impl ResourceGraph {
    /// Project a declaration log
    pub fn from_events(events: &[StackEvent]) -> Self {
        fold_projection(graph_projection, Self::default(), events).0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, key: &str) -> Option<NodeKind> {
        self.nodes.get(key).copied()
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(key, _)| key.as_str())
    }

    /// Access edges, in declaration order
    pub fn grants(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(|e| !e.kind.is_dependency())
    }

    /// Routing edges, in declaration order
    pub fn routes(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges
            .iter()
            .filter(|e| matches!(e.kind, EdgeKind::RoutesTo { .. }))
    }

    /// Nodes `key` directly depends on
    pub fn dependencies(&self, key: &str) -> BTreeSet<&str> {
        self.edges
            .iter()
            .filter(|e| e.kind.is_dependency() && e.from == key)
            .map(|e| e.to.as_str())
            .collect()
    }

    /// Nodes that directly depend on `key`
    pub fn dependents(&self, key: &str) -> BTreeSet<&str> {
        self.edges
            .iter()
            .filter(|e| e.kind.is_dependency() && e.to == key)
            .map(|e| e.from.as_str())
            .collect()
    }

    /// Provisioning order, dependencies first
    ///
    /// Kahn's algorithm with a sorted ready set, so ties are broken by key.
    /// Returns `None` if the structural edges contain a cycle.
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        let mut pending: BTreeMap<&str, usize> = self
            .nodes
            .keys()
            .map(|k| (k.as_str(), self.dependencies(k).len()))
            .collect();

        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, n)| **n == 0)
            .map(|(k, _)| *k)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(next) = ready.pop_first() {
            pending.remove(next);
            order.push(next);

            for dependent in self.dependents(next) {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if pending.is_empty() {
            Some(order)
        } else {
            None
        }
    }

    fn add_node(&mut self, path: &ConstructPath, kind: NodeKind) {
        self.nodes.insert(path.to_string(), kind);
    }

    fn add_edge(&mut self, from: &ConstructPath, to: &ConstructPath, kind: EdgeKind) {
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
    }
}

fn endpoint_node(graph: &mut ResourceGraph, endpoint: &Endpoint) -> String {
    let key = endpoint.to_string();
    if *endpoint == Endpoint::AnyIpv4 {
        graph.nodes.insert(key.clone(), NodeKind::Internet);
    }
    key
}

/// Pure graph projection
///
/// Dependency edges point from the dependent construct to the construct it
/// needs.
pub fn graph_projection(
    mut graph: ResourceGraph,
    event: &StackEvent,
) -> (ResourceGraph, Vec<SideEffect>) {
    match event {
        StackEvent::NetworkDeclared { network } => {
            graph.add_node(&network.path, NodeKind::Network);
        }
        StackEvent::ComputeUnitDeclared { unit } => {
            graph.add_node(&unit.path, NodeKind::ComputeUnit);
            graph.add_edge(&unit.path, &unit.network, EdgeKind::PlacedIn);
        }
        StackEvent::DatabaseDeclared { database } => {
            graph.add_node(&database.path, NodeKind::Database);
            graph.add_edge(&database.path, &database.network, EdgeKind::PlacedIn);
        }
        StackEvent::AccessGranted { grant } => {
            let from = endpoint_node(&mut graph, &grant.source);
            let to = endpoint_node(&mut graph, &grant.destination);
            graph.edges.push(GraphEdge {
                from,
                to,
                kind: EdgeKind::Grants { port: grant.port },
            });
        }
        StackEvent::LoadBalancerDeclared { load_balancer } => {
            graph.add_node(&load_balancer.path, NodeKind::LoadBalancer);
            graph.add_edge(&load_balancer.path, &load_balancer.network, EdgeKind::PlacedIn);
        }
        StackEvent::ListenerAdded { listener } => {
            graph.add_node(&listener.path, NodeKind::Listener);
            graph.add_edge(&listener.path, &listener.load_balancer, EdgeKind::BelongsTo);
        }
        StackEvent::TargetGroupAttached { target_group } => {
            graph.add_node(&target_group.path, NodeKind::TargetGroup);
            graph.add_edge(&target_group.path, &target_group.listener, EdgeKind::BelongsTo);
            for target in &target_group.targets {
                graph.add_edge(
                    &target_group.path,
                    &target.unit,
                    EdgeKind::RoutesTo { port: target.port },
                );
            }
        }
    }

    let effects = vec![SideEffect::log(
        LogLevel::Debug,
        format!(
            "graph: {} ({} nodes, {} edges)",
            event.event_type(),
            graph.node_count(),
            graph.edge_count()
        ),
    )];

    (graph, effects)
}
