// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Aggregate State
//!
//! ```text
//! Spec → handle_*() → Result<StackEvent, CommandError>
//!                           ↓
//! StackEvent → apply_event() → StackState
//! ```
//!
//! Collections are vectors in declaration order, so iteration (and every
//! projection built on it) is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::{ConstructId, ConstructPath};
use crate::events::{
    AccessGrant, ComputeUnit, DatabaseResource, Endpoint, Listener, LoadBalancer,
    NetworkBoundary, StackEvent, TargetGroup,
};

/// Immutable state of one stack, reconstructed from its declaration log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackState {
    /// Stack id (root of every construct path)
    pub stack: ConstructId,

    /// Number of events applied
    pub version: u64,

    pub networks: Vec<NetworkBoundary>,
    pub compute_units: Vec<ComputeUnit>,
    pub databases: Vec<DatabaseResource>,
    pub grants: Vec<AccessGrant>,
    pub load_balancers: Vec<LoadBalancer>,
    pub listeners: Vec<Listener>,
    pub target_groups: Vec<TargetGroup>,

    /// Every construct path declared so far
    pub declared: BTreeSet<ConstructPath>,
}

impl StackState {
    /// Empty state for a stack
    pub fn new(stack: ConstructId) -> Self {
        Self {
            stack,
            version: 0,
            networks: Vec::new(),
            compute_units: Vec::new(),
            databases: Vec::new(),
            grants: Vec::new(),
            load_balancers: Vec::new(),
            listeners: Vec::new(),
            target_groups: Vec::new(),
            declared: BTreeSet::new(),
        }
    }

    /// Reconstruct state from the declaration log
    ///
    /// ```text
    /// State = fold(Events, StackState::new(stack), apply_event)
    /// ```
    pub fn from_events(stack: ConstructId, events: &[StackEvent]) -> Self {
        events
            .iter()
            .fold(Self::new(stack), |state, event| apply_event(state, event))
    }

    /// Path of the stack itself
    pub fn root_path(&self) -> ConstructPath {
        ConstructPath::root(self.stack.clone())
    }

    // ========================================================================
    // Query Methods
    // ========================================================================

    /// The network boundary, once declared
    pub fn network(&self) -> Option<&NetworkBoundary> {
        self.networks.first()
    }

    pub fn is_declared(&self, path: &ConstructPath) -> bool {
        self.declared.contains(path)
    }

    pub fn network_at(&self, path: &ConstructPath) -> Option<&NetworkBoundary> {
        self.networks.iter().find(|n| &n.path == path)
    }

    pub fn compute_unit(&self, path: &ConstructPath) -> Option<&ComputeUnit> {
        self.compute_units.iter().find(|u| &u.path == path)
    }

    pub fn database(&self, path: &ConstructPath) -> Option<&DatabaseResource> {
        self.databases.iter().find(|d| &d.path == path)
    }

    pub fn load_balancer(&self, path: &ConstructPath) -> Option<&LoadBalancer> {
        self.load_balancers.iter().find(|l| &l.path == path)
    }

    pub fn listener(&self, path: &ConstructPath) -> Option<&Listener> {
        self.listeners.iter().find(|l| &l.path == path)
    }

    pub fn target_group(&self, path: &ConstructPath) -> Option<&TargetGroup> {
        self.target_groups.iter().find(|t| &t.path == path)
    }

    /// Listeners owned by a load balancer
    pub fn listeners_of<'a>(
        &'a self,
        load_balancer: &'a ConstructPath,
    ) -> impl Iterator<Item = &'a Listener> + 'a {
        self.listeners
            .iter()
            .filter(move |l| &l.load_balancer == load_balancer)
    }

    /// Target group attached to a listener
    pub fn target_group_of(&self, listener: &ConstructPath) -> Option<&TargetGroup> {
        self.target_groups.iter().find(|t| &t.listener == listener)
    }

    /// Check whether an endpoint refers to a declared resource of its kind
    pub fn has_endpoint(&self, endpoint: &Endpoint) -> bool {
        match endpoint {
            Endpoint::ComputeUnit(p) => self.compute_unit(p).is_some(),
            Endpoint::Database(p) => self.database(p).is_some(),
            Endpoint::LoadBalancer(p) => self.load_balancer(p).is_some(),
            Endpoint::AnyIpv4 => true,
        }
    }

    /// Grants whose destination is `endpoint`
    pub fn grants_to<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> impl Iterator<Item = &'a AccessGrant> + 'a {
        self.grants.iter().filter(move |g| &g.destination == endpoint)
    }

    /// Grants whose source is `endpoint`
    pub fn grants_from<'a>(
        &'a self,
        endpoint: &'a Endpoint,
    ) -> impl Iterator<Item = &'a AccessGrant> + 'a {
        self.grants.iter().filter(move |g| &g.source == endpoint)
    }

    /// Total number of constructs declared
    pub fn construct_count(&self) -> usize {
        self.declared.len()
    }
}

/// Apply event to state (pure function)
///
/// Never fails: the event was validated by its handler before it was
/// recorded.
pub fn apply_event(mut state: StackState, event: &StackEvent) -> StackState {
    if let Some(path) = event.construct() {
        state.declared.insert(path.clone());
    }

    match event {
        StackEvent::NetworkDeclared { network } => state.networks.push(network.clone()),
        StackEvent::ComputeUnitDeclared { unit } => state.compute_units.push(unit.clone()),
        StackEvent::DatabaseDeclared { database } => state.databases.push(database.clone()),
        StackEvent::AccessGranted { grant } => state.grants.push(grant.clone()),
        StackEvent::LoadBalancerDeclared { load_balancer } => {
            state.load_balancers.push(load_balancer.clone())
        }
        StackEvent::ListenerAdded { listener } => state.listeners.push(listener.clone()),
        StackEvent::TargetGroupAttached { target_group } => {
            state.target_groups.push(target_group.clone())
        }
    }

    state.version += 1;
    state
}
