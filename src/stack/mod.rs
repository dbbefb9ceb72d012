// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declared Stacks
//!
//! A [`Scope`] collects declarations; [`Scope::finish`] closes it into an
//! immutable [`Stack`]. A stack is its declaration log plus the state folded
//! from it, and everything else (validation, dependency graph, template) is
//! derived from those two.

pub mod scope;

pub use scope::{
    AnyIpv4, Connectable, DatabaseProps, DatabaseRef, InstanceProps, InstanceRef,
    InstanceTarget, ListenerProps, ListenerRef, LoadBalancerProps, LoadBalancerRef,
    NetworkProps, NetworkRef, Scope, SecurityGroupRef, TargetGroupRef, TargetProps,
};

use crate::aggregate::StackState;
use crate::domain::{validate_stack, ConstructId, ValidationResult};
use crate::events::StackEvent;
use crate::projection::{project_template, ResourceGraph, SideEffect, Template};

/// Immutable result of a finished declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    state: StackState,
    events: Vec<StackEvent>,
}

impl Stack {
    pub(crate) fn from_parts(state: StackState, events: Vec<StackEvent>) -> Self {
        Self { state, events }
    }

    /// Rebuild a stack by replaying its declaration log
    pub fn from_events(name: ConstructId, events: Vec<StackEvent>) -> Self {
        let state = StackState::from_events(name, &events);
        Self { state, events }
    }

    pub fn name(&self) -> &ConstructId {
        &self.state.stack
    }

    pub fn state(&self) -> &StackState {
        &self.state
    }

    /// Declaration log, in declaration order
    pub fn events(&self) -> &[StackEvent] {
        &self.events
    }

    /// Check the whole-stack invariants
    pub fn validate(&self) -> ValidationResult {
        validate_stack(&self.state)
    }

    /// Dependency graph of the declared constructs
    pub fn graph(&self) -> ResourceGraph {
        ResourceGraph::from_events(&self.events)
    }

    /// Provisioning template plus the effects raised while projecting it
    pub fn template(&self) -> (Template, Vec<SideEffect>) {
        project_template(self.state.stack.clone(), &self.events)
    }
}
