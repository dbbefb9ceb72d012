// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Domain Events
//!
//! Events are immutable facts about what was declared. They are past tense
//! (`ComputeUnitDeclared`, not `DeclareComputeUnit`) and are only ever
//! appended to the declaration log.
//!
//! ```text
//! Spec → handler (validate) → StackEvent → declaration log → projections
//! ```

pub mod stack;

pub use stack::{
    AccessGrant, ComputeUnit, DatabaseResource, Endpoint, HealthCheck, Listener, LoadBalancer,
    MachineImage, NetworkBoundary, StackEvent, Subnet, Target, TargetGroup,
};
