// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Domain Models
//!
//! Value objects with validation invariants used throughout the declaration
//! of a stack.
//!
//! # Value Objects with Invariants
//!
//! - [`ConstructId`] / [`ConstructPath`] / [`LogicalId`] - construct identity
//! - [`Ipv4Cidr`] - IPv4 network block with subnet allocation
//! - [`InstanceType`] - machine size class (`t2.small`, `db.t3.small`)
//! - [`DatabaseEngine`] / [`DatabaseName`] - managed database settings
//! - [`Port`] - protocol plus port range of an access grant
//! - [`ResourceKind`] - synthesized resource taxonomy
//!
//! Whole-stack rules live in [`invariants`].

pub mod construct_id;
pub mod engine;
pub mod instance_type;
pub mod invariants;
pub mod network;
pub mod port;
pub mod resource_type;

// Re-export value objects
pub use construct_id::{ConstructId, ConstructIdError, ConstructPath, LogicalId};
pub use engine::{DatabaseEngine, DatabaseName, EngineError, EngineKind, EngineVersion};
pub use instance_type::{InstanceClass, InstanceSize, InstanceType, InstanceTypeError};
pub use invariants::{validate_stack, ValidationError, ValidationResult};
pub use network::{CidrError, Ipv4Cidr, SubnetKind};
pub use port::{ApplicationProtocol, Port, Protocol};
pub use resource_type::{ResourceCategory, ResourceKind};
