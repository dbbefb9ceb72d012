// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration Commands
//!
//! Commands express what the builder wants declared and can be rejected.
//! Paths are already resolved by the [`Scope`](crate::stack::Scope), so every
//! command names its construct and the constructs it references.

use crate::domain::{
    ApplicationProtocol, ConstructPath, DatabaseEngine, DatabaseName, InstanceType, Ipv4Cidr,
    Port, SubnetKind,
};
use crate::events::{Endpoint, HealthCheck, MachineImage, Target};

/// Specification for declaring the network boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    pub path: ConstructPath,
    /// Address space carved into subnets
    pub cidr: Ipv4Cidr,
    /// Availability zones to spread subnets over
    pub max_azs: u8,
}

/// Specification for declaring a compute unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeUnitSpec {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub instance_type: InstanceType,
    pub subnet_kind: SubnetKind,
    pub machine_image: MachineImage,
}

/// Specification for declaring a managed database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSpec {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub engine: DatabaseEngine,
    pub instance_type: InstanceType,
    pub database_name: DatabaseName,
    /// Synchronized standby in a second zone
    pub multi_az: bool,
    pub allocated_storage_gb: u32,
}

/// Specification for an access grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSpec {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub port: Port,
    /// Generated from the endpoints when absent
    pub description: Option<String>,
}

/// Specification for declaring a load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerSpec {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub internet_facing: bool,
}

/// Specification for adding a listener to a load balancer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerSpec {
    pub path: ConstructPath,
    pub load_balancer: ConstructPath,
    pub port: u16,
    /// Derived from the port when absent
    pub protocol: Option<ApplicationProtocol>,
    pub open: bool,
}

/// Specification for attaching a target group to a listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupSpec {
    pub path: ConstructPath,
    pub listener: ConstructPath,
    pub port: u16,
    pub protocol: Option<ApplicationProtocol>,
    pub health_check: HealthCheck,
    pub targets: Vec<Target>,
}
