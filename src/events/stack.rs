// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Declaration Events
//!
//! Each builder operation that succeeds is recorded as one [`StackEvent`].
//! The entities below are embedded in the events that declare them; state is
//! never stored anywhere except as the fold of these events.
//!
//! Events carry no ids or timestamps of their own, so two declarations of the
//! same topology produce identical logs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{
    ApplicationProtocol, ConstructPath, DatabaseEngine, DatabaseName, InstanceType, Ipv4Cidr,
    Port, SubnetKind,
};

// ============================================================================
// Domain Entities (Embedded in Events)
// ============================================================================

/// Isolated address space shared by every resource of the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBoundary {
    pub path: ConstructPath,
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
    pub subnets: Vec<Subnet>,
}

impl NetworkBoundary {
    /// Subnets of one placement class, in availability-zone order
    pub fn subnets_of(&self, kind: SubnetKind) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.kind == kind)
    }
}

/// Slice of the network in one availability zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    /// `PublicSubnet1`, `PrivateSubnet2`, ...
    pub name: String,
    pub kind: SubnetKind,
    /// Zero-based availability-zone index
    pub availability_zone: u8,
    pub cidr: Ipv4Cidr,
}

/// Image a compute unit boots from, resolved by the provisioning engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    /// Public parameter holding the current image id
    pub ssm_parameter: String,
}

impl MachineImage {
    pub fn latest_amazon_linux_2023() -> Self {
        Self {
            ssm_parameter: "/aws/service/ami-amazon-linux-latest/al2023-ami-kernel-default-x86_64"
                .to_string(),
        }
    }
}

impl Default for MachineImage {
    fn default() -> Self {
        Self::latest_amazon_linux_2023()
    }
}

/// One web-tier instance plus its own security group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeUnit {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub instance_type: InstanceType,
    pub subnet_kind: SubnetKind,
    pub machine_image: MachineImage,
}

/// Managed relational database placed in the private subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseResource {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub engine: DatabaseEngine,
    pub instance_type: InstanceType,
    pub database_name: DatabaseName,
    pub multi_az: bool,
    pub allocated_storage_gb: u32,
}

impl DatabaseResource {
    /// Port clients connect on, taken from the engine
    pub fn port(&self) -> Port {
        self.engine.default_port()
    }
}

/// Either side of an access grant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Endpoint {
    ComputeUnit(ConstructPath),
    Database(ConstructPath),
    LoadBalancer(ConstructPath),
    /// Any IPv4 address (`0.0.0.0/0`)
    AnyIpv4,
}

impl Endpoint {
    /// Construct behind the endpoint, `None` for [`Endpoint::AnyIpv4`]
    pub fn path(&self) -> Option<&ConstructPath> {
        match self {
            Self::ComputeUnit(p) | Self::Database(p) | Self::LoadBalancer(p) => Some(p),
            Self::AnyIpv4 => None,
        }
    }

    pub fn is_load_balancer(&self) -> bool {
        matches!(self, Self::LoadBalancer(_))
    }

    /// Path of the security group that carries this endpoint's rules
    ///
    /// Compute units own `InstanceSecurityGroup`, databases and load
    /// balancers own `SecurityGroup`.
    pub fn security_group(&self) -> Option<ConstructPath> {
        match self {
            Self::ComputeUnit(p) => Some(p.child_named("InstanceSecurityGroup")),
            Self::Database(p) | Self::LoadBalancer(p) => Some(p.child_named("SecurityGroup")),
            Self::AnyIpv4 => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComputeUnit(p) | Self::Database(p) | Self::LoadBalancer(p) => write!(f, "{p}"),
            Self::AnyIpv4 => write!(f, "0.0.0.0/0"),
        }
    }
}

/// Directed permission edge: `destination` accepts `port` from `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub port: Port,
    pub description: String,
}

impl AccessGrant {
    /// Same source, destination and port
    pub fn same_edge(&self, other: &AccessGrant) -> bool {
        self.source == other.source && self.destination == other.destination && self.port == other.port
    }
}

/// Application load balancer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub path: ConstructPath,
    pub network: ConstructPath,
    pub internet_facing: bool,
}

/// Port a load balancer accepts traffic on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listener {
    pub path: ConstructPath,
    pub load_balancer: ConstructPath,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    /// Whether the listener admits traffic from anywhere
    pub open: bool,
}

/// Probe deciding whether a target receives traffic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
}

/// One backend of a target group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub unit: ConstructPath,
    pub port: u16,
}

/// Backends a listener forwards to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetGroup {
    pub path: ConstructPath,
    pub listener: ConstructPath,
    pub port: u16,
    pub protocol: ApplicationProtocol,
    pub health_check: HealthCheck,
    pub targets: Vec<Target>,
}

// ============================================================================
// Stack Events
// ============================================================================

/// Declaration log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StackEvent {
    NetworkDeclared { network: NetworkBoundary },
    ComputeUnitDeclared { unit: ComputeUnit },
    DatabaseDeclared { database: DatabaseResource },
    AccessGranted { grant: AccessGrant },
    LoadBalancerDeclared { load_balancer: LoadBalancer },
    ListenerAdded { listener: Listener },
    TargetGroupAttached { target_group: TargetGroup },
}

impl StackEvent {
    /// Get event type name for logging and routing
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::NetworkDeclared { .. } => "NetworkDeclared",
            Self::ComputeUnitDeclared { .. } => "ComputeUnitDeclared",
            Self::DatabaseDeclared { .. } => "DatabaseDeclared",
            Self::AccessGranted { .. } => "AccessGranted",
            Self::LoadBalancerDeclared { .. } => "LoadBalancerDeclared",
            Self::ListenerAdded { .. } => "ListenerAdded",
            Self::TargetGroupAttached { .. } => "TargetGroupAttached",
        }
    }

    /// Construct the event declares, `None` for grants
    pub fn construct(&self) -> Option<&ConstructPath> {
        match self {
            Self::NetworkDeclared { network } => Some(&network.path),
            Self::ComputeUnitDeclared { unit } => Some(&unit.path),
            Self::DatabaseDeclared { database } => Some(&database.path),
            Self::AccessGranted { .. } => None,
            Self::LoadBalancerDeclared { load_balancer } => Some(&load_balancer.path),
            Self::ListenerAdded { listener } => Some(&listener.path),
            Self::TargetGroupAttached { target_group } => Some(&target_group.path),
        }
    }
}
