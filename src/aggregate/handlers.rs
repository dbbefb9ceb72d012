// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Command Handlers for the Stack Aggregate
//!
//! ```text
//! handle_*(&StackState, Spec) → Result<StackEvent, CommandError>
//! ```
//!
//! Handlers never mutate state. They enforce the declaration rules:
//! - Construct paths are unique and belong to the stack
//! - At most one network boundary
//! - Every reference names a construct declared earlier
//! - Grants are never duplicated and never target `0.0.0.0/0`

use crate::aggregate::commands::*;
use crate::aggregate::StackState;
use crate::domain::{ApplicationProtocol, CidrError, ConstructPath, Port, SubnetKind};
use crate::events::*;

/// Smallest and largest storage the managed database accepts, in GiB
pub const STORAGE_RANGE_GB: std::ops::RangeInclusive<u32> = 20..=65536;

/// Command validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Path already used by another construct
    #[error("Construct {0} is already declared")]
    DuplicateConstruct(ConstructPath),

    /// Path is rooted in a different stack, or is the stack itself
    #[error("Construct {path} does not belong to stack {stack}")]
    NotInStack { path: ConstructPath, stack: String },

    /// A second network boundary was requested
    #[error("Network {0} is already declared; a stack has exactly one network")]
    NetworkAlreadyDeclared(ConstructPath),

    /// Reference to a construct that was never declared
    #[error("Unknown {kind}: {path}")]
    UnknownReference {
        kind: &'static str,
        path: ConstructPath,
    },

    #[error("Network must span at least one availability zone")]
    InvalidMaxAzs,

    #[error("Subnet allocation failed: {0}")]
    SubnetAllocation(#[from] CidrError),

    #[error("Allocated storage {0} GiB is outside 20-65536 GiB")]
    InvalidAllocatedStorage(u32),

    #[error("Invalid access grant: {0}")]
    InvalidGrant(String),

    #[error("Duplicate access grant: {0}")]
    DuplicateGrant(String),

    #[error("Port must be non-zero")]
    InvalidPort,

    #[error("Load balancer {load_balancer} already listens on port {port}")]
    ListenerPortInUse {
        load_balancer: ConstructPath,
        port: u16,
    },

    #[error("Listener {0} already has a target group")]
    TargetGroupAlreadyAttached(ConstructPath),

    #[error("Health check path must start with '/': {0}")]
    InvalidHealthCheck(String),

    #[error("Target group {0} has no targets")]
    NoTargets(ConstructPath),

    #[error("Compute unit {unit} is targeted twice on port {port}")]
    DuplicateTarget { unit: ConstructPath, port: u16 },
}

/// Check that `path` is a fresh construct path inside the stack
fn ensure_new(state: &StackState, path: &ConstructPath) -> Result<(), CommandError> {
    if path.stack() != &state.stack || path.depth() < 2 {
        return Err(CommandError::NotInStack {
            path: path.clone(),
            stack: state.stack.to_string(),
        });
    }

    if state.is_declared(path) {
        return Err(CommandError::DuplicateConstruct(path.clone()));
    }

    Ok(())
}

fn require_network(state: &StackState, path: &ConstructPath) -> Result<(), CommandError> {
    if state.network_at(path).is_none() {
        return Err(CommandError::UnknownReference {
            kind: "network",
            path: path.clone(),
        });
    }
    Ok(())
}

fn require_endpoint(state: &StackState, endpoint: &Endpoint) -> Result<(), CommandError> {
    if state.has_endpoint(endpoint) {
        return Ok(());
    }

    let (kind, path) = match endpoint {
        Endpoint::ComputeUnit(p) => ("compute unit", p),
        Endpoint::Database(p) => ("database", p),
        Endpoint::LoadBalancer(p) => ("load balancer", p),
        Endpoint::AnyIpv4 => return Ok(()),
    };

    Err(CommandError::UnknownReference {
        kind,
        path: path.clone(),
    })
}

/// Rule description used when the caller gives none
/// (`from WebServer1/Instance:3306`)
pub fn default_description(source: &Endpoint, port: &Port) -> String {
    let peer = match source.path() {
        Some(path) => path.relative(),
        None => source.to_string(),
    };

    format!("from {peer}:{}", port.label())
}

/// Handle DeclareNetwork
///
/// # Business Rules
/// - Only one network per stack
/// - One public and one private subnet per availability zone, carved from
///   the front of the CIDR in equal blocks: all public subnets first
pub fn handle_declare_network(
    state: &StackState,
    spec: NetworkSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;

    if let Some(existing) = state.network() {
        return Err(CommandError::NetworkAlreadyDeclared(existing.path.clone()));
    }

    if spec.max_azs == 0 {
        return Err(CommandError::InvalidMaxAzs);
    }

    let azs = usize::from(spec.max_azs);
    let blocks = spec.cidr.allocate(azs * 2)?;

    let subnets = blocks
        .into_iter()
        .enumerate()
        .map(|(i, cidr)| {
            let kind = if i < azs {
                SubnetKind::Public
            } else {
                SubnetKind::Private
            };
            let zone = i % azs;
            Subnet {
                name: format!("{}Subnet{}", kind.name_prefix(), zone + 1),
                kind,
                availability_zone: zone as u8,
                cidr,
            }
        })
        .collect();

    Ok(StackEvent::NetworkDeclared {
        network: NetworkBoundary {
            path: spec.path,
            cidr: spec.cidr,
            max_azs: spec.max_azs,
            subnets,
        },
    })
}

/// Handle DeclareComputeUnit
pub fn handle_declare_compute_unit(
    state: &StackState,
    spec: ComputeUnitSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;
    require_network(state, &spec.network)?;

    Ok(StackEvent::ComputeUnitDeclared {
        unit: ComputeUnit {
            path: spec.path,
            network: spec.network,
            instance_type: spec.instance_type,
            subnet_kind: spec.subnet_kind,
            machine_image: spec.machine_image,
        },
    })
}

/// Handle DeclareDatabase
///
/// # Business Rules
/// - Network must exist
/// - Allocated storage within the engine's accepted range
pub fn handle_declare_database(
    state: &StackState,
    spec: DatabaseSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;
    require_network(state, &spec.network)?;

    if !STORAGE_RANGE_GB.contains(&spec.allocated_storage_gb) {
        return Err(CommandError::InvalidAllocatedStorage(
            spec.allocated_storage_gb,
        ));
    }

    Ok(StackEvent::DatabaseDeclared {
        database: DatabaseResource {
            path: spec.path,
            network: spec.network,
            engine: spec.engine,
            instance_type: spec.instance_type,
            database_name: spec.database_name,
            multi_az: spec.multi_az,
            allocated_storage_gb: spec.allocated_storage_gb,
        },
    })
}

/// Handle GrantAccess
///
/// # Business Rules
/// - Both endpoints declared
/// - Destination is a construct, never `0.0.0.0/0`
/// - No grant from a construct to itself
/// - The same (source, destination, port) edge is declared at most once
pub fn handle_grant_access(
    state: &StackState,
    spec: GrantSpec,
) -> Result<StackEvent, CommandError> {
    if spec.destination == Endpoint::AnyIpv4 {
        return Err(CommandError::InvalidGrant(
            "destination cannot be 0.0.0.0/0".to_string(),
        ));
    }

    if spec.source == spec.destination {
        return Err(CommandError::InvalidGrant(format!(
            "{} cannot grant access to itself",
            spec.source
        )));
    }

    require_endpoint(state, &spec.source)?;
    require_endpoint(state, &spec.destination)?;

    let description = spec
        .description
        .unwrap_or_else(|| default_description(&spec.source, &spec.port));

    let grant = AccessGrant {
        source: spec.source,
        destination: spec.destination,
        port: spec.port,
        description,
    };

    if state.grants.iter().any(|g| g.same_edge(&grant)) {
        return Err(CommandError::DuplicateGrant(format!(
            "{} -> {} on {}",
            grant.source, grant.destination, grant.port
        )));
    }

    Ok(StackEvent::AccessGranted { grant })
}

/// Handle DeclareLoadBalancer
pub fn handle_declare_load_balancer(
    state: &StackState,
    spec: LoadBalancerSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;
    require_network(state, &spec.network)?;

    Ok(StackEvent::LoadBalancerDeclared {
        load_balancer: LoadBalancer {
            path: spec.path,
            network: spec.network,
            internet_facing: spec.internet_facing,
        },
    })
}

/// Handle AddListener
///
/// # Business Rules
/// - Load balancer declared
/// - Port non-zero and not already used by another listener of the same
///   load balancer
pub fn handle_add_listener(
    state: &StackState,
    spec: ListenerSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;
    require_endpoint(state, &Endpoint::LoadBalancer(spec.load_balancer.clone()))?;

    if spec.port == 0 {
        return Err(CommandError::InvalidPort);
    }

    if state
        .listeners_of(&spec.load_balancer)
        .any(|l| l.port == spec.port)
    {
        return Err(CommandError::ListenerPortInUse {
            load_balancer: spec.load_balancer,
            port: spec.port,
        });
    }

    Ok(StackEvent::ListenerAdded {
        listener: Listener {
            path: spec.path,
            load_balancer: spec.load_balancer,
            port: spec.port,
            protocol: spec
                .protocol
                .unwrap_or_else(|| ApplicationProtocol::for_port(spec.port)),
            open: spec.open,
        },
    })
}

/// Handle AttachTargetGroup
///
/// # Business Rules
/// - Listener declared and without a target group
/// - Health check path is absolute
/// - At least one target; every target is a declared compute unit and no
///   (unit, port) pair repeats
pub fn handle_attach_target_group(
    state: &StackState,
    spec: TargetGroupSpec,
) -> Result<StackEvent, CommandError> {
    ensure_new(state, &spec.path)?;

    if state.listener(&spec.listener).is_none() {
        return Err(CommandError::UnknownReference {
            kind: "listener",
            path: spec.listener,
        });
    }

    if state.target_group_of(&spec.listener).is_some() {
        return Err(CommandError::TargetGroupAlreadyAttached(spec.listener));
    }

    if !spec.health_check.path.starts_with('/') {
        return Err(CommandError::InvalidHealthCheck(spec.health_check.path));
    }

    if spec.port == 0 {
        return Err(CommandError::InvalidPort);
    }

    if spec.targets.is_empty() {
        return Err(CommandError::NoTargets(spec.path));
    }

    for (i, target) in spec.targets.iter().enumerate() {
        require_endpoint(state, &Endpoint::ComputeUnit(target.unit.clone()))?;

        if spec.targets[..i].contains(target) {
            return Err(CommandError::DuplicateTarget {
                unit: target.unit.clone(),
                port: target.port,
            });
        }
    }

    Ok(StackEvent::TargetGroupAttached {
        target_group: TargetGroup {
            path: spec.path,
            listener: spec.listener,
            port: spec.port,
            protocol: spec
                .protocol
                .unwrap_or_else(|| ApplicationProtocol::for_port(spec.port)),
            health_check: spec.health_check,
            targets: spec.targets,
        },
    })
}
