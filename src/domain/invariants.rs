// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Stack Invariants
//!
//! Handlers reject malformed commands one at a time. The functions here look
//! at a finished stack as a whole and check the topology rules that only make
//! sense once every declaration is in:
//!
//! 1. **Structure**: exactly one network, every reference resolves
//! 2. **Isolation**: the load balancer never reaches the database directly,
//!    compute units accept traffic only from the load balancer on a target port
//! 3. **Fan-out**: every compute unit has its own database grant, its own
//!    load balancer grant and its own target entry
//!
//! All functions are pure and deterministic; [`validate_stack`] composes them.

use crate::aggregate::StackState;
use crate::domain::{ConstructPath, Port};
use crate::events::Endpoint;

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Stack declares no network")]
    NoNetwork,

    #[error("Stack declares {0} networks, expected exactly one")]
    MultipleNetworks(usize),

    /// A construct references something that was never declared
    #[error("{from} references undeclared {to}")]
    DanglingReference { from: String, to: String },

    #[error("Load balancer {load_balancer} has direct access to database {database}")]
    LoadBalancerToDatabase {
        load_balancer: ConstructPath,
        database: ConstructPath,
    },

    /// A compute unit accepts traffic other than load balancer traffic on a
    /// target port
    #[error("Compute unit {unit} accepts {port} from {peer}")]
    UnexpectedInbound {
        unit: ConstructPath,
        peer: Endpoint,
        port: Port,
    },

    #[error("Compute unit {unit} has no access to database {database}")]
    MissingDatabaseGrant {
        unit: ConstructPath,
        database: ConstructPath,
    },

    #[error("Compute unit {unit} does not accept traffic from load balancer {load_balancer}")]
    MissingLoadBalancerGrant {
        unit: ConstructPath,
        load_balancer: ConstructPath,
    },

    #[error("Compute unit {0} is not a target of any load balancer")]
    UnitNotBehindLoadBalancer(ConstructPath),

    #[error("Listener {0} forwards to no target group")]
    ListenerWithoutTargets(ConstructPath),
}

/// Validate the stack has exactly one network boundary
pub fn validate_single_network(state: &StackState) -> ValidationResult {
    match state.networks.len() {
        0 => Err(ValidationError::NoNetwork),
        1 => Ok(()),
        n => Err(ValidationError::MultipleNetworks(n)),
    }
}

/// Validate every reference points at a declared construct
///
/// # Rules
/// - Units, databases and load balancers sit in a declared network
/// - Grant endpoints are declared
/// - Listeners belong to a declared load balancer, target groups to a
///   declared listener, targets are declared compute units
pub fn validate_references(state: &StackState) -> ValidationResult {
    let dangling = |from: &dyn std::fmt::Display, to: &dyn std::fmt::Display| -> ValidationResult {
        Err(ValidationError::DanglingReference {
            from: from.to_string(),
            to: to.to_string(),
        })
    };

    let placements = state
        .compute_units
        .iter()
        .map(|u| (&u.path, &u.network))
        .chain(state.databases.iter().map(|d| (&d.path, &d.network)))
        .chain(state.load_balancers.iter().map(|l| (&l.path, &l.network)));

    for (path, network) in placements {
        if state.network_at(network).is_none() {
            return dangling(path, network);
        }
    }

    for grant in &state.grants {
        for endpoint in [&grant.source, &grant.destination] {
            if !state.has_endpoint(endpoint) {
                return dangling(&grant.description, endpoint);
            }
        }
    }

    for listener in &state.listeners {
        if state.load_balancer(&listener.load_balancer).is_none() {
            return dangling(&listener.path, &listener.load_balancer);
        }
    }

    for group in &state.target_groups {
        if state.listener(&group.listener).is_none() {
            return dangling(&group.path, &group.listener);
        }
        for target in &group.targets {
            if state.compute_unit(&target.unit).is_none() {
                return dangling(&group.path, &target.unit);
            }
        }
    }

    Ok(())
}

/// Validate every listener forwards somewhere
pub fn validate_listeners_routed(state: &StackState) -> ValidationResult {
    match state
        .listeners
        .iter()
        .find(|l| state.target_group_of(&l.path).is_none())
    {
        Some(listener) => Err(ValidationError::ListenerWithoutTargets(listener.path.clone())),
        None => Ok(()),
    }
}

/// Validate no load balancer is granted access to a database
pub fn validate_database_isolation(state: &StackState) -> ValidationResult {
    for grant in &state.grants {
        if let (Endpoint::LoadBalancer(lb), Endpoint::Database(db)) =
            (&grant.source, &grant.destination)
        {
            return Err(ValidationError::LoadBalancerToDatabase {
                load_balancer: lb.clone(),
                database: db.clone(),
            });
        }
    }
    Ok(())
}

/// Validate compute units only accept load balancer traffic on target ports
///
/// # Rules
/// - Source is a load balancer
/// - Port is a single TCP port on which a target group of that load
///   balancer targets the unit
pub fn validate_compute_unit_inbound(state: &StackState) -> ValidationResult {
    for unit in &state.compute_units {
        let endpoint = Endpoint::ComputeUnit(unit.path.clone());

        for grant in state.grants_to(&endpoint) {
            let allowed = match &grant.source {
                Endpoint::LoadBalancer(lb) => grant.port.is_single()
                    && target_ports(state, lb, &unit.path)
                        .any(|port| grant.port == Port::tcp(port)),
                _ => false,
            };

            if !allowed {
                return Err(ValidationError::UnexpectedInbound {
                    unit: unit.path.clone(),
                    peer: grant.source.clone(),
                    port: grant.port,
                });
            }
        }
    }
    Ok(())
}

/// Ports on which `load_balancer` forwards to `unit`
fn target_ports<'a>(
    state: &'a StackState,
    load_balancer: &'a ConstructPath,
    unit: &'a ConstructPath,
) -> impl Iterator<Item = u16> + 'a {
    state
        .listeners_of(load_balancer)
        .filter_map(move |l| state.target_group_of(&l.path))
        .flat_map(|g| g.targets.iter())
        .filter(move |t| &t.unit == unit)
        .map(|t| t.port)
}

/// Validate the per-unit fan-out of the web tier
///
/// # Rules
/// For every compute unit:
/// - one grant to every database on that database's port
/// - at least one target entry
/// - one grant from every load balancer that targets it
pub fn validate_fleet_fan_out(state: &StackState) -> ValidationResult {
    for unit in &state.compute_units {
        let source = Endpoint::ComputeUnit(unit.path.clone());

        for database in &state.databases {
            let destination = Endpoint::Database(database.path.clone());
            let granted = state
                .grants_from(&source)
                .any(|g| g.destination == destination && g.port == database.port());

            if !granted {
                return Err(ValidationError::MissingDatabaseGrant {
                    unit: unit.path.clone(),
                    database: database.path.clone(),
                });
            }
        }

        let mut behind_any = false;
        for lb in &state.load_balancers {
            if target_ports(state, &lb.path, &unit.path).next().is_none() {
                continue;
            }
            behind_any = true;

            let from_lb = Endpoint::LoadBalancer(lb.path.clone());
            if !state.grants_from(&from_lb).any(|g| g.destination == source) {
                return Err(ValidationError::MissingLoadBalancerGrant {
                    unit: unit.path.clone(),
                    load_balancer: lb.path.clone(),
                });
            }
        }

        if !behind_any {
            return Err(ValidationError::UnitNotBehindLoadBalancer(unit.path.clone()));
        }
    }
    Ok(())
}

/// Composite validation of a finished stack
pub fn validate_stack(state: &StackState) -> ValidationResult {
    validate_single_network(state)?;
    validate_references(state)?;
    validate_listeners_routed(state)?;
    validate_database_isolation(state)?;
    validate_compute_unit_inbound(state)?;
    validate_fleet_fan_out(state)?;
    Ok(())
}
