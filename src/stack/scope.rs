// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration Scope
//!
//! The scope is the builder every construct declares into. Each method is a
//! small transaction:
//!
//! ```text
//! Props → Scope → Spec → handle_*(&state) → StackEvent → declaration log
//!                                                 ↓
//!                                           apply_event → state
//! ```
//!
//! If the handler rejects the declaration nothing is recorded and the error is
//! returned. Methods hand back typed references (`NetworkRef`, `InstanceRef`,
//! ...) that later declarations use to point at what was declared.

use tracing::debug;

use super::Stack;
use crate::aggregate::*;
use crate::domain::{
    ApplicationProtocol, ConstructId, ConstructPath, DatabaseEngine, DatabaseName,
    InstanceType, Ipv4Cidr, Port, SubnetKind,
};
use crate::errors::StackResult;
use crate::events::{Endpoint, HealthCheck, MachineImage, StackEvent, Target};

// ============================================================================
// References to Declared Constructs
// ============================================================================

/// Anything that can sit on either side of an access grant
pub trait Connectable {
    fn endpoint(&self) -> Endpoint;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRef {
    pub path: ConstructPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroupRef {
    pub path: ConstructPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub path: ConstructPath,
    pub security_group: SecurityGroupRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRef {
    pub path: ConstructPath,
    /// Engine default port
    pub port: Port,
    pub security_group: SecurityGroupRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRef {
    pub path: ConstructPath,
    pub security_group: SecurityGroupRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRef {
    pub path: ConstructPath,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGroupRef {
    pub path: ConstructPath,
}

/// Any IPv4 address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyIpv4;

impl Connectable for InstanceRef {
    fn endpoint(&self) -> Endpoint {
        Endpoint::ComputeUnit(self.path.clone())
    }
}

impl Connectable for DatabaseRef {
    fn endpoint(&self) -> Endpoint {
        Endpoint::Database(self.path.clone())
    }
}

impl Connectable for LoadBalancerRef {
    fn endpoint(&self) -> Endpoint {
        Endpoint::LoadBalancer(self.path.clone())
    }
}

impl Connectable for AnyIpv4 {
    fn endpoint(&self) -> Endpoint {
        Endpoint::AnyIpv4
    }
}

fn security_group_of(endpoint: &Endpoint, path: &ConstructPath) -> SecurityGroupRef {
    SecurityGroupRef {
        path: endpoint
            .security_group()
            .unwrap_or_else(|| path.child_named("SecurityGroup")),
    }
}

// ============================================================================
// Construct Properties
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProps {
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
}

impl Default for NetworkProps {
    fn default() -> Self {
        Self {
            cidr: Ipv4Cidr::DEFAULT_VPC,
            max_azs: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceProps {
    pub network: NetworkRef,
    pub instance_type: InstanceType,
    pub subnet_kind: SubnetKind,
    pub machine_image: MachineImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProps {
    pub network: NetworkRef,
    pub engine: DatabaseEngine,
    pub instance_type: InstanceType,
    pub database_name: DatabaseName,
    pub multi_az: bool,
    pub allocated_storage_gb: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerProps {
    pub network: NetworkRef,
    pub internet_facing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerProps {
    pub port: u16,
    pub protocol: Option<ApplicationProtocol>,
    /// Admit traffic from anywhere on the listener port
    pub open: bool,
}

impl ListenerProps {
    /// Open listener on `port`, protocol derived from the port
    pub fn open(port: u16) -> Self {
        Self {
            port,
            protocol: None,
            open: true,
        }
    }
}

/// One instance a target group forwards to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTarget {
    pub instance: ConstructPath,
    pub port: u16,
}

impl InstanceTarget {
    pub fn new(instance: &InstanceRef, port: u16) -> Self {
        Self {
            instance: instance.path.clone(),
            port,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetProps {
    pub port: u16,
    pub protocol: Option<ApplicationProtocol>,
    pub health_check_path: String,
    pub targets: Vec<InstanceTarget>,
}

// ============================================================================
// Scope
// ============================================================================

/// Builder owning the state and declaration log of one stack
#[derive(Debug, Clone)]
pub struct Scope {
    state: StackState,
    events: Vec<StackEvent>,
}

impl Scope {
    /// Start declaring a stack
    pub fn new(stack_name: &str) -> StackResult<Self> {
        let stack = ConstructId::new(stack_name)?;
        Ok(Self {
            state: StackState::new(stack),
            events: Vec::new(),
        })
    }

    pub fn stack_id(&self) -> &ConstructId {
        &self.state.stack
    }

    pub fn state(&self) -> &StackState {
        &self.state
    }

    /// Path of a top-level construct with the given id
    pub fn construct_path(&self, id: &str) -> StackResult<ConstructPath> {
        Ok(self.state.root_path().child(&ConstructId::new(id)?))
    }

    fn record(&mut self, result: Result<StackEvent, CommandError>) -> StackResult<()> {
        let event = result?;

        match event.construct() {
            Some(path) => debug!(construct = %path, "{}", event.event_type()),
            None => debug!("{}", event.event_type()),
        }

        self.state = apply_event(self.state.clone(), &event);
        self.events.push(event);
        Ok(())
    }

    /// Declare the network boundary
    pub fn network(&mut self, id: &str, props: NetworkProps) -> StackResult<NetworkRef> {
        let path = self.construct_path(id)?;
        let result = handle_declare_network(
            &self.state,
            NetworkSpec {
                path: path.clone(),
                cidr: props.cidr,
                max_azs: props.max_azs,
            },
        );
        self.record(result)?;
        Ok(NetworkRef { path })
    }

    /// Declare a compute instance at an explicit path
    ///
    /// Used by constructs that nest their instance below their own id.
    pub fn instance(&mut self, path: ConstructPath, props: InstanceProps) -> StackResult<InstanceRef> {
        let result = handle_declare_compute_unit(
            &self.state,
            ComputeUnitSpec {
                path: path.clone(),
                network: props.network.path,
                instance_type: props.instance_type,
                subnet_kind: props.subnet_kind,
                machine_image: props.machine_image,
            },
        );
        self.record(result)?;

        let security_group = security_group_of(&Endpoint::ComputeUnit(path.clone()), &path);
        Ok(InstanceRef {
            path,
            security_group,
        })
    }

    /// Declare a managed database
    pub fn database(&mut self, id: &str, props: DatabaseProps) -> StackResult<DatabaseRef> {
        let path = self.construct_path(id)?;
        let port = props.engine.default_port();
        let result = handle_declare_database(
            &self.state,
            DatabaseSpec {
                path: path.clone(),
                network: props.network.path,
                engine: props.engine,
                instance_type: props.instance_type,
                database_name: props.database_name,
                multi_az: props.multi_az,
                allocated_storage_gb: props.allocated_storage_gb,
            },
        );
        self.record(result)?;

        let security_group = security_group_of(&Endpoint::Database(path.clone()), &path);
        Ok(DatabaseRef {
            path,
            port,
            security_group,
        })
    }

    /// Declare a load balancer
    pub fn load_balancer(
        &mut self,
        id: &str,
        props: LoadBalancerProps,
    ) -> StackResult<LoadBalancerRef> {
        let path = self.construct_path(id)?;
        let result = handle_declare_load_balancer(
            &self.state,
            LoadBalancerSpec {
                path: path.clone(),
                network: props.network.path,
                internet_facing: props.internet_facing,
            },
        );
        self.record(result)?;

        let security_group = security_group_of(&Endpoint::LoadBalancer(path.clone()), &path);
        Ok(LoadBalancerRef {
            path,
            security_group,
        })
    }

    /// Add a listener to a load balancer
    ///
    /// An open listener also grants `0.0.0.0/0` access to the load balancer
    /// on the listener port.
    pub fn add_listener(
        &mut self,
        load_balancer: &LoadBalancerRef,
        id: &str,
        props: ListenerProps,
    ) -> StackResult<ListenerRef> {
        let path = load_balancer.path.child(&ConstructId::new(id)?);
        let result = handle_add_listener(
            &self.state,
            ListenerSpec {
                path: path.clone(),
                load_balancer: load_balancer.path.clone(),
                port: props.port,
                protocol: props.protocol,
                open: props.open,
            },
        );
        self.record(result)?;

        if props.open {
            self.grant(
                AnyIpv4.endpoint(),
                load_balancer.endpoint(),
                Port::tcp(props.port),
                Some(format!("Allow from anyone on port {}", props.port)),
            )?;
        }

        Ok(ListenerRef {
            path,
            port: props.port,
        })
    }

    /// Attach a target group to a listener
    pub fn add_targets(
        &mut self,
        listener: &ListenerRef,
        id: &str,
        props: TargetProps,
    ) -> StackResult<TargetGroupRef> {
        let path = listener.path.child(&ConstructId::new(id)?);
        let targets = props
            .targets
            .into_iter()
            .map(|t| Target {
                unit: t.instance,
                port: t.port,
            })
            .collect();

        let result = handle_attach_target_group(
            &self.state,
            TargetGroupSpec {
                path: path.clone(),
                listener: listener.path.clone(),
                port: props.port,
                protocol: props.protocol,
                health_check: HealthCheck {
                    path: props.health_check_path,
                },
                targets,
            },
        );
        self.record(result)?;
        Ok(TargetGroupRef { path })
    }

    /// Let `peer` connect to the database on its engine's default port
    pub fn allow_default_port_from(
        &mut self,
        database: &DatabaseRef,
        peer: &dyn Connectable,
    ) -> StackResult<()> {
        self.grant(peer.endpoint(), database.endpoint(), database.port, None)
    }

    /// Let `source` connect to `destination` on `port`
    pub fn allow_from(
        &mut self,
        destination: &dyn Connectable,
        source: &dyn Connectable,
        port: Port,
    ) -> StackResult<()> {
        self.grant(source.endpoint(), destination.endpoint(), port, None)
    }

    fn grant(
        &mut self,
        source: Endpoint,
        destination: Endpoint,
        port: Port,
        description: Option<String>,
    ) -> StackResult<()> {
        let result = handle_grant_access(
            &self.state,
            GrantSpec {
                source,
                destination,
                port,
                description,
            },
        );
        self.record(result)
    }

    /// Close the scope
    pub fn finish(self) -> Stack {
        Stack::from_parts(self.state, self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineVersion, InstanceClass, InstanceSize};
    use crate::errors::StackError;

    fn small() -> InstanceType {
        InstanceType::of(InstanceClass::T2, InstanceSize::Small)
    }

    fn scope_with_network() -> (Scope, NetworkRef) {
        let mut scope = Scope::new("Test").unwrap();
        let network = scope.network("Vpc", NetworkProps::default()).unwrap();
        (scope, network)
    }

    fn instance(scope: &mut Scope, network: &NetworkRef, id: &str) -> InstanceRef {
        let path = scope.construct_path(id).unwrap().child_named("Instance");
        scope
            .instance(
                path,
                InstanceProps {
                    network: network.clone(),
                    instance_type: small(),
                    subnet_kind: SubnetKind::Public,
                    machine_image: MachineImage::default(),
                },
            )
            .unwrap()
    }

    #[test]
    fn test_invalid_stack_name() {
        assert!(matches!(Scope::new(""), Err(StackError::ConstructId(_))));
    }

    #[test]
    fn test_instance_reference() {
        let (mut scope, network) = scope_with_network();
        let web = instance(&mut scope, &network, "Web");

        assert_eq!(web.path.to_string(), "Test/Web/Instance");
        assert_eq!(
            web.security_group.path.to_string(),
            "Test/Web/Instance/InstanceSecurityGroup"
        );
        assert_eq!(scope.state().compute_units.len(), 1);
    }

    #[test]
    fn test_rejected_declaration_records_nothing() {
        let (mut scope, network) = scope_with_network();
        instance(&mut scope, &network, "Web");
        let before = scope.state().version;

        let path = scope.construct_path("Web").unwrap().child_named("Instance");
        let result = scope.instance(
            path,
            InstanceProps {
                network,
                instance_type: small(),
                subnet_kind: SubnetKind::Public,
                machine_image: MachineImage::default(),
            },
        );

        assert!(matches!(
            result,
            Err(StackError::Command(CommandError::DuplicateConstruct(_)))
        ));
        assert_eq!(scope.state().version, before);
    }

    #[test]
    fn test_database_port_comes_from_engine() {
        let (mut scope, network) = scope_with_network();
        let db = scope
            .database(
                "Db",
                DatabaseProps {
                    network: network.clone(),
                    engine: DatabaseEngine::mysql(EngineVersion::mysql_8_0_36()),
                    instance_type: InstanceType::of(InstanceClass::T3, InstanceSize::Small),
                    database_name: DatabaseName::wordpress(),
                    multi_az: true,
                    allocated_storage_gb: 100,
                },
            )
            .unwrap();
        assert_eq!(db.port, Port::tcp(3306));

        let web = instance(&mut scope, &network, "Web");
        scope.allow_default_port_from(&db, &web).unwrap();

        let grant = &scope.state().grants[0];
        assert_eq!(grant.port, Port::tcp(3306));
        assert_eq!(grant.description, "from Web/Instance:3306");
    }

    #[test]
    fn test_open_listener_admits_anyone() {
        let (mut scope, network) = scope_with_network();
        let lb = scope
            .load_balancer(
                "Lb",
                LoadBalancerProps {
                    network,
                    internet_facing: true,
                },
            )
            .unwrap();
        let listener = scope.add_listener(&lb, "Listener", ListenerProps::open(80)).unwrap();

        assert_eq!(listener.path.to_string(), "Test/Lb/Listener");
        let grant = &scope.state().grants[0];
        assert_eq!(grant.source, Endpoint::AnyIpv4);
        assert_eq!(grant.destination, Endpoint::LoadBalancer(lb.path.clone()));
        assert_eq!(grant.description, "Allow from anyone on port 80");
    }

    #[test]
    fn test_targets_must_be_declared() {
        let (mut scope, network) = scope_with_network();
        let lb = scope
            .load_balancer(
                "Lb",
                LoadBalancerProps {
                    network,
                    internet_facing: true,
                },
            )
            .unwrap();
        let listener = scope.add_listener(&lb, "Listener", ListenerProps::open(80)).unwrap();

        let ghost = InstanceTarget {
            instance: scope.construct_path("Ghost").unwrap(),
            port: 80,
        };
        let result = scope.add_targets(
            &listener,
            "Fleet",
            TargetProps {
                port: 80,
                protocol: None,
                health_check_path: "/".to_string(),
                targets: vec![ghost],
            },
        );
        assert!(matches!(
            result,
            Err(StackError::Command(CommandError::UnknownReference { .. }))
        ));
    }

    #[test]
    fn test_finish_keeps_log() {
        let (scope, _) = scope_with_network();
        let stack = scope.finish();
        assert_eq!(stack.events().len(), 1);
        assert_eq!(stack.name().as_str(), "Test");
    }
}
