// Copyright (c) 2025 - Cowboy AI, Inc.
//! Blog Stack Assembly
//!
//! Wires the whole topology in one pass:
//!
//! ```text
//!                    0.0.0.0/0
//!                        │ tcp/80
//!                        ▼
//!                  LoadBalancer ── Listener :80 ── ApplicationFleet
//!                        │ tcp/80 (per unit)            │ targets
//!          ┌─────────────┼─────────────┐                │
//!          ▼             ▼             ▼                │
//!     WebServer1    WebServer2   ...  WebServerN  ◄─────┘
//!          │             │             │
//!          └─────────────┼─────────────┘ engine port (per unit)
//!                        ▼
//!                   WordPressDB
//! ```
//!
//! Every unit gets its own database grant, its own load balancer grant and
//! its own target entry.

use tracing::info;

use crate::config::StackConfig;
use crate::constructs::{WebServerInstance, WebServerInstanceProps};
use crate::domain::{DatabaseEngine, Port};
use crate::errors::StackResult;
use crate::stack::{
    DatabaseProps, DatabaseRef, InstanceTarget, ListenerProps, ListenerRef, LoadBalancerProps,
    LoadBalancerRef, NetworkProps, NetworkRef, Scope, Stack, TargetGroupRef, TargetProps,
};

pub const VPC_ID: &str = "BlogVpc";
pub const DATABASE_ID: &str = "WordPressDB";
pub const LOAD_BALANCER_ID: &str = "LoadBalancer";
pub const LISTENER_ID: &str = "Listener";
pub const TARGET_GROUP_ID: &str = "ApplicationFleet";

/// The declared blog stack together with handles to its parts
#[derive(Debug, Clone)]
pub struct BlogStack {
    pub stack: Stack,
    pub vpc: NetworkRef,
    pub web_servers: Vec<WebServerInstance>,
    pub database: DatabaseRef,
    pub load_balancer: LoadBalancerRef,
    pub listener: ListenerRef,
    pub fleet: TargetGroupRef,
}

impl BlogStack {
    /// Declare the stack described by `config`
    pub fn assemble(config: &StackConfig) -> StackResult<Self> {
        config.validate()?;
        let ids = config.web_server_ids();
        Self::assemble_with_ids(config, &ids)
    }

    /// Declare the stack with an explicit list of web server ids
    ///
    /// Lets callers drop or rename individual units while keeping the rest
    /// of the topology identical.
    pub fn assemble_with_ids(config: &StackConfig, web_server_ids: &[String]) -> StackResult<Self> {
        info!(
            stack = %config.stack_name,
            fleet_size = web_server_ids.len(),
            "Assembling blog stack"
        );

        let mut scope = Scope::new(&config.stack_name)?;

        let vpc = scope.network(
            VPC_ID,
            NetworkProps {
                cidr: config.vpc_cidr,
                max_azs: config.max_azs,
            },
        )?;

        let web_servers = web_server_ids
            .iter()
            .map(|id| {
                WebServerInstance::new(
                    &mut scope,
                    id,
                    WebServerInstanceProps {
                        instance_type: Some(config.web_instance_type),
                        ..WebServerInstanceProps::new(&vpc)
                    },
                )
            })
            .collect::<StackResult<Vec<_>>>()?;

        let database = scope.database(
            DATABASE_ID,
            DatabaseProps {
                network: vpc.clone(),
                engine: DatabaseEngine::mysql(config.db_engine_version.clone()),
                instance_type: config.db_instance_type,
                database_name: config.database_name.clone(),
                multi_az: config.multi_az,
                allocated_storage_gb: config.allocated_storage_gb,
            },
        )?;

        for web_server in &web_servers {
            scope.allow_default_port_from(&database, &web_server.instance)?;
        }

        let load_balancer = scope.load_balancer(
            LOAD_BALANCER_ID,
            LoadBalancerProps {
                network: vpc.clone(),
                internet_facing: true,
            },
        )?;

        let listener = scope.add_listener(
            &load_balancer,
            LISTENER_ID,
            ListenerProps::open(config.listener_port),
        )?;

        let fleet = scope.add_targets(
            &listener,
            TARGET_GROUP_ID,
            TargetProps {
                port: config.listener_port,
                protocol: None,
                health_check_path: config.health_check_path.clone(),
                targets: web_servers
                    .iter()
                    .map(|w| InstanceTarget::new(&w.instance, config.listener_port))
                    .collect(),
            },
        )?;

        for web_server in &web_servers {
            scope.allow_from(
                &web_server.instance,
                &load_balancer,
                Port::tcp(config.listener_port),
            )?;
        }

        let stack = scope.finish();
        info!(
            stack = %stack.name(),
            constructs = stack.state().construct_count(),
            grants = stack.state().grants.len(),
            "Blog stack assembled"
        );

        Ok(Self {
            stack,
            vpc,
            web_servers,
            database,
            load_balancer,
            listener,
            fleet,
        })
    }

    pub fn into_stack(self) -> Stack {
        self.stack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::errors::StackError;
    use crate::events::Endpoint;

    #[test]
    fn test_default_assembly_is_valid() {
        let blog = BlogStack::assemble(&StackConfig::default()).unwrap();

        assert_eq!(blog.web_servers.len(), 2);
        assert_eq!(blog.stack.validate(), Ok(()));
        assert_eq!(blog.database.path.to_string(), "CdkWorkshopStack/WordPressDB");
        assert_eq!(
            blog.fleet.path.to_string(),
            "CdkWorkshopStack/LoadBalancer/Listener/ApplicationFleet"
        );
    }

    #[test]
    fn test_grants_per_unit() {
        let blog = BlogStack::assemble(&StackConfig::default()).unwrap();
        let state = blog.stack.state();

        let database = Endpoint::Database(blog.database.path.clone());
        assert_eq!(state.grants_to(&database).count(), 2);

        for web in &blog.web_servers {
            let unit = Endpoint::ComputeUnit(web.instance.path.clone());
            let inbound: Vec<_> = state.grants_to(&unit).collect();
            assert_eq!(inbound.len(), 1);
            assert!(inbound[0].source.is_load_balancer());
            assert_eq!(inbound[0].port, Port::tcp(80));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_declaring() {
        let config = StackConfig {
            fleet_size: 0,
            ..StackConfig::default()
        };
        assert!(matches!(
            BlogStack::assemble(&config),
            Err(StackError::Config(ConfigError::EmptyFleet))
        ));
    }

    #[test]
    fn test_explicit_ids() {
        let ids = vec!["Blue".to_string(), "Green".to_string(), "Canary".to_string()];
        let blog = BlogStack::assemble_with_ids(&StackConfig::default(), &ids).unwrap();

        assert_eq!(blog.stack.state().compute_units.len(), 3);
        assert_eq!(blog.stack.validate(), Ok(()));
    }
}
