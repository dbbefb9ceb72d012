// Copyright (c) 2025 - Cowboy AI, Inc.
//! Web Server Instance Construct
//!
//! Declares one compute unit at `<id>/Instance` in the public subnets of the
//! given network. The unit gets its own security group that allows every
//! outbound connection and no inbound traffic; callers open it up with
//! explicit grants.

use tracing::info;

use crate::domain::{InstanceClass, InstanceSize, InstanceType, SubnetKind};
use crate::errors::StackResult;
use crate::events::{Endpoint, MachineImage};
use crate::stack::{Connectable, InstanceProps, InstanceRef, NetworkRef, Scope, SecurityGroupRef};

/// Properties of a [`WebServerInstance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebServerInstanceProps {
    pub vpc: NetworkRef,
    /// Defaults to `t2.small`
    pub instance_type: Option<InstanceType>,
    /// Defaults to the latest Amazon Linux 2023 image
    pub machine_image: Option<MachineImage>,
}

impl WebServerInstanceProps {
    pub fn new(vpc: &NetworkRef) -> Self {
        Self {
            vpc: vpc.clone(),
            instance_type: None,
            machine_image: None,
        }
    }
}

/// Handles to the resources of one declared web server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebServerInstance {
    pub instance: InstanceRef,
    pub security_group: SecurityGroupRef,
}

impl WebServerInstance {
    pub const DEFAULT_INSTANCE_TYPE: InstanceType =
        InstanceType::of(InstanceClass::T2, InstanceSize::Small);

    /// Declare a web server under `id`
    pub fn new(scope: &mut Scope, id: &str, props: WebServerInstanceProps) -> StackResult<Self> {
        let path = scope.construct_path(id)?.child_named("Instance");
        let instance_type = props.instance_type.unwrap_or(Self::DEFAULT_INSTANCE_TYPE);

        let instance = scope.instance(
            path,
            InstanceProps {
                network: props.vpc,
                instance_type,
                subnet_kind: SubnetKind::Public,
                machine_image: props.machine_image.unwrap_or_default(),
            },
        )?;

        info!(construct = %instance.path, %instance_type, "Declared web server");

        Ok(Self {
            security_group: instance.security_group.clone(),
            instance,
        })
    }
}

impl Connectable for WebServerInstance {
    fn endpoint(&self) -> Endpoint {
        self.instance.endpoint()
    }
}
