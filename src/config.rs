// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Configuration
//!
//! Defaults reproduce the blog topology: two `t2.small` web servers and a
//! multi-AZ `db.t3.small` MySQL 8.0.36 database named `wordpress`, behind an
//! internet-facing load balancer listening on port 80.
//!
//! Every field can be overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CIM_STACK_NAME` | `stack_name` |
//! | `CIM_STACK_FLEET_SIZE` | `fleet_size` |
//! | `CIM_STACK_VPC_CIDR` | `vpc_cidr` |
//! | `CIM_STACK_MAX_AZS` | `max_azs` |
//! | `CIM_STACK_WEB_INSTANCE_TYPE` | `web_instance_type` |
//! | `CIM_STACK_DB_INSTANCE_TYPE` | `db_instance_type` |
//! | `CIM_STACK_DB_ENGINE_VERSION` | `db_engine_version` |
//! | `CIM_STACK_DATABASE_NAME` | `database_name` |
//! | `CIM_STACK_MULTI_AZ` | `multi_az` |
//! | `CIM_STACK_ALLOCATED_STORAGE_GB` | `allocated_storage_gb` |
//! | `CIM_STACK_LISTENER_PORT` | `listener_port` |
//! | `CIM_STACK_HEALTH_CHECK_PATH` | `health_check_path` |
//! | `CDK_DEFAULT_ACCOUNT` | `account` |
//! | `CDK_DEFAULT_REGION` | `region` |

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::aggregate::STORAGE_RANGE_GB;
use crate::domain::{
    DatabaseName, EngineVersion, InstanceClass, InstanceSize, InstanceType, Ipv4Cidr,
};

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid stack name: {0:?} (1-128 letters, digits or hyphens, starting with a letter)")]
    InvalidStackName(String),

    #[error("Fleet size must be at least 1")]
    EmptyFleet,

    #[error("At least one availability zone is required")]
    NoAvailabilityZones,

    #[error("VPC {cidr} cannot hold {subnets} subnets")]
    VpcTooSmall { cidr: Ipv4Cidr, subnets: usize },

    #[error("Listener port must be non-zero")]
    InvalidListenerPort,

    #[error("Health check path must start with '/': {0:?}")]
    InvalidHealthCheckPath(String),

    #[error("Allocated storage {0} GiB is outside 20-65536 GiB")]
    InvalidAllocatedStorage(u32),
}

/// Settings for one blog stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    pub stack_name: String,
    /// Number of web servers behind the load balancer
    pub fleet_size: usize,
    pub vpc_cidr: Ipv4Cidr,
    pub max_azs: u8,
    pub web_instance_type: InstanceType,
    pub db_instance_type: InstanceType,
    pub db_engine_version: EngineVersion,
    pub database_name: DatabaseName,
    pub multi_az: bool,
    pub allocated_storage_gb: u32,
    /// Listener port and target port
    pub listener_port: u16,
    pub health_check_path: String,
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            stack_name: "CdkWorkshopStack".to_string(),
            fleet_size: 2,
            vpc_cidr: Ipv4Cidr::DEFAULT_VPC,
            max_azs: 2,
            web_instance_type: InstanceType::of(InstanceClass::T2, InstanceSize::Small),
            db_instance_type: InstanceType::of(InstanceClass::T3, InstanceSize::Small),
            db_engine_version: EngineVersion::mysql_8_0_36(),
            database_name: DatabaseName::wordpress(),
            multi_az: true,
            allocated_storage_gb: 100,
            listener_port: 80,
            health_check_path: "/wp-includes/images/blank.gif".to_string(),
            account: None,
            region: None,
        }
    }
}

/// Parse an optional override into `target`
fn override_with<T, E>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    target: &mut T,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<(), ConfigError>
where
    E: std::fmt::Display,
{
    if let Some(value) = lookup(var) {
        *target = parse(value.trim()).map_err(|e| ConfigError::InvalidValue {
            var,
            value: value.clone(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other}")),
    }
}

impl StackConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// Unset variables keep their defaults. The result is validated.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        override_with(&lookup, "CIM_STACK_NAME", &mut config.stack_name, |v| {
            Ok::<_, String>(v.to_string())
        })?;
        override_with(&lookup, "CIM_STACK_FLEET_SIZE", &mut config.fleet_size, usize::from_str)?;
        override_with(&lookup, "CIM_STACK_VPC_CIDR", &mut config.vpc_cidr, Ipv4Cidr::from_str)?;
        override_with(&lookup, "CIM_STACK_MAX_AZS", &mut config.max_azs, u8::from_str)?;
        override_with(
            &lookup,
            "CIM_STACK_WEB_INSTANCE_TYPE",
            &mut config.web_instance_type,
            InstanceType::from_str,
        )?;
        override_with(
            &lookup,
            "CIM_STACK_DB_INSTANCE_TYPE",
            &mut config.db_instance_type,
            InstanceType::from_str,
        )?;
        override_with(
            &lookup,
            "CIM_STACK_DB_ENGINE_VERSION",
            &mut config.db_engine_version,
            |v| EngineVersion::parse(v),
        )?;
        override_with(
            &lookup,
            "CIM_STACK_DATABASE_NAME",
            &mut config.database_name,
            |v| DatabaseName::new(v),
        )?;
        override_with(&lookup, "CIM_STACK_MULTI_AZ", &mut config.multi_az, parse_bool)?;
        override_with(
            &lookup,
            "CIM_STACK_ALLOCATED_STORAGE_GB",
            &mut config.allocated_storage_gb,
            u32::from_str,
        )?;
        override_with(
            &lookup,
            "CIM_STACK_LISTENER_PORT",
            &mut config.listener_port,
            u16::from_str,
        )?;
        override_with(
            &lookup,
            "CIM_STACK_HEALTH_CHECK_PATH",
            &mut config.health_check_path,
            |v| Ok::<_, String>(v.to_string()),
        )?;

        config.account = lookup("CDK_DEFAULT_ACCOUNT").filter(|v| !v.is_empty());
        config.region = lookup("CDK_DEFAULT_REGION").filter(|v| !v.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Check the settings describe a stack that can be declared
    pub fn validate(&self) -> Result<(), ConfigError> {
        let name_ok = self.stack_name.len() <= 128
            && self
                .stack_name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic())
            && self
                .stack_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !name_ok {
            return Err(ConfigError::InvalidStackName(self.stack_name.clone()));
        }

        if self.fleet_size == 0 {
            return Err(ConfigError::EmptyFleet);
        }

        if self.max_azs == 0 {
            return Err(ConfigError::NoAvailabilityZones);
        }

        let subnets = usize::from(self.max_azs) * 2;
        if self.vpc_cidr.allocate(subnets).is_err() {
            return Err(ConfigError::VpcTooSmall {
                cidr: self.vpc_cidr,
                subnets,
            });
        }

        if self.listener_port == 0 {
            return Err(ConfigError::InvalidListenerPort);
        }

        if !self.health_check_path.starts_with('/') {
            return Err(ConfigError::InvalidHealthCheckPath(
                self.health_check_path.clone(),
            ));
        }

        if !STORAGE_RANGE_GB.contains(&self.allocated_storage_gb) {
            return Err(ConfigError::InvalidAllocatedStorage(
                self.allocated_storage_gb,
            ));
        }

        Ok(())
    }

    /// Construct ids of the web servers, `WebServer1` through `WebServerN`
    pub fn web_server_ids(&self) -> Vec<String> {
        (1..=self.fleet_size)
            .map(|n| format!("WebServer{n}"))
            .collect()
    }
}
