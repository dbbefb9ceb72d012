// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-blog-stack
//!
//! Deterministic inputs shared by the integration tests. The synthesis
//! timestamp is a fixed constant so rendered assemblies are reproducible.
#![allow(dead_code)]

use chrono::{DateTime, Utc};

use cim_blog_stack::domain::ConstructPath;
use cim_blog_stack::synth::{synthesize, CloudAssembly, Environment};
use cim_blog_stack::{BlogStack, Stack, StackConfig};

pub const STACK_NAME: &str = "CdkWorkshopStack";

pub const HEALTH_CHECK_PATH: &str = "/wp-includes/images/blank.gif";

// Fixed synthesis timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Default configuration with a different fleet size
pub fn config_with_fleet(fleet_size: usize) -> StackConfig {
    StackConfig {
        fleet_size,
        ..StackConfig::default()
    }
}

/// Blog stack declared from the default configuration
pub fn default_blog() -> BlogStack {
    BlogStack::assemble(&StackConfig::default()).expect("Default configuration must assemble")
}

/// Stack with `fleet_size` web servers
pub fn stack_with_fleet(fleet_size: usize) -> Stack {
    BlogStack::assemble(&config_with_fleet(fleet_size))
        .expect("Fleet configuration must assemble")
        .into_stack()
}

/// Stack with exactly the given web server ids
pub fn stack_with_servers(ids: &[&str]) -> Stack {
    let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    BlogStack::assemble_with_ids(&StackConfig::default(), &ids)
        .expect("Explicit ids must assemble")
        .into_stack()
}

/// Synthesize with the fixed timestamp and an unknown environment
pub fn synthesize_fixed(stack: &Stack) -> CloudAssembly {
    synthesize(stack, &Environment::default(), fixed_timestamp())
        .expect("Valid stack must synthesize")
}

/// Path of the instance declared by web server `n`
pub fn web_server_instance(stack: &Stack, n: usize) -> ConstructPath {
    stack
        .state()
        .root_path()
        .child_named(&format!("WebServer{n}"))
        .child_named("Instance")
}
