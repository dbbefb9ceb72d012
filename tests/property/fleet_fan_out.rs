// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Fleet Fan-Out
//!
//! Verifies that:
//! - N web servers always produce N database grants, N load balancer
//!   grants and N targets
//! - Every generated configuration yields a valid, acyclic stack
//! - Replaying the declaration log reproduces the stack
//! - Synthesis is deterministic

use proptest::prelude::*;

use crate::fixtures::*;
use cim_blog_stack::events::Endpoint;
use cim_blog_stack::synth::{synthesize, Environment};
use cim_blog_stack::{BlogStack, Stack, StackConfig};

// ============================================================================
// Strategies
// ============================================================================

fn config_strategy() -> impl Strategy<Value = StackConfig> {
    (
        1usize..8,
        any::<bool>(),
        prop_oneof![Just(80u16), Just(8080u16)],
        1u8..=3,
    )
        .prop_map(|(fleet_size, multi_az, listener_port, max_azs)| StackConfig {
            fleet_size,
            multi_az,
            listener_port,
            max_azs,
            ..StackConfig::default()
        })
}

fn declare(config: &StackConfig) -> Stack {
    BlogStack::assemble(config)
        .expect("generated configuration must assemble")
        .into_stack()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Property: every unit gets exactly one grant per peer and one target
    #[test]
    fn prop_fan_out_scales_with_fleet(config in config_strategy()) {
        let stack = declare(&config);
        let state = stack.state();
        let n = config.fleet_size;

        let db = Endpoint::Database(state.databases[0].path.clone());
        let db_grants = state.grants_to(&db).count();
        let lb_grants = state.grants.iter().filter(|g| g.source.is_load_balancer()).count();
        let targets = state.target_groups[0].targets.len();

        prop_assert_eq!(state.compute_units.len(), n, "unit count");
        prop_assert_eq!(db_grants, n, "database grants");
        prop_assert_eq!(lb_grants, n, "load balancer grants");
        prop_assert_eq!(targets, n, "targets");
    }

    /// Property: generated stacks satisfy every invariant
    #[test]
    fn prop_generated_stack_is_valid(config in config_strategy()) {
        let stack = declare(&config);

        prop_assert_eq!(stack.validate(), Ok(()));

        let graph = stack.graph();
        let order = graph.topological_order();
        prop_assert!(order.is_some(), "dependency graph must be acyclic");
        prop_assert_eq!(order.map(|o| o.len()), Some(graph.node_count()));

        let (template, _) = stack.template();
        prop_assert!(template.dangling_references().is_empty());
    }

    /// Property: replaying the declaration log reproduces the stack
    #[test]
    fn prop_replay_reproduces_stack(config in config_strategy()) {
        let stack = declare(&config);
        let replayed = Stack::from_events(stack.name().clone(), stack.events().to_vec());

        prop_assert_eq!(replayed, stack);
    }

    /// Property: declaring twice synthesizes byte-identical files
    #[test]
    fn prop_synthesis_is_deterministic(config in config_strategy()) {
        let first = synthesize(&declare(&config), &Environment::default(), fixed_timestamp());
        let second = synthesize(&declare(&config), &Environment::default(), fixed_timestamp());

        prop_assert!(first.is_ok());
        prop_assert_eq!(
            first.and_then(|a| a.files()).ok(),
            second.and_then(|a| a.files()).ok()
        );
    }

    /// Property: the database only ever admits compute units
    #[test]
    fn prop_database_admits_only_units(config in config_strategy()) {
        let stack = declare(&config);
        let state = stack.state();
        let db = Endpoint::Database(state.databases[0].path.clone());

        for grant in state.grants_to(&db) {
            prop_assert!(
                matches!(grant.source, Endpoint::ComputeUnit(_)),
                "unexpected database source {}",
                grant.source
            );
        }
    }
}
