// Copyright (c) 2025 - Cowboy AI, Inc.
//! Blog Stack Assembly Tests
//!
//! End-to-end checks of the declared topology: fan-out per web server,
//! isolation of the database, and deterministic replay and synthesis.

mod fixtures;

use std::collections::BTreeSet;

use fixtures::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

use cim_blog_stack::domain::{ApplicationProtocol, Port, ResourceKind};
use cim_blog_stack::events::Endpoint;
use cim_blog_stack::projection::NodeKind;
use cim_blog_stack::{Stack, StackEvent};

#[test]
fn test_two_server_blog_topology() {
    let blog = default_blog();
    let state = blog.stack.state();

    assert_eq!(state.networks.len(), 1);
    assert_eq!(state.compute_units.len(), 2);
    assert_eq!(state.databases.len(), 1);
    assert_eq!(state.load_balancers.len(), 1);
    assert_eq!(state.listeners.len(), 1);
    assert_eq!(state.target_groups.len(), 1);

    let network = &state.networks[0];
    assert_eq!(network.cidr.to_string(), "10.0.0.0/16");

    for unit in &state.compute_units {
        assert_eq!(unit.instance_type.to_string(), "t2.small");
    }

    let database = &state.databases[0];
    assert!(database.multi_az);
    assert_eq!(database.database_name.as_str(), "wordpress");
    assert_eq!(database.engine.version.as_str(), "8.0.36");
    assert_eq!(database.instance_type.as_database_class(), "db.t3.small");

    let listener = &state.listeners[0];
    assert_eq!(listener.port, 80);
    assert_eq!(listener.protocol, ApplicationProtocol::Http);
    assert!(listener.open);

    let fleet = &state.target_groups[0];
    assert_eq!(fleet.path.leaf().as_str(), "ApplicationFleet");
    assert_eq!(fleet.health_check.path, HEALTH_CHECK_PATH);
    assert_eq!(fleet.targets.len(), 2);

    assert_eq!(blog.stack.validate(), Ok(()));
}

#[test]
fn test_each_unit_reaches_database_on_default_port() {
    let stack = stack_with_fleet(2);
    let state = stack.state();
    let database = &state.databases[0];
    let db = Endpoint::Database(database.path.clone());

    let sources: BTreeSet<_> = state
        .grants_to(&db)
        .inspect(|g| assert_eq!(g.port, Port::tcp(3306)))
        .map(|g| g.source.clone())
        .collect();

    let expected: BTreeSet<_> = (1..=2)
        .map(|n| Endpoint::ComputeUnit(web_server_instance(&stack, n)))
        .collect();
    assert_eq!(sources, expected);
}

#[test]
fn test_load_balancer_never_reaches_database() {
    let stack = stack_with_fleet(3);
    let state = stack.state();
    let db = Endpoint::Database(state.databases[0].path.clone());

    assert!(state.grants_to(&db).all(|g| !g.source.is_load_balancer()));
}

#[test]
fn test_units_accept_only_load_balancer_traffic() {
    let stack = stack_with_fleet(2);
    let state = stack.state();

    for n in 1..=2 {
        let unit = Endpoint::ComputeUnit(web_server_instance(&stack, n));
        let inbound: Vec<_> = state.grants_to(&unit).collect();

        assert_eq!(inbound.len(), 1, "WebServer{n} should have exactly one inbound grant");
        assert!(inbound[0].source.is_load_balancer());
        assert_eq!(inbound[0].port, Port::tcp(80));
    }
}

#[test_case(1 ; "single server")]
#[test_case(2 ; "default fleet")]
#[test_case(5 ; "larger fleet")]
fn test_fan_out_matches_fleet_size(fleet_size: usize) {
    let stack = stack_with_fleet(fleet_size);
    let state = stack.state();

    let db = Endpoint::Database(state.databases[0].path.clone());
    let lb_grants = state
        .grants
        .iter()
        .filter(|g| g.source.is_load_balancer())
        .count();

    assert_eq!(state.compute_units.len(), fleet_size);
    assert_eq!(state.grants_to(&db).count(), fleet_size);
    assert_eq!(lb_grants, fleet_size);
    assert_eq!(state.target_groups[0].targets.len(), fleet_size);
    assert_eq!(stack.validate(), Ok(()));
}

#[test]
fn test_removing_a_unit_removes_only_its_edges() {
    let both = stack_with_servers(&["WebServer1", "WebServer2"]);
    let one = stack_with_servers(&["WebServer1"]);
    let removed = Endpoint::ComputeUnit(web_server_instance(&both, 2));

    // Grants of the surviving unit are untouched
    let kept: Vec<_> = both
        .state()
        .grants
        .iter()
        .filter(|g| g.source != removed && g.destination != removed)
        .cloned()
        .collect();
    assert_eq!(kept, one.state().grants);

    let dropped = both.state().grants.len() - one.state().grants.len();
    assert_eq!(dropped, 2, "one database grant and one load balancer grant");

    let targets_of = |stack: &Stack| -> Vec<String> {
        stack.state().target_groups[0]
            .targets
            .iter()
            .map(|t| t.unit.to_string())
            .collect()
    };
    assert_eq!(
        targets_of(&both),
        vec![
            "CdkWorkshopStack/WebServer1/Instance".to_string(),
            "CdkWorkshopStack/WebServer2/Instance".to_string(),
        ]
    );
    assert_eq!(
        targets_of(&one),
        vec!["CdkWorkshopStack/WebServer1/Instance".to_string()]
    );
}

#[test]
fn test_removing_a_unit_removes_only_its_resources() {
    let (both, _) = stack_with_servers(&["WebServer1", "WebServer2"]).template();
    let (one, _) = stack_with_servers(&["WebServer1"]).template();

    let both_ids: BTreeSet<_> = both.resources.keys().cloned().collect();
    let one_ids: BTreeSet<_> = one.resources.keys().cloned().collect();

    assert!(one_ids.is_subset(&both_ids));

    // Instance, its security group, the database ingress, the unit ingress
    // and the load balancer egress
    let gone: Vec<_> = both_ids.difference(&one_ids).collect();
    assert_eq!(gone.len(), 5);
    for id in gone {
        let path = both.resources[id].construct_path().unwrap_or_default();
        assert!(path.contains("WebServer2"), "{id} at {path} is not WebServer2's");
    }
}

#[test]
fn test_template_resource_counts() {
    let (template, _) = stack_with_fleet(2).template();

    assert_eq!(template.count_of(ResourceKind::Vpc), 1);
    assert_eq!(template.count_of(ResourceKind::Subnet), 4);
    assert_eq!(template.count_of(ResourceKind::Instance), 2);
    assert_eq!(template.count_of(ResourceKind::DbInstance), 1);
    assert_eq!(template.count_of(ResourceKind::LoadBalancer), 1);
    assert_eq!(template.count_of(ResourceKind::Listener), 1);
    assert_eq!(template.count_of(ResourceKind::TargetGroup), 1);
    assert_eq!(template.count_of(ResourceKind::SecurityGroup), 4);
    // 2 database grants, 2 load balancer grants, 1 open listener
    assert_eq!(template.count_of(ResourceKind::SecurityGroupIngress), 5);
    assert_eq!(template.count_of(ResourceKind::SecurityGroupEgress), 2);
    // Each zone gets an elastic IP and a NAT gateway for its private subnet
    assert_eq!(template.count_of(ResourceKind::Eip), 2);
    assert_eq!(template.count_of(ResourceKind::NatGateway), 2);
    assert_eq!(template.count_of(ResourceKind::Route), 4);
    assert_eq!(template.resources.len(), 41);
    assert!(template.dangling_references().is_empty());
}

#[test]
fn test_provisioning_order() {
    let stack = stack_with_fleet(2);
    let graph = stack.graph();
    let order = graph.topological_order().expect("declared stack is acyclic");

    assert_eq!(order.len(), graph.node_count());
    let position = |key: &str| {
        order
            .iter()
            .position(|k| *k == key)
            .unwrap_or_else(|| panic!("{key} missing from order"))
    };

    let vpc = position("CdkWorkshopStack/BlogVpc");
    let lb = position("CdkWorkshopStack/LoadBalancer");
    let listener = position("CdkWorkshopStack/LoadBalancer/Listener");
    let fleet = position("CdkWorkshopStack/LoadBalancer/Listener/ApplicationFleet");

    assert!(vpc < lb);
    assert!(lb < listener);
    assert!(listener < fleet);
    for n in 1..=2 {
        let unit = position(&web_server_instance(&stack, n).to_string());
        assert!(vpc < unit);
        assert!(unit < fleet);
    }

    assert_eq!(graph.nodes_of_kind(NodeKind::Internet).count(), 1);
}

#[test]
fn test_resynthesis_is_byte_identical() {
    let first = synthesize_fixed(&stack_with_fleet(2));
    let second = synthesize_fixed(&stack_with_fleet(2));

    assert_eq!(first.files().unwrap(), second.files().unwrap());
    assert_eq!(stack_with_fleet(2).graph(), stack_with_fleet(2).graph());
}

#[test]
fn test_replay_reproduces_stack() {
    let stack = stack_with_fleet(2);

    let replayed = Stack::from_events(stack.name().clone(), stack.events().to_vec());
    assert_eq!(replayed, stack);
}

#[test]
fn test_replay_from_serialized_log() {
    let stack = stack_with_fleet(2);

    let json = serde_json::to_string(stack.events()).unwrap();
    let events: Vec<StackEvent> = serde_json::from_str(&json).unwrap();
    let replayed = Stack::from_events(stack.name().clone(), events);

    assert_eq!(replayed.state(), stack.state());
    assert_eq!(
        replayed.template().0.to_json_pretty().unwrap(),
        stack.template().0.to_json_pretty().unwrap()
    );
}

#[test]
fn test_serialized_log_with_empty_path_is_rejected() {
    let stack = stack_with_fleet(1);

    let mut network = serde_json::to_value(&stack.events()[0]).unwrap();
    assert_eq!(network["type"], "NetworkDeclared");
    network["network"]["path"] = serde_json::json!([]);

    assert!(serde_json::from_value::<StackEvent>(network).is_err());
}
