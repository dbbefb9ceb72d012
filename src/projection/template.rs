// Copyright (c) 2025 - Cowboy AI, Inc.
//! Provisioning Template Projection
//!
//! Folds the declaration log into the JSON template the provisioning engine
//! consumes. One declared construct usually expands into several resources:
//!
//! | Event                  | Resources                                          |
//! |------------------------|----------------------------------------------------|
//! | `NetworkDeclared`      | VPC, subnets, route tables, routes, IGW + attachment, EIP + NAT gateway per zone |
//! | `ComputeUnitDeclared`  | security group, instance, image parameter          |
//! | `DatabaseDeclared`     | subnet group, security group, DB instance          |
//! | `AccessGranted`        | ingress rule (+ egress rule from a load balancer)  |
//! | `LoadBalancerDeclared` | security group, load balancer, DNS name output     |
//! | `ListenerAdded`        | listener                                           |
//! | `TargetGroupAttached`  | target group, listener default action              |
//!
//! Resources are keyed by [`LogicalId`] in a `BTreeMap` and properties are
//! `serde_json::Value` objects (sorted keys), so the rendered template is
//! byte-identical for identical logs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::pure::{fold_projection, LogLevel, SideEffect};
use crate::aggregate::{apply_event, StackState};
use crate::domain::{ConstructId, ConstructPath, LogicalId, Port, Protocol, ResourceKind, SubnetKind};
use crate::events::{
    AccessGrant, ComputeUnit, DatabaseResource, Endpoint, Listener, LoadBalancer,
    NetworkBoundary, StackEvent, TargetGroup,
};

/// Template format understood by the provisioning engine
pub const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// Metadata key carrying the construct path of a resource
pub const PATH_METADATA_KEY: &str = "aws:cdk:path";

const MASTER_USERNAME: &str = "admin";

// ============================================================================
// Template Model
// ============================================================================

/// Synthesized provisioning template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<LogicalId, TemplateParameter>,

    pub resources: BTreeMap<LogicalId, TemplateResource>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, TemplateOutput>,
}

impl Default for Template {
    fn default() -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION.to_string(),
            description: None,
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }
}

/// One resource of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateResource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    pub properties: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<LogicalId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_replace_policy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_policy: Option<String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl TemplateResource {
    /// Resource of `kind` declared at `path`
    ///
    /// Stateful kinds are snapshotted instead of deleted.
    pub fn new(kind: ResourceKind, path: &ConstructPath, properties: Value) -> Self {
        let policy = kind.is_stateful().then(|| "Snapshot".to_string());
        Self {
            resource_type: kind.cfn_type().to_string(),
            properties,
            depends_on: Vec::new(),
            update_replace_policy: policy.clone(),
            deletion_policy: policy,
            metadata: BTreeMap::from([(PATH_METADATA_KEY.to_string(), path.to_string())]),
        }
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = LogicalId>) -> Self {
        self.depends_on.extend(ids);
        self
    }

    /// Kind of this resource, `None` for types outside the taxonomy
    pub fn kind(&self) -> Option<ResourceKind> {
        ResourceKind::from_cfn_type(&self.resource_type)
    }

    /// Construct path recorded in the metadata
    pub fn construct_path(&self) -> Option<&str> {
        self.metadata.get(PATH_METADATA_KEY).map(String::as_str)
    }

    /// Logical ids this resource references through `Ref`, `Fn::GetAtt` or
    /// `DependsOn`
    pub fn references(&self) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        collect_references(&self.properties, &mut found);
        found.extend(self.depends_on.iter().map(|id| id.to_string()));
        found
    }
}

fn collect_references(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                found.insert(target.clone());
            }
            if let Some(Value::String(target)) = map
                .get("Fn::GetAtt")
                .and_then(|att| att.as_array())
                .and_then(|att| att.first())
            {
                found.insert(target.clone());
            }
            map.values().for_each(|v| collect_references(v, found));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

/// Input resolved by the engine at deploy time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateParameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,
    pub default: String,
}

/// Value exported once the stack is deployed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Value,
}

impl Template {
    pub fn resource(&self, id: &LogicalId) -> Option<&TemplateResource> {
        self.resources.get(id)
    }

    /// Resource declared at a construct path
    pub fn resource_at(&self, path: &ConstructPath) -> Option<&TemplateResource> {
        self.resources.get(&path.logical_id())
    }

    /// Resources of one kind, in logical id order
    pub fn resources_of(
        &self,
        kind: ResourceKind,
    ) -> impl Iterator<Item = (&LogicalId, &TemplateResource)> {
        self.resources
            .iter()
            .filter(move |(_, r)| r.kind() == Some(kind))
    }

    pub fn count_of(&self, kind: ResourceKind) -> usize {
        self.resources_of(kind).count()
    }

    /// References that name neither a resource nor a parameter, as
    /// `(referencing resource or output, missing target)` pairs
    ///
    /// Empty for every template this module produces.
    pub fn dangling_references(&self) -> Vec<(String, String)> {
        let known: BTreeSet<&str> = self
            .resources
            .keys()
            .chain(self.parameters.keys())
            .map(LogicalId::as_str)
            .collect();

        let from_resources = self
            .resources
            .iter()
            .map(|(id, resource)| (id.to_string(), resource.references()));

        let from_outputs = self.outputs.iter().map(|(name, output)| {
            let mut found = BTreeSet::new();
            collect_references(&output.value, &mut found);
            (name.clone(), found)
        });

        from_resources
            .chain(from_outputs)
            .flat_map(|(owner, targets)| {
                targets
                    .into_iter()
                    .filter(|t| !known.contains(t.as_str()))
                    .map(move |t| (owner.clone(), t))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Render as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

// ============================================================================
// Projection
// ============================================================================

/// Projection state: the template plus the stack it was projected from
///
/// The stack state answers lookups across events (which subnets a unit is
/// placed in, which network a listener's load balancer lives in).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateState {
    pub declared: StackState,
    pub template: Template,
}

impl TemplateState {
    pub fn new(stack: ConstructId) -> Self {
        Self {
            declared: StackState::new(stack),
            template: Template::default(),
        }
    }
}

/// Project a whole declaration log into a template
pub fn project_template(stack: ConstructId, events: &[StackEvent]) -> (Template, Vec<SideEffect>) {
    let (state, effects) = fold_projection(template_projection, TemplateState::new(stack), events);
    (state.template, effects)
}

/// Pure template projection
pub fn template_projection(
    state: TemplateState,
    event: &StackEvent,
) -> (TemplateState, Vec<SideEffect>) {
    let declared = apply_event(state.declared, event);
    let mut out = Emitter {
        template: state.template,
        effects: Vec::new(),
    };

    match event {
        StackEvent::NetworkDeclared { network } => emit_network(&mut out, network),
        StackEvent::ComputeUnitDeclared { unit } => emit_compute_unit(&mut out, &declared, unit),
        StackEvent::DatabaseDeclared { database } => emit_database(&mut out, &declared, database),
        StackEvent::AccessGranted { grant } => emit_grant(&mut out, grant),
        StackEvent::LoadBalancerDeclared { load_balancer } => {
            emit_load_balancer(&mut out, &declared, load_balancer)
        }
        StackEvent::ListenerAdded { listener } => emit_listener(&mut out, listener),
        StackEvent::TargetGroupAttached { target_group } => {
            emit_target_group(&mut out, &declared, target_group)
        }
    }

    let Emitter { template, effects } = out;
    (TemplateState { declared, template }, effects)
}

struct Emitter {
    template: Template,
    effects: Vec<SideEffect>,
}

impl Emitter {
    fn add(&mut self, kind: ResourceKind, path: &ConstructPath, properties: Value) -> LogicalId {
        self.add_resource(TemplateResource::new(kind, path, properties), kind, path)
    }

    fn add_resource(
        &mut self,
        resource: TemplateResource,
        kind: ResourceKind,
        path: &ConstructPath,
    ) -> LogicalId {
        let id = path.logical_id();
        self.template.resources.insert(id.clone(), resource);
        self.effects.push(SideEffect::ResourceEmitted {
            logical_id: id.clone(),
            kind,
        });
        id
    }
}

fn reference(id: &LogicalId) -> Value {
    json!({ "Ref": id })
}

fn get_att(id: &LogicalId, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

fn availability_zone(index: u8) -> Value {
    json!({ "Fn::Select": [index, { "Fn::GetAZs": "" }] })
}

fn name_tag(path: &ConstructPath) -> Value {
    json!([{ "Key": "Name", "Value": path.to_string() }])
}

fn subnet_path(network: &NetworkBoundary, name: &str) -> ConstructPath {
    network.path.child_named(name)
}

fn subnet_refs(network: Option<&NetworkBoundary>, kind: SubnetKind) -> Vec<Value> {
    network
        .map(|n| {
            n.subnets_of(kind)
                .map(|s| reference(&subnet_path(n, &s.name).logical_id()))
                .collect()
        })
        .unwrap_or_default()
}

fn allow_all_outbound() -> Value {
    json!([{
        "CidrIp": "0.0.0.0/0",
        "Description": "Allow all outbound traffic by default",
        "IpProtocol": "-1"
    }])
}

fn security_group_properties(description: String, vpc: &ConstructPath, egress: Value) -> Value {
    json!({
        "GroupDescription": description,
        "SecurityGroupEgress": egress,
        "VpcId": reference(&vpc.logical_id()),
    })
}

/// Insert `FromPort`/`ToPort` unless the rule covers every protocol
fn with_port_range(mut rule: Value, port: &Port) -> Value {
    if port.protocol() != Protocol::All {
        rule["FromPort"] = json!(port.from_port());
        rule["ToPort"] = json!(port.to_port());
    }
    rule
}

fn emit_network(out: &mut Emitter, network: &NetworkBoundary) {
    let vpc = out.add(
        ResourceKind::Vpc,
        &network.path,
        json!({
            "CidrBlock": network.cidr.to_string(),
            "EnableDnsHostnames": true,
            "EnableDnsSupport": true,
            "InstanceTenancy": "default",
            "Tags": name_tag(&network.path),
        }),
    );

    let igw = out.add(
        ResourceKind::InternetGateway,
        &network.path.child_named("IGW"),
        json!({ "Tags": name_tag(&network.path) }),
    );
    let attachment = out.add(
        ResourceKind::VpcGatewayAttachment,
        &network.path.child_named("VPCGW"),
        json!({
            "InternetGatewayId": reference(&igw),
            "VpcId": reference(&vpc),
        }),
    );

    let mut nat_gateways: BTreeMap<u8, LogicalId> = BTreeMap::new();
    for subnet in &network.subnets {
        let path = subnet_path(network, &subnet.name);
        let subnet_id = out.add(
            ResourceKind::Subnet,
            &path,
            json!({
                "AvailabilityZone": availability_zone(subnet.availability_zone),
                "CidrBlock": subnet.cidr.to_string(),
                "MapPublicIpOnLaunch": subnet.kind == SubnetKind::Public,
                "Tags": name_tag(&path),
                "VpcId": reference(&vpc),
            }),
        );

        let route_table = out.add(
            ResourceKind::RouteTable,
            &path.child_named("RouteTable"),
            json!({
                "Tags": name_tag(&path),
                "VpcId": reference(&vpc),
            }),
        );
        let association = out.add(
            ResourceKind::SubnetRouteTableAssociation,
            &path.child_named("RouteTableAssociation"),
            json!({
                "RouteTableId": reference(&route_table),
                "SubnetId": reference(&subnet_id),
            }),
        );

        if subnet.kind == SubnetKind::Public {
            let route_path = path.child_named("DefaultRoute");
            let route = TemplateResource::new(
                ResourceKind::Route,
                &route_path,
                json!({
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "GatewayId": reference(&igw),
                    "RouteTableId": reference(&route_table),
                }),
            )
            .depends_on([attachment.clone()]);
            let route = out.add_resource(route, ResourceKind::Route, &route_path);

            let eip = out.add(
                ResourceKind::Eip,
                &path.child_named("EIP"),
                json!({
                    "Domain": "vpc",
                    "Tags": name_tag(&path),
                }),
            );
            let nat_path = path.child_named("NATGateway");
            let nat = TemplateResource::new(
                ResourceKind::NatGateway,
                &nat_path,
                json!({
                    "AllocationId": get_att(&eip, "AllocationId"),
                    "SubnetId": reference(&subnet_id),
                    "Tags": name_tag(&path),
                }),
            )
            .depends_on([route, association]);
            let nat = out.add_resource(nat, ResourceKind::NatGateway, &nat_path);
            nat_gateways.insert(subnet.availability_zone, nat);
        }
    }

    // Private subnets reach the internet through the NAT gateway of their zone
    for subnet in network.subnets_of(SubnetKind::Private) {
        let Some(nat) = nat_gateways.get(&subnet.availability_zone) else {
            continue;
        };
        let path = subnet_path(network, &subnet.name);
        out.add(
            ResourceKind::Route,
            &path.child_named("DefaultRoute"),
            json!({
                "DestinationCidrBlock": "0.0.0.0/0",
                "NatGatewayId": reference(nat),
                "RouteTableId": reference(&path.child_named("RouteTable").logical_id()),
            }),
        );
    }

    out.effects.push(SideEffect::log(
        LogLevel::Info,
        format!(
            "network {} spans {} availability zones with {} subnets",
            network.path,
            network.max_azs,
            network.subnets.len()
        ),
    ));
}

fn emit_compute_unit(out: &mut Emitter, declared: &StackState, unit: &ComputeUnit) {
    let endpoint = Endpoint::ComputeUnit(unit.path.clone());
    let Some(sg_path) = endpoint.security_group() else {
        return;
    };

    let sg = out.add(
        ResourceKind::SecurityGroup,
        &sg_path,
        json!({
            "GroupDescription": sg_path.to_string(),
            "SecurityGroupEgress": allow_all_outbound(),
            "Tags": name_tag(&unit.path),
            "VpcId": reference(&unit.network.logical_id()),
        }),
    );

    let image_parameter = declared
        .root_path()
        .child_named(&format!("SsmParameterValue:{}", unit.machine_image.ssm_parameter))
        .logical_id();
    out.template.parameters.insert(
        image_parameter.clone(),
        TemplateParameter {
            parameter_type: "AWS::SSM::Parameter::Value<AWS::EC2::Image::Id>".to_string(),
            default: unit.machine_image.ssm_parameter.clone(),
        },
    );

    let network = declared.network_at(&unit.network);
    let subnet = network.and_then(|n| n.subnets_of(unit.subnet_kind).next().map(|s| (n, s)));

    let mut properties = json!({
        "ImageId": reference(&image_parameter),
        "InstanceType": unit.instance_type.to_string(),
        "SecurityGroupIds": [get_att(&sg, "GroupId")],
        "Tags": name_tag(&unit.path),
    });
    if let Some((network, subnet)) = subnet {
        properties["AvailabilityZone"] = availability_zone(subnet.availability_zone);
        properties["SubnetId"] = reference(&subnet_path(network, &subnet.name).logical_id());
    }

    out.add(ResourceKind::Instance, &unit.path, properties);
}

fn emit_database(out: &mut Emitter, declared: &StackState, database: &DatabaseResource) {
    let name = database.path.leaf();
    let network = declared.network_at(&database.network);

    let subnet_group = out.add(
        ResourceKind::DbSubnetGroup,
        &database.path.child_named("SubnetGroup"),
        json!({
            "DBSubnetGroupDescription": format!("Subnet group for {name} database"),
            "SubnetIds": subnet_refs(network, SubnetKind::Private),
        }),
    );

    let sg_path = database.path.child_named("SecurityGroup");
    let sg = out.add(
        ResourceKind::SecurityGroup,
        &sg_path,
        security_group_properties(
            format!("Security group for {name} database"),
            &database.network,
            allow_all_outbound(),
        ),
    );

    out.add(
        ResourceKind::DbInstance,
        &database.path,
        json!({
            "AllocatedStorage": database.allocated_storage_gb.to_string(),
            "CopyTagsToSnapshot": true,
            "DBInstanceClass": database.instance_type.as_database_class(),
            "DBName": database.database_name.as_str(),
            "DBSubnetGroupName": reference(&subnet_group),
            "Engine": database.engine.kind.as_str(),
            "EngineVersion": database.engine.version.as_str(),
            "ManageMasterUserPassword": true,
            "MasterUsername": MASTER_USERNAME,
            "MultiAZ": database.multi_az,
            "Port": database.port().from_port().to_string(),
            "StorageType": "gp2",
            "VPCSecurityGroups": [get_att(&sg, "GroupId")],
        }),
    );

    if !database.multi_az {
        out.effects.push(SideEffect::Warning {
            construct: database.path.clone(),
            message: "database runs in a single availability zone".to_string(),
        });
    }
}

fn emit_grant(out: &mut Emitter, grant: &AccessGrant) {
    let Some(destination_sg) = grant.destination.security_group() else {
        return;
    };
    let destination_id = destination_sg.logical_id();
    let source_sg = grant.source.security_group();
    let label = grant.port.label();

    let peer = match &source_sg {
        Some(sg) => sg.logical_id().to_string(),
        None => "0.0.0.0_0".to_string(),
    };

    let mut ingress = with_port_range(
        json!({
            "Description": grant.description,
            "GroupId": get_att(&destination_id, "GroupId"),
            "IpProtocol": grant.port.protocol().as_ip_protocol(),
        }),
        &grant.port,
    );
    match &source_sg {
        Some(sg) => ingress["SourceSecurityGroupId"] = get_att(&sg.logical_id(), "GroupId"),
        None => ingress["CidrIp"] = json!("0.0.0.0/0"),
    }

    out.add(
        ResourceKind::SecurityGroupIngress,
        &destination_sg.child_named(&format!("from {peer}:{label}")),
        ingress,
    );

    // Load balancer security groups deny all outbound traffic, so every
    // ingress from a load balancer needs the matching egress.
    if let (true, Some(sg)) = (grant.source.is_load_balancer(), source_sg) {
        let egress = with_port_range(
            json!({
                "Description": "Load balancer to target",
                "DestinationSecurityGroupId": get_att(&destination_id, "GroupId"),
                "GroupId": get_att(&sg.logical_id(), "GroupId"),
                "IpProtocol": grant.port.protocol().as_ip_protocol(),
            }),
            &grant.port,
        );
        out.add(
            ResourceKind::SecurityGroupEgress,
            &sg.child_named(&format!("to {destination_id}:{label}")),
            egress,
        );
    }
}

fn emit_load_balancer(out: &mut Emitter, declared: &StackState, load_balancer: &LoadBalancer) {
    let network = declared.network_at(&load_balancer.network);
    let sg_path = load_balancer.path.child_named("SecurityGroup");

    let sg = out.add(
        ResourceKind::SecurityGroup,
        &sg_path,
        security_group_properties(
            format!(
                "Automatically created Security Group for ELB {}",
                load_balancer.path.logical_id()
            ),
            &load_balancer.network,
            json!([{
                "CidrIp": "255.255.255.255/32",
                "Description": "Disallow all traffic",
                "FromPort": 252,
                "IpProtocol": "icmp",
                "ToPort": 86
            }]),
        ),
    );

    let (scheme, subnet_kind) = if load_balancer.internet_facing {
        ("internet-facing", SubnetKind::Public)
    } else {
        ("internal", SubnetKind::Private)
    };

    // Public routes must exist before an internet-facing load balancer
    let routes: Vec<LogicalId> = match (load_balancer.internet_facing, network) {
        (true, Some(n)) => n
            .subnets_of(SubnetKind::Public)
            .map(|s| subnet_path(n, &s.name).child_named("DefaultRoute").logical_id())
            .collect(),
        _ => Vec::new(),
    };

    let resource = TemplateResource::new(
        ResourceKind::LoadBalancer,
        &load_balancer.path,
        json!({
            "LoadBalancerAttributes": [
                { "Key": "deletion_protection.enabled", "Value": "false" }
            ],
            "Scheme": scheme,
            "SecurityGroups": [get_att(&sg, "GroupId")],
            "Subnets": subnet_refs(network, subnet_kind),
            "Type": "application",
        }),
    )
    .depends_on(routes);
    let id = out.add_resource(resource, ResourceKind::LoadBalancer, &load_balancer.path);

    let output_name: String = load_balancer
        .path
        .relative()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    out.template.outputs.insert(
        format!("{output_name}DnsName"),
        TemplateOutput {
            description: Some(format!("DNS name of {}", load_balancer.path.relative())),
            value: get_att(&id, "DNSName"),
        },
    );
}

fn emit_listener(out: &mut Emitter, listener: &Listener) {
    out.add(
        ResourceKind::Listener,
        &listener.path,
        json!({
            "LoadBalancerArn": reference(&listener.load_balancer.logical_id()),
            "Port": listener.port,
            "Protocol": listener.protocol.as_str(),
        }),
    );
}

fn emit_target_group(out: &mut Emitter, declared: &StackState, target_group: &TargetGroup) {
    let vpc = declared
        .listener(&target_group.listener)
        .and_then(|l| declared.load_balancer(&l.load_balancer))
        .map(|lb| lb.network.logical_id());

    let targets: Vec<Value> = target_group
        .targets
        .iter()
        .map(|t| json!({ "Id": reference(&t.unit.logical_id()), "Port": t.port }))
        .collect();

    let mut properties = json!({
        "HealthCheckPath": target_group.health_check.path,
        "Port": target_group.port,
        "Protocol": target_group.protocol.as_str(),
        "TargetGroupAttributes": [
            { "Key": "stickiness.enabled", "Value": "false" }
        ],
        "TargetType": "instance",
        "Targets": targets,
    });
    if let Some(vpc) = vpc {
        properties["VpcId"] = reference(&vpc);
    }

    let group = out.add(ResourceKind::TargetGroup, &target_group.path, properties);

    if let Some(listener) = out
        .template
        .resources
        .get_mut(&target_group.listener.logical_id())
    {
        listener.properties["DefaultActions"] = json!([{
            "TargetGroupArn": reference(&group),
            "Type": "forward"
        }]);
    }

    out.effects.push(SideEffect::log(
        LogLevel::Info,
        format!(
            "{} forwards to {} targets, health check {}",
            target_group.path,
            target_group.targets.len(),
            target_group.health_check.path
        ),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::*;
    use crate::domain::{
        DatabaseEngine, DatabaseName, EngineVersion, InstanceClass, InstanceSize, InstanceType,
        Ipv4Cidr,
    };
    use crate::events::{HealthCheck, MachineImage, Target};

    fn stack() -> ConstructId {
        ConstructId::new("S").unwrap()
    }

    fn at(name: &str) -> ConstructPath {
        ConstructPath::root(stack()).child_named(name)
    }

    fn unit_path() -> ConstructPath {
        at("Web").child_named("Instance")
    }

    /// Drive the handlers the way the builder does
    fn declare(multi_az: bool) -> Vec<StackEvent> {
        let mut state = StackState::new(stack());
        let mut events = Vec::new();
        let mut record = |state: &mut StackState, event: StackEvent| {
            *state = apply_event(state.clone(), &event);
            events.push(event);
        };

        let e = handle_declare_network(
            &state,
            NetworkSpec {
                path: at("Vpc"),
                cidr: Ipv4Cidr::DEFAULT_VPC,
                max_azs: 2,
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_declare_compute_unit(
            &state,
            ComputeUnitSpec {
                path: unit_path(),
                network: at("Vpc"),
                instance_type: InstanceType::of(InstanceClass::T2, InstanceSize::Small),
                subnet_kind: SubnetKind::Public,
                machine_image: MachineImage::default(),
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_declare_database(
            &state,
            DatabaseSpec {
                path: at("Db"),
                network: at("Vpc"),
                engine: DatabaseEngine::mysql(EngineVersion::mysql_8_0_36()),
                instance_type: InstanceType::of(InstanceClass::T3, InstanceSize::Small),
                database_name: DatabaseName::wordpress(),
                multi_az,
                allocated_storage_gb: 100,
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_grant_access(
            &state,
            GrantSpec {
                source: Endpoint::ComputeUnit(unit_path()),
                destination: Endpoint::Database(at("Db")),
                port: Port::tcp(3306),
                description: None,
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_declare_load_balancer(
            &state,
            LoadBalancerSpec {
                path: at("Lb"),
                network: at("Vpc"),
                internet_facing: true,
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_add_listener(
            &state,
            ListenerSpec {
                path: at("Lb").child_named("Listener"),
                load_balancer: at("Lb"),
                port: 80,
                protocol: None,
                open: true,
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_attach_target_group(
            &state,
            TargetGroupSpec {
                path: at("Lb").child_named("Listener").child_named("Fleet"),
                listener: at("Lb").child_named("Listener"),
                port: 80,
                protocol: None,
                health_check: HealthCheck {
                    path: "/health".to_string(),
                },
                targets: vec![Target {
                    unit: unit_path(),
                    port: 80,
                }],
            },
        )
        .unwrap();
        record(&mut state, e);

        let e = handle_grant_access(
            &state,
            GrantSpec {
                source: Endpoint::LoadBalancer(at("Lb")),
                destination: Endpoint::ComputeUnit(unit_path()),
                port: Port::tcp(80),
                description: None,
            },
        )
        .unwrap();
        record(&mut state, e);

        events
    }

    #[test]
    fn test_network_expansion() {
        let (template, _) = project_template(stack(), &declare(true));

        assert_eq!(template.count_of(ResourceKind::Vpc), 1);
        assert_eq!(template.count_of(ResourceKind::Subnet), 4);
        assert_eq!(template.count_of(ResourceKind::RouteTable), 4);
        assert_eq!(template.count_of(ResourceKind::Route), 4);
        assert_eq!(template.count_of(ResourceKind::InternetGateway), 1);
        assert_eq!(template.count_of(ResourceKind::Eip), 2);
        assert_eq!(template.count_of(ResourceKind::NatGateway), 2);

        let vpc = template.resource_at(&at("Vpc")).unwrap();
        assert_eq!(vpc.properties["CidrBlock"], "10.0.0.0/16");
    }

    #[test]
    fn test_private_subnets_route_through_nat_in_same_zone() {
        let events = declare(true);
        let (template, _) = project_template(stack(), &events);
        let state = StackState::from_events(stack(), &events);
        let network = state.network().unwrap();

        for private in network.subnets_of(SubnetKind::Private) {
            let public = network
                .subnets_of(SubnetKind::Public)
                .find(|p| p.availability_zone == private.availability_zone)
                .unwrap();
            let nat_id = subnet_path(network, &public.name)
                .child_named("NATGateway")
                .logical_id();

            let route = template
                .resource_at(&subnet_path(network, &private.name).child_named("DefaultRoute"))
                .unwrap();
            assert_eq!(route.properties["NatGatewayId"], reference(&nat_id));
            assert!(route.properties.get("GatewayId").is_none());
        }

        let nat = template
            .resources_of(ResourceKind::NatGateway)
            .map(|(_, r)| r)
            .next()
            .unwrap();
        assert_eq!(nat.depends_on.len(), 2);
    }

    #[test]
    fn test_database_properties() {
        let (template, effects) = project_template(stack(), &declare(true));
        let db = template.resource_at(&at("Db")).unwrap();

        assert_eq!(db.resource_type, "AWS::RDS::DBInstance");
        assert_eq!(db.properties["DBInstanceClass"], "db.t3.small");
        assert_eq!(db.properties["Engine"], "mysql");
        assert_eq!(db.properties["EngineVersion"], "8.0.36");
        assert_eq!(db.properties["DBName"], "wordpress");
        assert_eq!(db.properties["MultiAZ"], true);
        assert_eq!(db.deletion_policy.as_deref(), Some("Snapshot"));
        assert!(!effects.iter().any(SideEffect::is_warning));
    }

    #[test]
    fn test_single_zone_database_warns() {
        let (_, effects) = project_template(stack(), &declare(false));
        assert_eq!(effects.iter().filter(|e| e.is_warning()).count(), 1);
    }

    #[test]
    fn test_grant_rules() {
        let (template, _) = project_template(stack(), &declare(true));

        let ingress: Vec<_> = template
            .resources_of(ResourceKind::SecurityGroupIngress)
            .map(|(_, r)| r)
            .collect();
        assert_eq!(ingress.len(), 2);

        let db_sg = at("Db").child_named("SecurityGroup").logical_id();
        let db_rule = ingress
            .iter()
            .find(|r| r.properties["GroupId"] == get_att(&db_sg, "GroupId"))
            .unwrap();
        assert_eq!(db_rule.properties["FromPort"], 3306);
        assert_eq!(db_rule.properties["IpProtocol"], "tcp");
        assert_eq!(db_rule.properties["Description"], "from Web/Instance:3306");

        assert_eq!(template.count_of(ResourceKind::SecurityGroupEgress), 1);
    }

    #[test]
    fn test_one_rule_per_grant_across_protocols() {
        let mut events = declare(true);
        for port in [Port::tcp(53), Port::udp(53)] {
            let state = StackState::from_events(stack(), &events);
            let e = handle_grant_access(
                &state,
                GrantSpec {
                    source: Endpoint::LoadBalancer(at("Lb")),
                    destination: Endpoint::ComputeUnit(unit_path()),
                    port,
                    description: None,
                },
            )
            .unwrap();
            events.push(e);
        }

        let (template, _) = project_template(stack(), &events);
        let grants = StackState::from_events(stack(), &events).grants.len();

        assert_eq!(grants, 4);
        assert_eq!(template.count_of(ResourceKind::SecurityGroupIngress), grants);
        assert_eq!(template.count_of(ResourceKind::SecurityGroupEgress), 3);

        let protocols: BTreeSet<_> = template
            .resources_of(ResourceKind::SecurityGroupIngress)
            .filter(|(_, r)| r.properties["FromPort"] == 53)
            .filter_map(|(_, r)| r.properties["IpProtocol"].as_str())
            .collect();
        assert_eq!(protocols, BTreeSet::from(["tcp", "udp"]));
    }

    #[test]
    fn test_listener_forwards_to_target_group() {
        let (template, _) = project_template(stack(), &declare(true));

        let listener = template
            .resource_at(&at("Lb").child_named("Listener"))
            .unwrap();
        let group_id = at("Lb")
            .child_named("Listener")
            .child_named("Fleet")
            .logical_id();
        assert_eq!(
            listener.properties["DefaultActions"][0]["TargetGroupArn"],
            reference(&group_id)
        );

        let group = template.resource(&group_id).unwrap();
        assert_eq!(group.properties["HealthCheckPath"], "/health");
        assert_eq!(group.properties["Targets"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_every_reference_resolves() {
        let (template, _) = project_template(stack(), &declare(true));
        assert_eq!(template.dangling_references(), vec![]);
        assert_eq!(template.outputs.len(), 1);
        assert!(template.outputs.contains_key("LbDnsName"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let events = declare(true);
        let (a, _) = project_template(stack(), &events);
        let (b, _) = project_template(stack(), &events);
        assert_eq!(a.to_json_pretty().unwrap(), b.to_json_pretty().unwrap());
    }
}
