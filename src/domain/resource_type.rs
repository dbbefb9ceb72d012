// Copyright (c) 2025 - Cowboy AI, Inc.
//! Synthesized Resource Taxonomy
//!
//! Every resource the stack emits into a template has a [`ResourceKind`],
//! which fixes its provisioning type name and its high-level category.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a synthesized resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Isolated address space
    Vpc,
    /// Slice of the address space in one availability zone
    Subnet,
    /// Route to the public internet
    InternetGateway,
    /// Binds the internet gateway to the VPC
    VpcGatewayAttachment,
    /// Routing table of one subnet
    RouteTable,
    /// Single route inside a routing table
    Route,
    /// Binds a subnet to its routing table
    SubnetRouteTableAssociation,
    /// Static public address for a NAT gateway
    Eip,
    /// Outbound internet access for private subnets
    NatGateway,

    // Security
    /// Stateful firewall attached to one resource
    SecurityGroup,
    /// Stand-alone inbound rule
    SecurityGroupIngress,
    /// Stand-alone outbound rule
    SecurityGroupEgress,

    // Compute
    /// Virtual machine
    Instance,

    // Database
    /// Subnets a managed database may be placed in
    DbSubnetGroup,
    /// Managed relational database
    DbInstance,

    // Routing
    /// Application load balancer
    LoadBalancer,
    /// Port the load balancer accepts traffic on
    Listener,
    /// Backends traffic is forwarded to
    TargetGroup,
}

impl ResourceKind {
    /// Every kind, in declaration order
    pub const ALL: [ResourceKind; 18] = [
        Self::Vpc,
        Self::Subnet,
        Self::InternetGateway,
        Self::VpcGatewayAttachment,
        Self::RouteTable,
        Self::Route,
        Self::SubnetRouteTableAssociation,
        Self::Eip,
        Self::NatGateway,
        Self::SecurityGroup,
        Self::SecurityGroupIngress,
        Self::SecurityGroupEgress,
        Self::Instance,
        Self::DbSubnetGroup,
        Self::DbInstance,
        Self::LoadBalancer,
        Self::Listener,
        Self::TargetGroup,
    ];

    /// Type name understood by the provisioning engine
    pub fn cfn_type(&self) -> &'static str {
        match self {
            Self::Vpc => "AWS::EC2::VPC",
            Self::Subnet => "AWS::EC2::Subnet",
            Self::InternetGateway => "AWS::EC2::InternetGateway",
            Self::VpcGatewayAttachment => "AWS::EC2::VPCGatewayAttachment",
            Self::RouteTable => "AWS::EC2::RouteTable",
            Self::Route => "AWS::EC2::Route",
            Self::SubnetRouteTableAssociation => "AWS::EC2::SubnetRouteTableAssociation",
            Self::Eip => "AWS::EC2::EIP",
            Self::NatGateway => "AWS::EC2::NatGateway",
            Self::SecurityGroup => "AWS::EC2::SecurityGroup",
            Self::SecurityGroupIngress => "AWS::EC2::SecurityGroupIngress",
            Self::SecurityGroupEgress => "AWS::EC2::SecurityGroupEgress",
            Self::Instance => "AWS::EC2::Instance",
            Self::DbSubnetGroup => "AWS::RDS::DBSubnetGroup",
            Self::DbInstance => "AWS::RDS::DBInstance",
            Self::LoadBalancer => "AWS::ElasticLoadBalancingV2::LoadBalancer",
            Self::Listener => "AWS::ElasticLoadBalancingV2::Listener",
            Self::TargetGroup => "AWS::ElasticLoadBalancingV2::TargetGroup",
        }
    }

    /// Reverse lookup of [`ResourceKind::cfn_type`]
    pub fn from_cfn_type(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.cfn_type() == type_name)
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Vpc => "VPC",
            Self::Subnet => "Subnet",
            Self::InternetGateway => "Internet Gateway",
            Self::VpcGatewayAttachment => "Gateway Attachment",
            Self::RouteTable => "Route Table",
            Self::Route => "Route",
            Self::SubnetRouteTableAssociation => "Route Table Association",
            Self::Eip => "Elastic IP",
            Self::NatGateway => "NAT Gateway",
            Self::SecurityGroup => "Security Group",
            Self::SecurityGroupIngress => "Ingress Rule",
            Self::SecurityGroupEgress => "Egress Rule",
            Self::Instance => "Instance",
            Self::DbSubnetGroup => "DB Subnet Group",
            Self::DbInstance => "DB Instance",
            Self::LoadBalancer => "Load Balancer",
            Self::Listener => "Listener",
            Self::TargetGroup => "Target Group",
        }
    }

    /// Get the primary category for this kind
    pub fn category(&self) -> ResourceCategory {
        match self {
            Self::Vpc
            | Self::Subnet
            | Self::InternetGateway
            | Self::VpcGatewayAttachment
            | Self::RouteTable
            | Self::Route
            | Self::SubnetRouteTableAssociation
            | Self::Eip
            | Self::NatGateway => ResourceCategory::Network,

            Self::SecurityGroup
            | Self::SecurityGroupIngress
            | Self::SecurityGroupEgress => ResourceCategory::Security,

            Self::Instance => ResourceCategory::Compute,

            Self::DbSubnetGroup | Self::DbInstance => ResourceCategory::Database,

            Self::LoadBalancer | Self::Listener | Self::TargetGroup => ResourceCategory::Routing,
        }
    }

    /// Resources that retain data and need an explicit deletion policy
    pub fn is_stateful(&self) -> bool {
        matches!(self, Self::DbInstance)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resource category (high-level grouping)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceCategory {
    Network,
    Security,
    Compute,
    Database,
    Routing,
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "Network"),
            Self::Security => write!(f, "Security"),
            Self::Compute => write!(f, "Compute"),
            Self::Database => write!(f, "Database"),
            Self::Routing => write!(f, "Routing"),
        }
    }
}
