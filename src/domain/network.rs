// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CidrError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidNotation(String),

    #[error("Invalid prefix length: {0} (must be 0-32)")]
    InvalidPrefixLength(u8),

    #[error("Host bits set in network address: {0}")]
    HostBitsSet(String),

    #[error("Cannot split {cidr} into {count} blocks")]
    CannotSplit { cidr: String, count: usize },
}

/// IPv4 network block in CIDR notation
///
/// Invariants:
/// - Prefix length 0-32
/// - Address is the network address (no host bits set)
///
/// # Examples
///
/// ```rust
/// use cim_blog_stack::domain::Ipv4Cidr;
///
/// let vpc: Ipv4Cidr = "10.0.0.0/16".parse().unwrap();
/// assert_eq!(vpc.prefix_len(), 16);
/// assert_eq!(vpc.size(), 65536);
///
/// // 10.0.0.1/16 is a host address, not a network
/// assert!("10.0.0.1/16".parse::<Ipv4Cidr>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ipv4Cidr {
    address: Ipv4Addr,
    prefix_len: u8,
}

impl Ipv4Cidr {
    /// `10.0.0.0/16`
    pub const DEFAULT_VPC: Ipv4Cidr = Ipv4Cidr {
        address: Ipv4Addr::new(10, 0, 0, 0),
        prefix_len: 16,
    };

    /// Create a network block with validation
    pub fn new(address: Ipv4Addr, prefix_len: u8) -> Result<Self, CidrError> {
        if prefix_len > 32 {
            return Err(CidrError::InvalidPrefixLength(prefix_len));
        }

        let raw = u32::from(address);
        if raw & !Self::mask(prefix_len) != 0 {
            return Err(CidrError::HostBitsSet(format!("{}/{}", address, prefix_len)));
        }

        Ok(Self { address, prefix_len })
    }

    fn mask(prefix_len: u8) -> u32 {
        if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - u32::from(prefix_len))
        }
    }

    /// Network address
    pub fn network(&self) -> Ipv4Addr {
        self.address
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Netmask as a dotted address
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(Self::mask(self.prefix_len))
    }

    /// Number of addresses in the block
    pub fn size(&self) -> u64 {
        1u64 << (32 - u32::from(self.prefix_len))
    }

    /// Last address in the block
    pub fn broadcast(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) | !Self::mask(self.prefix_len))
    }

    /// Check if an address falls inside the block
    pub fn contains_address(&self, address: Ipv4Addr) -> bool {
        u32::from(address) & Self::mask(self.prefix_len) == u32::from(self.address)
    }

    /// Check if another block lies entirely inside this one
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix_len >= self.prefix_len && self.contains_address(other.address)
    }

    /// Check if two blocks share any address
    pub fn overlaps(&self, other: &Ipv4Cidr) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Split into every block of the given (longer) prefix, in address order
    pub fn split(&self, new_prefix: u8) -> Result<Vec<Ipv4Cidr>, CidrError> {
        if new_prefix > 32 {
            return Err(CidrError::InvalidPrefixLength(new_prefix));
        }
        if new_prefix < self.prefix_len {
            return Err(CidrError::CannotSplit {
                cidr: self.to_string(),
                count: 0,
            });
        }

        let step = 1u64 << (32 - u32::from(new_prefix));
        let count = 1u64 << (new_prefix - self.prefix_len);
        let base = u64::from(u32::from(self.address));

        (0..count)
            .map(|i| Ipv4Cidr::new(Ipv4Addr::from((base + i * step) as u32), new_prefix))
            .collect()
    }

    /// Carve `count` equally sized, non-overlapping blocks from the front
    ///
    /// Uses the largest block size that still fits `count` blocks.
    pub fn allocate(&self, count: usize) -> Result<Vec<Ipv4Cidr>, CidrError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let extra_bits = usize::BITS - (count - 1).leading_zeros();
        let new_prefix = u32::from(self.prefix_len) + extra_bits;
        if new_prefix > 32 {
            return Err(CidrError::CannotSplit {
                cidr: self.to_string(),
                count,
            });
        }

        let mut blocks = self.split(new_prefix as u8)?;
        blocks.truncate(count);
        Ok(blocks)
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, prefix_str) = s
            .split_once('/')
            .ok_or_else(|| CidrError::InvalidNotation(s.to_string()))?;

        let address = Ipv4Addr::from_str(addr_str)
            .map_err(|_| CidrError::InvalidAddress(addr_str.to_string()))?;

        let prefix_len = prefix_str
            .parse::<u8>()
            .map_err(|_| CidrError::InvalidNotation(s.to_string()))?;

        Self::new(address, prefix_len)
    }
}

impl TryFrom<String> for Ipv4Cidr {
    type Error = CidrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Ipv4Cidr> for String {
    fn from(cidr: Ipv4Cidr) -> Self {
        cidr.to_string()
    }
}

/// Placement class of a subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetKind {
    /// Routed to the internet gateway; instances get public addresses
    Public,
    /// No direct route from the internet
    Private,
}

impl SubnetKind {
    /// Prefix used when naming subnets of this kind
    pub fn name_prefix(&self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
        }
    }
}

impl fmt::Display for SubnetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Public => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}
