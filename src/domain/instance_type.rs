// Copyright (c) 2025 - Cowboy AI, Inc.
//! Machine Size Classes
//!
//! `InstanceType` is the `<class>.<size>` pair shared by compute instances
//! (`t2.small`) and database instances (`db.t3.small`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Instance type parse error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InstanceTypeError {
    #[error("Invalid instance type format: {0} (expected <class>.<size>)")]
    InvalidFormat(String),

    #[error("Unknown instance class: {0}")]
    UnknownClass(String),

    #[error("Unknown instance size: {0}")]
    UnknownSize(String),
}

/// Instance family and generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceClass {
    /// Burstable, previous generation
    T2,
    /// Burstable, current generation
    T3,
    /// Burstable, AMD
    T3a,
    /// General purpose
    M5,
    /// Compute optimized
    C5,
    /// Memory optimized
    R5,
}

impl InstanceClass {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::T2 => "t2",
            Self::T3 => "t3",
            Self::T3a => "t3a",
            Self::M5 => "m5",
            Self::C5 => "c5",
            Self::R5 => "r5",
        }
    }

    /// Burstable classes accrue CPU credits
    pub fn is_burstable(&self) -> bool {
        matches!(self, Self::T2 | Self::T3 | Self::T3a)
    }
}

impl FromStr for InstanceClass {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "t2" => Ok(Self::T2),
            "t3" => Ok(Self::T3),
            "t3a" => Ok(Self::T3a),
            "m5" => Ok(Self::M5),
            "c5" => Ok(Self::C5),
            "r5" => Ok(Self::R5),
            _ => Err(InstanceTypeError::UnknownClass(s.to_string())),
        }
    }
}

/// Instance size within a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceSize {
    Nano,
    Micro,
    Small,
    Medium,
    Large,
    XLarge,
}

impl InstanceSize {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nano => "nano",
            Self::Micro => "micro",
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::XLarge => "xlarge",
        }
    }
}

impl FromStr for InstanceSize {
    type Err = InstanceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nano" => Ok(Self::Nano),
            "micro" => Ok(Self::Micro),
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            "xlarge" => Ok(Self::XLarge),
            _ => Err(InstanceTypeError::UnknownSize(s.to_string())),
        }
    }
}

/// Machine size class value object
///
/// # Examples
///
/// ```rust
/// use cim_blog_stack::domain::{InstanceClass, InstanceSize, InstanceType};
///
/// let web = InstanceType::of(InstanceClass::T2, InstanceSize::Small);
/// assert_eq!(web.to_string(), "t2.small");
///
/// let db: InstanceType = "db.t3.small".parse().unwrap();
/// assert_eq!(db.as_database_class(), "db.t3.small");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstanceType {
    class: InstanceClass,
    size: InstanceSize,
}

impl InstanceType {
    /// Combine a class and a size
    pub const fn of(class: InstanceClass, size: InstanceSize) -> Self {
        Self { class, size }
    }

    pub fn class(&self) -> InstanceClass {
        self.class
    }

    pub fn size(&self) -> InstanceSize {
        self.size
    }

    /// Name used for managed database instances (`db.` prefix)
    pub fn as_database_class(&self) -> String {
        format!("db.{}", self)
    }
}

impl fmt::Display for InstanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class.as_str(), self.size.as_str())
    }
}

impl FromStr for InstanceType {
    type Err = InstanceTypeError;

    /// Accepts `t3.small` and the database form `db.t3.small`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("db.").unwrap_or(s);
        let (class, size) = trimmed
            .split_once('.')
            .ok_or_else(|| InstanceTypeError::InvalidFormat(s.to_string()))?;

        if size.contains('.') {
            return Err(InstanceTypeError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            class: class.parse()?,
            size: size.parse()?,
        })
    }
}

impl TryFrom<String> for InstanceType {
    type Error = InstanceTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstanceType> for String {
    fn from(value: InstanceType) -> Self {
        value.to_string()
    }
}
