// Copyright (c) 2025 - Cowboy AI, Inc.
//! Managed Database Engine Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::Port;

/// Engine validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid engine version: {0} (expected <major>.<minor>[.<patch>])")]
    InvalidVersion(String),

    #[error("Invalid database name: {0} (1-64 alphanumerics or underscores, starting with a letter)")]
    InvalidDatabaseName(String),
}

/// Relational engine family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Mysql,
    Mariadb,
    Postgres,
}

impl EngineKind {
    /// Engine name understood by the provisioning engine
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Mariadb => "mariadb",
            Self::Postgres => "postgres",
        }
    }

    /// Port the engine listens on unless told otherwise
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Mysql | Self::Mariadb => 3306,
            Self::Postgres => 5432,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dotted engine version (`8.0.36`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineVersion(String);

impl EngineVersion {
    /// MySQL 8.0.36
    pub fn mysql_8_0_36() -> Self {
        Self("8.0.36".to_string())
    }

    /// Parse with validation
    pub fn parse(version: impl Into<String>) -> Result<Self, EngineError> {
        let version = version.into();
        let parts: Vec<&str> = version.split('.').collect();

        let well_formed = (2..=3).contains(&parts.len())
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));

        if !well_formed {
            return Err(EngineError::InvalidVersion(version));
        }

        Ok(Self(version))
    }

    /// Full version string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<major>.<minor>`, which selects the parameter group family
    pub fn major(&self) -> &str {
        match self.0.match_indices('.').nth(1) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EngineVersion {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EngineVersion> for String {
    fn from(value: EngineVersion) -> Self {
        value.0
    }
}

/// Engine kind plus version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseEngine {
    pub kind: EngineKind,
    pub version: EngineVersion,
}

impl DatabaseEngine {
    /// MySQL at the given version
    pub fn mysql(version: EngineVersion) -> Self {
        Self {
            kind: EngineKind::Mysql,
            version,
        }
    }

    /// Port clients connect on
    pub fn default_port(&self) -> Port {
        Port::tcp(self.kind.default_port())
    }
}

impl fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.version)
    }
}

/// Logical database created inside the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseName(String);

impl DatabaseName {
    pub const MAX_LENGTH: usize = 64;

    /// The blog's database
    pub fn wordpress() -> Self {
        Self("wordpress".to_string())
    }

    pub fn new(name: impl Into<String>) -> Result<Self, EngineError> {
        let name = name.into();

        let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_chars = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !starts_with_letter || !valid_chars || name.len() > Self::MAX_LENGTH {
            return Err(EngineError::InvalidDatabaseName(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DatabaseName {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DatabaseName> for String {
    fn from(value: DatabaseName) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_default_port() {
        let engine = DatabaseEngine::mysql(EngineVersion::mysql_8_0_36());
        assert_eq!(engine.default_port(), Port::tcp(3306));
        assert_eq!(engine.to_string(), "mysql 8.0.36");
        assert_eq!(EngineKind::Postgres.default_port(), 5432);
    }

    #[test]
    fn test_engine_version() {
        let v = EngineVersion::parse("8.0.36").unwrap();
        assert_eq!(v.major(), "8.0");
        assert_eq!(EngineVersion::parse("16.2").unwrap().major(), "16.2");

        assert!(EngineVersion::parse("8").is_err());
        assert!(EngineVersion::parse("8.0.x").is_err());
        assert!(EngineVersion::parse("8..36").is_err());
        assert!(EngineVersion::parse("8.0.36.1").is_err());
    }

    #[test]
    fn test_database_name() {
        assert!(DatabaseName::new("wordpress").is_ok());
        assert!(DatabaseName::new("wp_blog2").is_ok());

        assert!(DatabaseName::new("").is_err());
        assert!(DatabaseName::new("2fast").is_err());
        assert!(DatabaseName::new("word-press").is_err());
        assert!(DatabaseName::new("a".repeat(65)).is_err());
    }
}
