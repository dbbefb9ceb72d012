//! Error types for stack declaration and synthesis

use thiserror::Error;

use crate::aggregate::CommandError;
use crate::config::ConfigError;
use crate::domain::{
    CidrError, ConstructIdError, EngineError, InstanceTypeError, ValidationError,
};

/// Errors that can occur while declaring or synthesizing a stack
#[derive(Debug, Error)]
pub enum StackError {
    /// A declaration was rejected by the aggregate
    #[error("Declaration rejected: {0}")]
    Command(#[from] CommandError),

    /// The finished stack breaks a topology invariant
    #[error("Stack validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid construct id: {0}")]
    ConstructId(#[from] ConstructIdError),

    #[error("Invalid CIDR block: {0}")]
    Cidr(#[from] CidrError),

    #[error("Invalid instance type: {0}")]
    InstanceType(#[from] InstanceTypeError),

    #[error("Invalid database engine settings: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::Serialization(err.to_string())
    }
}
