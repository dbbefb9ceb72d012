// Copyright (c) 2025 - Cowboy AI, Inc.
//! Side Effect Executor
//!
//! Executors interpret the side effects returned by pure projections.
//!
//! ```text
//! template projection ──> Vec<SideEffect> ──> executor.execute()
//!   (pure, per event)        Log / Warning        (async, in order)
//!                            ResourceEmitted
//! ```
//!
//! Synthesis hands its effects to a [`LoggingExecutor`]; tests use a
//! [`CollectingExecutor`] and inspect what was produced.

use super::pure::{LogLevel, SideEffect};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Interprets projection effects outside the pure fold
#[async_trait]
pub trait SideEffectExecutor: Send + Sync {
    /// Execute a batch of side effects in order
    ///
    /// If any effect fails, the remaining effects are not executed.
    async fn execute(&mut self, effects: Vec<SideEffect>) -> Result<(), ExecutorError>;

    /// Execute a single side effect
    async fn execute_one(&mut self, effect: SideEffect) -> Result<(), ExecutorError> {
        self.execute(vec![effect]).await
    }
}

/// Failure while interpreting an effect
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Effect is not supported by this executor
    #[error("Unsupported effect: {0}")]
    UnsupportedEffect(String),

    /// Effect execution failed
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Logging executor - emits every effect through `tracing`
///
/// Resource emissions go out at debug level, warnings at warn level.
#[derive(Debug, Clone, Default)]
pub struct LoggingExecutor {
    /// Effects that have been logged
    pub logged_effects: Vec<SideEffect>,
}

impl LoggingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all logged effects
    pub fn effects(&self) -> &[SideEffect] {
        &self.logged_effects
    }

    /// Number of warnings logged so far
    pub fn warning_count(&self) -> usize {
        self.logged_effects.iter().filter(|e| e.is_warning()).count()
    }
}

#[async_trait]
impl SideEffectExecutor for LoggingExecutor {
    async fn execute(&mut self, effects: Vec<SideEffect>) -> Result<(), ExecutorError> {
        for effect in effects {
            match &effect {
                SideEffect::Log { level, message } => match level {
                    LogLevel::Debug => debug!("{message}"),
                    LogLevel::Info => info!("{message}"),
                    LogLevel::Warn => warn!("{message}"),
                },
                SideEffect::Warning { construct, message } => {
                    warn!(construct = %construct, "{message}");
                }
                SideEffect::ResourceEmitted { logical_id, kind } => {
                    debug!(logical_id = %logical_id, kind = kind.cfn_type(), "Resource emitted");
                }
            }
            self.logged_effects.push(effect);
        }
        Ok(())
    }
}

/// Collecting executor - keeps effects for later inspection
#[derive(Debug, Clone, Default)]
pub struct CollectingExecutor {
    /// Collected effects
    pub collected: Vec<SideEffect>,
}

impl CollectingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all collected effects
    pub fn effects(&self) -> &[SideEffect] {
        &self.collected
    }

    /// Take all collected effects, leaving the collector empty
    pub fn take_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.collected)
    }
}

#[async_trait]
impl SideEffectExecutor for CollectingExecutor {
    async fn execute(&mut self, mut effects: Vec<SideEffect>) -> Result<(), ExecutorError> {
        self.collected.append(&mut effects);
        Ok(())
    }
}
