// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Projection System
//!
//! Projections over the declaration log are pure functions:
//! - `(State, &StackEvent) → (State, Effects)`
//! - Side effects are returned as data, never performed
//! - Replay is a fold of the log through the projection
//!
//! # Architecture
//!
//! ```text
//! Pure Projection Function          Side Effect Executor
//! ─────────────────────────         ──────────────────────
//!
//! (State, &Event)                   Effects
//!      │                                 │
//!      ▼                                 ▼
//! ┌──────────────┐                 ┌──────────────┐
//! │   project()  │    Effects      │   execute()  │
//! │  pure func   │ ─────────────>  │  logging     │
//! └──────────────┘                 └──────────────┘
//!      │
//!      ▼
//! (New State, Effects)
//! ```
//!
//! The graph and template projections are both built on [`fold_projection`],
//! so projecting the same log twice yields identical output.

use serde::{Deserialize, Serialize};

use crate::domain::{ConstructPath, LogicalId, ResourceKind};

/// Side effects produced by projections
///
/// Returned as data. An executor decides what to do with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    /// Log a message
    Log {
        /// Log level
        level: LogLevel,
        /// Message
        message: String,
    },

    /// A declaration is valid but probably not what the author wants
    Warning {
        construct: ConstructPath,
        message: String,
    },

    /// A resource was added to the projected template
    ResourceEmitted {
        logical_id: LogicalId,
        kind: ResourceKind,
    },
}

impl SideEffect {
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning { .. })
    }
}

/// Log levels for logging side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
}

/// Pure projection function type
///
/// Takes the current state and one event, returns the new state and the
/// side effects the event caused.
pub type PureProjection<S, E> = fn(S, &E) -> (S, Vec<SideEffect>);

/// Fold a sequence of events through a pure projection
///
/// Returns the final state and every side effect, in event order.
pub fn fold_projection<S, E>(
    projection: PureProjection<S, E>,
    initial_state: S,
    events: &[E],
) -> (S, Vec<SideEffect>) {
    events.iter().fold(
        (initial_state, Vec::new()),
        |(state, mut all_effects), event| {
            let (new_state, mut effects) = projection(state, event);
            all_effects.append(&mut effects);
            (new_state, all_effects)
        },
    )
}
