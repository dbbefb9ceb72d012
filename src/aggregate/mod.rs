// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Aggregate
//!
//! The declaration of a stack is event sourced:
//!
//! ```text
//! Spec → handle_*(&StackState, Spec) → StackEvent → apply_event → StackState
//! ```
//!
//! Handlers are pure: no I/O, no clock, no random ids. The same sequence of
//! specs always produces the same events, and folding those events always
//! produces the same state.

pub mod commands;
pub mod handlers;
pub mod stack;

pub use commands::*;
pub use handlers::*;
pub use stack::{apply_event, StackState};
