// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reusable Constructs
//!
//! A construct is a plain factory over a [`Scope`](crate::stack::Scope): it
//! declares a group of related resources and returns typed references to
//! them. Constructs hold no state of their own.

pub mod web_server;

pub use web_server::{WebServerInstance, WebServerInstanceProps};
