// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Fan-out, replay and determinism properties of the declared stack.

mod fleet_fan_out;
