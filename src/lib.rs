//! Declarative blog stack for the Composable Information Machine
//!
//! Declares a fixed cloud topology (one VPC, a fleet of web servers, a
//! managed MySQL database and an internet-facing load balancer) as an
//! event-sourced resource graph, and synthesizes it into the template and
//! manifest a provisioning engine consumes.
//!
//! ```text
//! StackConfig → BlogStack::assemble → Scope → handlers → [StackEvent]
//!                                                            │
//!                               ┌────────────────────────────┼──────────────┐
//!                               ▼                            ▼              ▼
//!                         StackState                  ResourceGraph     Template
//!                     (validate_stack)                                     │
//!                                                                  synth::synthesize
//!                                                                          ▼
//!                                                                   CloudAssembly
//! ```
//!
//! Declaration never performs I/O. Only writing the assembly is async.

pub mod aggregate;
pub mod assembly;
pub mod config;
pub mod constructs;
pub mod domain;
pub mod errors;
pub mod events;
pub mod projection;
pub mod stack;
pub mod synth;

// Re-export commonly used types
pub use assembly::BlogStack;
pub use config::{ConfigError, StackConfig};
pub use constructs::{WebServerInstance, WebServerInstanceProps};
pub use domain::{ConstructId, ConstructPath, LogicalId, ResourceCategory, ResourceKind};
pub use errors::{StackError, StackResult};
pub use events::StackEvent;
pub use stack::{Scope, Stack};
pub use synth::{synthesize, AssemblyError, CloudAssembly};
