// Copyright (c) 2025 - Cowboy AI, Inc.

//! Projections of the Declaration Log
//!
//! A projection is a functor from the declaration log into a read model:
//!
//! ```text
//! [StackEvent] ────F──────> ReadModel
//!    │                        │
//!    │ Events                 │ Updates
//!    ▼                        ▼
//! [e1, e2, e3]  ──>  [u1, u2, u3]
//! ```
//!
//! - **Identity**: the empty log projects to the empty model
//! - **Composition**: projecting `e1 ++ e2` equals projecting `e2` from the
//!   model of `e1`
//!
//! Two read models exist:
//! - [`graph`]: the resource dependency graph
//! - [`template`]: the provisioning template handed to the engine

pub mod executor;
pub mod graph;
pub mod pure;
pub mod template;

pub use executor::{CollectingExecutor, ExecutorError, LoggingExecutor, SideEffectExecutor};
pub use graph::{graph_projection, EdgeKind, GraphEdge, NodeKind, ResourceGraph};
pub use pure::{fold_projection, LogLevel, PureProjection, SideEffect};
pub use template::{
    project_template, template_projection, Template, TemplateOutput, TemplateParameter,
    TemplateResource, TemplateState,
};
