// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Assembly Synthesis
//!
//! Turns a finished [`Stack`] into the artifacts the provisioning engine
//! reads:
//!
//! ```text
//! Stack ── validate ──> template projection ── reference check ──> CloudAssembly
//!                                                                     │
//!                                                          AssemblyWriter (async)
//!                                                                     ▼
//!                                         <Stack>.template.json + manifest.json
//! ```
//!
//! Synthesis itself is pure; the timestamp is passed in. Nothing is written
//! unless every check passes.

pub mod writer;

pub use writer::{AssemblyWriter, FileSystemWriter, MemoryWriter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

use crate::domain::ValidationError;
use crate::projection::{SideEffect, Template};
use crate::stack::Stack;

/// Cloud assembly schema version written into the manifest
pub const MANIFEST_SCHEMA_VERSION: &str = "36.0.0";

pub const MANIFEST_FILE: &str = "manifest.json";

const STACK_ARTIFACT_TYPE: &str = "aws:cloudformation:stack";

/// Errors raised while synthesizing or writing a cloud assembly
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("Stack is invalid: {0}")]
    Validation(#[from] ValidationError),

    #[error("{resource} references undeclared {target}")]
    DanglingReference { resource: String, target: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Target account and region, unknown until deploy time when unset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "aws://{}/{}",
            self.account.as_deref().unwrap_or("unknown-account"),
            self.region.as_deref().unwrap_or("unknown-region")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactProperties {
    pub template_file: String,
}

/// One deployable unit of the assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub environment: String,
    pub properties: ArtifactProperties,
    pub display_name: String,
}

/// Index of the assembly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub synthesized_at: DateTime<Utc>,
    pub artifacts: BTreeMap<String, Artifact>,
}

/// Everything produced by one synthesis run
#[derive(Debug, Clone, PartialEq)]
pub struct CloudAssembly {
    pub stack_name: String,
    pub manifest: Manifest,
    pub template: Template,
    /// Effects raised while projecting the template
    pub effects: Vec<SideEffect>,
}

impl CloudAssembly {
    /// File name of the stack template
    pub fn template_file(&self) -> String {
        template_file_name(&self.stack_name)
    }

    /// Rendered files, keyed by file name
    pub fn files(&self) -> Result<BTreeMap<String, String>, AssemblyError> {
        Ok(BTreeMap::from([
            (self.template_file(), self.template.to_json_pretty()?),
            (
                MANIFEST_FILE.to_string(),
                serde_json::to_string_pretty(&self.manifest)?,
            ),
        ]))
    }
}

fn template_file_name(stack_name: &str) -> String {
    format!("{stack_name}.template.json")
}

/// Synthesize a cloud assembly
///
/// # Errors
/// - [`AssemblyError::Validation`] if the stack breaks an invariant
/// - [`AssemblyError::DanglingReference`] if the template references a
///   resource it does not declare
pub fn synthesize(
    stack: &Stack,
    environment: &Environment,
    synthesized_at: DateTime<Utc>,
) -> Result<CloudAssembly, AssemblyError> {
    stack.validate()?;

    let (template, effects) = stack.template();

    if let Some((resource, target)) = template.dangling_references().into_iter().next() {
        return Err(AssemblyError::DanglingReference { resource, target });
    }

    let stack_name = stack.name().to_string();
    let artifact = Artifact {
        artifact_type: STACK_ARTIFACT_TYPE.to_string(),
        environment: environment.to_string(),
        properties: ArtifactProperties {
            template_file: template_file_name(&stack_name),
        },
        display_name: stack_name.clone(),
    };

    let manifest = Manifest {
        version: MANIFEST_SCHEMA_VERSION.to_string(),
        synthesized_at,
        artifacts: BTreeMap::from([(stack_name.clone(), artifact)]),
    };

    info!(
        stack = %stack_name,
        resources = template.resources.len(),
        environment = %environment,
        "Synthesized cloud assembly"
    );

    Ok(CloudAssembly {
        stack_name,
        manifest,
        template,
        effects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::BlogStack;
    use crate::config::StackConfig;
    use crate::domain::ConstructId;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(
            Environment::default().to_string(),
            "aws://unknown-account/unknown-region"
        );
        let env = Environment {
            account: Some("123456789012".to_string()),
            region: Some("us-east-1".to_string()),
        };
        assert_eq!(env.to_string(), "aws://123456789012/us-east-1");
    }

    #[test]
    fn test_manifest_points_at_template() {
        let stack = BlogStack::assemble(&StackConfig::default()).unwrap().into_stack();
        let assembly = synthesize(&stack, &Environment::default(), at()).unwrap();

        let artifact = &assembly.manifest.artifacts["CdkWorkshopStack"];
        assert_eq!(artifact.properties.template_file, "CdkWorkshopStack.template.json");
        assert_eq!(artifact.artifact_type, "aws:cloudformation:stack");

        let files = assembly.files().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("manifest.json"));
        assert!(files["CdkWorkshopStack.template.json"].contains("AWSTemplateFormatVersion"));
    }

    #[test]
    fn test_invalid_stack_is_not_synthesized() {
        let stack = Stack::from_events(ConstructId::new("Empty").unwrap(), vec![]);
        assert!(matches!(
            synthesize(&stack, &Environment::default(), at()),
            Err(AssemblyError::Validation(ValidationError::NoNetwork))
        ));
    }
}
