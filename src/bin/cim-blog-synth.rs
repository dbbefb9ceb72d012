// Copyright (c) 2025 - Cowboy AI, Inc.
//! Blog Stack Synthesizer
//!
//! Declares the blog stack, validates it and writes the cloud assembly
//! (`<Stack>.template.json` + `manifest.json`) for the provisioning engine.
//!
//! Run with: cargo run --bin cim-blog-synth
//!
//! Configuration comes from `CIM_STACK_*` environment variables (see
//! `StackConfig::from_env`); the output directory from `CIM_STACK_OUTDIR`
//! (default `cdk.out`).

use anyhow::{Context, Result};
use chrono::Utc;
use cim_blog_stack::{
    projection::{LoggingExecutor, SideEffectExecutor},
    synth::{synthesize, AssemblyWriter, Environment, FileSystemWriter},
    BlogStack, ResourceCategory, StackConfig,
};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Where the assembly is written
fn out_dir_from_env() -> String {
    std::env::var("CIM_STACK_OUTDIR").unwrap_or_else(|_| "cdk.out".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting blog stack synthesis");

    // Load configuration
    let config = StackConfig::from_env().context("Invalid stack configuration")?;
    let out_dir = out_dir_from_env();
    info!("📋 Configuration loaded:");
    info!("  - Stack: {}", config.stack_name);
    info!("  - Web servers: {} x {}", config.fleet_size, config.web_instance_type);
    info!(
        "  - Database: mysql {} on {}",
        config.db_engine_version,
        config.db_instance_type.as_database_class()
    );
    info!("  - Output: {}", out_dir);

    // Declare
    let stack = BlogStack::assemble(&config)
        .context("Failed to declare blog stack")?
        .into_stack();

    let graph = stack.graph();
    let order = graph
        .topological_order()
        .context("Construct dependencies contain a cycle")?;
    info!("🔗 Provisioning order: {}", order.join(" → "));

    // Synthesize
    let environment = Environment {
        account: config.account.clone(),
        region: config.region.clone(),
    };
    let assembly =
        synthesize(&stack, &environment, Utc::now()).context("Failed to synthesize stack")?;

    let mut executor = LoggingExecutor::new();
    executor
        .execute(assembly.effects.clone())
        .await
        .context("Failed to report synthesis effects")?;
    if executor.warning_count() > 0 {
        warn!("⚠️  {} warning(s) raised during synthesis", executor.warning_count());
    }

    // Resource summary
    let mut summary: BTreeMap<ResourceCategory, usize> = BTreeMap::new();
    for resource in assembly.template.resources.values() {
        if let Some(kind) = resource.kind() {
            *summary.entry(kind.category()).or_default() += 1;
        }
    }
    info!("📦 {} resources synthesized:", assembly.template.resources.len());
    for (category, count) in &summary {
        info!("  - {}: {}", category, count);
    }

    // Write
    let mut writer = FileSystemWriter::new(&out_dir);
    let written = writer
        .write(&assembly)
        .await
        .with_context(|| format!("Failed to write cloud assembly to {out_dir}"))?;

    for path in &written {
        info!("✅ Wrote {}", path.display());
    }

    Ok(())
}
