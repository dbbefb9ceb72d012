// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Assembly Writers

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{AssemblyError, CloudAssembly};

/// Destination for a synthesized cloud assembly
#[async_trait]
pub trait AssemblyWriter: Send + Sync {
    /// Write every file of the assembly, returning where each went
    async fn write(&mut self, assembly: &CloudAssembly) -> Result<Vec<PathBuf>, AssemblyError>;
}

/// Writes the assembly into a directory, creating it if needed
#[derive(Debug, Clone)]
pub struct FileSystemWriter {
    out_dir: PathBuf,
}

impl FileSystemWriter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait]
impl AssemblyWriter for FileSystemWriter {
    async fn write(&mut self, assembly: &CloudAssembly) -> Result<Vec<PathBuf>, AssemblyError> {
        let files = assembly.files()?;

        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .map_err(|source| AssemblyError::Io {
                path: self.out_dir.clone(),
                source,
            })?;

        let mut written = Vec::with_capacity(files.len());
        for (name, contents) in files {
            let path = self.out_dir.join(name);
            tokio::fs::write(&path, contents)
                .await
                .map_err(|source| AssemblyError::Io {
                    path: path.clone(),
                    source,
                })?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        info!(
            "Cloud assembly for {} written to {}",
            assembly.stack_name,
            self.out_dir.display()
        );
        Ok(written)
    }
}

/// Keeps the rendered files in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter {
    pub files: BTreeMap<String, String>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

#[async_trait]
impl AssemblyWriter for MemoryWriter {
    async fn write(&mut self, assembly: &CloudAssembly) -> Result<Vec<PathBuf>, AssemblyError> {
        let files = assembly.files()?;
        let names = files.keys().map(PathBuf::from).collect();
        self.files.extend(files);
        Ok(names)
    }
}
