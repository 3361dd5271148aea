//! Source file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::infra::config::Config;

/// A candidate source file found in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub display_name: String,
}

impl SourceFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, display_name }
    }
}

/// Inputs for a directory listing.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub directory: PathBuf,
    pub extension: String,
}

impl DiscoveryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: config.workspace.directory.clone(),
            extension: config.workspace.extension.clone(),
        }
    }

    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }
}

/// List files in the configured directory (non-recursive) matching the extension, sorted by
/// file name. An unreadable directory is an error.
pub fn discover(cfg: &DiscoveryConfig) -> Result<Vec<SourceFile>> {
    let entries = fs::read_dir(&cfg.directory)
        .with_context(|| format!("failed to read directory {}", cfg.directory.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to list directory {}", cfg.directory.display()))?;
        let path = entry.path();
        if !path.is_file() || !has_extension(&path, &cfg.extension) {
            continue;
        }
        files.push(SourceFile::from_path(path));
    }

    files.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    tracing::debug!(
        directory = %cfg.directory.display(),
        count = files.len(),
        "discovered source files"
    );
    Ok(files)
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}
