// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWorkflowConfig, WorkflowConfig};
use crate::errors::Result;

/// Load a configuration file and return the raw `RawWorkflowConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawWorkflowConfig> {
    let config: RawWorkflowConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file and validate it:
///
/// - at least one task,
/// - no unknown or self references in `after`,
/// - `files` / `dirs` name existing inputs and do not overlap,
/// - no dependency cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowConfig> {
    let raw_config = load_from_path(&path)?;
    WorkflowConfig::try_from(raw_config)
}

/// Directory that relative input paths of a config file are resolved
/// against: the file's parent, or the current directory for a bare name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
