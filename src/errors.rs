// src/errors.rs

//! Crate-wide error types.
//!
//! - [`GraphError`] covers structural violations (duplicate names, dangling
//!   edges, premature removal) and cycles found while sorting.
//! - [`HashError`] covers content hashing: missing paths, kind mismatches,
//!   values that have no canonical form.
//! - [`WorkdagError`] wraps both plus config loading failures.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::DeclaredType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node '{0}' appears more than once in the graph")]
    DuplicateNode(String),

    #[error("edge ({from}, {to}) can't be added to the graph: endpoint is not a node")]
    DanglingEdge { from: String, to: String },

    #[error("node '{0}' is not present in the graph")]
    NodeNotFound(String),

    #[error("node '{node}' shouldn't be run, has to wait for {waiting_on:?}")]
    NotReady {
        node: String,
        waiting_on: Vec<String>,
    },

    #[error("cycle detected; nodes stuck waiting on each other: {0:?}")]
    Cycle(Vec<String>),

    #[error("presorted order does not match the graph's nodes: {0}")]
    InvalidPresort(String),
}

#[derive(Error, Debug)]
pub enum HashError {
    #[error("file not found: {0:?}")]
    FileNotFound(PathBuf),

    #[error("not a regular file: {0:?}")]
    NotAFile(PathBuf),

    #[error("directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {0:?}")]
    NotADirectory(PathBuf),

    #[error("cannot hash non-finite float {0}")]
    NonFiniteFloat(f64),

    #[error("a {found} value cannot be hashed as {declared}")]
    DeclaredTypeMismatch {
        declared: DeclaredType,
        found: &'static str,
    },

    #[error("IO error while hashing {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize canonical form: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WorkdagError>;
