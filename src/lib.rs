// src/lib.rs

pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod hash;
pub mod logging;
pub mod types;

use std::path::Path;

use tracing::{debug, info};

use crate::config::{config_root_dir, load_and_validate};
use crate::dag::Scheduler;
use crate::engine::{
    CacheStore, Executor, FileCacheStore, MemoryCacheStore, RunReport, Runtime,
};
use crate::errors::Result;
use crate::hash::ContentHasher;
use crate::types::CacheMode;

pub use crate::dag::{Edge, Graph, Node};
pub use crate::errors::{GraphError, HashError, WorkdagError};
pub use crate::hash::{hash_dir, hash_file, hash_function, hash_value, Value};
pub use crate::types::DeclaredType;

/// High-level entry point: run the workflow described by a config file.
///
/// This wires together:
/// - config loading and validation
/// - the scheduler built from the task graph
/// - the content hasher configured by `[config]`
/// - the cache store (memory, or `.workdag/cache` next to the config)
/// - the caller's executor
///
/// Logging is left to the caller; see [`logging::init_logging`].
pub async fn run<E: Executor>(config_path: impl AsRef<Path>, executor: E) -> Result<RunReport> {
    let config_path = config_path.as_ref();
    let cfg = load_and_validate(config_path)?;
    let root = config_root_dir(config_path);
    debug!(config = ?config_path, root = ?root, tasks = cfg.task.len(), "loaded workflow");

    let scheduler = Scheduler::from_config(&cfg)?;
    let hasher = ContentHasher::new(cfg.hash_options());

    let mut cache: Box<dyn CacheStore> = match cfg.config.cache {
        CacheMode::Memory => Box::new(MemoryCacheStore::new()),
        CacheMode::File => Box::new(FileCacheStore::new(root.clone())),
    };
    let active: Vec<&str> = cfg.task.keys().map(String::as_str).collect();
    cache.prune(&active)?;

    info!(algorithm = ?cfg.config.algorithm, cache = ?cfg.config.cache, "starting workflow run");
    let runtime = Runtime::new(scheduler, cfg.task_specs(&root), hasher, cache, executor);
    runtime.run().await
}
