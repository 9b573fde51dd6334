// src/engine/mod.rs

//! Reference driver tying the scheduler and the content hasher together.
//!
//! For each task that becomes ready the runtime computes a digest over the
//! task's inputs. If the [`cache`] store already holds that digest the task
//! is retired without running; otherwise it is handed to an
//! [`executor::Executor`] and retired once it reports success.
//!
//! The graph is only ever touched by the runtime loop in [`runtime`];
//! executors run on the tokio runtime and report back over a channel.

use crate::hash::Value;
use crate::types::DeclaredType;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(i32),
}

/// One named input of a task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskInput {
    pub name: String,
    pub value: Value,
    pub declared: DeclaredType,
}

impl TaskInput {
    pub fn new(name: impl Into<String>, value: impl Into<Value>, declared: DeclaredType) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            declared,
        }
    }
}

/// What the executor receives for a task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskSpec {
    pub name: TaskName,
    pub inputs: Vec<TaskInput>,
}

impl TaskSpec {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, input: TaskInput) -> Self {
        self.inputs.push(input);
        self
    }
}

/// Events flowing into the runtime from executors and the embedding program.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Stop dispatching and return. Tasks still running are aborted and
    /// reported as abandoned.
    ShutdownRequested,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Tasks that were executed and succeeded, in completion order.
    pub executed: Vec<TaskName>,
    /// Tasks skipped because their inputs digest was already cached.
    pub cached: Vec<TaskName>,
    /// Tasks that failed (including ones whose inputs could not be hashed).
    pub failed: Vec<TaskName>,
    /// Tasks that never started, because something upstream failed or the
    /// run was shut down first.
    pub skipped: Vec<TaskName>,
    /// Tasks that were running when a shutdown was requested.
    pub abandoned: Vec<TaskName>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty() && self.abandoned.is_empty()
    }
}

pub mod cache;
pub mod executor;
pub mod runtime;

pub use cache::{CACHE_FILE_PATH, CacheStore, FileCacheStore, MemoryCacheStore};
pub use executor::{ExecFuture, Executor};
pub use runtime::Runtime;
