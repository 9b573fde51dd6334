// src/engine/executor.rs

//! Pluggable task execution.
//!
//! The runtime never decides how a task's work is done; it hands a
//! [`TaskSpec`] to an `Executor` and awaits the returned future on a tokio
//! task. Tests provide executors that record calls and return canned
//! outcomes.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::engine::{TaskOutcome, TaskSpec};

/// Future returned by [`Executor::execute`].
pub type ExecFuture = Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'static>>;

/// Trait abstracting how a ready task is executed.
pub trait Executor: Send {
    /// Start executing `task`.
    ///
    /// The returned future is spawned onto the tokio runtime, so it must not
    /// borrow from `self`. An `Err` is treated like a failed outcome.
    fn execute(&mut self, task: TaskSpec) -> ExecFuture;
}
