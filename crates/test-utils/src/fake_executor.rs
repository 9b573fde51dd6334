use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use workdag::engine::{ExecFuture, Executor, TaskOutcome, TaskSpec};

/// A fake executor that:
/// - records which tasks were "run" (and the specs they received)
/// - reports `Success`, or `Failed(1)` for tasks registered via `failing`.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    specs: Arc<Mutex<Vec<TaskSpec>>>,
    failing: HashSet<String>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `task` report a failed outcome.
    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    /// Shared handle to the names of executed tasks, in call order.
    pub fn executed_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn specs(&self) -> Vec<TaskSpec> {
        self.specs.lock().unwrap().clone()
    }
}

impl Executor for FakeExecutor {
    fn execute(&mut self, task: TaskSpec) -> ExecFuture {
        let executed = Arc::clone(&self.executed);
        let specs = Arc::clone(&self.specs);
        let fails = self.failing.contains(&task.name);

        Box::pin(async move {
            executed.lock().unwrap().push(task.name.clone());
            specs.lock().unwrap().push(task);

            if fails {
                Ok(TaskOutcome::Failed(1))
            } else {
                Ok(TaskOutcome::Success)
            }
        })
    }
}
