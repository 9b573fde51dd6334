use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::model::WorkflowConfig;
use crate::dag::graph::Graph;
use crate::engine::TaskName;
use crate::errors::GraphError;

/// Scheduler drives a [`Graph`] of task names through one workflow run.
///
/// It is responsible for:
/// - handing out batches of tasks whose predecessors have all completed
/// - remembering which tasks are in flight so they are dispatched once
/// - retiring completed tasks from the graph, which unblocks dependents
/// - keeping failed tasks in the graph so their dependents never run
#[derive(Debug)]
pub struct Scheduler {
    graph: Graph<TaskName>,
    in_flight: HashSet<TaskName>,
    failed: Vec<TaskName>,
}

impl Scheduler {
    /// Wrap a graph, rejecting it up front if it contains a cycle.
    pub fn new(mut graph: Graph<TaskName>) -> Result<Self, GraphError> {
        graph.sorting(None)?;
        Ok(Self {
            graph,
            in_flight: HashSet::new(),
            failed: Vec::new(),
        })
    }

    /// Construct a scheduler from a validated [`WorkflowConfig`].
    pub fn from_config(cfg: &WorkflowConfig) -> Result<Self, GraphError> {
        Self::new(cfg.graph()?)
    }

    pub fn graph(&self) -> &Graph<TaskName> {
        &self.graph
    }

    /// Tasks that became eligible since the last call, in sorted order.
    ///
    /// Returned tasks are marked in flight and will not be returned again.
    pub fn next_batch(&mut self) -> Result<Vec<TaskName>, GraphError> {
        let order: Vec<TaskName> = self.graph.sorted_nodes()?.into_iter().cloned().collect();

        let batch: Vec<TaskName> = order
            .into_iter()
            .filter(|task| {
                self.graph.is_ready(task)
                    && !self.in_flight.contains(task)
                    && !self.failed.contains(task)
            })
            .collect();

        for task in &batch {
            self.in_flight.insert(task.clone());
        }

        if !batch.is_empty() {
            debug!(?batch, "dependencies satisfied; dispatching batch");
        }
        Ok(batch)
    }

    /// Retire a task after it ran successfully or was served from cache.
    pub fn complete(&mut self, task: &str) -> Result<(), GraphError> {
        self.graph.remove_node(task)?;
        self.in_flight.remove(task);
        info!(task = %task, remaining = self.graph.len(), "task completed");
        Ok(())
    }

    /// Record a failed task. It stays in the graph, so every task that
    /// (transitively) depends on it is skipped.
    pub fn fail(&mut self, task: &str) {
        if !self.in_flight.remove(task) {
            warn!(task = %task, "failure reported for a task that was not in flight");
        }
        if !self.failed.iter().any(|t| t == task) {
            self.failed.push(task.to_string());
        }
        warn!(
            task = %task,
            blocked = ?self.graph.successors_of(task),
            "task failed; dependents will not run"
        );
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Tasks currently handed out and not yet completed or failed, in
    /// insertion order.
    pub fn in_flight(&self) -> Vec<TaskName> {
        self.graph
            .nodes()
            .filter(|task| self.in_flight.contains(*task))
            .cloned()
            .collect()
    }

    pub fn failed(&self) -> &[TaskName] {
        &self.failed
    }

    /// `true` once nothing is running and nothing else can become ready.
    pub fn is_finished(&self) -> bool {
        self.in_flight.is_empty()
            && !self
                .graph
                .ready_nodes()
                .into_iter()
                .any(|task| !self.failed.contains(task))
    }

    /// Tasks left in the graph that never ran because an upstream task
    /// failed (or because the run stopped early).
    pub fn skipped(&self) -> Vec<TaskName> {
        self.graph
            .nodes()
            .filter(|task| !self.failed.contains(task) && !self.in_flight.contains(*task))
            .cloned()
            .collect()
    }
}
