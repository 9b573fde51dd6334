// src/engine/runtime.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::{debug, info, warn};

use crate::dag::Scheduler;
use crate::errors::{HashError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::hash::{ContentHasher, Value};
use crate::types::DeclaredType;

use super::cache::CacheStore;
use super::executor::Executor;
use super::{RunReport, RuntimeEvent, TaskName, TaskOutcome, TaskSpec};

type Joined = std::result::Result<(Id, (TaskName, TaskOutcome)), JoinError>;

/// Drives one workflow run.
///
/// The runtime is the only owner of the scheduler (and so of the graph).
/// It hashes the inputs of every ready task on a blocking thread, skips
/// tasks whose digest matches the cache, and spawns the rest through the
/// [`Executor`] onto a [`JoinSet`]. A task's digest also covers the digests
/// its predecessors completed under, so a rerun upstream invalidates every
/// task downstream of it.
pub struct Runtime<E, S, F = RealFileSystem>
where
    E: Executor,
    S: CacheStore,
    F: FileSystem + 'static,
{
    scheduler: Scheduler,
    tasks: HashMap<TaskName, TaskSpec>,
    /// Direct predecessors of every task, captured before any is retired.
    upstream: HashMap<TaskName, Vec<TaskName>>,
    hasher: Arc<ContentHasher<F>>,
    cache: S,
    executor: E,
    event_tx: mpsc::Sender<RuntimeEvent>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    running: JoinSet<(TaskName, TaskOutcome)>,
    running_ids: HashMap<Id, TaskName>,
    /// Inputs digest of every task currently executing.
    pending_digests: HashMap<TaskName, String>,
    /// Digest each retired task completed under, executed or cached.
    completed_digests: HashMap<TaskName, String>,
}

impl<E, S, F> fmt::Debug for Runtime<E, S, F>
where
    E: Executor,
    S: CacheStore,
    F: FileSystem + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .field("pending_digests", &self.pending_digests)
            .field("completed_digests", &self.completed_digests)
            .finish_non_exhaustive()
    }
}

impl<E, S, F> Runtime<E, S, F>
where
    E: Executor,
    S: CacheStore,
    F: FileSystem + 'static,
{
    /// Tasks without a spec in `specs` run with no inputs.
    pub fn new<I>(
        scheduler: Scheduler,
        specs: I,
        hasher: ContentHasher<F>,
        cache: S,
        executor: E,
    ) -> Self
    where
        I: IntoIterator<Item = TaskSpec>,
    {
        let mut upstream: HashMap<TaskName, Vec<TaskName>> = HashMap::new();
        for (from, to) in scheduler.graph().edges() {
            upstream.entry(to.clone()).or_default().push(from.clone());
        }

        let (event_tx, event_rx) = mpsc::channel(64);
        Self {
            scheduler,
            tasks: specs.into_iter().map(|s| (s.name.clone(), s)).collect(),
            upstream,
            hasher: Arc::new(hasher),
            cache,
            executor,
            event_tx,
            event_rx,
            running: JoinSet::new(),
            running_ids: HashMap::new(),
            pending_digests: HashMap::new(),
            completed_digests: HashMap::new(),
        }
    }

    /// Sender for injecting events, e.g. [`RuntimeEvent::ShutdownRequested`]
    /// from a ctrl-c handler.
    pub fn event_sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.event_tx.clone()
    }

    /// Main loop: dispatch ready tasks, then wait for a completion or an
    /// injected event, until nothing is running and nothing else can become
    /// ready.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(tasks = self.scheduler.graph().len(), "workdag runtime started");
        let mut report = RunReport::default();

        loop {
            let batch = self.scheduler.next_batch()?;

            // Cache hits retire tasks immediately, which can unblock more.
            let mut retired_from_cache = false;
            for task in batch {
                retired_from_cache |= self.start_task(task, &mut report).await?;
            }
            if retired_from_cache {
                continue;
            }

            if self.scheduler.in_flight_count() == 0 {
                break;
            }

            let event = tokio::select! {
                Some(joined) = self.running.join_next_with_id() => {
                    Self::completion_event(&mut self.running_ids, joined)
                }
                Some(event) = self.event_rx.recv() => Some(event),
                else => break,
            };
            let Some(event) = event else {
                continue;
            };
            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::TaskCompleted { task, outcome } => {
                    self.handle_completion(task, outcome, &mut report)?;
                }
                RuntimeEvent::ShutdownRequested => {
                    report.abandoned = self.scheduler.in_flight();
                    info!(
                        abandoned = ?report.abandoned,
                        "shutdown requested; aborting running tasks"
                    );
                    self.running.abort_all();
                    break;
                }
            }
        }

        report.skipped = self.scheduler.skipped();
        info!(
            executed = report.executed.len(),
            cached = report.cached.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            abandoned = report.abandoned.len(),
            "runtime exiting"
        );
        Ok(report)
    }

    /// Returns `true` if the task was served from cache.
    async fn start_task(&mut self, task: TaskName, report: &mut RunReport) -> Result<bool> {
        let spec = self
            .tasks
            .get(&task)
            .cloned()
            .unwrap_or_else(|| TaskSpec::new(task.clone()));

        let digest = match self.digest_inputs(&spec).await? {
            Ok(digest) => digest,
            Err(err) => {
                warn!(task = %task, error = %err, "could not hash task inputs; failing task");
                self.scheduler.fail(&task);
                report.failed.push(task);
                return Ok(false);
            }
        };

        if self.cache.load(&task)?.as_deref() == Some(digest.as_str()) {
            info!(task = %task, digest = %digest, "inputs unchanged; skipping execution");
            self.scheduler.complete(&task)?;
            self.completed_digests.insert(task.clone(), digest);
            report.cached.push(task);
            return Ok(true);
        }

        debug!(task = %task, digest = %digest, "cache miss; executing task");
        self.pending_digests.insert(task.clone(), digest);

        let future = self.executor.execute(spec);
        let name = task.clone();
        let handle = self.running.spawn(async move {
            let outcome = match future.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(task = %name, error = %err, "executor returned an error");
                    TaskOutcome::Failed(-1)
                }
            };
            (name, outcome)
        });
        self.running_ids.insert(handle.id(), task);

        Ok(false)
    }

    /// Turn a finished executor task into a completion event. A panicked
    /// or cancelled executor counts as a failure.
    fn completion_event(
        running_ids: &mut HashMap<Id, TaskName>,
        joined: Joined,
    ) -> Option<RuntimeEvent> {
        match joined {
            Ok((id, (task, outcome))) => {
                running_ids.remove(&id);
                Some(RuntimeEvent::TaskCompleted { task, outcome })
            }
            Err(err) => {
                let task = running_ids.remove(&err.id())?;
                if err.is_panic() {
                    warn!(task = %task, "executor panicked; failing task");
                } else {
                    warn!(task = %task, "executor was cancelled; failing task");
                }
                Some(RuntimeEvent::TaskCompleted {
                    task,
                    outcome: TaskOutcome::Failed(-1),
                })
            }
        }
    }

    /// Hash on a blocking thread; file and directory inputs do real IO.
    ///
    /// Root tasks are keyed by their own inputs alone. Any other task is
    /// keyed by its inputs digest together with the digest each
    /// predecessor completed under.
    async fn digest_inputs(&self, spec: &TaskSpec) -> Result<std::result::Result<String, HashError>> {
        let hasher = Arc::clone(&self.hasher);
        let inputs = spec.inputs.clone();
        let upstream: Vec<(TaskName, String)> = self
            .upstream
            .get(&spec.name)
            .into_iter()
            .flatten()
            .filter_map(|pred| {
                self.completed_digests
                    .get(pred)
                    .map(|digest| (pred.clone(), digest.clone()))
            })
            .collect();

        let digest = tokio::task::spawn_blocking(move || {
            let own = hasher.hash_inputs(
                inputs
                    .iter()
                    .map(|input| (input.name.as_str(), &input.value, input.declared)),
            )?;
            if upstream.is_empty() {
                return Ok(own);
            }
            let key = Value::map([
                ("inputs", Value::from(own)),
                ("upstream", Value::map(upstream)),
            ]);
            hasher.hash_function(&key, DeclaredType::Opaque)
        })
        .await
        .map_err(anyhow::Error::from)?;
        Ok(digest)
    }

    fn handle_completion(
        &mut self,
        task: TaskName,
        outcome: TaskOutcome,
        report: &mut RunReport,
    ) -> Result<()> {
        let Some(digest) = self.pending_digests.remove(&task) else {
            warn!(task = %task, "completion for a task that is not running; ignoring");
            return Ok(());
        };

        match outcome {
            TaskOutcome::Success => {
                self.cache.save(&task, &digest)?;
                self.scheduler.complete(&task)?;
                self.completed_digests.insert(task.clone(), digest);
                report.executed.push(task);
            }
            TaskOutcome::Failed(code) => {
                warn!(task = %task, exit_code = code, "task failed");
                self.scheduler.fail(&task);
                report.failed.push(task);
            }
        }
        Ok(())
    }
}
