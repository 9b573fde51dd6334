// src/config/model.rs

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::dag::{Edge, Graph};
use crate::engine::{TaskInput, TaskName, TaskSpec};
use crate::errors::GraphError;
use crate::hash::{HashOptions, Value};
use crate::logging::LogLevel;
use crate::types::{CacheMode, DeclaredType, HashAlgorithm};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// algorithm = "sha256"
/// ignore_hidden_files = true
/// cache = "file"
///
/// [task.A]
/// inputs = { src = "data/a.txt", n = 3 }
/// files = ["src"]
///
/// [task.B]
/// after = ["A"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowConfig {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<TaskName, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigSection {
    /// `"sha256"` (default) or `"blake3"`.
    #[serde(default)]
    pub algorithm: HashAlgorithm,

    /// Skip hidden subdirectories when hashing directory inputs.
    #[serde(default)]
    pub ignore_hidden_dirs: bool,

    /// Skip hidden files when hashing directory inputs.
    #[serde(default)]
    pub ignore_hidden_files: bool,

    /// `"memory"` (default) or `"file"` (`.workdag/cache` next to the config).
    #[serde(default)]
    pub cache: CacheMode,

    /// Optional log level; `WORKDAG_LOG` is used when unset.
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<TaskName>,

    /// Input values that make up the task's cache key.
    #[serde(default)]
    pub inputs: BTreeMap<String, toml::Value>,

    /// Names of inputs holding file paths, hashed by file content.
    #[serde(default)]
    pub files: Vec<String>,

    /// Names of inputs holding directory paths, hashed by directory content.
    #[serde(default)]
    pub dirs: Vec<String>,
}

impl TaskConfig {
    /// How the input called `name` should be hashed.
    pub fn declared_type_of(&self, name: &str) -> DeclaredType {
        if self.files.iter().any(|f| f == name) {
            DeclaredType::File
        } else if self.dirs.iter().any(|d| d == name) {
            DeclaredType::Directory
        } else {
            DeclaredType::Opaque
        }
    }

    /// Inputs converted to hashable values. Relative paths of file and
    /// directory inputs are resolved against `root`.
    pub fn resolved_inputs(&self, root: &Path) -> Vec<TaskInput> {
        self.inputs
            .iter()
            .map(|(name, raw)| {
                let declared = self.declared_type_of(name);
                let value = Value::from(raw.clone());
                let value = match declared {
                    DeclaredType::Opaque => value,
                    DeclaredType::File | DeclaredType::Directory => resolve_paths(value, root),
                };
                TaskInput {
                    name: name.clone(),
                    value,
                    declared,
                }
            })
            .collect()
    }
}

fn resolve_paths(value: Value, root: &Path) -> Value {
    match value {
        Value::Str(path) if Path::new(&path).is_relative() => Value::from(root.join(path)),
        Value::List(items) => Value::List(items.into_iter().map(|v| resolve_paths(v, root)).collect()),
        Value::Tuple(items) => {
            Value::Tuple(items.into_iter().map(|v| resolve_paths(v, root)).collect())
        }
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, resolve_paths(v, root)))
                .collect(),
        ),
        other => other,
    }
}

/// Validated configuration. Obtain one through `TryFrom<RawWorkflowConfig>`
/// or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub config: ConfigSection,
    pub task: BTreeMap<TaskName, TaskConfig>,
}

impl WorkflowConfig {
    pub(crate) fn new_unchecked(config: ConfigSection, task: BTreeMap<TaskName, TaskConfig>) -> Self {
        Self { config, task }
    }

    pub fn hash_options(&self) -> HashOptions {
        HashOptions {
            algorithm: self.config.algorithm,
            ignore_hidden_dirs: self.config.ignore_hidden_dirs,
            ignore_hidden_files: self.config.ignore_hidden_files,
        }
    }

    /// Build the task graph: one node per task, one edge `dep -> task` per
    /// entry in `after`.
    pub fn graph(&self) -> Result<Graph<TaskName>, GraphError> {
        graph_from_tasks(&self.task)
    }

    /// Task specs for the driver, with paths resolved against `root`.
    pub fn task_specs(&self, root: &Path) -> Vec<TaskSpec> {
        self.task
            .iter()
            .map(|(name, tc)| TaskSpec {
                name: name.clone(),
                inputs: tc.resolved_inputs(root),
            })
            .collect()
    }
}

pub(crate) fn graph_from_tasks(
    tasks: &BTreeMap<TaskName, TaskConfig>,
) -> Result<Graph<TaskName>, GraphError> {
    let edges = tasks.iter().flat_map(|(name, tc)| {
        tc.after.iter().map(move |dep| Edge {
            from: dep.clone(),
            to: name.clone(),
        })
    });
    Graph::new(tasks.keys().cloned(), edges)
}
