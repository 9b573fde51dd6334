#![allow(dead_code)]

use std::collections::BTreeMap;

use workdag::config::{ConfigSection, RawWorkflowConfig, TaskConfig, WorkflowConfig};
use workdag::types::{CacheMode, HashAlgorithm};

/// Builder for `WorkflowConfig` to simplify test setup.
pub struct WorkflowConfigBuilder {
    config: RawWorkflowConfig,
}

impl WorkflowConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawWorkflowConfig {
                config: ConfigSection::default(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.config.config.algorithm = algorithm;
        self
    }

    pub fn cache(mut self, mode: CacheMode) -> Self {
        self.config.config.cache = mode;
        self
    }

    pub fn ignore_hidden(mut self, dirs: bool, files: bool) -> Self {
        self.config.config.ignore_hidden_dirs = dirs;
        self.config.config.ignore_hidden_files = files;
        self
    }

    pub fn raw(self) -> RawWorkflowConfig {
        self.config
    }

    pub fn build(self) -> WorkflowConfig {
        WorkflowConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for WorkflowConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn input(mut self, name: &str, value: impl Into<toml::Value>) -> Self {
        self.task.inputs.insert(name.to_string(), value.into());
        self
    }

    pub fn file_input(mut self, name: &str, path: &str) -> Self {
        self.task.files.push(name.to_string());
        self.input(name, path)
    }

    pub fn dir_input(mut self, name: &str, path: &str) -> Self {
        self.task.dirs.push(name.to_string());
        self.input(name, path)
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
