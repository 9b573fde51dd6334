// src/config/validate.rs

use crate::config::model::{RawWorkflowConfig, WorkflowConfig, graph_from_tasks};
use crate::errors::{Result, WorkdagError};

impl TryFrom<RawWorkflowConfig> for WorkflowConfig {
    type Error = WorkdagError;

    fn try_from(raw: RawWorkflowConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(WorkflowConfig::new_unchecked(raw.config, raw.task))
    }
}

fn validate_raw_config(cfg: &RawWorkflowConfig) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_typed_inputs(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawWorkflowConfig) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(WorkdagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawWorkflowConfig) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if !cfg.task.contains_key(dep) {
                return Err(WorkdagError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
            if dep == name {
                return Err(WorkdagError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_typed_inputs(cfg: &RawWorkflowConfig) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (field, keys) in [("files", &task.files), ("dirs", &task.dirs)] {
            for key in keys {
                if !task.inputs.contains_key(key) {
                    return Err(WorkdagError::ConfigError(format!(
                        "task '{name}' lists unknown input '{key}' in `{field}`"
                    )));
                }
            }
        }
        if let Some(key) = task.files.iter().find(|f| task.dirs.contains(f)) {
            return Err(WorkdagError::ConfigError(format!(
                "task '{name}' lists input '{key}' in both `files` and `dirs`"
            )));
        }
    }
    Ok(())
}

/// Cycles are found by sorting the task graph once.
fn validate_dag(cfg: &RawWorkflowConfig) -> Result<()> {
    let mut graph = graph_from_tasks(&cfg.task)?;
    graph.sorting(None)?;
    Ok(())
}
