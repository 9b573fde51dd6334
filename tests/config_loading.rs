// tests/config_loading.rs

mod common;
use crate::common::builders::{TaskConfigBuilder, WorkflowConfigBuilder};
use crate::common::init_tracing;

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use workdag::config::{WorkflowConfig, load_and_validate, load_from_str};
use workdag::errors::{GraphError, WorkdagError};
use workdag::hash::Value;
use workdag::logging::LogLevel;
use workdag::types::{CacheMode, DeclaredType, HashAlgorithm};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: Result<WorkflowConfig, WorkdagError>, needle: &str) {
    match result {
        Err(WorkdagError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} lacks {needle:?}")
        }
        Err(e) => panic!("Expected ConfigError, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_config_round_trip() {
    init_tracing();
    let file = write_config(
        r#"
[config]
algorithm = "blake3"
ignore_hidden_dirs = true
cache = "file"
log_level = "debug"

[task.fetch]
inputs = { url = "https://example.org/data.csv", retries = 3 }

[task.build]
after = ["fetch"]
inputs = { src = "src", flags = ["-O2", "-g"] }
dirs = ["src"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.config.algorithm, HashAlgorithm::Blake3);
    assert!(cfg.config.ignore_hidden_dirs);
    assert!(!cfg.config.ignore_hidden_files);
    assert_eq!(cfg.config.cache, CacheMode::File);
    assert_eq!(cfg.config.log_level, Some(LogLevel::Debug));

    let build = &cfg.task["build"];
    assert_eq!(build.after, vec!["fetch".to_string()]);
    assert_eq!(build.declared_type_of("src"), DeclaredType::Directory);
    assert_eq!(build.declared_type_of("flags"), DeclaredType::Opaque);

    let options = cfg.hash_options();
    assert_eq!(options.algorithm, HashAlgorithm::Blake3);
    assert!(options.ignore_hidden_dirs);
}

#[test]
fn test_defaults_when_config_section_is_missing() {
    let raw = load_from_str("[task.only]\n").unwrap();
    let cfg = WorkflowConfig::try_from(raw).unwrap();

    assert_eq!(cfg.config.algorithm, HashAlgorithm::Sha256);
    assert_eq!(cfg.config.cache, CacheMode::Memory);
    assert!(cfg.config.log_level.is_none());
    assert!(cfg.task["only"].inputs.is_empty());
}

#[test]
fn test_graph_from_config_follows_after() {
    let cfg = WorkflowConfigBuilder::new()
        .with_task("A", TaskConfigBuilder::new().build())
        .with_task("B", TaskConfigBuilder::new().after("A").build())
        .with_task("C", TaskConfigBuilder::new().after("A").after("B").build())
        .build();

    let mut graph = cfg.graph().unwrap();
    assert_eq!(graph.predecessors_of("C"), vec!["A", "B"]);
    assert_eq!(graph.sorted_node_names().unwrap(), vec!["A", "B", "C"]);
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let file = write_config(
        r#"
[task.A]
after = ["B"]

[task.B]
after = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(WorkdagError::Graph(GraphError::Cycle(stuck))) => {
            assert_eq!(stuck, vec!["A".to_string(), "B".to_string()]);
        }
        Err(e) => panic!("Expected Cycle error, got: {e:?}"),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_unknown_dependency_returns_config_error() {
    let file = write_config(
        r#"
[task.A]
after = ["NonExistent"]
"#,
    );
    expect_config_error(load_and_validate(file.path()), "unknown dependency 'NonExistent'");
}

#[test]
fn test_self_dependency_is_rejected() {
    let raw = WorkflowConfigBuilder::new()
        .with_task("A", TaskConfigBuilder::new().after("A").build())
        .raw();
    expect_config_error(WorkflowConfig::try_from(raw), "cannot depend on itself");
}

#[test]
fn test_empty_config_is_rejected() {
    let raw = load_from_str("").unwrap();
    expect_config_error(WorkflowConfig::try_from(raw), "at least one");
}

#[test]
fn test_typed_input_must_exist() {
    let file = write_config(
        r#"
[task.A]
inputs = { data = "a.txt" }
files = ["dta"]
"#,
    );
    expect_config_error(load_and_validate(file.path()), "unknown input 'dta'");
}

#[test]
fn test_input_cannot_be_both_file_and_dir() {
    let raw = WorkflowConfigBuilder::new()
        .with_task(
            "A",
            TaskConfigBuilder::new()
                .file_input("p", "x")
                .dir_input("p", "x")
                .build(),
        )
        .raw();
    expect_config_error(WorkflowConfig::try_from(raw), "both `files` and `dirs`");
}

#[test]
fn test_invalid_algorithm_is_a_toml_error() {
    let result = load_from_str("[config]\nalgorithm = \"md5\"\n[task.A]\n");
    assert!(matches!(result, Err(WorkdagError::TomlError(_))));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let result = load_and_validate(Path::new("/definitely/not/a/workdag.toml"));
    assert!(matches!(result, Err(WorkdagError::IoError(_))));
}

#[test]
fn test_task_specs_resolve_relative_paths() {
    let cfg = WorkflowConfigBuilder::new()
        .with_task(
            "A",
            TaskConfigBuilder::new()
                .file_input("data", "inputs/a.txt")
                .file_input("abs", "/etc/hosts")
                .input("label", "inputs/a.txt")
                .build(),
        )
        .build();

    let specs = cfg.task_specs(Path::new("/work"));
    assert_eq!(specs.len(), 1);
    let inputs = &specs[0].inputs;

    let find = |name: &str| {
        inputs
            .iter()
            .find(|input| input.name == name)
            .unwrap_or_else(|| panic!("missing input {name}"))
    };

    let data = find("data");
    assert_eq!(data.declared, DeclaredType::File);
    assert_eq!(data.value, Value::from(Path::new("/work/inputs/a.txt")));

    assert_eq!(find("abs").value, Value::from("/etc/hosts"));

    // Opaque strings are never treated as paths.
    let label = find("label");
    assert_eq!(label.declared, DeclaredType::Opaque);
    assert_eq!(label.value, Value::from("inputs/a.txt"));
}

#[test]
fn test_parse_helpers() {
    assert_eq!("BLAKE3".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Blake3));
    assert!("md5".parse::<HashAlgorithm>().is_err());
    assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert!("loud".parse::<LogLevel>().is_err());
}
