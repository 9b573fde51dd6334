// src/engine/cache.rs

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::engine::TaskName;

/// Relative path (from the workflow root) to the cache file.
///
/// The effective path on disk is `<root>/.workdag/cache`.
pub const CACHE_FILE_PATH: &str = ".workdag/cache";

fn cache_file_path(root: &Path) -> PathBuf {
    root.join(CACHE_FILE_PATH)
}

/// Remembers the inputs digest of each task's last successful run.
pub trait CacheStore: Send + Sync {
    fn load(&self, task: &str) -> Result<Option<String>>;
    fn save(&mut self, task: &str, digest: &str) -> Result<()>;
    /// Remove entries for tasks that are not in `active_tasks`.
    fn prune(&mut self, active_tasks: &[&str]) -> Result<()>;
}

impl<S: CacheStore + ?Sized> CacheStore for Box<S> {
    fn load(&self, task: &str) -> Result<Option<String>> {
        (**self).load(task)
    }

    fn save(&mut self, task: &str, digest: &str) -> Result<()> {
        (**self).save(task, digest)
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        (**self).prune(active_tasks)
    }
}

impl<S: CacheStore + ?Sized> CacheStore for &mut S {
    fn load(&self, task: &str) -> Result<Option<String>> {
        (**self).load(task)
    }

    fn save(&mut self, task: &str, digest: &str) -> Result<()> {
        (**self).save(task, digest)
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        (**self).prune(active_tasks)
    }
}

/// Stores digests in `<root>/.workdag/cache`, one `name digest` per line.
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    root: PathBuf,
}

impl FileCacheStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn path(&self) -> PathBuf {
        cache_file_path(&self.root)
    }
}

impl CacheStore for FileCacheStore {
    fn load(&self, task: &str) -> Result<Option<String>> {
        let map = load_all_digests(&self.root)?;
        Ok(map.get(task).cloned())
    }

    fn save(&mut self, task: &str, digest: &str) -> Result<()> {
        let mut map = load_all_digests(&self.root)?;
        map.insert(task.to_string(), digest.to_string());
        save_all_digests(&self.root, &map)?;
        debug!(task = %task, digest = %digest, "stored task digest (file)");
        Ok(())
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        let mut map = load_all_digests(&self.root)?;
        let initial_len = map.len();
        map.retain(|k, _| active_tasks.contains(&k.as_str()));

        if map.len() < initial_len {
            save_all_digests(&self.root, &map)?;
            info!(
                removed = initial_len - map.len(),
                "pruned stale task digests (file)"
            );
        }
        Ok(())
    }
}

/// Stores digests in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    map: HashMap<TaskName, String>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn load(&self, task: &str) -> Result<Option<String>> {
        Ok(self.map.get(task).cloned())
    }

    fn save(&mut self, task: &str, digest: &str) -> Result<()> {
        self.map.insert(task.to_string(), digest.to_string());
        debug!(task = %task, digest = %digest, "stored task digest (memory)");
        Ok(())
    }

    fn prune(&mut self, active_tasks: &[&str]) -> Result<()> {
        let initial_len = self.map.len();
        self.map.retain(|k, _| active_tasks.contains(&k.as_str()));
        if self.map.len() < initial_len {
            info!(
                removed = initial_len - self.map.len(),
                "pruned stale task digests (memory)"
            );
        }
        Ok(())
    }
}

fn load_all_digests(root: &Path) -> Result<HashMap<TaskName, String>> {
    let path = cache_file_path(root);

    if !path.exists() {
        return Ok(HashMap::new());
    }

    let file = File::open(&path).with_context(|| format!("opening cache file at {path:?}"))?;
    let reader = BufReader::new(file);

    let mut map = HashMap::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some((name, digest)) = trimmed.split_once(char::is_whitespace) {
            map.insert(name.to_string(), digest.trim().to_string());
        }
    }

    Ok(map)
}

fn save_all_digests(root: &Path, map: &HashMap<TaskName, String>) -> Result<()> {
    let path = cache_file_path(root);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating cache directory at {parent:?}"))?;
    }

    let file = File::create(&path).with_context(|| format!("creating cache file at {path:?}"))?;
    let mut writer = BufWriter::new(file);

    let mut entries: Vec<_> = map.iter().collect();
    entries.sort();
    for (name, digest) in entries {
        writeln!(writer, "{name} {digest}")?;
    }

    writer.flush()?;
    Ok(())
}
