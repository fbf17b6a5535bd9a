//! Best-effort key-value snapshots of the task list and stats.
//!
//! Two keys: `tasks` (JSON array, key removed when the list is empty) and
//! `stats`. Anything unreadable loads as empty/default.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::warn;

use crate::stats::Stats;
use crate::task::Task;

pub const TASKS_KEY: &str = "tasks";
pub const STATS_KEY: &str = "stats";

/// Where snapshots live (files, browser storage, memory).
pub trait SnapshotStore {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemorySnapshots {
    entries: HashMap<String, String>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SnapshotStore for MemorySnapshots {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

pub fn load_tasks(store: &impl SnapshotStore) -> Vec<Task> {
    load_json(store, TASKS_KEY).unwrap_or_default()
}

pub fn load_stats(store: &impl SnapshotStore) -> Stats {
    load_json::<Stats>(store, STATS_KEY)
        .map(Stats::normalized)
        .unwrap_or_default()
}

pub fn save_tasks(store: &mut impl SnapshotStore, tasks: &[Task]) -> Result<()> {
    if tasks.is_empty() {
        return store.remove(TASKS_KEY);
    }
    let json = serde_json::to_string(tasks).context("serialize tasks")?;
    store.save(TASKS_KEY, &json)
}

pub fn save_stats(store: &mut impl SnapshotStore, stats: &Stats) -> Result<()> {
    let json = serde_json::to_string(stats).context("serialize stats")?;
    store.save(STATS_KEY, &json)
}

fn load_json<T: serde::de::DeserializeOwned>(store: &impl SnapshotStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, "snapshot unreadable, starting fresh: {e:#}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(key, "snapshot malformed, starting fresh: {e}");
            None
        }
    }
}
