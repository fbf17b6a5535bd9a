//! TaskStore: ordered in-memory task collection mirrored to a snapshot.
//!
//! - Insertion order is the list order and the tie-break for due polling.
//! - Every mutation marks the store dirty; the owner flushes one snapshot
//!   per handled event and clears the flag.
//! - Lookups by a vanished id return `StoreError::NotFound`; callers that
//!   apply late async results treat that as a no-op.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::enrichment::Priority;
use crate::task::{Task, TaskId, TaskStatus};

/// Fresh opaque task id.
pub fn new_task_id() -> TaskId {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

/// Partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub status: Option<TaskStatus>,
    pub retry_count: Option<u32>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub image_url: Option<String>,
    pub is_parsing: Option<bool>,
    pub is_image_loading: Option<bool>,
    pub modal_dismissed: Option<bool>,
}

impl TaskPatch {
    fn apply(self, t: &mut Task) {
        if let Some(v) = self.title {
            t.title = v;
        }
        if let Some(v) = self.scheduled_time {
            t.scheduled_time = v;
        }
        if let Some(v) = self.status {
            t.status = v;
        }
        if let Some(v) = self.retry_count {
            t.retry_count = v;
        }
        if let Some(v) = self.last_action_time {
            t.last_action_time = v;
        }
        if let Some(v) = self.category {
            t.category = Some(v);
        }
        if let Some(v) = self.priority {
            t.priority = Some(v);
        }
        if let Some(v) = self.image_url {
            t.image_url = Some(v);
        }
        if let Some(v) = self.is_parsing {
            t.is_parsing = v;
        }
        if let Some(v) = self.is_image_loading {
            t.is_image_loading = v;
        }
        if let Some(v) = self.modal_dismissed {
            t.modal_dismissed = v;
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TaskStore {
    tasks: Vec<Task>,
    dirty: bool,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a snapshot. A restored store starts clean.
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Mutable access; assumes the caller mutates, so the store goes dirty.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        let t = self.tasks.iter_mut().find(|t| t.id == id)?;
        self.dirty = true;
        Some(t)
    }

    /// Resolve a unique id prefix (CLI convenience).
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&Task> {
        let mut hits = self.tasks.iter().filter(|t| t.id.starts_with(prefix));
        let first = hits.next()?;
        if hits.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// New pending task with no reminder, enrichment outstanding.
    pub fn create(&mut self, title: &str, now: DateTime<Utc>) -> &Task {
        let task = Task::new(new_task_id(), title.trim(), now).parsing(true);
        self.push(task)
    }

    pub fn push(&mut self, task: Task) -> &Task {
        self.dirty = true;
        self.tasks.push(task);
        let last = self.tasks.len() - 1;
        &self.tasks[last]
    }

    /// Insert ahead of `anchor`; appends when the anchor is gone.
    pub fn insert_before(&mut self, anchor: &str, task: Task) -> &Task {
        let Some(pos) = self.position(anchor) else {
            return self.push(task);
        };
        self.dirty = true;
        self.tasks.insert(pos, task);
        &self.tasks[pos]
    }

    /// Replace one task with several, in place.
    pub fn splice(&mut self, id: &str, replacement: Vec<Task>) -> Result<Task, StoreError> {
        let pos = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.dirty = true;
        let removed = self.tasks.splice(pos..=pos, replacement).collect::<Vec<_>>();
        removed
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<&Task, StoreError> {
        let pos = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.dirty = true;
        patch.apply(&mut self.tasks[pos]);
        Ok(&self.tasks[pos])
    }

    pub fn remove(&mut self, id: &str) -> Result<Task, StoreError> {
        let pos = self
            .position(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.dirty = true;
        Ok(self.tasks.remove(pos))
    }

    /// Tasks grouped by category, groups in first-seen order.
    pub fn grouped_by_category(&self) -> Vec<(String, Vec<&Task>)> {
        let mut groups: Vec<(String, Vec<&Task>)> = Vec::new();
        for t in &self.tasks {
            let key = t.category.clone().unwrap_or_else(|| "Uncategorized".to_string());
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, v)) => v.push(t),
                None => groups.push((key, vec![t])),
            }
        }
        groups
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}
