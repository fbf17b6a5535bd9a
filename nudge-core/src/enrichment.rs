//! Request/response contract of the AI capability client, as consumed by the
//! core. Every operation has a documented fallback, so completions are always
//! values, never errors.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse for model output ("High", "urgent", "p2", ...).
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" | "urgent" | "p0" | "p1" => Some(Priority::High),
            "medium" | "normal" | "p2" => Some(Priority::Medium),
            "low" | "background" | "p3" => Some(Priority::Low),
            _ => None,
        }
    }
}

/// Result of natural-language task parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTask {
    pub title: String,
    pub minutes_from_now: i64,
    pub time_specified: bool,
}

impl ParsedTask {
    /// What a failed parse degrades to: the raw text, no time.
    pub fn fallback(raw: &str) -> Self {
        Self {
            title: raw.trim().to_string(),
            minutes_from_now: 0,
            time_specified: false,
        }
    }
}

/// Minimal view of a task sent to the prioritization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityAssignment {
    pub id: TaskId,
    pub category: String,
    pub priority: Priority,
}

/// A completed asynchronous enrichment, fed back into the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Parsed {
        task_id: TaskId,
        parsed: ParsedTask,
    },
    Image {
        task_id: TaskId,
        image_url: Option<String>,
    },
    Decomposed {
        task_id: TaskId,
        subtasks: Vec<String>,
    },
    Prioritized {
        assignments: Vec<PriorityAssignment>,
    },
}
