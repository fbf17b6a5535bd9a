//! Task model for the reminder / check-in lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enrichment::Priority;
use crate::time::no_reminder;

pub type TaskId = String;

/// Lifecycle state of a task. Removal (completion or delete) is terminal and
/// has no variant: removed tasks leave the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Countdown,
    WaitingForStartConfirmation,
    WaitingForCompletion,
    Blocked,
}

impl TaskStatus {
    /// Edges of the lifecycle table. Anything else is a bug.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Countdown)
                | (Countdown, WaitingForStartConfirmation)
                | (WaitingForStartConfirmation, WaitingForCompletion)
                | (WaitingForStartConfirmation, Countdown)
                | (WaitingForStartConfirmation, Pending)
                | (WaitingForStartConfirmation, Blocked)
                | (WaitingForCompletion, Countdown)
                | (Blocked, Pending)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Countdown => "countdown",
            TaskStatus::WaitingForStartConfirmation => "started?",
            TaskStatus::WaitingForCompletion => "in progress",
            TaskStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,

    /// When the current state is due to advance. Reminder time while
    /// pending, countdown expiry while in countdown, follow-up check while
    /// waiting for completion.
    pub scheduled_time: DateTime<Utc>,

    pub status: TaskStatus,

    /// Times the user declined "did you start?".
    pub retry_count: u32,

    pub last_action_time: DateTime<Utc>,

    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_parsing: bool,
    #[serde(default)]
    pub is_image_loading: bool,

    /// The reminder modal for this pending task was closed without an answer.
    #[serde(default)]
    pub modal_dismissed: bool,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            scheduled_time: no_reminder(now),
            status: TaskStatus::Pending,
            retry_count: 0,
            last_action_time: now,
            category: None,
            priority: None,
            image_url: None,
            is_parsing: false,
            is_image_loading: false,
            modal_dismissed: false,
        }
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_time = at;
        self
    }

    pub fn parsing(mut self, parsing: bool) -> Self {
        self.is_parsing = parsing;
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.scheduled_time <= now
    }

    /// Milliseconds elapsed since the last transition, for countdown rings.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_action_time).num_milliseconds().max(0)
    }

    /// Milliseconds until `scheduled_time`, clamped at zero.
    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.scheduled_time - now).num_milliseconds().max(0)
    }
}
