//! Messages into and out of the event loop.

use crate::enrichment::{Enrichment, TaskSummary};
use crate::stats::Reward;
use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Time advanced; evaluate due transitions.
    Tick,
    /// Free-text task entry.
    Submit { text: String },
    /// Result of a voice capture attempt.
    Voice(VoiceCapture),
    /// A button press (or help text) on the active modal.
    Respond { task_id: TaskId, response: Response },
    /// Scheduling picker result.
    Schedule { task_id: TaskId, choice: ScheduleChoice },
    Delete { task_id: TaskId },
    /// Ask the AI to split a task into smaller steps.
    Breakdown { task_id: TaskId },
    /// Ask the AI to categorize and rank all tasks.
    Prioritize,
    /// An asynchronous enrichment finished.
    Enriched(Enrichment),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCapture {
    Transcript(String),
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Reminder: "okay, let's go".
    Acknowledge,
    /// Reminder: try again in five minutes.
    Snooze,
    /// Close the modal without answering.
    Dismiss,
    Started,
    NotStarted,
    Done,
    NotDone,
    /// Blocked: "this would help".
    Help(String),
    /// Blocked: nothing in particular.
    Skip,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleChoice {
    /// Quick pick, minutes from now.
    InMinutes(i64),
    /// Explicit local date+time ("YYYY-MM-DD HH:MM") in an IANA timezone.
    At { local: String, timezone: String },
    NoReminder,
}

/// Work the owner of the loop performs on the core's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Parse { task_id: TaskId, text: String },
    GenerateImage { task_id: TaskId, title: String },
    Decompose { task_id: TaskId, title: String },
    Prioritize { tasks: Vec<TaskSummary> },
    Speak(String),
    Celebrate(Reward),
}
