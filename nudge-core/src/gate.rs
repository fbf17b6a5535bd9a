//! Interaction gate: at most one blocking modal, one scheduling prompt, and
//! a short celebration window during which nothing new opens.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::task::{TaskId, TaskStatus};
use crate::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    /// "Time to ...": acknowledge, snooze, or dismiss.
    Reminder,
    /// "Did you start?"
    StartCheck,
    /// "Are you done?"
    CompletionCheck,
    /// "What would help?"
    Blocked,
}

impl ModalKind {
    /// The modal a task in `status` is waiting on without any timer.
    pub fn implied_by(status: TaskStatus) -> Option<Self> {
        match status {
            TaskStatus::WaitingForStartConfirmation => Some(ModalKind::StartCheck),
            TaskStatus::Blocked => Some(ModalKind::Blocked),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub task_id: TaskId,
    pub kind: ModalKind,
}

#[derive(Debug, Default, Clone)]
pub struct Gate {
    active: Option<Modal>,
    scheduling: Option<TaskId>,
    waiting_for_schedule: VecDeque<TaskId>,
    celebrating_until: Option<DateTime<Utc>>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Modal> {
        self.active.as_ref()
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.active.as_ref().is_some_and(|m| m.task_id == task_id)
    }

    /// Open a modal. Refuses while another one is showing.
    pub fn open(&mut self, task_id: impl Into<TaskId>, kind: ModalKind) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.active = Some(Modal {
            task_id: task_id.into(),
            kind,
        });
        true
    }

    /// Swap the kind of the modal that is already showing for this task.
    pub fn switch(&mut self, task_id: &str, kind: ModalKind) -> bool {
        match self.active.as_mut() {
            Some(m) if m.task_id == task_id => {
                m.kind = kind;
                true
            }
            _ => false,
        }
    }

    pub fn close(&mut self) -> Option<Modal> {
        self.active.take()
    }

    /// Close only if `task_id` owns the modal.
    pub fn close_for(&mut self, task_id: &str) -> Option<Modal> {
        if self.is_active(task_id) {
            return self.active.take();
        }
        None
    }

    pub fn scheduling(&self) -> Option<&TaskId> {
        self.scheduling.as_ref()
    }

    /// Ask for a time for `task_id`; queued behind any prompt already open.
    pub fn request_schedule(&mut self, task_id: impl Into<TaskId>) {
        let id = task_id.into();
        if self.scheduling.as_deref() == Some(id.as_str()) || self.waiting_for_schedule.contains(&id) {
            return;
        }
        if self.scheduling.is_none() {
            self.scheduling = Some(id);
        } else {
            self.waiting_for_schedule.push_back(id);
        }
    }

    /// Drop `task_id` from the scheduling prompt or its queue; the next
    /// queued task gets the prompt.
    pub fn finish_schedule(&mut self, task_id: &str) {
        self.waiting_for_schedule.retain(|id| id != task_id);
        if self.scheduling.as_deref() == Some(task_id) {
            self.scheduling = self.waiting_for_schedule.pop_front();
        }
    }

    /// Forget everything about a removed task.
    pub fn forget(&mut self, task_id: &str) {
        self.close_for(task_id);
        self.finish_schedule(task_id);
    }

    pub fn celebrate(&mut self, now: DateTime<Utc>) {
        self.celebrating_until = Some(now + time::CELEBRATION);
    }

    pub fn is_celebrating(&self, now: DateTime<Utc>) -> bool {
        self.celebrating_until.is_some_and(|until| now < until)
    }

    /// The ticker may only evaluate while this holds.
    pub fn is_clear(&self, now: DateTime<Utc>) -> bool {
        self.active.is_none() && self.scheduling.is_none() && !self.is_celebrating(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn only_one_modal_at_a_time() {
        let mut g = Gate::new();
        assert!(g.open("a", ModalKind::Reminder));
        assert!(!g.open("b", ModalKind::StartCheck));
        assert!(g.is_active("a"));
        assert!(g.close_for("b").is_none());
        assert_eq!(g.close().unwrap().task_id, "a");
        assert!(g.open("b", ModalKind::StartCheck));
    }

    #[test]
    fn switch_keeps_owner() {
        let mut g = Gate::new();
        g.open("a", ModalKind::StartCheck);
        assert!(!g.switch("b", ModalKind::Blocked));
        assert!(g.switch("a", ModalKind::Blocked));
        assert_eq!(g.active().unwrap().kind, ModalKind::Blocked);
    }

    #[test]
    fn scheduling_prompts_queue_in_order() {
        let mut g = Gate::new();
        g.request_schedule("a");
        g.request_schedule("b");
        g.request_schedule("a");
        assert_eq!(g.scheduling().map(String::as_str), Some("a"));
        assert!(!g.is_clear(now()));
        g.finish_schedule("a");
        assert_eq!(g.scheduling().map(String::as_str), Some("b"));
        g.forget("b");
        assert!(g.scheduling().is_none());
        assert!(g.is_clear(now()));
    }

    #[test]
    fn celebration_expires_after_four_seconds() {
        let mut g = Gate::new();
        g.celebrate(now());
        assert!(!g.is_clear(now() + Duration::milliseconds(3_999)));
        assert!(g.is_clear(now() + Duration::seconds(4)));
    }
}
