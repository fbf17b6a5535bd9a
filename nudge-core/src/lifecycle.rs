//! Task lifecycle transitions.
//!
//! Each function checks its source state, mutates the task, and reports the
//! edge it took. A `None` means the task was not in a state that accepts the
//! event; callers treat that as a stale event and do nothing.
//!
//! ```text
//! PENDING --ack--> COUNTDOWN --15s--> WAITING_FOR_START_CONFIRMATION
//!    ^                 ^                 | yes -> WAITING_FOR_COMPLETION --done--> (removed)
//!    |                 +-- no (0->1) ----+                 |
//!    +---------------- no (1->2, +60s) --+                 +--not done--> COUNTDOWN
//!    |                                   | no (>=2)
//!    +---- help / skip (+5m) ------- BLOCKED
//! ```

use chrono::{DateTime, Utc};

use crate::task::{Task, TaskStatus};
use crate::time::{self, has_reminder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Where a "not started yet" answer sent the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineOutcome {
    /// First decline: another countdown right away.
    Recountdown,
    /// Second decline: back to pending for a minute.
    Deferred,
    /// Third decline: ask what would help.
    Blocked,
}

fn advance(task: &mut Task, to: TaskStatus, now: DateTime<Utc>) -> Transition {
    let from = task.status;
    debug_assert!(from.can_transition_to(to), "illegal edge {from:?} -> {to:?}");
    task.status = to;
    task.last_action_time = now;
    Transition { from, to }
}

/// Whether the initial trigger may fire for this task now. The horizon guard
/// is evaluated here, at trigger time.
pub fn can_trigger(task: &Task, now: DateTime<Utc>) -> bool {
    task.status == TaskStatus::Pending
        && !task.is_parsing
        && !task.modal_dismissed
        && task.is_due(now)
        && has_reminder(task.scheduled_time, now)
}

/// The user acknowledged the reminder: start the countdown.
pub fn acknowledge(task: &mut Task, now: DateTime<Utc>) -> Option<Transition> {
    if task.status != TaskStatus::Pending {
        return None;
    }
    task.scheduled_time = now + time::COUNTDOWN;
    task.modal_dismissed = false;
    Some(advance(task, TaskStatus::Countdown, now))
}

/// Re-arm a pending reminder five minutes out.
pub fn snooze(task: &mut Task, now: DateTime<Utc>) -> bool {
    if task.status != TaskStatus::Pending {
        return false;
    }
    task.scheduled_time = now + time::SNOOZE;
    task.modal_dismissed = false;
    task.last_action_time = now;
    true
}

/// The reminder modal was closed without an answer.
pub fn dismiss_reminder(task: &mut Task) -> bool {
    if task.status != TaskStatus::Pending {
        return false;
    }
    task.modal_dismissed = true;
    true
}

/// Set a pending task's reminder time (scheduling picker or parsed time).
pub fn reschedule(task: &mut Task, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    if task.status != TaskStatus::Pending {
        return false;
    }
    task.scheduled_time = at;
    task.modal_dismissed = false;
    task.last_action_time = now;
    true
}

pub fn countdown_expired(task: &mut Task, now: DateTime<Utc>) -> Option<Transition> {
    if task.status != TaskStatus::Countdown || !task.is_due(now) {
        return None;
    }
    Some(advance(task, TaskStatus::WaitingForStartConfirmation, now))
}

/// "Yes, I started": check back in ten minutes.
pub fn confirm_started(task: &mut Task, now: DateTime<Utc>) -> Option<Transition> {
    if task.status != TaskStatus::WaitingForStartConfirmation {
        return None;
    }
    task.scheduled_time = now + time::COMPLETION_FOLLOW_UP;
    Some(advance(task, TaskStatus::WaitingForCompletion, now))
}

/// "Not yet": escalate along the retry ladder.
pub fn decline_started(task: &mut Task, now: DateTime<Utc>) -> Option<(Transition, DeclineOutcome)> {
    if task.status != TaskStatus::WaitingForStartConfirmation {
        return None;
    }
    let previous = task.retry_count;
    task.retry_count += 1;
    let out = match previous {
        0 => {
            task.scheduled_time = now + time::COUNTDOWN;
            (advance(task, TaskStatus::Countdown, now), DeclineOutcome::Recountdown)
        }
        1 => {
            task.scheduled_time = now + time::SECOND_DECLINE_DEFERRAL;
            task.modal_dismissed = false;
            (advance(task, TaskStatus::Pending, now), DeclineOutcome::Deferred)
        }
        _ => (advance(task, TaskStatus::Blocked, now), DeclineOutcome::Blocked),
    };
    Some(out)
}

/// Completion can only be confirmed from the follow-up state.
pub fn can_complete(task: &Task) -> bool {
    task.status == TaskStatus::WaitingForCompletion
}

/// "Not done yet": restart the trigger flow with a fresh countdown.
pub fn decline_done(task: &mut Task, now: DateTime<Utc>) -> Option<Transition> {
    if task.status != TaskStatus::WaitingForCompletion {
        return None;
    }
    task.scheduled_time = now + time::COUNTDOWN;
    Some(advance(task, TaskStatus::Countdown, now))
}

/// Completion check closed without an answer: ask again later.
pub fn postpone_follow_up(task: &mut Task, now: DateTime<Utc>) -> bool {
    if task.status != TaskStatus::WaitingForCompletion {
        return false;
    }
    task.scheduled_time = now + time::COMPLETION_FOLLOW_UP;
    true
}

/// Leave BLOCKED: a fresh pending re-queue five minutes out.
pub fn unblock(task: &mut Task, now: DateTime<Utc>) -> Option<Transition> {
    if task.status != TaskStatus::Blocked {
        return None;
    }
    task.retry_count = 0;
    task.modal_dismissed = false;
    task.scheduled_time = now + time::SNOOZE;
    Some(advance(task, TaskStatus::Pending, now))
}
