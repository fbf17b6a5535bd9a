//! Ticker: decides which single due transition a tick performs.
//!
//! The loop that owns `App` calls `Event::Tick` on a fixed interval; this
//! module only answers "what is due now", so it stays pure and tests can
//! drive time by hand through a `Clock`.

use std::cell::Cell;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::gate::{Gate, ModalKind};
use crate::lifecycle;
use crate::store::TaskStore;
use crate::task::{TaskId, TaskStatus};

pub const DEFAULT_TICK: StdDuration = StdDuration::from_millis(1000);

/// Source of "now" for the event loop.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for deterministic replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let next = self.now.get() + by;
        self.now.set(next);
        next
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// The one thing a tick should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Due {
    /// A pending reminder reached its time.
    Trigger(TaskId),
    /// A countdown ran out; ask "did you start?".
    CountdownExpired(TaskId),
    /// The follow-up window passed; ask "are you done?".
    FollowUp(TaskId),
    /// A task is parked in a state that needs its modal back (after restore).
    Reopen(TaskId, ModalKind),
}

/// Pick at most one due transition, in fixed priority order.
pub fn next_due(store: &TaskStore, gate: &Gate, now: DateTime<Utc>) -> Option<Due> {
    if !gate.is_clear(now) {
        return None;
    }

    let tasks = store.list();

    if let Some(t) = tasks.iter().find(|t| lifecycle::can_trigger(t, now)) {
        return Some(Due::Trigger(t.id.clone()));
    }

    if let Some(t) = tasks
        .iter()
        .find(|t| t.status == TaskStatus::Countdown && t.is_due(now))
    {
        return Some(Due::CountdownExpired(t.id.clone()));
    }

    if let Some(t) = tasks
        .iter()
        .find(|t| t.status == TaskStatus::WaitingForCompletion && t.is_due(now))
    {
        return Some(Due::FollowUp(t.id.clone()));
    }

    tasks.iter().find_map(|t| {
        ModalKind::implied_by(t.status).map(|kind| Due::Reopen(t.id.clone(), kind))
    })
}
