//! Session: the event loop's owner. Wraps `App` with snapshot persistence,
//! flushing once per handled event.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::app::{App, AppError};
use crate::events::{Effect, Event};
use crate::snapshot::{self, SnapshotStore};

pub struct Session<S: SnapshotStore> {
    app: App,
    snapshots: S,
}

impl<S: SnapshotStore> Session<S> {
    /// Load snapshots (best effort) and return the enrichment to re-run.
    pub fn open(snapshots: S) -> (Self, Vec<Effect>) {
        let tasks = snapshot::load_tasks(&snapshots);
        let stats = snapshot::load_stats(&snapshots);
        let (app, effects) = App::restore(tasks, stats);
        (Self { app, snapshots }, effects)
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn snapshots(&self) -> &S {
        &self.snapshots
    }

    pub fn dispatch(&mut self, event: Event, now: DateTime<Utc>) -> Result<Vec<Effect>, AppError> {
        let result = self.app.handle(event, now);
        self.flush();
        result
    }

    /// Write whatever changed. Failures are logged, never raised.
    pub fn flush(&mut self) {
        let dirty = self.app.take_dirty();
        if dirty.tasks {
            if let Err(e) = snapshot::save_tasks(&mut self.snapshots, self.app.store().list()) {
                warn!("saving tasks failed: {e:#}");
            }
        }
        if dirty.stats {
            if let Err(e) = snapshot::save_stats(&mut self.snapshots, &self.app.stats()) {
                warn!("saving stats failed: {e:#}");
            }
        }
    }
}
