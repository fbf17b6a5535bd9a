//! nudge-core: task lifecycle, check-ins, and streaks for the Nudge reminder app

pub mod app;
pub mod enrichment;
pub mod events;
pub mod gate;
pub mod lifecycle;
pub mod scheduler;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod task;
pub mod time;

pub use app::{App, AppError, Dirty};
pub use enrichment::{Enrichment, ParsedTask, Priority, PriorityAssignment, TaskSummary};
pub use events::{Effect, Event, Response, ScheduleChoice, VoiceCapture};
pub use gate::{Gate, Modal, ModalKind};
pub use lifecycle::{DeclineOutcome, Transition};
pub use scheduler::{Clock, Due, ManualClock, SystemClock, next_due};
pub use session::Session;
pub use snapshot::{MemorySnapshots, SnapshotStore};
pub use stats::{Reward, Stats};
pub use store::{StoreError, TaskPatch, TaskStore};
pub use task::{Task, TaskId, TaskStatus};
