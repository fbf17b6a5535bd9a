//! App: the single-writer state machine behind every surface.
//!
//! All state lives here and changes only through `handle(event, now)`.
//! Side work (AI calls, speech, banners) comes back out as `Effect`s; async
//! results re-enter as `Event::Enriched`.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::enrichment::{Enrichment, ParsedTask, PriorityAssignment, TaskSummary};
use crate::events::{Effect, Event, Response, ScheduleChoice, VoiceCapture};
use crate::gate::{Gate, Modal, ModalKind};
use crate::lifecycle::{self, DeclineOutcome};
use crate::scheduler::{self, Due};
use crate::stats::Stats;
use crate::store::{TaskStore, new_task_id};
use crate::task::{Task, TaskStatus};
use crate::time::{self, has_reminder, no_reminder, parse_local_to_utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("invalid time: {0}")]
    InvalidSchedule(String),
    #[error("voice input is not available here; type the task instead")]
    CaptureUnsupported,
}

/// Which snapshots need writing after the last event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dirty {
    pub tasks: bool,
    pub stats: bool,
}

#[derive(Debug, Default)]
pub struct App {
    store: TaskStore,
    stats: Stats,
    gate: Gate,
    stats_dirty: bool,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from snapshots and re-issue enrichment that never finished.
    pub fn restore(tasks: Vec<Task>, stats: Stats) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();
        for t in &tasks {
            if t.is_parsing {
                effects.push(Effect::Parse {
                    task_id: t.id.clone(),
                    text: t.title.clone(),
                });
            } else if t.is_image_loading {
                effects.push(Effect::GenerateImage {
                    task_id: t.id.clone(),
                    title: t.title.clone(),
                });
            }
        }
        let app = Self {
            store: TaskStore::from_tasks(tasks),
            stats: stats.normalized(),
            gate: Gate::new(),
            stats_dirty: false,
        };
        (app, effects)
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn active_modal(&self) -> Option<(&Modal, &Task)> {
        let modal = self.gate.active()?;
        let task = self.store.get(&modal.task_id)?;
        Some((modal, task))
    }

    pub fn scheduling_task(&self) -> Option<&Task> {
        self.gate.scheduling().and_then(|id| self.store.get(id))
    }

    pub fn is_celebrating(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_celebrating(now)
    }

    /// Report and clear pending snapshot writes.
    pub fn take_dirty(&mut self) -> Dirty {
        let dirty = Dirty {
            tasks: self.store.is_dirty(),
            stats: self.stats_dirty,
        };
        self.store.mark_clean();
        self.stats_dirty = false;
        dirty
    }

    pub fn handle(&mut self, event: Event, now: DateTime<Utc>) -> Result<Vec<Effect>, AppError> {
        match event {
            Event::Tick => Ok(self.tick(now)),
            Event::Submit { text } => Ok(self.submit(&text, now)),
            Event::Voice(VoiceCapture::Transcript(text)) => Ok(self.submit(&text, now)),
            Event::Voice(VoiceCapture::Unsupported) => Err(AppError::CaptureUnsupported),
            Event::Respond { task_id, response } => Ok(self.respond(&task_id, response, now)),
            Event::Schedule { task_id, choice } => self.schedule(&task_id, choice, now),
            Event::Delete { task_id } => Ok(self.delete(&task_id)),
            Event::Breakdown { task_id } => Ok(self.breakdown(&task_id)),
            Event::Prioritize => Ok(self.prioritize()),
            Event::Enriched(e) => Ok(self.enriched(e, now)),
        }
    }

    fn tick(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(due) = scheduler::next_due(&self.store, &self.gate, now) else {
            return vec![];
        };

        match due {
            Due::Trigger(id) => {
                let Some(task) = self.store.get(&id) else { return vec![] };
                let speech = format!("Time to {}!", task.title);
                info!(task_id = %id, "reminder due");
                self.gate.open(id, ModalKind::Reminder);
                vec![Effect::Speak(speech)]
            }
            Due::CountdownExpired(id) => {
                let Some(task) = self.store.get_mut(&id) else { return vec![] };
                if lifecycle::countdown_expired(task, now).is_none() {
                    return vec![];
                }
                let speech = format!("Did you start {}?", task.title);
                info!(task_id = %id, "countdown expired");
                self.gate.open(id, ModalKind::StartCheck);
                vec![Effect::Speak(speech)]
            }
            Due::FollowUp(id) => {
                let Some(task) = self.store.get(&id) else { return vec![] };
                let speech = format!("Are you done with {}?", task.title);
                info!(task_id = %id, "follow-up due");
                self.gate.open(id, ModalKind::CompletionCheck);
                vec![Effect::Speak(speech)]
            }
            Due::Reopen(id, kind) => {
                debug!(task_id = %id, ?kind, "reopening modal");
                self.gate.open(id, kind);
                vec![]
            }
        }
    }

    fn submit(&mut self, text: &str, now: DateTime<Utc>) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }
        let id = self.store.create(text, now).id.clone();
        info!(task_id = %id, "task created");
        vec![Effect::Parse {
            task_id: id,
            text: text.to_string(),
        }]
    }

    fn respond(&mut self, task_id: &str, response: Response, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(kind) = self.gate.active().filter(|m| m.task_id == task_id).map(|m| m.kind) else {
            debug!(task_id, ?response, "response for a modal that is not open");
            return vec![];
        };
        if !self.store.contains(task_id) {
            self.gate.forget(task_id);
            return vec![];
        }

        match (kind, response) {
            (_, Response::Delete) => self.delete(task_id),
            (ModalKind::Reminder, Response::Acknowledge) => {
                self.with_task(task_id, |t| lifecycle::acknowledge(t, now).is_some());
                self.gate.close();
                vec![Effect::Speak("Let's go! Starting in 15 seconds.".to_string())]
            }
            (ModalKind::Reminder, Response::Snooze) => {
                self.with_task(task_id, |t| lifecycle::snooze(t, now));
                self.gate.close();
                vec![Effect::Speak("Okay, I'll remind you in 5 minutes.".to_string())]
            }
            (ModalKind::Reminder, Response::Dismiss) => {
                self.with_task(task_id, lifecycle::dismiss_reminder);
                self.gate.close();
                vec![]
            }
            (ModalKind::StartCheck, Response::Started) => {
                self.with_task(task_id, |t| lifecycle::confirm_started(t, now).is_some());
                self.gate.close();
                vec![Effect::Speak("Great! I'll check back in 10 minutes.".to_string())]
            }
            (ModalKind::StartCheck, Response::NotStarted) => self.decline_start(task_id, now),
            (ModalKind::CompletionCheck, Response::Done) => self.complete(task_id, now),
            (ModalKind::CompletionCheck, Response::NotDone) => {
                self.with_task(task_id, |t| lifecycle::decline_done(t, now).is_some());
                self.stats.record_decline();
                self.stats_dirty = true;
                self.gate.close();
                vec![Effect::Speak("That's okay. Let's try again in 15 seconds.".to_string())]
            }
            (ModalKind::CompletionCheck, Response::Dismiss) => {
                self.with_task(task_id, |t| lifecycle::postpone_follow_up(t, now));
                self.gate.close();
                vec![]
            }
            (ModalKind::Blocked, Response::Help(text)) if !text.trim().is_empty() => {
                self.unblock_with_help(task_id, text.trim(), now)
            }
            (ModalKind::Blocked, Response::Help(_) | Response::Skip) => {
                self.with_task(task_id, |t| lifecycle::unblock(t, now).is_some());
                self.gate.close();
                vec![Effect::Speak("Okay. I'll check in again in 5 minutes.".to_string())]
            }
            (kind, response) => {
                debug!(task_id, ?kind, ?response, "response does not fit the open modal");
                vec![]
            }
        }
    }

    fn decline_start(&mut self, task_id: &str, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(task) = self.store.get_mut(task_id) else { return vec![] };
        let Some((_, outcome)) = lifecycle::decline_started(task, now) else { return vec![] };
        let title = task.title.clone();
        self.stats.record_decline();
        self.stats_dirty = true;
        info!(task_id, ?outcome, "start declined");

        let speech = match outcome {
            DeclineOutcome::Recountdown => {
                self.gate.close();
                "No problem. 15 more seconds.".to_string()
            }
            DeclineOutcome::Deferred => {
                self.gate.close();
                "No worries, I'll ask again in a minute.".to_string()
            }
            DeclineOutcome::Blocked => {
                self.gate.switch(task_id, ModalKind::Blocked);
                format!("What's getting in the way of {title}? What would help?")
            }
        };
        vec![Effect::Speak(speech)]
    }

    fn complete(&mut self, task_id: &str, now: DateTime<Utc>) -> Vec<Effect> {
        match self.store.get(task_id) {
            Some(t) if lifecycle::can_complete(t) => {}
            _ => return vec![],
        }
        let Ok(task) = self.store.remove(task_id) else { return vec![] };
        let reward = self.stats.record_success();
        self.stats_dirty = true;
        self.gate.forget(task_id);
        self.gate.celebrate(now);
        info!(task_id, xp = self.stats.xp, level = self.stats.level, "task completed");

        let mut speech = format!("Amazing, you finished {}!", task.title);
        if reward.leveled_up {
            speech.push_str(&format!(" You reached level {}!", reward.level));
        }
        vec![Effect::Celebrate(reward), Effect::Speak(speech)]
    }

    fn unblock_with_help(&mut self, task_id: &str, help: &str, now: DateTime<Utc>) -> Vec<Effect> {
        let helper = Task::new(new_task_id(), help, now)
            .scheduled_at(now + time::SNOOZE)
            .parsing(true);
        let helper_id = helper.id.clone();
        self.store.insert_before(task_id, helper);
        self.with_task(task_id, |t| lifecycle::unblock(t, now).is_some());
        self.gate.close();
        info!(task_id, helper_id = %helper_id, "helper task added");

        vec![
            Effect::Parse {
                task_id: helper_id,
                text: help.to_string(),
            },
            Effect::Speak("Good idea. Let's do that first, in 5 minutes.".to_string()),
        ]
    }

    fn schedule(
        &mut self,
        task_id: &str,
        choice: ScheduleChoice,
        now: DateTime<Utc>,
    ) -> Result<Vec<Effect>, AppError> {
        let at = match choice {
            ScheduleChoice::InMinutes(m) if m < 0 => {
                return Err(AppError::InvalidSchedule(format!("{m} minutes is in the past")));
            }
            ScheduleChoice::InMinutes(m) => time::minutes_from(now, m)
                .ok_or_else(|| AppError::InvalidSchedule(format!("{m} minutes is out of range")))?,
            ScheduleChoice::At { local, timezone } => parse_local_to_utc(&local, &timezone)
                .map_err(|e| AppError::InvalidSchedule(e.to_string()))?,
            ScheduleChoice::NoReminder => no_reminder(now),
        };

        let Some(task) = self.store.get_mut(task_id) else {
            debug!(task_id, "schedule for a vanished task");
            self.gate.finish_schedule(task_id);
            return Ok(vec![]);
        };
        if !lifecycle::reschedule(task, at, now) {
            debug!(task_id, status = ?task.status, "only pending tasks can be rescheduled");
        }
        self.gate.finish_schedule(task_id);
        Ok(vec![])
    }

    fn delete(&mut self, task_id: &str) -> Vec<Effect> {
        self.gate.forget(task_id);
        match self.store.remove(task_id) {
            Ok(_) => info!(task_id, "task deleted"),
            Err(e) => debug!(task_id, "{e}"),
        }
        vec![]
    }

    fn breakdown(&self, task_id: &str) -> Vec<Effect> {
        match self.store.get(task_id) {
            Some(t) if t.status == TaskStatus::Pending && !self.gate.is_active(task_id) => {
                vec![Effect::Decompose {
                    task_id: t.id.clone(),
                    title: t.title.clone(),
                }]
            }
            _ => vec![],
        }
    }

    fn prioritize(&self) -> Vec<Effect> {
        if self.store.is_empty() {
            return vec![];
        }
        let tasks = self
            .store
            .list()
            .iter()
            .map(|t| TaskSummary {
                id: t.id.clone(),
                title: t.title.clone(),
            })
            .collect();
        vec![Effect::Prioritize { tasks }]
    }

    fn enriched(&mut self, enrichment: Enrichment, now: DateTime<Utc>) -> Vec<Effect> {
        match enrichment {
            Enrichment::Parsed { task_id, parsed } => self.apply_parse(&task_id, parsed, now),
            Enrichment::Image { task_id, image_url } => {
                if let Some(t) = self.store.get_mut(&task_id) {
                    t.is_image_loading = false;
                    if image_url.is_some() {
                        t.image_url = image_url;
                    }
                }
                vec![]
            }
            Enrichment::Decomposed { task_id, subtasks } => {
                self.apply_decomposition(&task_id, subtasks, now)
            }
            Enrichment::Prioritized { assignments } => {
                self.apply_priorities(assignments);
                vec![]
            }
        }
    }

    fn apply_parse(&mut self, task_id: &str, parsed: ParsedTask, now: DateTime<Utc>) -> Vec<Effect> {
        let Some(task) = self.store.get_mut(task_id) else {
            debug!(task_id, "parse finished for a vanished task");
            return vec![];
        };

        let title = parsed.title.trim();
        if !title.is_empty() {
            task.title = title.to_string();
        }
        task.is_parsing = false;

        if parsed.time_specified {
            match time::minutes_from(now, parsed.minutes_from_now.max(0)) {
                Some(at) => {
                    lifecycle::reschedule(task, at, now);
                }
                None => warn!(task_id, minutes = parsed.minutes_from_now, "parsed time out of range, asking instead"),
            }
        }
        let needs_time = task.status == TaskStatus::Pending && !has_reminder(task.scheduled_time, now);

        task.is_image_loading = true;
        let effect = Effect::GenerateImage {
            task_id: task.id.clone(),
            title: task.title.clone(),
        };

        if needs_time {
            self.gate.request_schedule(task_id);
        }
        vec![effect]
    }

    fn apply_decomposition(&mut self, task_id: &str, subtasks: Vec<String>, now: DateTime<Utc>) -> Vec<Effect> {
        let titles: Vec<String> = subtasks
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let Some(original) = self.store.get(task_id) else { return vec![] };
        if titles.is_empty() || original.status != TaskStatus::Pending || self.gate.is_active(task_id) {
            debug!(task_id, "decomposition unavailable; task left as is");
            return vec![];
        }

        let steps: Vec<Task> = titles
            .into_iter()
            .map(|title| {
                let mut t = Task::new(new_task_id(), title, now).scheduled_at(original.scheduled_time);
                t.category = original.category.clone();
                t.priority = original.priority;
                t.is_image_loading = true;
                t
            })
            .collect();
        let effects = steps
            .iter()
            .map(|t| Effect::GenerateImage {
                task_id: t.id.clone(),
                title: t.title.clone(),
            })
            .collect();

        let first_step = steps[0].id.clone();
        let was_prompting = self.gate.scheduling().is_some_and(|id| id == task_id);
        if self.store.splice(task_id, steps).is_err() {
            return vec![];
        }
        self.gate.finish_schedule(task_id);
        if was_prompting {
            self.gate.request_schedule(first_step);
        }
        info!(task_id, "task broken down");
        effects
    }

    fn apply_priorities(&mut self, assignments: Vec<PriorityAssignment>) {
        for a in assignments {
            if let Some(t) = self.store.get_mut(&a.id) {
                t.category = Some(a.category);
                t.priority = Some(a.priority);
            }
        }
    }

    /// Run a lifecycle step on a stored task; a missing task is a no-op.
    fn with_task(&mut self, task_id: &str, f: impl FnOnce(&mut Task) -> bool) -> bool {
        match self.store.get_mut(task_id) {
            Some(t) => f(t),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::Priority;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn parsed(title: &str, minutes: i64, specified: bool) -> ParsedTask {
        ParsedTask {
            title: title.to_string(),
            minutes_from_now: minutes,
            time_specified: specified,
        }
    }

    /// Submit and finish parsing with a time, returning the task id.
    fn add_due(app: &mut App, title: &str, now: DateTime<Utc>) -> String {
        let effects = app.handle(Event::Submit { text: title.to_string() }, now).unwrap();
        let Some(Effect::Parse { task_id, .. }) = effects.into_iter().next() else {
            panic!("expected a parse request");
        };
        app.handle(
            Event::Enriched(Enrichment::Parsed {
                task_id: task_id.clone(),
                parsed: parsed(title, 0, true),
            }),
            now,
        )
        .unwrap();
        task_id
    }

    fn respond(app: &mut App, id: &str, r: Response, now: DateTime<Utc>) -> Vec<Effect> {
        app.handle(
            Event::Respond {
                task_id: id.to_string(),
                response: r,
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn submit_requests_parse_and_blank_is_ignored() {
        let mut app = App::new();
        assert!(app.handle(Event::Submit { text: "   ".into() }, t0()).unwrap().is_empty());
        let effects = app.handle(Event::Submit { text: " call mom ".into() }, t0()).unwrap();
        assert!(matches!(&effects[0], Effect::Parse { text, .. } if text == "call mom"));
        assert_eq!(app.store().len(), 1);
        assert!(app.store().list()[0].is_parsing);
    }

    #[test]
    fn parse_with_time_schedules_and_requests_image() {
        let mut app = App::new();
        let effects = app.handle(Event::Submit { text: "call mom in 30 min".into() }, t0()).unwrap();
        let Effect::Parse { task_id, .. } = &effects[0] else { panic!() };
        let effects = app
            .handle(
                Event::Enriched(Enrichment::Parsed {
                    task_id: task_id.clone(),
                    parsed: parsed("Call mom", 30, true),
                }),
                t0(),
            )
            .unwrap();
        let t = app.store().get(task_id).unwrap();
        assert_eq!(t.title, "Call mom");
        assert_eq!(t.scheduled_time, t0() + Duration::minutes(30));
        assert!(!t.is_parsing);
        assert!(t.is_image_loading);
        assert!(matches!(&effects[0], Effect::GenerateImage { title, .. } if title == "Call mom"));
        assert!(app.scheduling_task().is_none());
    }

    #[test]
    fn late_results_for_deleted_tasks_are_ignored() {
        let mut app = App::new();
        let effects = app.handle(Event::Submit { text: "x".into() }, t0()).unwrap();
        let Effect::Parse { task_id, .. } = &effects[0] else { panic!() };
        app.handle(Event::Delete { task_id: task_id.clone() }, t0()).unwrap();
        let out = app
            .handle(
                Event::Enriched(Enrichment::Parsed {
                    task_id: task_id.clone(),
                    parsed: parsed("X", 5, true),
                }),
                t0(),
            )
            .unwrap();
        assert!(out.is_empty());
        let out = app
            .handle(
                Event::Enriched(Enrichment::Image {
                    task_id: task_id.clone(),
                    image_url: Some("u".into()),
                }),
                t0(),
            )
            .unwrap();
        assert!(out.is_empty());
        assert!(app.store().is_empty());
    }

    #[test]
    fn invalid_custom_time_mutates_nothing() {
        let mut app = App::new();
        let effects = app.handle(Event::Submit { text: "wash dishes".into() }, t0()).unwrap();
        let Effect::Parse { task_id, .. } = &effects[0] else { panic!() };
        app.handle(
            Event::Enriched(Enrichment::Parsed {
                task_id: task_id.clone(),
                parsed: ParsedTask::fallback("wash dishes"),
            }),
            t0(),
        )
        .unwrap();
        app.take_dirty();
        let before = app.store().get(task_id).cloned();

        let err = app
            .handle(
                Event::Schedule {
                    task_id: task_id.clone(),
                    choice: ScheduleChoice::At {
                        local: "next tuesday".into(),
                        timezone: "America/Chicago".into(),
                    },
                },
                t0(),
            )
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidSchedule(_)));
        assert_eq!(app.store().get(task_id).cloned(), before);
        assert_eq!(app.scheduling_task().map(|t| t.id.clone()), Some(task_id.clone()));
        assert_eq!(app.take_dirty(), Dirty::default());
    }

    #[test]
    fn out_of_range_parsed_time_asks_for_a_time() {
        let mut app = App::new();
        let effects = app.handle(Event::Submit { text: "call mom in forever".into() }, t0()).unwrap();
        let Effect::Parse { task_id, .. } = &effects[0] else { panic!() };
        let effects = app
            .handle(
                Event::Enriched(Enrichment::Parsed {
                    task_id: task_id.clone(),
                    parsed: parsed("Call mom", 1_000_000_000_000_000, true),
                }),
                t0(),
            )
            .unwrap();
        let t = app.store().get(task_id).unwrap();
        assert_eq!(t.title, "Call mom");
        assert!(!t.is_parsing);
        assert!(!has_reminder(t.scheduled_time, t0()));
        assert!(matches!(&effects[0], Effect::GenerateImage { .. }));
        assert_eq!(app.scheduling_task().map(|t| t.id.clone()), Some(task_id.clone()));
    }

    #[test]
    fn out_of_range_minutes_are_rejected_without_changes() {
        let mut app = App::new();
        let effects = app.handle(Event::Submit { text: "stretch".into() }, t0()).unwrap();
        let Effect::Parse { task_id, .. } = &effects[0] else { panic!() };
        app.handle(
            Event::Enriched(Enrichment::Parsed {
                task_id: task_id.clone(),
                parsed: ParsedTask::fallback("stretch"),
            }),
            t0(),
        )
        .unwrap();
        app.take_dirty();
        let before = app.store().get(task_id).cloned();

        for m in [i64::MAX, i64::MAX / 2, 1_000_000_000_000_000] {
            let err = app
                .handle(
                    Event::Schedule {
                        task_id: task_id.clone(),
                        choice: ScheduleChoice::InMinutes(m),
                    },
                    t0(),
                )
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidSchedule(_)));
        }
        assert_eq!(app.store().get(task_id).cloned(), before);
        assert_eq!(app.scheduling_task().map(|t| t.id.clone()), Some(task_id.clone()));
        assert_eq!(app.take_dirty(), Dirty::default());
    }

    #[test]
    fn voice_capture_unsupported_creates_nothing() {
        let mut app = App::new();
        let err = app.handle(Event::Voice(VoiceCapture::Unsupported), t0()).unwrap_err();
        assert_eq!(err, AppError::CaptureUnsupported);
        assert!(app.store().is_empty());

        app.handle(Event::Voice(VoiceCapture::Transcript("stretch".into())), t0()).unwrap();
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn reminder_snooze_and_dismiss() {
        let mut app = App::new();
        let id = add_due(&mut app, "stretch", t0());

        let fx = app.handle(Event::Tick, t0()).unwrap();
        assert!(matches!(&fx[0], Effect::Speak(s) if s.contains("stretch")));
        assert_eq!(app.gate().active().unwrap().kind, ModalKind::Reminder);

        respond(&mut app, &id, Response::Dismiss, t0());
        assert!(app.gate().active().is_none());
        assert!(app.handle(Event::Tick, t0() + Duration::seconds(1)).unwrap().is_empty());
        assert!(app.store().get(&id).unwrap().modal_dismissed);

        // Rescheduling clears the dismissal.
        app.handle(
            Event::Schedule {
                task_id: id.clone(),
                choice: ScheduleChoice::InMinutes(0),
            },
            t0() + Duration::seconds(2),
        )
        .unwrap();
        app.handle(Event::Tick, t0() + Duration::seconds(2)).unwrap();
        respond(&mut app, &id, Response::Snooze, t0() + Duration::seconds(2));
        let t = app.store().get(&id).unwrap();
        assert_eq!(t.scheduled_time, t0() + Duration::seconds(2) + Duration::minutes(5));
        assert!(!t.modal_dismissed);
    }

    #[test]
    fn responses_to_other_modals_are_ignored() {
        let mut app = App::new();
        let a = add_due(&mut app, "a", t0());
        let b = add_due(&mut app, "b", t0());
        app.handle(Event::Tick, t0()).unwrap();
        assert!(app.gate().is_active(&a));

        assert!(respond(&mut app, &b, Response::Acknowledge, t0()).is_empty());
        assert!(respond(&mut app, &a, Response::Done, t0()).is_empty());
        assert_eq!(app.store().get(&a).unwrap().status, TaskStatus::Pending);
        assert!(app.gate().is_active(&a));
    }

    #[test]
    fn blocked_help_enqueues_helper_ahead() {
        let mut app = App::new();
        let id = add_due(&mut app, "do taxes", t0());
        {
            let t = app.store.get_mut(&id).unwrap();
            t.status = TaskStatus::WaitingForStartConfirmation;
            t.retry_count = 2;
        }
        app.gate.open(id.clone(), ModalKind::StartCheck);

        respond(&mut app, &id, Response::NotStarted, t0());
        assert_eq!(app.store().get(&id).unwrap().status, TaskStatus::Blocked);
        assert_eq!(app.gate().active().unwrap().kind, ModalKind::Blocked);

        let fx = respond(&mut app, &id, Response::Help("find the receipts folder".into()), t0());
        let Effect::Parse { task_id: helper, text } = &fx[0] else { panic!() };
        assert_eq!(text, "find the receipts folder");
        assert!(app.gate().active().is_none());

        let ids: Vec<_> = app.store().list().iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids, vec![helper.clone(), id.clone()]);
        let original = app.store().get(&id).unwrap();
        assert_eq!(original.status, TaskStatus::Pending);
        assert_eq!(original.retry_count, 0);
        assert_eq!(original.scheduled_time, t0() + Duration::minutes(5));
        let h = app.store().get(helper).unwrap();
        assert_eq!(h.scheduled_time, t0() + Duration::minutes(5));

        // Helper parse without a time keeps its slot and asks nothing.
        app.handle(
            Event::Enriched(Enrichment::Parsed {
                task_id: helper.clone(),
                parsed: ParsedTask::fallback("find the receipts folder"),
            }),
            t0(),
        )
        .unwrap();
        assert!(app.scheduling_task().is_none());
        let five = t0() + Duration::minutes(5);
        app.handle(Event::Tick, five).unwrap();
        assert!(app.gate().is_active(helper));
    }

    #[test]
    fn decomposition_replaces_task_or_leaves_it() {
        let mut app = App::new();
        let id = add_due(&mut app, "clean the house", t0());
        let fx = app.handle(Event::Breakdown { task_id: id.clone() }, t0()).unwrap();
        assert!(matches!(&fx[0], Effect::Decompose { title, .. } if title == "clean the house"));

        app.handle(
            Event::Enriched(Enrichment::Decomposed {
                task_id: id.clone(),
                subtasks: vec![],
            }),
            t0(),
        )
        .unwrap();
        assert!(app.store().contains(&id));

        let fx = app
            .handle(
                Event::Enriched(Enrichment::Decomposed {
                    task_id: id.clone(),
                    subtasks: vec!["kitchen".into(), " ".into(), "bathroom".into()],
                }),
                t0(),
            )
            .unwrap();
        assert_eq!(fx.len(), 2);
        assert!(!app.store().contains(&id));
        let titles: Vec<_> = app.store().list().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["kitchen", "bathroom"]);
        assert!(app.store().list().iter().all(|t| t.scheduled_time == t0()));
    }

    #[test]
    fn prioritization_sets_category_and_priority() {
        let mut app = App::new();
        let id = add_due(&mut app, "pay rent", t0());
        let fx = app.handle(Event::Prioritize, t0()).unwrap();
        assert!(matches!(&fx[0], Effect::Prioritize { tasks } if tasks.len() == 1));
        app.handle(
            Event::Enriched(Enrichment::Prioritized {
                assignments: vec![
                    PriorityAssignment {
                        id: id.clone(),
                        category: "Money".into(),
                        priority: Priority::High,
                    },
                    PriorityAssignment {
                        id: "gone".into(),
                        category: "x".into(),
                        priority: Priority::Low,
                    },
                ],
            }),
            t0(),
        )
        .unwrap();
        let t = app.store().get(&id).unwrap();
        assert_eq!(t.category.as_deref(), Some("Money"));
        assert_eq!(t.priority, Some(Priority::High));
    }

    #[test]
    fn restore_reissues_unfinished_enrichment() {
        let mut parsing = Task::new("p", "raw text", t0()).parsing(true);
        parsing.is_image_loading = true;
        let mut imaging = Task::new("i", "Image me", t0());
        imaging.is_image_loading = true;
        let done = Task::new("d", "Done", t0());

        let (app, fx) = App::restore(vec![parsing, imaging, done], Stats::default());
        assert_eq!(app.store().len(), 3);
        assert_eq!(
            fx,
            vec![
                Effect::Parse { task_id: "p".into(), text: "raw text".into() },
                Effect::GenerateImage { task_id: "i".into(), title: "Image me".into() },
            ]
        );
    }

    #[test]
    fn delete_active_task_closes_modal() {
        let mut app = App::new();
        let id = add_due(&mut app, "a", t0());
        app.handle(Event::Tick, t0()).unwrap();
        respond(&mut app, &id, Response::Delete, t0());
        assert!(app.gate().active().is_none());
        assert!(app.store().is_empty());
    }
}
