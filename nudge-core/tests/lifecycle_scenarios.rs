use chrono::{DateTime, Duration, TimeZone, Utc};
use nudge_core::{
    App, Clock, Effect, Enrichment, Event, ManualClock, ModalKind, ParsedTask, Response,
    ScheduleChoice, Stats, Task, TaskStatus,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 19, 12, 0, 0).unwrap()
}

fn submit(app: &mut App, text: &str, now: DateTime<Utc>) -> String {
    let effects = app.handle(Event::Submit { text: text.to_string() }, now).unwrap();
    match effects.into_iter().next() {
        Some(Effect::Parse { task_id, .. }) => task_id,
        other => panic!("expected parse request, got {other:?}"),
    }
}

fn parsed(app: &mut App, id: &str, p: ParsedTask, now: DateTime<Utc>) {
    app.handle(
        Event::Enriched(Enrichment::Parsed {
            task_id: id.to_string(),
            parsed: p,
        }),
        now,
    )
    .unwrap();
}

fn respond(app: &mut App, id: &str, response: Response, now: DateTime<Utc>) -> Vec<Effect> {
    app.handle(
        Event::Respond {
            task_id: id.to_string(),
            response,
        },
        now,
    )
    .unwrap()
}

fn status(app: &App, id: &str) -> TaskStatus {
    app.store().get(id).unwrap().status
}

/// A task that is due right now with its reminder modal about to open.
fn due_task(app: &mut App, title: &str, now: DateTime<Utc>) -> String {
    let id = submit(app, title, now);
    parsed(
        app,
        &id,
        ParsedTask {
            title: title.to_string(),
            minutes_from_now: 0,
            time_specified: true,
        },
        now,
    );
    id
}

#[test]
fn no_time_phrase_prompts_for_schedule_and_sixty_minutes_sets_reminder() {
    let mut app = App::new();
    let now = t0();
    let id = submit(&mut app, "wash dishes", now);

    // The AI was unreachable: documented fallback.
    parsed(&mut app, &id, ParsedTask::fallback("wash dishes"), now);
    assert_eq!(app.scheduling_task().map(|t| t.id.as_str()), Some(id.as_str()));

    // Ticker stays quiet while the prompt is open.
    assert!(app.handle(Event::Tick, now).unwrap().is_empty());

    app.handle(
        Event::Schedule {
            task_id: id.clone(),
            choice: ScheduleChoice::InMinutes(60),
        },
        now,
    )
    .unwrap();
    let t = app.store().get(&id).unwrap();
    assert_eq!((t.scheduled_time - now).num_milliseconds(), 3_600_000);
    assert!(app.scheduling_task().is_none());
}

#[test]
fn countdown_expires_at_fifteen_seconds_not_before() {
    let mut app = App::new();
    let id = due_task(&mut app, "stretch", t0());
    app.handle(Event::Tick, t0()).unwrap();
    respond(&mut app, &id, Response::Acknowledge, t0());
    assert_eq!(status(&app, &id), TaskStatus::Countdown);

    app.handle(Event::Tick, t0() + Duration::milliseconds(14_999)).unwrap();
    assert_eq!(status(&app, &id), TaskStatus::Countdown);
    assert!(app.gate().active().is_none());

    let fx = app.handle(Event::Tick, t0() + Duration::milliseconds(15_000)).unwrap();
    assert_eq!(status(&app, &id), TaskStatus::WaitingForStartConfirmation);
    assert_eq!(app.gate().active().unwrap().kind, ModalKind::StartCheck);
    assert!(matches!(&fx[0], Effect::Speak(s) if s.contains("start")));
}

#[test]
fn three_declines_walk_the_retry_ladder() {
    let clock = ManualClock::new(t0());
    let mut app = App::new();
    let id = due_task(&mut app, "do laundry", clock.now());

    // Trigger, acknowledge, countdown, ask.
    let reach_start_check = |app: &mut App| {
        app.handle(Event::Tick, clock.now()).unwrap();
        respond(app, &id, Response::Acknowledge, clock.now());
        clock.advance(Duration::seconds(15));
        app.handle(Event::Tick, clock.now()).unwrap();
        assert_eq!(status(app, &id), TaskStatus::WaitingForStartConfirmation);
    };

    reach_start_check(&mut app);
    respond(&mut app, &id, Response::NotStarted, clock.now());
    assert_eq!(status(&app, &id), TaskStatus::Countdown);
    assert_eq!(app.store().get(&id).unwrap().retry_count, 1);

    clock.advance(Duration::seconds(15));
    app.handle(Event::Tick, clock.now()).unwrap();
    respond(&mut app, &id, Response::NotStarted, clock.now());
    assert_eq!(status(&app, &id), TaskStatus::Pending);
    assert_eq!(app.store().get(&id).unwrap().retry_count, 2);

    // Deferred a minute: nothing before that.
    clock.advance(Duration::seconds(59));
    assert!(app.handle(Event::Tick, clock.now()).unwrap().is_empty());
    clock.advance(Duration::seconds(1));
    reach_start_check(&mut app);
    respond(&mut app, &id, Response::NotStarted, clock.now());
    assert_eq!(status(&app, &id), TaskStatus::Blocked);
    assert_eq!(app.gate().active().unwrap().kind, ModalKind::Blocked);
    assert_eq!(app.stats().streak, 0);
}

#[test]
fn confirming_completion_removes_task_and_rewards() {
    let mut app = App::new();
    let now = t0();
    let id = due_task(&mut app, "wash dishes", now);
    app.handle(Event::Tick, now).unwrap();
    respond(&mut app, &id, Response::Acknowledge, now);
    let now = now + Duration::seconds(15);
    app.handle(Event::Tick, now).unwrap();
    respond(&mut app, &id, Response::Started, now);
    assert_eq!(status(&app, &id), TaskStatus::WaitingForCompletion);

    // Follow-up opens after ten minutes, without a status change.
    assert!(app.handle(Event::Tick, now + Duration::minutes(9)).unwrap().is_empty());
    let now = now + Duration::minutes(10);
    app.handle(Event::Tick, now).unwrap();
    assert_eq!(app.gate().active().unwrap().kind, ModalKind::CompletionCheck);
    assert_eq!(status(&app, &id), TaskStatus::WaitingForCompletion);

    let before = app.stats();
    let fx = respond(&mut app, &id, Response::Done, now);
    assert!(app.store().get(&id).is_none());
    assert_eq!(app.stats().xp, before.xp + 25);
    assert_eq!(app.stats().streak, before.streak + 1);
    assert!(matches!(fx[0], Effect::Celebrate(r) if r.xp_gained == 25));
    assert!(app.is_celebrating(now + Duration::seconds(3)));
}

#[test]
fn celebration_holds_back_the_next_modal() {
    let mut app = App::new();
    let now = t0();
    let one = due_task(&mut app, "one", now);
    app.handle(Event::Tick, now).unwrap();
    respond(&mut app, &one, Response::Acknowledge, now);
    app.handle(Event::Tick, now + Duration::seconds(15)).unwrap();
    respond(&mut app, &one, Response::Started, now + Duration::seconds(15));

    let check = now + Duration::seconds(15) + Duration::minutes(10);
    app.handle(Event::Tick, check).unwrap();
    respond(&mut app, &one, Response::Done, check);

    let two = due_task(&mut app, "two", check + Duration::seconds(1));
    assert!(app.handle(Event::Tick, check + Duration::seconds(1)).unwrap().is_empty());
    assert!(app.handle(Event::Tick, check + Duration::milliseconds(3_999)).unwrap().is_empty());
    app.handle(Event::Tick, check + Duration::seconds(4)).unwrap();
    assert!(app.gate().is_active(&two));
}

#[test]
fn declining_completion_restarts_countdown_and_resets_streak() {
    let mut app = App::new();
    let now = t0();
    let id = due_task(&mut app, "write report", now);
    app.handle(Event::Tick, now).unwrap();
    respond(&mut app, &id, Response::Acknowledge, now);
    app.handle(Event::Tick, now + Duration::seconds(15)).unwrap();
    respond(&mut app, &id, Response::Started, now + Duration::seconds(15));

    let check = now + Duration::seconds(15) + Duration::minutes(10);
    app.handle(Event::Tick, check).unwrap();
    respond(&mut app, &id, Response::NotDone, check);
    let t = app.store().get(&id).unwrap();
    assert_eq!(t.status, TaskStatus::Countdown);
    assert_eq!(t.scheduled_time, check + Duration::seconds(15));
    assert_eq!(app.stats().streak, 0);
}

#[test]
fn skip_when_blocked_requeues_in_five_minutes() {
    let mut tasks = vec![Task::new("b", "taxes", t0()).with_status(TaskStatus::Blocked)];
    tasks[0].retry_count = 3;
    let (mut app, _) = App::restore(tasks, Stats::default());

    // The blocked modal comes back on the first tick after restore.
    app.handle(Event::Tick, t0()).unwrap();
    assert_eq!(app.gate().active().unwrap().kind, ModalKind::Blocked);

    respond(&mut app, "b", Response::Skip, t0());
    let t = app.store().get("b").unwrap();
    assert_eq!(t.status, TaskStatus::Pending);
    assert_eq!(t.retry_count, 0);
    assert_eq!(t.scheduled_time, t0() + Duration::minutes(5));
}

/// Drive random-ish interleavings of ticks and answers and check the
/// invariants after every step.
#[test]
fn invariants_hold_across_interleavings() {
    let responses = [
        Response::Acknowledge,
        Response::Snooze,
        Response::Dismiss,
        Response::Started,
        Response::NotStarted,
        Response::Done,
        Response::NotDone,
        Response::Help("ask a friend".to_string()),
        Response::Skip,
    ];

    for seed in 1u64..=20 {
        let mut rng = seed;
        let mut next = move || {
            rng ^= rng << 13;
            rng ^= rng >> 7;
            rng ^= rng << 17;
            rng
        };

        let clock = ManualClock::new(t0());
        let mut app = App::new();
        for i in 0..4 {
            due_task(&mut app, &format!("task {i}"), clock.now());
        }

        let mut last: std::collections::HashMap<String, (TaskStatus, u32)> = app
            .store()
            .list()
            .iter()
            .map(|t| (t.id.clone(), (t.status, t.retry_count)))
            .collect();
        let mut stats = app.stats();

        for _ in 0..400 {
            clock.advance(Duration::seconds((next() % 90) as i64));
            if next() % 3 == 0 {
                app.handle(Event::Tick, clock.now()).unwrap();
            } else if let Some(modal) = app.gate().active().cloned() {
                let r = responses[(next() % responses.len() as u64) as usize].clone();
                app.handle(
                    Event::Respond {
                        task_id: modal.task_id,
                        response: r,
                    },
                    clock.now(),
                )
                .unwrap();
            } else if let Some(id) = app.scheduling_task().map(|t| t.id.clone()) {
                app.handle(
                    Event::Schedule {
                        task_id: id,
                        choice: ScheduleChoice::InMinutes(1),
                    },
                    clock.now(),
                )
                .unwrap();
            } else {
                app.handle(Event::Tick, clock.now()).unwrap();
            }

            // Helper tasks need their parse to finish.
            let parsing: Vec<String> = app
                .store()
                .list()
                .iter()
                .filter(|t| t.is_parsing)
                .map(|t| t.id.clone())
                .collect();
            for id in parsing {
                parsed(&mut app, &id, ParsedTask::fallback("helper"), clock.now());
            }

            // At most one modal, and it belongs to a live task.
            if let Some(m) = app.gate().active() {
                assert!(app.store().contains(&m.task_id));
            }

            for t in app.store().list() {
                if let Some(&(prev_status, prev_retry)) = last.get(&t.id) {
                    if prev_status != t.status {
                        assert!(
                            prev_status.can_transition_to(t.status),
                            "illegal edge {prev_status:?} -> {:?}",
                            t.status
                        );
                    }
                    let requeued = prev_status == TaskStatus::Blocked && t.status == TaskStatus::Pending;
                    if !requeued {
                        assert!(t.retry_count >= prev_retry);
                    }
                }
            }
            last = app
                .store()
                .list()
                .iter()
                .map(|t| (t.id.clone(), (t.status, t.retry_count)))
                .collect();

            let now_stats = app.stats();
            assert!(now_stats.xp < 100);
            assert!(now_stats.level >= stats.level);
            assert!(now_stats.level <= stats.level + 1);
            stats = now_stats;
        }
    }
}
