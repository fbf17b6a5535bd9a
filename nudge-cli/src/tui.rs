use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use nudge_core::time::has_reminder;
use nudge_core::{
    Effect, Event, Modal, ModalKind, Response, Reward, ScheduleChoice, Session, Task, TaskId, TaskStatus, VoiceCapture,
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::io::{self, Stdout};
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

use crate::state::FileSnapshots;

pub struct Tui {
    session: Session<FileSnapshots>,
    timezone: Tz,
    quick_picks: Vec<i64>,
    tick: Duration,
    work: UnboundedSender<Effect>,
    done: Receiver<Event>,
    input: String,
    /// Main-line text set aside while a prompt owns the input.
    draft: String,
    custom_time: bool,
    selected: usize,
    notice: Option<String>,
    last_reward: Option<Reward>,
    show_help: bool,
    quit: bool,
}

/// Which prompt owns the input line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Focus {
    Main,
    Modal(Modal),
    Schedule(TaskId),
}

/// What a line typed into the main input means.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Add(String),
    Voice,
    Prioritize,
    Breakdown(Option<String>),
    Delete(Option<String>),
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(input: &str) -> Option<Command> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    let Some(rest) = s.strip_prefix('/') else {
        return Some(Command::Add(s.to_string()));
    };
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|a| !a.is_empty()).map(str::to_string);
    Some(match name {
        "voice" | "mic" => Command::Voice,
        "prioritize" | "sort" => Command::Prioritize,
        "breakdown" | "split" => Command::Breakdown(arg),
        "delete" | "rm" => Command::Delete(arg),
        "help" => Command::Help,
        "quit" | "q" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    })
}

/// Short status line for one task.
fn describe(task: &Task, now: DateTime<Utc>, tz: Tz) -> String {
    if task.is_parsing {
        return "understanding…".to_string();
    }
    match task.status {
        TaskStatus::Pending if !has_reminder(task.scheduled_time, now) => "no reminder".to_string(),
        TaskStatus::Pending if task.modal_dismissed => "reminder dismissed".to_string(),
        TaskStatus::Pending => {
            let left = task.remaining_ms(now);
            if left <= 0 {
                "due now".to_string()
            } else if left < 60 * 60 * 1000 {
                format!("in {}", short_duration(left))
            } else {
                task.scheduled_time.with_timezone(&tz).format("%a %H:%M").to_string()
            }
        }
        TaskStatus::Countdown => format!("starting in {}", short_duration(task.remaining_ms(now).max(0))),
        TaskStatus::WaitingForStartConfirmation => "did you start?".to_string(),
        TaskStatus::WaitingForCompletion => {
            format!("check-in in {}", short_duration(task.remaining_ms(now).max(0)))
        }
        TaskStatus::Blocked => "stuck".to_string(),
    }
}

fn short_duration(ms: i64) -> String {
    let secs = (ms + 999) / 1000;
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", (secs + 59) / 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

fn modal_text(kind: ModalKind, task: &Task) -> (String, String, &'static str) {
    match kind {
        ModalKind::Reminder => (
            "reminder".to_string(),
            format!("Time to {}!", task.title),
            "Enter=let's go  s=snooze 5m  Esc=dismiss  Ctrl-D=delete",
        ),
        ModalKind::StartCheck => (
            "check-in".to_string(),
            format!("Did you start {}?", task.title),
            "y=yes, started  n=not yet  Ctrl-D=delete",
        ),
        ModalKind::CompletionCheck => (
            "check-in".to_string(),
            format!("Are you done with {}?", task.title),
            "y=done  n=not yet  Esc=ask later  Ctrl-D=delete",
        ),
        ModalKind::Blocked => (
            "stuck".to_string(),
            format!("What's getting in the way of {}? What would help?", task.title),
            "type what would help + Enter  Esc=skip  Ctrl-D=delete",
        ),
    }
}

impl Tui {
    pub fn new(
        session: Session<FileSnapshots>,
        timezone: Tz,
        quick_picks: Vec<i64>,
        tick: Duration,
        work: UnboundedSender<Effect>,
        done: Receiver<Event>,
    ) -> Self {
        Self {
            session,
            timezone,
            quick_picks,
            tick,
            work,
            done,
            input: String::new(),
            draft: String::new(),
            custom_time: false,
            selected: 0,
            notice: None,
            last_reward: None,
            show_help: false,
            quit: false,
        }
    }

    pub fn run(mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;

        res
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        self.dispatch(Event::Tick);

        while !self.quit {
            terminal.draw(|f| self.draw(f))?;

            while let Ok(ev) = self.done.try_recv() {
                self.dispatch(ev);
            }

            if last_tick.elapsed() >= self.tick {
                last_tick = Instant::now();
                self.dispatch(Event::Tick);
            }

            if event::poll(Duration::from_millis(50))? {
                if let TermEvent::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.on_key(key);
                    }
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, event: Event) {
        let before = self.focus();
        match self.session.dispatch(event, Utc::now()) {
            Ok(effects) => self.run_effects(effects),
            Err(e) => self.notice = Some(e.to_string()),
        }
        let after = self.focus();
        if after != before {
            self.refocus(&before, &after);
        }
    }

    fn focus(&self) -> Focus {
        let app = self.session.app();
        if let Some((modal, _)) = app.active_modal() {
            return Focus::Modal(modal.clone());
        }
        match app.scheduling_task() {
            Some(task) => Focus::Schedule(task.id.clone()),
            None => Focus::Main,
        }
    }

    /// Every prompt starts with an empty line. The main line comes back
    /// once the last prompt closes.
    fn refocus(&mut self, before: &Focus, after: &Focus) {
        self.custom_time = false;
        match (before, after) {
            (Focus::Main, _) => self.draft = std::mem::take(&mut self.input),
            (_, Focus::Main) => self.input = std::mem::take(&mut self.draft),
            _ => self.input.clear(),
        }
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Celebrate(reward) => self.last_reward = Some(reward),
                Effect::Speak(text) => {
                    self.notice = Some(text.clone());
                    self.send(Effect::Speak(text));
                }
                other => self.send(other),
            }
        }
    }

    fn send(&self, effect: Effect) {
        if let Err(e) = self.work.send(effect) {
            tracing::warn!("enrichment worker is gone: {e}");
        }
    }

    /// Tasks in display order (grouped by category).
    fn rows(&self) -> Vec<&Task> {
        self.session
            .app()
            .store()
            .grouped_by_category()
            .into_iter()
            .flat_map(|(_, tasks)| tasks)
            .collect()
    }

    fn target(&self, prefix: Option<String>) -> Option<TaskId> {
        match prefix {
            Some(p) => self.session.app().store().resolve_prefix(&p).map(|t| t.id.clone()),
            None => self.rows().get(self.selected).map(|t| t.id.clone()),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if let Some((modal, _)) = self.session.app().active_modal() {
            let (task_id, kind) = (modal.task_id.clone(), modal.kind);
            self.on_modal_key(task_id, kind, key, ctrl);
            return;
        }
        if let Some(task) = self.session.app().scheduling_task() {
            let task_id = task.id.clone();
            self.on_schedule_key(task_id, key);
            return;
        }
        self.on_main_key(key, ctrl);
    }

    fn on_modal_key(&mut self, task_id: TaskId, kind: ModalKind, key: KeyEvent, ctrl: bool) {
        let response = if ctrl && key.code == KeyCode::Char('d') {
            Some(Response::Delete)
        } else {
            match (kind, key.code) {
                (ModalKind::Reminder, KeyCode::Enter | KeyCode::Char('a')) => Some(Response::Acknowledge),
                (ModalKind::Reminder, KeyCode::Char('s')) => Some(Response::Snooze),
                (ModalKind::Reminder | ModalKind::CompletionCheck, KeyCode::Esc) => Some(Response::Dismiss),
                (ModalKind::StartCheck, KeyCode::Char('y')) => Some(Response::Started),
                (ModalKind::StartCheck, KeyCode::Char('n')) => Some(Response::NotStarted),
                (ModalKind::CompletionCheck, KeyCode::Char('y')) => Some(Response::Done),
                (ModalKind::CompletionCheck, KeyCode::Char('n')) => Some(Response::NotDone),
                (ModalKind::Blocked, KeyCode::Enter) => Some(Response::Help(std::mem::take(&mut self.input))),
                (ModalKind::Blocked, KeyCode::Esc) => {
                    self.input.clear();
                    Some(Response::Skip)
                }
                (ModalKind::Blocked, KeyCode::Backspace) => {
                    self.input.pop();
                    None
                }
                (ModalKind::Blocked, KeyCode::Char(c)) => {
                    self.input.push(c);
                    None
                }
                _ => None,
            }
        };
        if let Some(response) = response {
            self.dispatch(Event::Respond { task_id, response });
        }
    }

    fn on_schedule_key(&mut self, task_id: TaskId, key: KeyEvent) {
        if self.custom_time {
            match key.code {
                KeyCode::Esc => {
                    self.custom_time = false;
                    self.input.clear();
                }
                KeyCode::Enter => {
                    let local = std::mem::take(&mut self.input);
                    self.custom_time = false;
                    self.dispatch(Event::Schedule {
                        task_id,
                        choice: ScheduleChoice::At {
                            local: local.trim().to_string(),
                            timezone: self.timezone.name().to_string(),
                        },
                    });
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => self.input.push(c),
                _ => {}
            }
            return;
        }

        let choice = match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                let idx = (c as usize) - ('1' as usize);
                self.quick_picks.get(idx).copied().map(ScheduleChoice::InMinutes)
            }
            KeyCode::Char('c') => {
                self.custom_time = true;
                self.input.clear();
                None
            }
            KeyCode::Char('n') | KeyCode::Esc => Some(ScheduleChoice::NoReminder),
            _ => None,
        };
        if let Some(choice) = choice {
            self.dispatch(Event::Schedule { task_id, choice });
        }
    }

    fn on_main_key(&mut self, key: KeyEvent, ctrl: bool) {
        if ctrl {
            match key.code {
                KeyCode::Char('d') => self.run_command(Command::Delete(None)),
                KeyCode::Char('b') => self.run_command(Command::Breakdown(None)),
                KeyCode::Char('p') => self.run_command(Command::Prioritize),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc if self.input.is_empty() => self.quit = true,
            KeyCode::Esc => self.input.clear(),
            KeyCode::Enter => {
                let line = std::mem::take(&mut self.input);
                if let Some(cmd) = parse_command(&line) {
                    self.run_command(cmd);
                }
            }
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                let n = self.rows().len();
                if self.selected + 1 < n {
                    self.selected += 1;
                }
            }
            KeyCode::Char('?') if self.input.is_empty() => self.show_help = !self.show_help,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn run_command(&mut self, cmd: Command) {
        match cmd {
            Command::Add(text) => self.dispatch(Event::Submit { text }),
            // A terminal has no microphone capture.
            Command::Voice => self.dispatch(Event::Voice(VoiceCapture::Unsupported)),
            Command::Prioritize => {
                self.notice = Some("Sorting your tasks…".to_string());
                self.dispatch(Event::Prioritize);
            }
            Command::Breakdown(prefix) => match self.target(prefix) {
                Some(task_id) => {
                    self.notice = Some("Breaking it into smaller steps…".to_string());
                    self.dispatch(Event::Breakdown { task_id });
                }
                None => self.notice = Some("No such task.".to_string()),
            },
            Command::Delete(prefix) => match self.target(prefix) {
                Some(task_id) => self.dispatch(Event::Delete { task_id }),
                None => self.notice = Some("No such task.".to_string()),
            },
            Command::Help => self.show_help = !self.show_help,
            Command::Quit => self.quit = true,
            Command::Unknown(name) => self.notice = Some(format!("Unknown command /{name}. Try /help")),
        }
        let n = self.rows().len();
        self.selected = self.selected.min(n.saturating_sub(1));
    }

    fn draw(&self, f: &mut ratatui::Frame) {
        let now = Utc::now();
        let app = self.session.app();
        let celebrating = app.is_celebrating(now);
        let modal = app.active_modal();
        let scheduling = app.scheduling_task();

        let mut constraints = vec![Constraint::Length(3), Constraint::Min(5)];
        if celebrating || modal.is_some() || scheduling.is_some() {
            constraints.push(Constraint::Length(5));
        }
        constraints.push(Constraint::Length(3));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(f.area());

        // stats header
        let stats = app.stats();
        let header = Paragraph::new(Line::from(vec![
            Span::styled("Nudge", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw("   "),
            Span::styled(format!("Level {}", stats.level), Style::default().fg(Color::Cyan)),
            Span::raw(format!("   XP {}/{}", stats.xp, nudge_core::stats::XP_PER_LEVEL)),
            Span::styled(format!("   Streak {}", stats.streak), Style::default().fg(Color::Magenta)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(header, chunks[0]);

        // task list
        let mut lines: Vec<Line> = Vec::new();
        if self.show_help {
            for l in [
                "Type a task and press Enter, e.g. \"call mom in 30 minutes\".",
                "Up/Down select  Ctrl-D delete  Ctrl-B break down  Ctrl-P prioritize  Esc quit",
                "Commands: /voice /prioritize /breakdown [id] /delete [id] /help /quit",
                "",
            ] {
                lines.push(Line::from(Span::styled(l, Style::default().fg(Color::Gray))));
            }
        }
        let mut row = 0usize;
        for (category, tasks) in app.store().grouped_by_category() {
            lines.push(Line::from(Span::styled(
                category,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )));
            for t in tasks {
                let selected = row == self.selected;
                row += 1;
                let marker = if selected { "> " } else { "  " };
                let mut spans = vec![
                    Span::raw(marker),
                    Span::styled(
                        t.id.chars().take(6).collect::<String>(),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        t.title.clone(),
                        if selected {
                            Style::default().add_modifier(Modifier::BOLD)
                        } else {
                            Style::default()
                        },
                    ),
                    Span::styled(format!("  ({})", describe(t, now, self.timezone)), Style::default().fg(Color::Gray)),
                ];
                if let Some(p) = t.priority {
                    spans.push(Span::styled(format!("  [{p:?}]"), Style::default().fg(Color::Yellow)));
                }
                if t.image_url.is_some() {
                    spans.push(Span::raw("  🖼"));
                } else if t.is_image_loading {
                    spans.push(Span::styled("  …", Style::default().fg(Color::DarkGray)));
                }
                lines.push(Line::from(spans));
            }
        }
        if row == 0 {
            lines.push(Line::from(Span::styled(
                "No tasks yet. What do you want to get done?",
                Style::default().fg(Color::Gray),
            )));
        }
        let list = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("tasks"))
            .wrap(Wrap { trim: false });
        f.render_widget(list, chunks[1]);

        // banner / modal / scheduling prompt
        let mut next = 2;
        if celebrating || modal.is_some() || scheduling.is_some() {
            let panel = if celebrating {
                let msg = match &self.last_reward {
                    Some(r) if r.leveled_up => format!("🎉 +{} XP  LEVEL UP! You're level {}", r.xp_gained, r.level),
                    Some(r) => format!("🎉 +{} XP  streak {}", r.xp_gained, r.streak),
                    None => "🎉 Nice work!".to_string(),
                };
                Paragraph::new(Text::from(vec![Line::from(Span::styled(
                    msg,
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ))]))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("done!"))
            } else if let Some((m, task)) = modal {
                let (title, question, keys) = modal_text(m.kind, task);
                Paragraph::new(Text::from(vec![
                    Line::from(Span::styled(question, Style::default().add_modifier(Modifier::BOLD))),
                    Line::raw(""),
                    Line::from(Span::styled(keys, Style::default().fg(Color::Gray))),
                ]))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(title)
                        .border_style(Style::default().fg(Color::Yellow)),
                )
                .wrap(Wrap { trim: true })
            } else {
                let task_title = scheduling.map(|t| t.title.as_str()).unwrap_or_default();
                let picks = self
                    .quick_picks
                    .iter()
                    .enumerate()
                    .take(9)
                    .map(|(i, m)| format!("{}={}", i + 1, short_duration(m * 60_000)))
                    .collect::<Vec<_>>()
                    .join("  ");
                let keys = if self.custom_time {
                    format!("type YYYY-MM-DD HH:MM ({}) + Enter  Esc=back", self.timezone.name())
                } else {
                    format!("{picks}  c=custom time  n=no reminder")
                };
                Paragraph::new(Text::from(vec![
                    Line::from(Span::styled(
                        format!("When should I remind you about {task_title}?"),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::raw(""),
                    Line::from(Span::styled(keys, Style::default().fg(Color::Gray))),
                ]))
                .block(Block::default().borders(Borders::ALL).title("schedule"))
                .wrap(Wrap { trim: true })
            };
            f.render_widget(panel, chunks[2]);
            next = 3;
        }

        let input_title = if modal.is_some_and(|(m, _)| m.kind == ModalKind::Blocked) {
            "what would help?"
        } else if self.custom_time && scheduling.is_some() {
            "remind me at"
        } else {
            "new task"
        };
        let input_widget = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title(input_title))
            .style(Style::default().fg(Color::White));
        f.render_widget(input_widget, chunks[next]);

        let footer = Paragraph::new(Span::styled(
            self.notice.clone().unwrap_or_else(|| "? for help".to_string()),
            Style::default().fg(Color::Gray),
        ));
        f.render_widget(footer, chunks[next + 1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};
    use nudge_core::time::no_reminder;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 15, 0, 0).unwrap()
    }

    #[test]
    fn plain_text_adds_and_slashes_are_commands() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("call mom"), Some(Command::Add("call mom".into())));
        assert_eq!(parse_command("/voice"), Some(Command::Voice));
        assert_eq!(parse_command("/breakdown ab12"), Some(Command::Breakdown(Some("ab12".into()))));
        assert_eq!(parse_command("/delete"), Some(Command::Delete(None)));
        assert_eq!(parse_command("/dance"), Some(Command::Unknown("dance".into())));
    }

    #[test]
    fn describes_each_state() {
        let tz = chrono_tz::America::Chicago;
        let t = Task::new("a", "Call mom", now()).parsing(false);
        assert_eq!(describe(&t, now(), tz), "no reminder");
        assert_eq!(t.scheduled_time, no_reminder(now()));

        let t = t.scheduled_at(now() + ChronoDuration::minutes(5));
        assert_eq!(describe(&t, now(), tz), "in 5m");

        // 15:00 UTC + 3h = 18:00 UTC = 12:00 in Chicago (CST)
        let later = t.clone().scheduled_at(now() + ChronoDuration::hours(3));
        assert_eq!(describe(&later, now(), tz), "Sun 12:00");

        let c = t
            .clone()
            .with_status(TaskStatus::Countdown)
            .scheduled_at(now() + ChronoDuration::seconds(15));
        assert_eq!(describe(&c, now(), tz), "starting in 15s");

        let p = Task::new("b", "x", now()).parsing(true);
        assert_eq!(describe(&p, now(), tz), "understanding…");
    }

    #[test]
    fn short_durations_round_up() {
        assert_eq!(short_duration(14_001), "15s");
        assert_eq!(short_duration(5 * 60_000), "5m");
        assert_eq!(short_duration(120 * 60_000), "2h00m");
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(tui: &mut Tui, text: &str) {
        for c in text.chars() {
            tui.on_key(key(KeyCode::Char(c)));
        }
    }

    fn open_tui(dir: &std::path::Path, tasks: &[Task]) -> (Tui, tokio::sync::mpsc::UnboundedReceiver<Effect>) {
        use nudge_core::SnapshotStore;

        let mut snaps = FileSnapshots::open(dir.join("state")).unwrap();
        if !tasks.is_empty() {
            snaps.save("tasks", &serde_json::to_string(tasks).unwrap()).unwrap();
        }
        let (session, _) = Session::open(snaps);
        let (work_tx, work_rx) = tokio::sync::mpsc::unbounded_channel();
        let (_done_tx, done_rx) = std::sync::mpsc::channel();
        let tui = Tui::new(
            session,
            chrono_tz::America::Chicago,
            vec![5, 15, 30],
            Duration::from_secs(1),
            work_tx,
            done_rx,
        );
        (tui, work_rx)
    }

    #[test]
    fn help_prompt_starts_empty_and_draft_comes_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocked = Task::new("b1", "Fold laundry", now()).with_status(TaskStatus::Blocked);
        let (mut tui, mut work) = open_tui(dir.path(), &[blocked]);

        type_text(&mut tui, "buy milk");
        tui.dispatch(Event::Tick);
        assert!(matches!(tui.focus(), Focus::Modal(Modal { kind: ModalKind::Blocked, .. })));
        assert_eq!(tui.input, "");

        type_text(&mut tui, "too tired");
        tui.on_key(key(KeyCode::Enter));
        assert_eq!(tui.focus(), Focus::Main);
        assert_eq!(tui.input, "buy milk");

        let Ok(Effect::Parse { text, .. }) = work.try_recv() else {
            panic!("expected the helper task to be parsed");
        };
        assert_eq!(text, "too tired");
        assert_eq!(tui.session.app().store().list()[0].title, "too tired");
    }

    #[test]
    fn time_prompt_does_not_inherit_the_main_line() {
        let dir = tempfile::tempdir().unwrap();
        let (mut tui, _work) = open_tui(dir.path(), &[]);

        tui.dispatch(Event::Submit { text: "wash dishes".into() });
        let task_id = tui.session.app().store().list()[0].id.clone();
        type_text(&mut tui, "half a th");
        tui.dispatch(Event::Enriched(nudge_core::Enrichment::Parsed {
            task_id: task_id.clone(),
            parsed: nudge_core::ParsedTask::fallback("wash dishes"),
        }));
        assert_eq!(tui.focus(), Focus::Schedule(task_id));
        assert_eq!(tui.input, "");

        tui.on_key(key(KeyCode::Char('c')));
        type_text(&mut tui, "2026-03");
        tui.on_key(key(KeyCode::Char('n')));
        // 'n' is text while typing a custom time
        assert_eq!(tui.input, "2026-03n");
        tui.on_key(key(KeyCode::Esc));
        tui.on_key(key(KeyCode::Char('n')));
        assert_eq!(tui.focus(), Focus::Main);
        assert_eq!(tui.input, "half a th");
        assert!(!tui.custom_time);
    }
}
