use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use nudge_ai::AiClient;
use nudge_core::time::has_reminder;
use nudge_core::{Event, ScheduleChoice, Session, Task};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod config;
mod state;
mod tui;
mod voice;
mod worker;

use config::Config;
use state::FileSnapshots;
use voice::Voice;

#[derive(Parser, Debug)]
#[command(
    name = "nudge",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("NUDGE_BUILD_SHA"), ")"),
    about = "Task reminders that check in until it's done"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive reminder screen (default)
    Run,

    /// Capture a task from free text, e.g. "call mom in 30 minutes"
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Set or clear a task's reminder
    Schedule(ScheduleArgs),

    /// List tasks grouped by category
    List,

    /// Show xp, level and streak
    Stats,

    /// Delete a task
    Delete {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Split a task into small first steps
    Breakdown {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Categorize and rank all tasks
    Prioritize,

    /// Speak a line with the configured voice
    Say {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Manage ~/.nudge/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store credentials for the AI service
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Task id (a unique prefix is enough)
    id: String,

    /// Minutes from now
    #[arg(long = "in", value_name = "MINUTES", conflicts_with_all = ["at", "none"])]
    in_minutes: Option<i64>,

    /// Local time "YYYY-MM-DD HH:MM" in schedule.timezone
    #[arg(long, conflicts_with = "none")]
    at: Option<String>,

    /// No reminder
    #[arg(long)]
    none: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an OpenAI API key into ~/.nudge/auth.json
    PasteOpenaiApiKey,
}

fn init_logging(interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env("NUDGE_LOG").unwrap_or_else(|_| {
        if interactive { "nudge=info".into() } else { "nudge=warn".into() }
    });

    // The TUI owns the terminal, so interactive runs log to a file.
    if interactive {
        let path = state::log_path()?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);
    init_logging(matches!(command, Command::Run))?;

    match command {
        Command::Run => run_interactive()?,
        Command::Add { text } => add(&text.join(" ")).await?,
        Command::Schedule(args) => schedule(args)?,
        Command::List => list()?,
        Command::Stats => {
            let (session, _) = Session::open(FileSnapshots::open_default()?);
            let s = session.app().stats();
            println!("Level {}  XP {}/{}  Streak {}", s.level, s.xp, nudge_core::stats::XP_PER_LEVEL, s.streak);
        }
        Command::Delete { id } => {
            let (mut session, _) = Session::open(FileSnapshots::open_default()?);
            let task = resolve(&session, &id)?;
            session.dispatch(Event::Delete { task_id: task.id.clone() }, Utc::now())?;
            println!("Deleted: {}", task.title);
        }
        Command::Breakdown { id } => breakdown(&id).await?,
        Command::Prioritize => prioritize().await?,
        Command::Say { text } => {
            let cfg = config::load_config()?;
            let ai = AiClient::new(cfg.ai_config()?);
            let voice = Voice::detect(&cfg.voice);
            let text = text.join(" ");
            let audio = ai.speak(&text).await;
            voice.say(&text, audio.as_deref()).await;
        }
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
        Command::Auth { command } => match command {
            AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
        },
    }

    Ok(())
}

struct Tools {
    cfg: Config,
    ai: AiClient,
    voice: Voice,
}

fn tools() -> Result<Tools> {
    let cfg = config::load_config()?;
    let ai = AiClient::new(cfg.ai_config()?);
    let voice = Voice::detect(&cfg.voice);
    Ok(Tools { cfg, ai, voice })
}

fn resolve(session: &Session<FileSnapshots>, id: &str) -> Result<Task> {
    match session.app().store().resolve_prefix(id) {
        Some(t) => Ok(t.clone()),
        None => bail!("no single task matches {id:?} (see: nudge list)"),
    }
}

fn run_interactive() -> Result<()> {
    let t = tools()?;
    let tz = t.cfg.timezone()?;
    let tick = std::time::Duration::from_millis(t.cfg.schedule.tick_ms.max(100));

    let (session, resume) = Session::open(FileSnapshots::open_default()?);
    tracing::info!(tasks = session.app().store().len(), resumed = resume.len(), "session opened");

    let (work_tx, work_rx) = tokio::sync::mpsc::unbounded_channel();
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    tokio::spawn(worker::run_worker(t.ai, t.voice, work_rx, done_tx));
    for effect in resume {
        work_tx.send(effect).context("start enrichment worker")?;
    }

    let ui = tui::Tui::new(session, tz, t.cfg.schedule.quick_picks.clone(), tick, work_tx, done_rx);
    tokio::task::block_in_place(|| ui.run())
}

async fn add(text: &str) -> Result<()> {
    let t = tools()?;
    let (mut session, resume) = Session::open(FileSnapshots::open_default()?);
    worker::settle(&mut session, &t.ai, &t.voice, resume).await?;

    let effects = session.dispatch(Event::Submit { text: text.to_string() }, Utc::now())?;
    let id = match effects.first() {
        Some(nudge_core::Effect::Parse { task_id, .. }) => task_id.clone(),
        _ => bail!("nothing to add"),
    };
    worker::settle(&mut session, &t.ai, &t.voice, effects).await?;

    let Some(task) = session.app().store().get(&id) else {
        return Ok(());
    };
    println!("Added {}  {}", short_id(&task.id), task.title);
    if has_reminder(task.scheduled_time, Utc::now()) {
        let local = task.scheduled_time.with_timezone(&t.cfg.timezone()?);
        println!("Reminder at {}", local.format("%Y-%m-%d %H:%M %Z"));
    } else {
        println!(
            "No time found. Pick one: nudge schedule {} --in {}",
            short_id(&task.id),
            t.cfg.schedule.quick_picks.first().copied().unwrap_or(15)
        );
    }
    Ok(())
}

fn schedule(args: ScheduleArgs) -> Result<()> {
    let cfg = config::load_config()?;
    let choice = match (args.in_minutes, args.at, args.none) {
        (Some(m), _, _) => ScheduleChoice::InMinutes(m),
        (None, Some(local), _) => ScheduleChoice::At {
            local,
            timezone: cfg.schedule.timezone.clone(),
        },
        (None, None, true) => ScheduleChoice::NoReminder,
        (None, None, false) => bail!("pass one of --in <minutes>, --at \"YYYY-MM-DD HH:MM\" or --none"),
    };

    let (mut session, _) = Session::open(FileSnapshots::open_default()?);
    let task = resolve(&session, &args.id)?;
    session.dispatch(
        Event::Schedule {
            task_id: task.id.clone(),
            choice,
        },
        Utc::now(),
    )?;

    let Some(updated) = session.app().store().get(&task.id) else {
        return Ok(());
    };
    if has_reminder(updated.scheduled_time, Utc::now()) {
        let local = updated.scheduled_time.with_timezone(&cfg.timezone()?);
        println!("{}: reminder at {}", updated.title, local.format("%Y-%m-%d %H:%M %Z"));
    } else {
        println!("{}: no reminder", updated.title);
    }
    Ok(())
}

fn list() -> Result<()> {
    let cfg = config::load_config()?;
    let tz = cfg.timezone()?;
    let (session, _) = Session::open(FileSnapshots::open_default()?);
    let now = Utc::now();

    let store = session.app().store();
    if store.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for (category, tasks) in store.grouped_by_category() {
        println!("{category}");
        for t in tasks {
            let when = if has_reminder(t.scheduled_time, now) {
                t.scheduled_time.with_timezone(&tz).format("%Y-%m-%d %H:%M").to_string()
            } else {
                "no reminder".to_string()
            };
            let priority = t.priority.map(|p| format!(" [{p:?}]")).unwrap_or_default();
            println!(
                "  {}  {:<28} {:<26} {}{}",
                short_id(&t.id),
                t.status.label(),
                t.title,
                when,
                priority
            );
        }
    }
    Ok(())
}

async fn breakdown(id: &str) -> Result<()> {
    let t = tools()?;
    let (mut session, _) = Session::open(FileSnapshots::open_default()?);
    let task = resolve(&session, id)?;
    let before: HashSet<String> = session.app().store().list().iter().map(|t| t.id.clone()).collect();

    let effects = session.dispatch(Event::Breakdown { task_id: task.id.clone() }, Utc::now())?;
    if effects.is_empty() {
        bail!("only pending tasks can be broken down");
    }
    worker::settle(&mut session, &t.ai, &t.voice, effects).await?;

    if session.app().store().contains(&task.id) {
        println!("Couldn't break down {:?}; it stays as is.", task.title);
        return Ok(());
    }
    let steps: Vec<&Task> = session
        .app()
        .store()
        .list()
        .iter()
        .filter(|s| !before.contains(&s.id))
        .collect();
    println!("Split {:?} into {} steps:", task.title, steps.len());
    for s in steps {
        println!("  {}  {}", short_id(&s.id), s.title);
    }
    Ok(())
}

async fn prioritize() -> Result<()> {
    let t = tools()?;
    let (mut session, _) = Session::open(FileSnapshots::open_default()?);
    let effects = session.dispatch(Event::Prioritize, Utc::now())?;
    worker::settle(&mut session, &t.ai, &t.voice, effects).await?;
    drop(session);
    list()
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}
