use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tbbr::actor::coordinator::{self, Coordinator, CoordinatorHandle, Event, Record, ReplayOutput};
use tbbr::common::config::Settings;
use tbbr::common::log;
use tbbr::model::{Command, InboundMessage, Tab, TabId};
use tbbr::sys::clock::MonotonicClock;
use tbbr::sys::memory_host::MemoryHost;
use tbbr::sys::store::{LocalState, LocalStore};
use tracing::info;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Feed a recorded session to a fresh coordinator and print every call it
    /// makes, then its final state.
    Replay {
        recording: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Local state to start from instead of an empty one.
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// Run a script of steps against an in-memory window.
    Simulate {
        script: PathBuf,
        #[arg(long, default_value_t = 5)]
        tabs: u32,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write every handled event here for later replay.
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// List the command names key bindings can use.
    Commands,
    /// Print the effective settings.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    log::init(cli.verbose);

    match cli.command {
        Cmd::Replay { recording, config, state } => {
            let settings = load_settings(config.as_deref())?;
            let state = match state {
                Some(path) => LocalStore::new(path).load()?,
                None => LocalState::default(),
            };
            let snapshot = coordinator::replay(&recording, settings, state, print_output)
                .with_context(|| format!("replaying {}", recording.display()))?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Cmd::Simulate { script, tabs, config, record } => {
            let settings = load_settings(config.as_deref())?;
            let steps = std::fs::read_to_string(&script)
                .with_context(|| format!("reading {}", script.display()))?;
            let steps = parse_script(&steps)?;
            let record = match record {
                Some(path) => Record::new(&path)?,
                None => Record::disabled(),
            };
            tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?
                .block_on(simulate(settings, tabs, steps, record))?;
        }
        Cmd::Commands => {
            for name in Command::vocabulary() {
                println!("{name}");
            }
        }
        Cmd::Config { config } => print!("{}", load_settings(config.as_deref())?.to_toml()?),
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match path {
        Some(path) => path.to_owned(),
        None => Settings::default_path()?,
    };
    Ok(Settings::load_or_default(&path)?)
}

fn print_output(output: ReplayOutput) {
    match serde_json::to_string(&output) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("unprintable output {output:?}: {e}"),
    }
}

#[derive(Debug)]
enum Step {
    Event(Event),
    Activate(TabId),
    Wait(Duration),
}

/// One step per line: a command name, `activate N`, `mouse enter`,
/// `mouse leave`, `key K` or `wait SECONDS`. `#` starts a comment.
fn parse_script(script: &str) -> anyhow::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (number, line) in script.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let step = match line.split_whitespace().collect::<Vec<_>>().as_slice() {
            [] => continue,
            ["activate", id] => Step::Activate(TabId::new(id.parse()?)),
            ["mouse", "enter"] => Step::Event(Event::Message(InboundMessage::MouseEnter)),
            ["mouse", "leave"] => Step::Event(Event::Message(InboundMessage::MouseLeave)),
            ["key", key] => Step::Event(Event::Message(InboundMessage::PickKey {
                key: key.to_lowercase(),
                shift_key: key.chars().any(char::is_uppercase),
            })),
            ["wait", secs] => Step::Wait(Duration::try_from_secs_f64(secs.parse()?)?),
            [name] => Step::Event(Event::Command(Command::parse(name)?)),
            _ => bail!("line {}: cannot read `{line}`", number + 1),
        };
        steps.push(step);
    }
    Ok(steps)
}

async fn simulate(
    settings: Settings,
    tabs: u32,
    steps: Vec<Step>,
    record: Record,
) -> anyhow::Result<()> {
    let host = Arc::new(MemoryHost::new((1..=tabs).map(|id| Tab {
        id: TabId::new(id),
        url: Some(format!("https://site-{id}.test/")),
        title: format!("Site {id}"),
        ..Tab::default()
    })));
    let handle = Coordinator::spawn(
        settings,
        LocalState::default(),
        host.clone(),
        Arc::new(MonotonicClock::new()),
        record,
    );
    host.connect(handle.sender());

    for step in steps {
        info!(?step, "step");
        match step {
            Step::Event(event) => handle.send(event),
            Step::Activate(id) => host.activate(id),
            Step::Wait(duration) => tokio::time::sleep(duration).await,
        }
        settle(&handle).await?;
    }

    for tab in host.tabs() {
        let marker = if tab.active { "*" } else { " " };
        println!("{marker} {:>3} {}", tab.id.get(), tab.title);
    }
    Ok(())
}

/// Waits until the coordinator has handled everything sent so far.
async fn settle(handle: &CoordinatorHandle) -> anyhow::Result<()> {
    // host replies land back in the queue, so give them a few rounds
    for _ in 0..4 {
        tokio::task::yield_now().await;
        let queries = handle.clone();
        if tokio::task::spawn_blocking(move || queries.snapshot()).await?.is_none() {
            bail!("coordinator stopped");
        }
    }
    Ok(())
}
