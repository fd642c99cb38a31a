//! Foreground timer session.
//!
//! Reads one command per line from stdin and prints every event as a JSON
//! line on stdout. The session ends on `quit` or end of input.

use clap::Args;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use vitempo_core::{
    Event, Muted, NotificationPrefs, Notifier, Session, SessionRunner, Silent, TechniqueId,
    TerminalBell,
};

use super::{CliResult, Context};

#[derive(Args)]
pub struct RunArgs {
    /// Technique to run (defaults to the active one)
    #[arg(long)]
    technique: Option<TechniqueId>,
    /// Start with notifications muted
    #[arg(long)]
    mute: bool,
}

enum Command {
    Start,
    Pause,
    Resume,
    Toggle,
    Stop,
    Reset,
    Skip,
    Status,
    Mute(bool),
    Current(String),
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Err("empty command".into());
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "toggle" => Command::Toggle,
        "stop" => Command::Stop,
        "reset" => Command::Reset,
        "skip" => Command::Skip,
        "status" => Command::Status,
        "mute" => Command::Mute(true),
        "unmute" => Command::Mute(false),
        "current" => match words.next() {
            Some(id) => Command::Current(id.to_string()),
            None => return Err("usage: current <task-id>".into()),
        },
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(command)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn run(args: RunArgs) -> CliResult {
    let ctx = Context::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session_loop(ctx, args))
}

async fn session_loop(ctx: Context, args: RunArgs) -> CliResult {
    let technique = ctx.technique(args.technique)?;
    let technique_id = technique.id;
    let settings = ctx.settings(&technique);
    let tasks = ctx.tasks(technique_id);

    let prefs = NotificationPrefs::new(args.mute || ctx.config.notifications.muted);
    let notifier: Arc<dyn Notifier> =
        if ctx.config.notifications.enabled && ctx.config.notifications.bell {
            Arc::new(Muted::new(TerminalBell, prefs.clone()))
        } else {
            Arc::new(Silent)
        };

    let session = Session::new(technique, settings, tasks, notifier);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut runner = SessionRunner::new(session, tx)
        .with_tick_interval(Duration::from_millis(ctx.config.timer.tick_interval_ms));
    let shared = runner.session();

    let persist_tasks = |tasks: &vitempo_core::TaskList| {
        if let Err(e) = ctx.save_tasks(technique_id, tasks) {
            warn!(error = %e, "failed to save task list");
        }
    };

    info!(technique = %technique_id, "session started");
    print_json(&Event::StateSnapshot(runner.snapshot().await))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                print_json(&event)?;
                if matches!(event, Event::TaskProgressed { .. }) {
                    persist_tasks(shared.lock().await.tasks());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        eprintln!("error: {message}");
                        continue;
                    }
                };
                match command {
                    Command::Start => { runner.start().await; }
                    Command::Pause => { runner.pause().await; }
                    Command::Resume => { runner.resume().await; }
                    Command::Toggle => { runner.toggle().await; }
                    Command::Stop => { runner.stop().await; }
                    Command::Reset => { runner.reset().await; }
                    Command::Skip => { runner.skip().await; }
                    Command::Status => {
                        print_json(&Event::StateSnapshot(runner.snapshot().await))?;
                    }
                    Command::Mute(muted) => {
                        prefs.set_muted(muted);
                        print_json(&json!({ "type": "notifications", "muted": muted }))?;
                    }
                    Command::Current(id) => {
                        let mut session = shared.lock().await;
                        match session.assign_current(&id) {
                            Ok(changed) => {
                                if changed {
                                    persist_tasks(session.tasks());
                                }
                                let current = session.tasks().effective_current().map(|t| t.id.clone());
                                print_json(&json!({ "type": "current_task", "task_id": current }))?;
                            }
                            Err(e) => eprintln!("error: {e}"),
                        }
                    }
                    Command::Quit => break,
                }
            }
        }
    }

    while let Ok(event) = rx.try_recv() {
        print_json(&event)?;
    }
    persist_tasks(shared.lock().await.tasks());
    drop(runner);
    info!("session ended");
    Ok(())
}
