//! Headless mode runner - main event loop without TUI
//!
//! Reads commands from stdin on a plain thread, feeds them to the engine as
//! messages, and emits every engine event as NDJSON.

use std::path::Path;

use tokio::sync::mpsc;

use apidemo_app::config::Settings;
use apidemo_app::{Clickable, Controls, Engine, Message, Selectable};
use apidemo_core::prelude::*;

use super::HeadlessEvent;

/// What a line of stdin asks for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Forward to the engine
    Send(Message),
    /// Forward to the engine, then stop reading
    SendAndStop(Message),
    Ignore,
    Unknown(String),
}

/// Run in headless mode - output JSON events instead of a TUI
pub async fn run_headless(project_path: &Path, settings: Settings) -> Result<()> {
    info!("Starting headless host");
    info!("Project: {}", project_path.display());

    let controls = Controls::new(settings.worker.limit_choices.clone());
    let mut engine = Engine::with_settings(project_path.to_path_buf(), settings);

    // Spawn headless-specific stdin reader
    let stdin_tx = engine.msg_sender();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx, controls);
    });

    let result = match engine.start() {
        Ok(()) => {
            emit_engine_events(&mut engine);
            headless_event_loop(&mut engine).await
        }
        Err(e) => {
            HeadlessEvent::error(e.to_string(), true).emit();
            Err(e)
        }
    };

    // Shutdown
    engine.shutdown().await;
    emit_engine_events(&mut engine);

    info!("Headless host exiting");
    result
}

/// Main headless event loop
async fn headless_event_loop(engine: &mut Engine) -> Result<()> {
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                emit_engine_events(engine);
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

fn emit_engine_events(engine: &mut Engine) {
    for event in engine.drain_events() {
        HeadlessEvent::from(event).emit();
    }
}

fn parse_command(line: &str, controls: &Controls) -> Command {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else {
        return Command::Ignore;
    };

    match word {
        "r" | "restart" => Command::Send(controls.restart.click()),
        "o" | "rotate" => Command::Send(controls.rotate.click()),
        "n" | "notify" => Command::Send(controls.notify_start.click()),
        "s" | "stop-notify" => Command::Send(controls.notify_stop.click()),
        "status" => Command::Send(controls.status.click()),
        "f" | "finish" => Command::SendAndStop(controls.finish.click()),
        "q" | "quit" => Command::SendAndStop(Message::Quit),
        "l" | "limit" => {
            let selected = parts
                .next()
                .and_then(|index| index.parse::<usize>().ok())
                .and_then(|index| controls.limit.select(index));
            match selected {
                Some(msg) => Command::Send(msg),
                None => Command::Unknown(format!(
                    "{} (expected an index below {}, choices {:?})",
                    line.trim(),
                    controls.limit.len(),
                    controls.limit.items()
                )),
            }
        }
        _ => Command::Unknown(line.trim().to_string()),
    }
}

/// Read commands from stdin and send them to the message channel (blocking)
fn spawn_stdin_reader_blocking(msg_tx: mpsc::Sender<Message>, controls: Controls) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        let (msg, stop) = match parse_command(&line, &controls) {
            Command::Send(msg) => (msg, false),
            Command::SendAndStop(msg) => (msg, true),
            Command::Ignore => continue,
            Command::Unknown(input) => {
                warn!("Unknown stdin command: {}", input);
                HeadlessEvent::error(format!("Unknown command: {}", input), false).emit();
                continue;
            }
        };

        info!("Stdin: {:?}", msg);
        if msg_tx.blocking_send(msg).is_err() {
            let err = Error::channel_send("engine stopped accepting commands");
            warn!("{}", err);
            return;
        }
        if stop {
            info!("Stdin reader exiting");
            return;
        }
    }

    // EOF ends the session like an explicit quit
    info!("Stdin closed, requesting quit");
    let _ = msg_tx.blocking_send(Message::Quit);
}
