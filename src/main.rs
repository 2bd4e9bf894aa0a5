use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tokio::signal;
use tokio::sync::mpsc;

use chatpane::config::Config;
use chatpane::display::{DisplaySurface, PanelGeometry, TerminalSurface};
use chatpane::logging::init_tracing;
use chatpane::shutdown::ShutdownHandle;
use chatpane::source::VecSource;
use chatpane::{Session, SessionError, SessionOutcome};

const PROMPT: &str = "Enter your questions:->";

#[derive(Parser, Debug)]
#[command(name = "chatpane")]
#[command(about = "Streams chat answers onto a small text panel", long_about = None)]
#[command(version)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ask a single question and exit
    #[arg(long, value_name = "TEXT", conflicts_with = "replay")]
    prompt: Option<String>,

    /// Render a recorded SSE body instead of calling the API
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    let surface = TerminalSurface::new(PanelGeometry::from(&config.display))
        .context("opening terminal panel")?;
    let prompt_row = surface.prompt_row();
    let mut session = Session::new(config, surface);
    tokio::spawn(forward_signals(session.stop_handle()));

    if let Some(path) = &args.replay {
        let body = std::fs::read(path)
            .with_context(|| format!("reading replay file '{}'", path.display()))?;
        finish(session.run_source(VecSource::from_bytes(body)).await)?;
        return Ok(());
    }

    if let Some(prompt) = &args.prompt {
        finish(session.start_session(prompt).await)?;
        return Ok(());
    }

    prompt_loop(&mut session, prompt_row).await
}

/// Ask questions read from stdin until EOF or a stop signal.
async fn prompt_loop<S: DisplaySurface>(session: &mut Session<S>, prompt_row: u16) -> Result<()> {
    let stop = session.stop_handle();
    let mut lines = stdin_lines();

    loop {
        show_prompt(prompt_row)?;
        let line = tokio::select! {
            biased;
            _ = stop.wait() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            break;
        };

        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        session.clear_display();
        if let Err(err) = session.start_session(question).await {
            tracing::warn!(error = %err, "question failed, waiting for the next one");
        }
        if session.is_stopped() {
            break;
        }
    }

    session.clear_display();
    Ok(())
}

fn finish(result: Result<SessionOutcome, SessionError>) -> Result<()> {
    let outcome = result?;
    tracing::info!(
        ended_by = ?outcome.ended_by,
        chars = outcome.chars_enqueued,
        evicted = outcome.chars_evicted,
        "done"
    );
    Ok(())
}

fn show_prompt(row: u16) -> io::Result<()> {
    execute!(
        io::stdout(),
        MoveTo(0, row),
        Clear(ClearType::FromCursorDown),
        Print(PROMPT)
    )
}

/// Read stdin lines on a plain thread so a pending read never holds up
/// runtime shutdown.
fn stdin_lines() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn forward_signals(stop: ShutdownHandle) {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(_) => {
                let _ = signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
    }

    tracing::info!("stop requested");
    stop.signal();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_and_replay_conflict() {
        let parsed = Args::try_parse_from(["chatpane", "--prompt", "hi", "--replay", "x.sse"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn no_arguments_means_interactive() {
        let args = Args::try_parse_from(["chatpane"]).unwrap();
        assert!(args.prompt.is_none());
        assert!(args.replay.is_none());
        assert!(args.config.is_none());
    }
}
