//! Coworker CLI — a full-screen TUI for rehearsing conversations with
//! executive personas, grounded in a Qdrant knowledge base and answered
//! by Gemini.
//!
//! This binary loads configuration, starts file logging, sets up the
//! terminal, delegates to [`app::App`] for all application logic, and tears
//! the terminal down on exit.

mod app;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use coworker::config::Config;
use coworker::logging::init_logging;
use crossterm::ExecutableCommand;
use crossterm::event;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::app::App;

// ── Entry point ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("load configuration")?;
    // Non-fatal: the TUI still runs without a log file.
    let log_file = init_logging(&config.logging).ok();
    tracing::info!(persona = %config.persona_id, "coworker starting");

    let mut app = App::new(config, log_file)?;
    let mut terminal = setup_terminal()?;

    let run_result = run_app(&mut terminal, &mut app);

    restore_terminal()?;
    tracing::info!("coworker exiting");
    run_result
}

// ── Terminal lifecycle ───────────────────────────────────────────────

/// Enable raw mode, switch to the alternate screen, and create the backend.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(DisableMouseCapture)?;
    stdout.execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Main draw → poll → handle loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_tasks();
        terminal.draw(|frame| app.draw(frame))?;

        if app.should_quit() {
            break;
        }

        if event::poll(Duration::from_millis(50))? {
            let ev = event::read()?;
            app.handle_event(ev)?;
        }
    }

    Ok(())
}
