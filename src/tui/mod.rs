//! Terminal dashboard
//!
//! Four screens built on the shared data table: the editable application
//! tracker, published postings, recruitment announcements and the
//! enterprise directory.

pub mod app;
pub mod components;
pub mod screens;
pub mod traits;
pub mod ui;

use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

pub use app::{App, Screen};

use crate::config::Config;

/// Set up the terminal, run the dashboard and restore the terminal even
/// when the app fails
pub async fn run_tui(config: &Config) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app::run_app(&mut terminal, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("Dashboard exited successfully"),
        Err(e) => error!("Dashboard encountered an error: {:#}", e),
    }
    result
}
