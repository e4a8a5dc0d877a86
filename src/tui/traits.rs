//! Shared screen contract for the dashboard

use anyhow::Result;
use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};

/// Actions a screen hands back to the app loop
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenAction {
    SetStatus(String),
    SetSuccess(String),
    SetWarning(String),
    SetError(String),
    None,
}

/// Core trait for all dashboard screens
pub trait Screen {
    fn draw(&mut self, f: &mut Frame, area: Rect);

    async fn handle_key_event(&mut self, key: KeyEvent) -> Result<ScreenAction>;

    async fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<ScreenAction>;

    /// True while the screen wants every key, e.g. during inline editing.
    /// Global shortcuts are suppressed then.
    fn captures_input(&self) -> bool {
        false
    }

    /// Reload data from the store
    async fn refresh(&mut self) -> Result<()> {
        Ok(())
    }

    /// Screen-specific lines for the help popup
    fn help_text(&self) -> &'static str;
}
