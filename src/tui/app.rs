//! Main dashboard state and event loop

use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{debug, error, info};

use super::components::StatusDisplay;
use super::screens::{RecordKind, RecordsScreen, TrackerScreen};
use super::traits::{Screen as _, ScreenAction};
use super::ui::{centered_rect, Styles};
use crate::config::Config;
use crate::storage::{Storage, TrackerStore};

/// Dashboard screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Tracker,
    Postings,
    Announcements,
    Directory,
}

impl Screen {
    pub const ALL: [Screen; 4] = [Screen::Tracker, Screen::Postings, Screen::Announcements, Screen::Directory];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Tracker => "我的进展",
            Screen::Postings => "网申表格",
            Screen::Announcements => "招聘公告",
            Screen::Directory => "央国企名录",
        }
    }

    pub fn next(&self) -> Screen {
        let pos = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }

    /// Screen bound to a digit key, `1` being the first
    pub fn from_digit(c: char) -> Option<Screen> {
        let index = c.to_digit(10)?.checked_sub(1)?;
        Self::ALL.get(index as usize).copied()
    }
}

/// Main dashboard state
pub struct App {
    pub current_screen: Screen,
    pub tracker: TrackerScreen,
    pub postings: RecordsScreen,
    pub announcements: RecordsScreen,
    pub directory: RecordsScreen,
    pub status: StatusDisplay,
    pub should_quit: bool,
    pub show_help_popup: bool,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let storage = Arc::new(
            Storage::new(config.database_path_str())
                .await
                .with_context(|| format!("Failed to open database {}", config.database_path.display()))?,
        );
        let tracker_store: Arc<dyn TrackerStore> = storage.clone();
        let table = &config.table;

        Ok(Self {
            current_screen: Screen::Tracker,
            tracker: TrackerScreen::new(tracker_store, table)?,
            postings: RecordsScreen::new(storage.clone(), RecordKind::Postings, table)?,
            announcements: RecordsScreen::new(storage.clone(), RecordKind::Announcements, table)?,
            directory: RecordsScreen::new(storage, RecordKind::Enterprises, table)?,
            status: StatusDisplay::new(),
            should_quit: false,
            show_help_popup: false,
        })
    }

    /// Run the main application loop
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        self.navigate_to_screen(Screen::Tracker).await;

        loop {
            terminal.draw(|f| self.draw(f))?;

            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key).await,
                Event::Mouse(mouse) => self.handle_mouse_event(mouse).await,
                _ => {}
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn captures_input(&self) -> bool {
        match self.current_screen {
            Screen::Tracker => self.tracker.captures_input(),
            Screen::Postings => self.postings.captures_input(),
            Screen::Announcements => self.announcements.captures_input(),
            Screen::Directory => self.directory.captures_input(),
        }
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help_popup {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help_popup = false;
            }
            return;
        }

        if !self.captures_input() {
            match key.code {
                KeyCode::F(1) | KeyCode::Char('?') => {
                    self.show_help_popup = true;
                    return;
                }
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Tab => {
                    self.navigate_to_screen(self.current_screen.next()).await;
                    return;
                }
                KeyCode::Char(c) => {
                    if let Some(screen) = Screen::from_digit(c) {
                        self.navigate_to_screen(screen).await;
                        return;
                    }
                }
                _ => {}
            }
        }

        let result = match self.current_screen {
            Screen::Tracker => self.tracker.handle_key_event(key).await,
            Screen::Postings => self.postings.handle_key_event(key).await,
            Screen::Announcements => self.announcements.handle_key_event(key).await,
            Screen::Directory => self.directory.handle_key_event(key).await,
        };
        self.apply_result(result).await;
    }

    pub async fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.show_help_popup {
            return;
        }
        let result = match self.current_screen {
            Screen::Tracker => self.tracker.handle_mouse_event(mouse).await,
            Screen::Postings => self.postings.handle_mouse_event(mouse).await,
            Screen::Announcements => self.announcements.handle_mouse_event(mouse).await,
            Screen::Directory => self.directory.handle_mouse_event(mouse).await,
        };
        self.apply_result(result).await;
    }

    async fn apply_result(&mut self, result: Result<ScreenAction>) {
        match result {
            Ok(action) => self.apply_action(action).await,
            Err(e) => {
                error!("{:#}", e);
                self.status.set_error(format!("{:#}", e));
            }
        }
    }

    async fn apply_action(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::SetStatus(message) => self.status.set_info(message),
            ScreenAction::SetSuccess(message) => self.status.set_success(message),
            ScreenAction::SetWarning(message) => self.status.set_warning(message),
            ScreenAction::SetError(message) => self.status.set_error(message),
            ScreenAction::None => {}
        }
    }

    /// Switch screens and reload the target's data
    pub async fn navigate_to_screen(&mut self, screen: Screen) {
        debug!("Navigating to {:?}", screen);
        self.current_screen = screen;
        let result = match screen {
            Screen::Tracker => self.tracker.refresh().await,
            Screen::Postings => self.postings.refresh().await,
            Screen::Announcements => self.announcements.refresh().await,
            Screen::Directory => self.directory.refresh().await,
        };
        if let Err(e) = result {
            error!("Failed to refresh {}: {:#}", screen.title(), e);
            self.status.set_error(format!("加载失败: {:#}", e));
        }
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let size = f.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_tabs(f, chunks[0]);

        match self.current_screen {
            Screen::Tracker => self.tracker.draw(f, chunks[1]),
            Screen::Postings => self.postings.draw(f, chunks[1]),
            Screen::Announcements => self.announcements.draw(f, chunks[1]),
            Screen::Directory => self.directory.draw(f, chunks[1]),
        }

        self.status.render(f, chunks[2], "1-4/Tab: Switch | ?: Help | q: Quit");

        if self.show_help_popup {
            self.draw_help_popup(f, size);
        }
    }

    fn draw_tabs(&self, f: &mut Frame, area: Rect) {
        let spans: Vec<Span> = Screen::ALL
            .iter()
            .enumerate()
            .map(|(i, screen)| {
                let style = if *screen == self.current_screen {
                    Styles::selected()
                } else {
                    Styles::inactive()
                };
                Span::styled(format!(" {} {} ", i + 1, screen.title()), style)
            })
            .collect();
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_help_popup(&self, f: &mut Frame, area: Rect) {
        let popup_area = centered_rect(70, 70, area);
        f.render_widget(Clear, popup_area);

        let help = format!("{}\n\n{}", self.context_help(), GLOBAL_HELP);
        let popup = Paragraph::new(help).block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Styles::active_border()),
        );
        f.render_widget(popup, popup_area);
    }

    fn context_help(&self) -> &'static str {
        match self.current_screen {
            Screen::Tracker => self.tracker.help_text(),
            Screen::Postings => self.postings.help_text(),
            Screen::Announcements => self.announcements.help_text(),
            Screen::Directory => self.directory.help_text(),
        }
    }
}

const GLOBAL_HELP: &str = "Global:\n\
    1-4 / Tab - Switch screen\n\
    F1 / ? - Toggle this help\n\
    q - Quit";

/// Open the dashboard on an already prepared terminal
pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, config: &Config) -> Result<()> {
    let mut app = App::new(config).await?;
    info!("Starting main application loop");
    app.run(terminal).await?;
    info!("Application loop completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crossterm::event::KeyModifiers;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_path: dir.path().join("app.db"),
            log_file: dir.path().join("app.log"),
            table: TableConfig::default(),
        };
        let app = App::new(&config).await.unwrap();
        (dir, app)
    }

    #[test]
    fn test_screen_cycle_and_digits() {
        assert_eq!(Screen::Tracker.next(), Screen::Postings);
        assert_eq!(Screen::Directory.next(), Screen::Tracker);
        assert_eq!(Screen::from_digit('3'), Some(Screen::Announcements));
        assert_eq!(Screen::from_digit('0'), None);
        assert_eq!(Screen::from_digit('5'), None);
    }

    #[tokio::test]
    async fn test_global_keys() {
        let (_dir, mut app) = app().await;
        app.handle_key_event(key(KeyCode::Char('2'))).await;
        assert_eq!(app.current_screen, Screen::Postings);
        app.handle_key_event(key(KeyCode::Tab)).await;
        assert_eq!(app.current_screen, Screen::Announcements);

        app.handle_key_event(key(KeyCode::Char('?'))).await;
        assert!(app.show_help_popup);
        app.handle_key_event(key(KeyCode::Esc)).await;
        assert!(!app.show_help_popup);

        app.handle_key_event(key(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_filter_bar_swallows_global_keys() {
        let (_dir, mut app) = app().await;
        app.navigate_to_screen(Screen::Tracker).await;
        app.handle_key_event(key(KeyCode::Char('/'))).await;
        app.handle_key_event(key(KeyCode::Char('q'))).await;
        app.handle_key_event(key(KeyCode::Char('2'))).await;
        assert!(!app.should_quit);
        assert_eq!(app.current_screen, Screen::Tracker);

        app.handle_key_event(key(KeyCode::Esc)).await;
        app.handle_key_event(key(KeyCode::Char('q'))).await;
        assert!(app.should_quit);
    }
}
