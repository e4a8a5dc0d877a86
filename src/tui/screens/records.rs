//! Read-only record screens: postings, announcements and the directory

use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{layout::Rect, Frame};
use tracing::{info, warn};

use crate::columns::{announcement_columns, enterprise_columns, posting_columns, regulatory_unit_columns};
use crate::config::TableConfig;
use crate::models::{Announcement, JobPosting, NewApplication};
use crate::storage::{Storage, TrackerStore};
use crate::table::value::{check_unique_ids, to_rows};
use crate::table::{ColumnSet, Row, TableEvent};
use crate::tui::components::data_table::{DataTableState, TableInput};
use crate::tui::traits::{Screen, ScreenAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Postings,
    Announcements,
    Enterprises,
    RegulatoryUnits,
}

impl RecordKind {
    pub fn title(&self) -> &'static str {
        match self {
            RecordKind::Postings => "网申表格",
            RecordKind::Announcements => "招聘公告",
            RecordKind::Enterprises => "央国企名录",
            RecordKind::RegulatoryUnits => "监管单位",
        }
    }

    fn columns(&self, long_text_max: usize) -> Result<ColumnSet> {
        let columns = match self {
            RecordKind::Postings => posting_columns(long_text_max),
            RecordKind::Announcements => announcement_columns(long_text_max),
            RecordKind::Enterprises => enterprise_columns(long_text_max),
            RecordKind::RegulatoryUnits => regulatory_unit_columns(long_text_max),
        };
        columns.with_context(|| format!("Invalid columns for {}", self.title()))
    }

    fn is_directory(&self) -> bool {
        matches!(self, RecordKind::Enterprises | RecordKind::RegulatoryUnits)
    }
}

pub struct RecordsScreen {
    storage: Arc<Storage>,
    kind: RecordKind,
    config: TableConfig,
    postings: Vec<JobPosting>,
    announcements: Vec<Announcement>,
    rows: Vec<Row>,
    table: DataTableState,
}

impl RecordsScreen {
    pub fn new(storage: Arc<Storage>, kind: RecordKind, config: &TableConfig) -> Result<Self> {
        Ok(Self {
            storage,
            kind,
            config: config.clone(),
            postings: Vec::new(),
            announcements: Vec::new(),
            rows: Vec::new(),
            table: DataTableState::new(kind.columns(config.long_text_max)?, config),
        })
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    async fn reload(&mut self) -> Result<()> {
        let rows = match self.kind {
            RecordKind::Postings => {
                self.postings = self.storage.list_postings().await.context("Failed to load postings")?;
                to_rows(&self.postings)
            }
            RecordKind::Announcements => {
                self.announcements = self
                    .storage
                    .list_announcements()
                    .await
                    .context("Failed to load announcements")?;
                to_rows(&self.announcements)
            }
            RecordKind::Enterprises => to_rows(
                &self
                    .storage
                    .list_enterprises()
                    .await
                    .context("Failed to load enterprises")?,
            ),
            RecordKind::RegulatoryUnits => to_rows(
                &self
                    .storage
                    .list_regulatory_units()
                    .await
                    .context("Failed to load regulatory units")?,
            ),
        };
        if let Err(e) = check_unique_ids(&rows) {
            warn!("Inconsistent {} list: {}", self.kind.title(), e);
            return Err(e).with_context(|| format!("{} share an id", self.kind.title()));
        }
        self.rows = rows;
        self.table.reset_interaction();
        Ok(())
    }

    /// Switch the directory between enterprises and regulatory units
    async fn toggle_directory(&mut self) -> Result<ScreenAction> {
        self.kind = match self.kind {
            RecordKind::Enterprises => RecordKind::RegulatoryUnits,
            RecordKind::RegulatoryUnits => RecordKind::Enterprises,
            other => return Ok(ScreenAction::SetStatus(format!("{} 没有其他视图", other.title()))),
        };
        self.table = DataTableState::new(self.kind.columns(self.config.long_text_max)?, &self.config);
        self.reload().await?;
        Ok(ScreenAction::SetStatus(format!("已切换到{}", self.kind.title())))
    }

    /// Copy the focused posting or announcement into my applications
    async fn add_focused(&mut self) -> Result<ScreenAction> {
        let Some(id) = self.table.focused_row_id(&self.rows) else {
            return Ok(ScreenAction::None);
        };
        let new = match self.kind {
            RecordKind::Postings => self
                .postings
                .iter()
                .find(|p| p.id == id)
                .map(NewApplication::from_posting),
            RecordKind::Announcements => self
                .announcements
                .iter()
                .find(|a| a.id == id)
                .map(NewApplication::from_announcement),
            _ => None,
        };
        let Some(new) = new else {
            return Ok(ScreenAction::None);
        };

        match self.storage.add_application(&new).await {
            Ok(app) => {
                info!("Added {} from {}", app.company, self.kind.title());
                Ok(ScreenAction::SetSuccess(format!("已加入我的进展: {}", app.company)))
            }
            Err(e) => {
                warn!("Failed to add application from {}: {}", id, e);
                Ok(ScreenAction::SetError(format!("添加失败: {}", e)))
            }
        }
    }

    fn apply_table_input(&mut self, input: TableInput) -> ScreenAction {
        match input {
            TableInput::Notice(message) => ScreenAction::SetStatus(message),
            TableInput::Event(TableEvent::RowActivated { source_index, .. }) => {
                if let Some(row) = self.rows.get(source_index) {
                    let details = describe(self.table.columns(), row);
                    self.table.show_popup(self.kind.title(), &details);
                }
                ScreenAction::None
            }
            _ => ScreenAction::None,
        }
    }
}

/// One `header: value` line per column, with links and long text in full
fn describe(columns: &ColumnSet, row: &Row) -> String {
    columns
        .iter()
        .map(|column| {
            let content = column.render(row);
            let text = content.disclosure().unwrap_or(content.display_text()).replace('\n', " ");
            format!("{}: {}", column.header, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl Screen for RecordsScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        self.table.render(f, area, &self.rows, self.kind.title());
    }

    async fn handle_key_event(&mut self, key: KeyEvent) -> Result<ScreenAction> {
        match self.table.handle_key(key, &self.rows) {
            TableInput::Ignored => match key.code {
                KeyCode::Char('p') if matches!(self.kind, RecordKind::Postings | RecordKind::Announcements) => {
                    self.add_focused().await
                }
                KeyCode::Char('u') if self.kind.is_directory() => self.toggle_directory().await,
                KeyCode::Char('r') => {
                    self.reload().await?;
                    Ok(ScreenAction::SetStatus(format!("已加载 {} 条记录", self.rows.len())))
                }
                _ => Ok(ScreenAction::None),
            },
            input => Ok(self.apply_table_input(input)),
        }
    }

    async fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<ScreenAction> {
        let input = self.table.handle_mouse(mouse, &self.rows);
        Ok(self.apply_table_input(input))
    }

    fn captures_input(&self) -> bool {
        self.table.captures_input()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await
    }

    fn help_text(&self) -> &'static str {
        match self.kind {
            RecordKind::Postings | RecordKind::Announcements => {
                "Records:\n\
                ↑/↓/←/→ - Move between cells\n\
                Enter / double click - Show details\n\
                p - Add to 我的进展\n\
                i - Show full text\n\
                / - Filter, [ ] - Page, +/- - Rows per page\n\
                r - Reload"
            }
            RecordKind::Enterprises | RecordKind::RegulatoryUnits => {
                "Directory:\n\
                ↑/↓/←/→ - Move between cells\n\
                Enter / double click - Show details\n\
                u - Switch enterprises / regulatory units\n\
                / - Filter, [ ] - Page, +/- - Rows per page\n\
                r - Reload"
            }
        }
    }
}
