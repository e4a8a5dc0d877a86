//! Terminal data table
//!
//! Owns the per-screen table state (pagination, filter, selection, focused
//! cell, inline editor, drag controller) and turns crossterm input into
//! [`TableEvent`]s for the hosting screen. Rows stay owned by the screen and
//! are passed in on every call.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

use super::input_bar::{InputBar, InputOutcome};
use crate::config::TableConfig;
use crate::table::column::date_portion;
use crate::table::edit::CellMode;
use crate::table::reorder::DragInput;
use crate::table::view::{TableBody, NO_RESULTS};
use crate::table::{
    render_table, CellContent, CheckState, ColumnSet, Commit, DragReorder, EditableCell, GlobalFilter, Pagination,
    Presentation, Row, RowSelection, TableEvent, TableProps, TableView,
};
use crate::tui::ui::{centered_rect, fit_width, Styles};

const GRIP_WIDTH: u16 = 2;
const CHECKBOX_WIDTH: u16 = 3;

/// What the table did with an input event
#[derive(Debug, Clone, PartialEq)]
pub enum TableInput {
    /// Not a table key; the screen may handle it
    Ignored,
    Consumed,
    Event(TableEvent),
    /// Message for the status bar
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Grip,
    Checkbox,
    Column(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Header(Zone),
    Row(usize, Zone),
    Dropdown(usize),
}

/// Screen geometry of the last render, used for mouse hit testing
#[derive(Debug, Clone, Default)]
struct HitMap {
    header_y: Option<u16>,
    body_top: u16,
    body_rows: usize,
    /// Page index of the first visible body row
    scroll: usize,
    zones: Vec<(Zone, u16, u16)>,
    dropdown: Option<Rect>,
}

impl HitMap {
    fn zone_at(&self, x: u16) -> Option<Zone> {
        self.zones
            .iter()
            .find(|(_, start, end)| x >= *start && x < *end)
            .map(|(zone, _, _)| *zone)
    }

    /// Page index of the row drawn at screen line `y`
    fn row_at(&self, y: u16) -> Option<usize> {
        (y >= self.body_top && usize::from(y - self.body_top) < self.body_rows)
            .then(|| self.scroll + usize::from(y - self.body_top))
    }

    /// Screen line of a page row, when it is visible
    fn line_of(&self, row: usize) -> Option<u16> {
        let offset = row.checked_sub(self.scroll)?;
        (offset < self.body_rows).then(|| self.body_top + offset as u16)
    }

    fn hit(&self, x: u16, y: u16) -> Option<Hit> {
        if let Some(area) = self.dropdown {
            if x >= area.x && x < area.x + area.width && y >= area.y && y < area.y + area.height {
                return Some(Hit::Dropdown(usize::from(y - area.y)));
            }
        }
        let zone = self.zone_at(x)?;
        if self.header_y == Some(y) {
            return Some(Hit::Header(zone));
        }
        self.row_at(y).map(|row| Hit::Row(row, zone))
    }

    fn zone_span(&self, zone: Zone) -> Option<(u16, u16)> {
        self.zones
            .iter()
            .find(|(z, _, _)| *z == zone)
            .map(|(_, start, end)| (*start, *end))
    }
}

#[derive(Debug, Clone, Copy)]
struct Click {
    at: Instant,
    row: usize,
    col: usize,
}

pub struct DataTableState {
    columns: ColumnSet,
    pub pagination: Pagination,
    pub filter: GlobalFilter,
    filter_bar: InputBar,
    selection: Option<RowSelection>,
    reorderable: bool,
    cursor_row: usize,
    cursor_col: usize,
    list_state: ListState,
    editor: Option<EditableCell>,
    drag: DragReorder,
    popup: Option<(String, String)>,
    last_click: Option<Click>,
    double_click: Duration,
    hits: HitMap,
}

impl DataTableState {
    pub fn new(columns: ColumnSet, config: &TableConfig) -> Self {
        Self {
            columns,
            pagination: Pagination::new(config.page_size).unwrap_or_default(),
            filter: GlobalFilter::default(),
            filter_bar: InputBar::new("筛选 (/)").with_placeholder("输入关键字筛选..."),
            selection: None,
            reorderable: false,
            cursor_row: 0,
            cursor_col: 0,
            list_state: ListState::default(),
            editor: None,
            drag: DragReorder::new(config.drag_distance),
            popup: None,
            last_click: None,
            double_click: config.double_click_window(),
            hits: HitMap::default(),
        }
    }

    /// Enable the checkbox column
    pub fn selectable(mut self) -> Self {
        self.selection = Some(RowSelection::new());
        self
    }

    /// Enable the drag handle column
    pub fn reorderable(mut self) -> Self {
        self.reorderable = true;
        self
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn selection(&self) -> Option<&RowSelection> {
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        if let Some(selection) = self.selection.as_mut() {
            selection.clear();
        }
    }

    /// Forget selected ids that are no longer in `rows`
    pub fn prune_selection(&mut self, rows: &[Row]) {
        if let Some(selection) = self.selection.as_mut() {
            let removed = selection.retain_known(rows.iter().map(Row::id));
            if removed > 0 {
                debug!("Dropped {} stale selected rows", removed);
            }
        }
    }

    /// Drop an open editor and any drag in progress, e.g. after a reload
    pub fn reset_interaction(&mut self) {
        self.editor = None;
        self.drag.cancel();
    }

    pub fn is_editing(&self) -> bool {
        self.editor.as_ref().map_or(false, EditableCell::is_editing)
    }

    /// Keys go to the table alone while an editor, the filter bar, a
    /// keyboard drag or a popup is active
    pub fn captures_input(&self) -> bool {
        self.is_editing() || self.filter_bar.is_focused || self.drag.is_dragging() || self.popup.is_some()
    }

    pub fn show_popup(&mut self, title: &str, text: &str) {
        self.popup = Some((title.to_string(), text.to_string()));
    }

    pub fn popup(&self) -> Option<&(String, String)> {
        self.popup.as_ref()
    }

    pub fn view(&self, rows: &[Row]) -> TableView {
        let mut props = TableProps::new(rows, &self.columns, &self.pagination, &self.filter)
            .reorderable(self.reorderable);
        if let Some(selection) = &self.selection {
            props = props.with_selection(selection);
        }
        render_table(&props)
    }

    /// Id of the row under the cursor
    pub fn focused_row_id(&self, rows: &[Row]) -> Option<String> {
        self.view(rows)
            .rows()
            .get(self.cursor_row)
            .map(|r| r.row_id.clone())
    }

    fn filtered_total(&self, rows: &[Row]) -> usize {
        self.filter.apply(rows, &self.columns).len()
    }

    fn page_len(&self, rows: &[Row]) -> usize {
        self.view(rows).rows().len()
    }

    pub fn handle_key(&mut self, key: KeyEvent, rows: &[Row]) -> TableInput {
        if self.popup.is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('q')) {
                self.popup = None;
            }
            return TableInput::Consumed;
        }
        if self.filter_bar.is_focused {
            return self.handle_filter_key(key);
        }
        if self.is_editing() {
            return self.handle_edit_key(key);
        }
        if self.drag.is_dragging() {
            return self.handle_drag_key(key, rows);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.page_len(rows);
                self.cursor_row = (self.cursor_row + 1).min(len.saturating_sub(1));
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.cursor_col = self.cursor_col.saturating_sub(1);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.cursor_col = (self.cursor_col + 1).min(self.columns.len().saturating_sub(1));
            }
            KeyCode::PageDown | KeyCode::Char(']') => {
                let total = self.filtered_total(rows);
                self.pagination.next(total);
                self.cursor_row = 0;
            }
            KeyCode::PageUp | KeyCode::Char('[') => {
                self.pagination.previous();
                self.cursor_row = 0;
            }
            KeyCode::Home => {
                self.pagination.first();
                self.cursor_row = 0;
            }
            KeyCode::End => {
                let total = self.filtered_total(rows);
                self.pagination.last(total);
                self.cursor_row = 0;
            }
            KeyCode::Char('+') => self.pagination.cycle_page_size(true),
            KeyCode::Char('-') => self.pagination.cycle_page_size(false),
            KeyCode::Enter | KeyCode::Char('e') => return self.activate(rows),
            KeyCode::Char(' ') if self.selection.is_some() => {
                return match self.focused_row_id(rows) {
                    Some(id) => self.change_selection(|s| s.toggle(&id)),
                    None => TableInput::Consumed,
                };
            }
            KeyCode::Char('a') if self.selection.is_some() => {
                let view = self.view(rows);
                return self.change_selection(|s| s.toggle_all(&view.page_ids()));
            }
            KeyCode::Char('m') if self.reorderable => {
                if let Some(id) = self.focused_row_id(rows) {
                    self.drag.begin_drag(&id);
                }
            }
            KeyCode::Char('i') => {
                let view = self.view(rows);
                let disclosure = view
                    .rows()
                    .get(self.cursor_row)
                    .and_then(|r| r.cells.get(self.cursor_col))
                    .and_then(|c| c.content.disclosure().map(str::to_string));
                match disclosure {
                    Some(text) => self.show_popup("全文", &text),
                    None => return TableInput::Notice("该单元格没有更多内容".to_string()),
                }
            }
            KeyCode::Char('/') => self.filter_bar.set_focus(true),
            KeyCode::Esc if self.filter.is_active() => {
                self.filter.clear();
                self.filter_bar.clear();
                self.pagination.first();
            }
            _ => return TableInput::Ignored,
        }
        TableInput::Consumed
    }

    fn handle_filter_key(&mut self, key: KeyEvent) -> TableInput {
        match self.filter_bar.handle_key(key) {
            InputOutcome::Edited => {
                self.filter.set_query(&self.filter_bar.value);
                self.pagination.first();
                self.cursor_row = 0;
            }
            InputOutcome::Submitted(_) => self.filter_bar.set_focus(false),
            InputOutcome::Cancelled => {
                self.filter_bar.clear();
                self.filter_bar.set_focus(false);
                self.filter.clear();
                self.pagination.first();
            }
            InputOutcome::Unchanged => {}
        }
        TableInput::Consumed
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> TableInput {
        let Some(editor) = self.editor.as_mut() else {
            return TableInput::Ignored;
        };
        let commit = if editor.kind().is_select() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    editor.highlight_previous();
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    editor.highlight_next();
                    None
                }
                KeyCode::Enter | KeyCode::Char(' ') => Some(editor.confirm()),
                KeyCode::Tab => Some(editor.blur()),
                KeyCode::Esc => {
                    editor.cancel();
                    Some(Commit::Unchanged)
                }
                _ => None,
            }
        } else {
            match key.code {
                KeyCode::Char(c) => {
                    editor.insert_char(c);
                    None
                }
                KeyCode::Backspace => {
                    editor.backspace();
                    None
                }
                KeyCode::Delete => {
                    editor.delete();
                    None
                }
                KeyCode::Left => {
                    editor.cursor_left();
                    None
                }
                KeyCode::Right => {
                    editor.cursor_right();
                    None
                }
                KeyCode::Home => {
                    editor.cursor_home();
                    None
                }
                KeyCode::End => {
                    editor.cursor_end();
                    None
                }
                KeyCode::Enter => Some(editor.confirm()),
                KeyCode::Tab => Some(editor.blur()),
                KeyCode::Esc => {
                    editor.cancel();
                    Some(Commit::Unchanged)
                }
                _ => None,
            }
        };
        match commit {
            Some(commit) => self.finish_edit(commit),
            None => TableInput::Consumed,
        }
    }

    fn handle_drag_key(&mut self, key: KeyEvent, rows: &[Row]) -> TableInput {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                let view = self.view(rows);
                let down = matches!(key.code, KeyCode::Down | KeyCode::Char('j'));
                self.drag.move_target(&view.page_ids(), down);
                if let Some(pos) = self
                    .drag
                    .over_id()
                    .and_then(|over| view.rows().iter().position(|r| r.row_id == over))
                {
                    self.cursor_row = pos;
                }
                TableInput::Consumed
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('m') => match self.drag.drop_current(rows, Row::id) {
                Some(reordered) => TableInput::Event(TableEvent::Reordered(reordered)),
                None => TableInput::Consumed,
            },
            KeyCode::Esc => {
                self.drag.cancel();
                TableInput::Consumed
            }
            _ => TableInput::Consumed,
        }
    }

    fn change_selection(&mut self, change: impl FnOnce(&mut RowSelection)) -> TableInput {
        match self.selection.as_mut() {
            Some(selection) => {
                change(selection);
                TableInput::Event(TableEvent::SelectionChanged(selection.clone()))
            }
            None => TableInput::Ignored,
        }
    }

    fn finish_edit(&mut self, commit: Commit) -> TableInput {
        self.editor = None;
        match commit {
            Commit::Changed(update) => TableInput::Event(TableEvent::CellCommitted(update)),
            Commit::Unchanged => TableInput::Consumed,
            Commit::Rejected { reason } => TableInput::Notice(reason),
        }
    }

    /// Edit the focused cell, or report the row as activated when the
    /// column is read-only
    fn activate(&mut self, rows: &[Row]) -> TableInput {
        let view = self.view(rows);
        let Some(row) = view.rows().get(self.cursor_row) else {
            return TableInput::Consumed;
        };
        let Some(column) = self.columns.get(self.cursor_col) else {
            return TableInput::Consumed;
        };
        match &column.edit {
            Some(kind) => {
                let value = match column.value(&rows[row.source_index]) {
                    Ok(value) => value,
                    Err(e) => return TableInput::Notice(e.to_string()),
                };
                let mut editor = EditableCell::new(row.source_index, &column.id, kind.clone(), value);
                editor.begin_edit();
                debug!("Editing {} of row {}", column.id, row.row_id);
                self.editor = Some(editor);
                TableInput::Consumed
            }
            None => TableInput::Event(TableEvent::RowActivated {
                row_id: row.row_id.clone(),
                source_index: row.source_index,
            }),
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, rows: &[Row]) -> TableInput {
        self.handle_mouse_at(mouse, rows, Instant::now())
    }

    fn handle_mouse_at(&mut self, mouse: MouseEvent, rows: &[Row], now: Instant) -> TableInput {
        if self.popup.is_some() {
            if let MouseEventKind::Down(_) = mouse.kind {
                self.popup = None;
            }
            return TableInput::Consumed;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.pointer_down(mouse.column, mouse.row, rows, now),
            MouseEventKind::Drag(MouseButton::Left) => {
                let view = self.view(rows);
                let hovered = self
                    .hits
                    .row_at(mouse.row)
                    .and_then(|r| view.rows().get(r))
                    .map(|r| r.row_id.as_str());
                self.drag.pointer_move(mouse.column, mouse.row, hovered);
                TableInput::Consumed
            }
            MouseEventKind::Up(MouseButton::Left) => match self.drag.pointer_up(rows, Row::id) {
                Some(reordered) => TableInput::Event(TableEvent::Reordered(reordered)),
                None => TableInput::Consumed,
            },
            MouseEventKind::ScrollDown if !self.is_editing() => {
                let len = self.page_len(rows);
                self.cursor_row = (self.cursor_row + 1).min(len.saturating_sub(1));
                TableInput::Consumed
            }
            MouseEventKind::ScrollUp if !self.is_editing() => {
                self.cursor_row = self.cursor_row.saturating_sub(1);
                TableInput::Consumed
            }
            _ => TableInput::Ignored,
        }
    }

    fn pointer_down(&mut self, x: u16, y: u16, rows: &[Row], now: Instant) -> TableInput {
        let hit = self.hits.hit(x, y);

        if let Some(editor) = self.editor.as_mut() {
            if let Some(Hit::Dropdown(index)) = hit {
                let commit = editor.select_option(index);
                return self.finish_edit(commit);
            }
            let on_editor = match hit {
                Some(Hit::Row(r, Zone::Column(c))) => {
                    r == self.cursor_row && self.columns.get(c).map(|col| col.id.as_str()) == Some(editor.column_id())
                }
                _ => false,
            };
            if on_editor {
                return TableInput::Consumed;
            }
            let commit = editor.blur();
            if let Some(Hit::Row(r, Zone::Column(c))) = hit {
                self.cursor_row = r;
                self.cursor_col = c;
            }
            return self.finish_edit(commit);
        }

        let view = self.view(rows);
        match hit {
            Some(Hit::Header(Zone::Checkbox)) => self.change_selection(|s| s.toggle_all(&view.page_ids())),
            Some(Hit::Header(_)) | Some(Hit::Dropdown(_)) | None => TableInput::Ignored,
            Some(Hit::Row(r, zone)) => {
                let Some(row) = view.rows().get(r) else {
                    return TableInput::Ignored;
                };
                self.cursor_row = r;
                match zone {
                    Zone::Grip if self.reorderable => {
                        self.drag.pointer_down(&row.row_id, x, y);
                        TableInput::Consumed
                    }
                    Zone::Checkbox => {
                        let id = row.row_id.clone();
                        self.change_selection(|s| s.toggle(&id))
                    }
                    Zone::Grip => TableInput::Consumed,
                    Zone::Column(c) => {
                        self.cursor_col = c;
                        let double = self.last_click.map_or(false, |last| {
                            last.row == r && last.col == c && now.duration_since(last.at) <= self.double_click
                        });
                        if double {
                            self.last_click = None;
                            self.activate(rows)
                        } else {
                            self.last_click = Some(Click { at: now, row: r, col: c });
                            TableInput::Consumed
                        }
                    }
                }
            }
        }
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, rows: &[Row], title: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        self.filter_bar.render(f, chunks[0]);

        let view = self.view(rows);
        self.pagination.clamp(view.page.filtered_total);
        self.cursor_row = self.cursor_row.min(view.rows().len().saturating_sub(1));

        let selected_count = self.selection.as_ref().map_or(0, RowSelection::len);
        let block_title = if selected_count > 0 {
            format!("{} ({} 条, 已选 {})", title, view.page.filtered_total, selected_count)
        } else {
            format!("{} ({} 条)", title, view.page.filtered_total)
        };
        let block = Block::default()
            .title(block_title)
            .borders(Borders::ALL)
            .border_style(Styles::active_border());
        let inner = block.inner(chunks[1]);
        f.render_widget(block, chunks[1]);

        self.hits = self.layout_zones(inner);
        let header_area = Rect::new(inner.x, inner.y, inner.width, inner.height.min(1));
        let body_area = Rect::new(inner.x, inner.y + header_area.height, inner.width, inner.height - header_area.height);
        f.render_widget(Paragraph::new(self.header_line(&view)), header_area);

        let capacity = usize::from(body_area.height);
        let mut items = Vec::new();
        match &view.body {
            TableBody::Empty { message, .. } => {
                let width = self.hits.zones.last().map_or(0, |(_, _, end)| end - inner.x);
                let pad = usize::from(width).saturating_sub(message.width()) / 2;
                items.push(ListItem::new(Line::from(Span::styled(
                    format!("{}{}", " ".repeat(pad), message),
                    Styles::placeholder(),
                ))));
                self.hits.body_rows = 0;
                self.list_state = ListState::default();
                f.render_widget(List::new(items), body_area);
            }
            TableBody::Rows(view_rows) => {
                for (i, row) in view_rows.iter().enumerate() {
                    items.push(ListItem::new(self.row_line(i, row)));
                }
                if self.list_state.offset() >= view_rows.len() {
                    *self.list_state.offset_mut() = 0;
                }
                // The list scrolls its offset so the cursor row stays on screen
                self.list_state.select(Some(self.cursor_row));
                f.render_stateful_widget(List::new(items), body_area, &mut self.list_state);
                self.hits.scroll = self.list_state.offset();
                self.hits.body_rows = view_rows.len().saturating_sub(self.hits.scroll).min(capacity);
            }
        }

        f.render_widget(Paragraph::new(self.footer_text(&view)).style(Styles::inactive()), chunks[2]);

        self.render_dropdown(f, area, &view);

        if let Some((popup_title, text)) = &self.popup {
            let popup_area = centered_rect(60, 40, area);
            f.render_widget(Clear, popup_area);
            let paragraph = Paragraph::new(text.as_str())
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .title(format!("{} (Esc 关闭)", popup_title))
                        .borders(Borders::ALL)
                        .border_style(Styles::active_border()),
                );
            f.render_widget(paragraph, popup_area);
        }
    }

    fn layout_zones(&self, inner: Rect) -> HitMap {
        let right = inner.x + inner.width;
        let mut zones = Vec::new();
        let mut x = inner.x;
        let mut widths = Vec::new();
        if self.reorderable {
            widths.push((Zone::Grip, GRIP_WIDTH));
        }
        if self.selection.is_some() {
            widths.push((Zone::Checkbox, CHECKBOX_WIDTH));
        }
        widths.extend(self.columns.iter().enumerate().map(|(i, c)| (Zone::Column(i), c.width)));

        for (zone, width) in widths {
            if x >= right {
                break;
            }
            let end = (x + width).min(right);
            zones.push((zone, x, end));
            x = end + 1;
        }

        HitMap {
            header_y: (inner.height > 0).then_some(inner.y),
            body_top: inner.y + 1,
            body_rows: 0,
            scroll: 0,
            zones,
            dropdown: None,
        }
    }

    fn header_line(&self, view: &TableView) -> Line<'static> {
        let spans = self
            .hits
            .zones
            .iter()
            .map(|(zone, start, end)| {
                let width = usize::from(end - start);
                let text = match zone {
                    Zone::Grip => String::new(),
                    Zone::Checkbox => check_symbol(view.select_all.unwrap_or(CheckState::Unchecked)).to_string(),
                    Zone::Column(i) => view.headers.get(*i).map(|h| h.label.clone()).unwrap_or_default(),
                };
                Span::styled(format!("{} ", fit_width(&text, width)), Styles::title())
            })
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn row_line(&self, index: usize, row: &crate::table::view::ViewRow) -> Line<'static> {
        let is_cursor_row = index == self.cursor_row;
        let row_style = if self.drag.active_id() == Some(row.row_id.as_str()) {
            Styles::drag_source()
        } else if self.drag.is_dragging() && self.drag.over_id() == Some(row.row_id.as_str()) {
            Styles::drop_target()
        } else if is_cursor_row {
            Styles::cursor_row()
        } else {
            Style::default()
        };

        let spans = self
            .hits
            .zones
            .iter()
            .map(|(zone, start, end)| {
                let width = usize::from(end - start);
                let (text, style) = match zone {
                    Zone::Grip => ("⠿".to_string(), Styles::inactive()),
                    Zone::Checkbox => {
                        let state = if row.selected == Some(true) {
                            CheckState::Checked
                        } else {
                            CheckState::Unchecked
                        };
                        (check_symbol(state).to_string(), Style::default())
                    }
                    Zone::Column(i) => self.cell_text(row, *i, is_cursor_row),
                };
                Span::styled(format!("{} ", fit_width(&text, width)), row_style.patch(style))
            })
            .collect::<Vec<_>>();
        Line::from(spans)
    }

    fn cell_text(&self, row: &crate::table::view::ViewRow, column_index: usize, is_cursor_row: bool) -> (String, Style) {
        let (Some(column), Some(cell)) = (self.columns.get(column_index), row.cells.get(column_index)) else {
            return (String::new(), Style::default());
        };

        if let Some(editor) = &self.editor {
            if editor.row_index() == row.source_index && editor.column_id() == column.id {
                if let CellMode::Editing(draft) = editor.mode() {
                    let text = if editor.kind().is_select() {
                        let label = draft
                            .highlighted
                            .and_then(|i| editor.kind().options().get(i))
                            .map_or("", |o| o.label.as_str());
                        format!("{} ▾", label)
                    } else {
                        let mut text: String = draft.text.chars().take(draft.cursor).collect();
                        text.push('▏');
                        text.extend(draft.text.chars().skip(draft.cursor));
                        text
                    };
                    return (text, Styles::editing());
                }
            }
        }

        let text = cell.content.display_text().to_string();
        let focused = is_cursor_row && column_index == self.cursor_col;
        let style = if focused {
            Styles::selected()
        } else {
            match &cell.content {
                CellContent::Absent | CellContent::EditHint => Styles::placeholder(),
                CellContent::Failed(_) => Styles::error(),
                CellContent::Value { .. } => match column.presentation {
                    Presentation::Badge => Styles::badge(&text),
                    Presentation::Link { .. } => Styles::link(),
                    Presentation::Deadline if is_past(&text) => Styles::error(),
                    _ => Style::default(),
                },
            }
        };
        (text, style)
    }

    fn footer_text(&self, view: &TableView) -> String {
        let mut parts = vec![view.showing_text(), format!("每页 {} 行 (+/-)", view.page.page_size)];
        if view.page.page_count > 1 {
            parts.push(format!("{} ([ ])", view.page_text()));
        }
        match self.drag.input() {
            Some(DragInput::Keyboard) => parts.push("排序中: ↑/↓ 选择位置, Enter 放下, Esc 取消".to_string()),
            Some(DragInput::Pointer) => parts.push("拖动中: 松开鼠标放下".to_string()),
            None => {}
        }
        parts.join(" · ")
    }

    fn render_dropdown(&mut self, f: &mut Frame, area: Rect, view: &TableView) {
        self.hits.dropdown = None;
        let Some(editor) = &self.editor else {
            return;
        };
        let Some(draft) = editor.draft() else {
            return;
        };
        if !editor.kind().is_select() {
            return;
        }
        let Some(column_index) = self.columns.iter().position(|c| c.id == editor.column_id()) else {
            return;
        };
        let Some(row_pos) = view.rows().iter().position(|r| r.source_index == editor.row_index()) else {
            return;
        };
        let Some((x, end)) = self.hits.zone_span(Zone::Column(column_index)) else {
            return;
        };
        let Some(row_y) = self.hits.line_of(row_pos) else {
            return;
        };

        let options = editor.kind().options();
        let label_width = options.iter().map(|o| o.label.width()).max().unwrap_or(0) as u16;
        let width = (label_width + 4).max(end - x).min(area.width);
        let height = (options.len() as u16 + 2).min(area.height);
        let below = row_y + 1;
        let y = if below + height <= area.y + area.height {
            below
        } else {
            row_y.saturating_sub(height)
        };
        let x = x.min((area.x + area.width).saturating_sub(width));
        let dropdown_area = Rect::new(x, y, width, height);

        let items: Vec<ListItem> = options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let style = if Some(i) == draft.highlighted {
                    Styles::selected()
                } else {
                    Styles::badge(&option.value)
                };
                ListItem::new(option.label.clone()).style(style)
            })
            .collect();

        f.render_widget(Clear, dropdown_area);
        f.render_widget(
            List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Styles::active_border()),
            ),
            dropdown_area,
        );
        self.hits.dropdown = Some(Rect::new(
            dropdown_area.x + 1,
            dropdown_area.y + 1,
            dropdown_area.width.saturating_sub(2),
            dropdown_area.height.saturating_sub(2),
        ));
    }
}

fn check_symbol(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Indeterminate => "[-]",
        CheckState::Unchecked => "[ ]",
    }
}

/// Deadline already behind us
fn is_past(text: &str) -> bool {
    NaiveDate::parse_from_str(&date_portion(text), "%Y-%m-%d")
        .map_or(false, |date| date < chrono::Local::now().date_naive())
}
