//! 我的进展: the editable application tracker

use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tracing::{info, warn};

use crate::columns::application_columns;
use crate::config::TableConfig;
use crate::models::{MyApplication, NewApplication};
use crate::storage::TrackerStore;
use crate::table::value::{check_unique_ids, to_rows};
use crate::table::view::apply_cell_update;
use crate::table::{order_changes, CellUpdate, Row, TableEvent, TableRecord};
use crate::tui::components::data_table::{DataTableState, TableInput};
use crate::tui::components::input_bar::{InputBar, InputOutcome};
use crate::tui::traits::{Screen, ScreenAction};
use crate::tui::ui::Styles;

enum Prompt {
    Add(InputBar),
    ConfirmDelete(Vec<String>),
}

pub struct TrackerScreen {
    store: Arc<dyn TrackerStore>,
    applications: Vec<MyApplication>,
    rows: Vec<Row>,
    table: DataTableState,
    prompt: Option<Prompt>,
}

impl TrackerScreen {
    pub fn new(store: Arc<dyn TrackerStore>, config: &TableConfig) -> Result<Self> {
        let columns = application_columns(config.long_text_max).context("Invalid application columns")?;
        Ok(Self {
            store,
            applications: Vec::new(),
            rows: Vec::new(),
            table: DataTableState::new(columns, config).selectable().reorderable(),
            prompt: None,
        })
    }

    pub fn applications(&self) -> &[MyApplication] {
        &self.applications
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    async fn reload(&mut self) -> Result<()> {
        self.applications = self
            .store
            .list_applications()
            .await
            .context("Failed to load applications")?;
        self.rows = to_rows(&self.applications);
        if let Err(e) = check_unique_ids(&self.rows) {
            warn!("Inconsistent application list: {}", e);
            self.applications.clear();
            self.rows.clear();
            return Err(e).context("Applications share an id");
        }
        self.table.prune_selection(&self.rows);
        self.table.reset_interaction();
        Ok(())
    }

    async fn apply_table_input(&mut self, input: TableInput) -> Result<ScreenAction> {
        match input {
            TableInput::Ignored | TableInput::Consumed => Ok(ScreenAction::None),
            TableInput::Notice(message) => Ok(ScreenAction::SetStatus(message)),
            TableInput::Event(TableEvent::CellCommitted(update)) => self.commit_cell(update).await,
            TableInput::Event(TableEvent::Reordered(reordered)) => self.persist_reorder(reordered).await,
            TableInput::Event(TableEvent::SelectionChanged(_)) => Ok(ScreenAction::None),
            TableInput::Event(TableEvent::RowActivated { source_index, .. }) => {
                let links = self
                    .applications
                    .get(source_index)
                    .map(|app| app.links().join("\n"))
                    .unwrap_or_default();
                if links.is_empty() {
                    Ok(ScreenAction::SetStatus("没有相关链接".to_string()))
                } else {
                    self.table.show_popup("相关链接", &links);
                    Ok(ScreenAction::None)
                }
            }
        }
    }

    /// Show the edit right away, then persist it. A failed write reloads
    /// the list so the table reverts to what the store holds.
    async fn commit_cell(&mut self, update: CellUpdate) -> Result<ScreenAction> {
        let Some(id) = self.rows.get(update.row_index).map(|r| r.id().to_string()) else {
            return Ok(ScreenAction::None);
        };
        self.rows = apply_cell_update(&self.rows, &update);

        let value = update.value.as_str().map(str::trim).filter(|v| !v.is_empty());
        match self
            .store
            .update_application_field(&id, &update.column_id, value)
            .await
        {
            Ok(updated) => {
                if let Some(pos) = self.applications.iter().position(|a| a.id == updated.id) {
                    self.rows[pos] = updated.to_row();
                    self.applications[pos] = updated;
                }
                let header = self
                    .table
                    .columns()
                    .by_id(&update.column_id)
                    .map_or(update.column_id.clone(), |c| c.header.clone());
                Ok(ScreenAction::SetSuccess(format!("已更新{}", header)))
            }
            Err(e) => {
                warn!("Failed to save {} of {}: {}", update.column_id, id, e);
                self.reload().await?;
                Ok(ScreenAction::SetError(format!("保存失败: {}", e)))
            }
        }
    }

    async fn persist_reorder(&mut self, reordered: Vec<Row>) -> Result<ScreenAction> {
        let changes = order_changes(&reordered, |id| {
            self.applications.iter().find(|a| a.id == id).map(|a| a.order)
        });
        if changes.is_empty() {
            return Ok(ScreenAction::None);
        }

        let mut applications = Vec::with_capacity(self.applications.len());
        for row in &reordered {
            if let Some(app) = self.applications.iter().find(|a| a.id == row.id()) {
                applications.push(app.clone());
            }
        }
        for change in &changes {
            if let Some(app) = applications.iter_mut().find(|a| a.id == change.id) {
                app.order = change.order;
            }
        }
        self.applications = applications;
        self.rows = reordered;

        match self.store.persist_order(&changes).await {
            Ok(()) => {
                info!("Persisted order of {} applications", changes.len());
                Ok(ScreenAction::SetSuccess("已调整顺序".to_string()))
            }
            Err(e) => {
                warn!("Failed to persist order: {}", e);
                self.reload().await?;
                Ok(ScreenAction::SetError(format!("排序保存失败: {}", e)))
            }
        }
    }

    async fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<ScreenAction> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(ScreenAction::None);
        };
        match prompt {
            Prompt::Add(input) => match input.handle_key(key) {
                InputOutcome::Submitted(company) => {
                    self.prompt = None;
                    let company = company.trim();
                    if company.is_empty() {
                        return Ok(ScreenAction::SetError("公司名称不能为空".to_string()));
                    }
                    match self.store.add_application(&NewApplication::new(company)).await {
                        Ok(app) => {
                            self.reload().await?;
                            Ok(ScreenAction::SetSuccess(format!("已添加 {}", app.company)))
                        }
                        Err(e) => Ok(ScreenAction::SetError(format!("添加失败: {}", e))),
                    }
                }
                InputOutcome::Cancelled => {
                    self.prompt = None;
                    Ok(ScreenAction::None)
                }
                InputOutcome::Edited | InputOutcome::Unchanged => Ok(ScreenAction::None),
            },
            Prompt::ConfirmDelete(ids) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let ids = std::mem::take(ids);
                    self.prompt = None;
                    match self.store.delete_applications(&ids).await {
                        Ok(removed) => {
                            self.table.clear_selection();
                            self.reload().await?;
                            Ok(ScreenAction::SetSuccess(format!("已删除 {} 条记录", removed)))
                        }
                        Err(e) => {
                            warn!("Bulk delete failed: {}", e);
                            Ok(ScreenAction::SetError(format!("删除失败: {}", e)))
                        }
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.prompt = None;
                    Ok(ScreenAction::SetStatus("已取消删除".to_string()))
                }
                _ => Ok(ScreenAction::None),
            },
        }
    }
}

impl Screen for TrackerScreen {
    fn draw(&mut self, f: &mut Frame, area: Rect) {
        let (table_area, prompt_area) = match self.prompt {
            Some(_) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(5), Constraint::Length(3)])
                    .split(area);
                (chunks[0], Some(chunks[1]))
            }
            None => (area, None),
        };

        self.table.render(f, table_area, &self.rows, "我的进展");

        if let (Some(prompt), Some(prompt_area)) = (&self.prompt, prompt_area) {
            match prompt {
                Prompt::Add(input) => input.render(f, prompt_area),
                Prompt::ConfirmDelete(ids) => {
                    let text = format!("确认删除选中的 {} 条记录? (y/n)", ids.len());
                    f.render_widget(
                        Paragraph::new(text).style(Styles::warning()).block(
                            Block::default()
                                .borders(Borders::ALL)
                                .border_style(Styles::active_border()),
                        ),
                        prompt_area,
                    );
                }
            }
        }
    }

    async fn handle_key_event(&mut self, key: KeyEvent) -> Result<ScreenAction> {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key).await;
        }

        match self.table.handle_key(key, &self.rows) {
            TableInput::Ignored => match key.code {
                KeyCode::Char('c') => {
                    let mut input = InputBar::new("新增公司 (Enter 确认, Esc 取消)").with_placeholder("公司名称");
                    input.set_focus(true);
                    self.prompt = Some(Prompt::Add(input));
                    Ok(ScreenAction::None)
                }
                KeyCode::Char('d') => {
                    let ids = self
                        .table
                        .selection()
                        .map(|s| s.selected_ids())
                        .unwrap_or_default();
                    if ids.is_empty() {
                        Ok(ScreenAction::SetWarning("请先用空格选择要删除的行".to_string()))
                    } else {
                        self.prompt = Some(Prompt::ConfirmDelete(ids));
                        Ok(ScreenAction::None)
                    }
                }
                KeyCode::Char('r') => {
                    self.reload().await?;
                    Ok(ScreenAction::SetStatus(format!("已加载 {} 条记录", self.rows.len())))
                }
                _ => Ok(ScreenAction::None),
            },
            input => self.apply_table_input(input).await,
        }
    }

    async fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<ScreenAction> {
        if self.prompt.is_some() {
            return Ok(ScreenAction::None);
        }
        let input = self.table.handle_mouse(mouse, &self.rows);
        self.apply_table_input(input).await
    }

    fn captures_input(&self) -> bool {
        self.prompt.is_some() || self.table.captures_input()
    }

    async fn refresh(&mut self) -> Result<()> {
        self.reload().await
    }

    fn help_text(&self) -> &'static str {
        "我的进展:\n\
        ↑/↓/←/→ - Move between cells\n\
        Enter / e / double click - Edit cell\n\
        Esc - Cancel edit, Tab - Save and leave\n\
        Space / a - Select row / page\n\
        d - Delete selected rows\n\
        m or drag ⠿ - Reorder rows\n\
        c - Add application\n\
        i - Show full text\n\
        / - Filter, [ ] - Page, +/- - Rows per page\n\
        r - Reload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Storage, StoreError};
    use crate::table::{CellValue, OrderChange};
    use async_trait::async_trait;
    use chrono::Utc;
    use crossterm::event::KeyModifiers;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStore {
        applications: Mutex<Vec<MyApplication>>,
        fail_writes: bool,
    }

    fn application(id: &str, company: &str, order: i64) -> MyApplication {
        let mut app = MyApplication {
            id: id.to_string(),
            company: company.to_string(),
            position: None,
            status: "未投递".to_string(),
            priority: "中".to_string(),
            progress: None,
            status_updated_at: None,
            location: None,
            industry: None,
            applied_at: None,
            tags: None,
            referral_code: None,
            remarks: None,
            apply_url: None,
            apply_url2: None,
            apply_url3: None,
            order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        if id == "a" {
            app.apply_url = Some("https://example.com/apply".to_string());
        }
        app
    }

    impl FakeStore {
        fn with(applications: Vec<MyApplication>, fail_writes: bool) -> Arc<Self> {
            Arc::new(Self {
                applications: Mutex::new(applications),
                fail_writes,
            })
        }

        fn snapshot(&self) -> Vec<MyApplication> {
            self.applications.lock().unwrap().clone()
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes {
                Err(StoreError::NotFound("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl TrackerStore for FakeStore {
        async fn list_applications(&self) -> Result<Vec<MyApplication>, StoreError> {
            let mut apps = self.snapshot();
            apps.sort_by_key(|a| a.order);
            Ok(apps)
        }

        async fn add_application(&self, new: &NewApplication) -> Result<MyApplication, StoreError> {
            self.check()?;
            let app = application(&format!("n{}", self.snapshot().len()), &new.company, -1);
            self.applications.lock().unwrap().push(app.clone());
            Ok(app)
        }

        async fn update_application_field(
            &self,
            id: &str,
            field: &str,
            value: Option<&str>,
        ) -> Result<MyApplication, StoreError> {
            self.check()?;
            let mut apps = self.applications.lock().unwrap();
            let app = apps
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            match field {
                "status" => app.status = value.unwrap_or_default().to_string(),
                "remarks" => app.remarks = value.map(str::to_string),
                other => return Err(StoreError::NotEditable(other.to_string())),
            }
            Ok(app.clone())
        }

        async fn persist_order(&self, changes: &[OrderChange]) -> Result<(), StoreError> {
            self.check()?;
            let mut apps = self.applications.lock().unwrap();
            for change in changes {
                if let Some(app) = apps.iter_mut().find(|a| a.id == change.id) {
                    app.order = change.order;
                }
            }
            Ok(())
        }

        async fn delete_applications(&self, ids: &[String]) -> Result<u64, StoreError> {
            self.check()?;
            let mut apps = self.applications.lock().unwrap();
            let before = apps.len();
            apps.retain(|a| !ids.contains(&a.id));
            Ok((before - apps.len()) as u64)
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn screen(store: Arc<FakeStore>) -> TrackerScreen {
        let mut screen = TrackerScreen::new(store, &TableConfig::default()).unwrap();
        screen.refresh().await.unwrap();
        screen
    }

    fn seeded() -> Vec<MyApplication> {
        vec![application("a", "华为", 0), application("b", "腾讯", 1), application("c", "字节跳动", 2)]
    }

    fn status_update(value: &str) -> TableInput {
        TableInput::Event(TableEvent::CellCommitted(CellUpdate {
            row_index: 1,
            column_id: "status".to_string(),
            value: CellValue::Choice(value.to_string()),
        }))
    }

    #[tokio::test]
    async fn test_committed_cell_is_saved() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;

        let action = screen.apply_table_input(status_update("面试")).await.unwrap();
        assert!(matches!(action, ScreenAction::SetSuccess(_)));
        assert_eq!(screen.applications()[1].status, "面试");
        assert_eq!(screen.rows()[1].value("status"), CellValue::Choice("面试".to_string()));
        assert_eq!(store.snapshot()[1].status, "面试");
    }

    #[tokio::test]
    async fn test_failed_save_reverts_row() {
        let store = FakeStore::with(seeded(), true);
        let mut screen = screen(store).await;

        let action = screen.apply_table_input(status_update("面试")).await.unwrap();
        assert!(matches!(action, ScreenAction::SetError(_)));
        assert_eq!(screen.rows()[1].value("status"), CellValue::Choice("未投递".to_string()));
    }

    #[tokio::test]
    async fn test_keyboard_edit_reaches_store() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;

        // Move to the remarks column and type a note
        for _ in 0..11 {
            screen.handle_key_event(key(KeyCode::Right)).await.unwrap();
        }
        screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert!(screen.captures_input());
        for c in "一面".chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).await.unwrap();
        }
        let action = screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(action, ScreenAction::SetSuccess("已更新备注".to_string()));
        assert_eq!(store.snapshot()[0].remarks.as_deref(), Some("一面"));
    }

    #[tokio::test]
    async fn test_reorder_persists_changed_rows() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;

        screen.handle_key_event(key(KeyCode::Char('m'))).await.unwrap();
        screen.handle_key_event(key(KeyCode::Down)).await.unwrap();
        screen.handle_key_event(key(KeyCode::Down)).await.unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert!(matches!(action, ScreenAction::SetSuccess(_)));

        let ids: Vec<&str> = screen.rows().iter().map(Row::id).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        let mut stored = store.snapshot();
        stored.sort_by_key(|a| a.order);
        let stored_ids: Vec<&str> = stored.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(stored_ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_reorder_survives_reload_from_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path().join("tracker.db").to_str().unwrap()).await.unwrap());
        for company in ["A", "B", "C", "D", "E"] {
            storage.add_application(&NewApplication::new(company)).await.unwrap();
        }
        let mut screen = TrackerScreen::new(storage.clone(), &TableConfig::default()).unwrap();
        screen.refresh().await.unwrap();
        let companies = |screen: &TrackerScreen| -> Vec<String> {
            screen.applications().iter().map(|a| a.company.clone()).collect()
        };
        assert_eq!(companies(&screen), vec!["E", "D", "C", "B", "A"]);

        screen.handle_key_event(key(KeyCode::Char('m'))).await.unwrap();
        screen.handle_key_event(key(KeyCode::Down)).await.unwrap();
        screen.handle_key_event(key(KeyCode::Down)).await.unwrap();
        let action = screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(action, ScreenAction::SetSuccess("已调整顺序".to_string()));
        let shown = companies(&screen);
        assert_eq!(shown, vec!["D", "C", "E", "B", "A"]);

        screen.refresh().await.unwrap();
        assert_eq!(companies(&screen), shown);
    }

    #[tokio::test]
    async fn test_duplicate_ids_refuse_reload() {
        let store = FakeStore::with(vec![application("a", "华为", 0), application("a", "腾讯", 1)], false);
        let mut screen = TrackerScreen::new(store, &TableConfig::default()).unwrap();
        let err = screen.refresh().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Duplicate row id 'a'"));
        assert!(screen.rows().is_empty());
    }

    #[tokio::test]
    async fn test_bulk_delete_clears_selection() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;

        screen.handle_key_event(key(KeyCode::Char(' '))).await.unwrap();
        screen.handle_key_event(key(KeyCode::Down)).await.unwrap();
        screen.handle_key_event(key(KeyCode::Char(' '))).await.unwrap();
        screen.handle_key_event(key(KeyCode::Char('d'))).await.unwrap();
        assert!(screen.captures_input());

        let action = screen.handle_key_event(key(KeyCode::Char('y'))).await.unwrap();
        assert_eq!(action, ScreenAction::SetSuccess("已删除 2 条记录".to_string()));
        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(screen.rows().len(), 1);
        assert!(screen.table.selection().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_without_selection_only_warns() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;
        let action = screen.handle_key_event(key(KeyCode::Char('d'))).await.unwrap();
        assert!(matches!(action, ScreenAction::SetWarning(_)));
        assert!(!screen.captures_input());
        assert_eq!(store.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_quick_add() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store.clone()).await;

        screen.handle_key_event(key(KeyCode::Char('c'))).await.unwrap();
        for c in "国家电网".chars() {
            screen.handle_key_event(key(KeyCode::Char(c))).await.unwrap();
        }
        let action = screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(action, ScreenAction::SetSuccess("已添加 国家电网".to_string()));
        assert_eq!(screen.rows().len(), 4);
        assert_eq!(screen.applications()[0].company, "国家电网");
    }

    #[tokio::test]
    async fn test_links_popup_on_activation() {
        let store = FakeStore::with(seeded(), false);
        let mut screen = screen(store).await;
        for _ in 0..12 {
            screen.handle_key_event(key(KeyCode::Right)).await.unwrap();
        }
        screen.handle_key_event(key(KeyCode::Enter)).await.unwrap();
        assert_eq!(
            screen.table.popup().map(|(_, text)| text.as_str()),
            Some("https://example.com/apply")
        );
    }
}
