//! Inline cell editor
//!
//! A cell is either displaying its value or editing a draft of it. Text and
//! date cells commit on blur or Enter; select cells commit as soon as an
//! option is chosen. Nothing leaves the cell until a commit produces a
//! [`CellUpdate`].

use chrono::NaiveDate;

use super::column::{date_portion, EditKind};
use super::value::CellValue;

/// Committed edit handed to the hosting screen
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate {
    /// Index of the row in the source collection
    pub row_index: usize,
    pub column_id: String,
    pub value: CellValue,
}

/// Result of leaving edit mode
#[derive(Debug, Clone, PartialEq)]
pub enum Commit {
    /// Editing ended without a change
    Unchanged,
    Changed(CellUpdate),
    /// The draft was invalid; the original value is kept
    Rejected { reason: String },
}

/// In-progress edit
#[derive(Debug, Clone, PartialEq)]
pub struct EditDraft {
    /// Draft text at activation, used to detect a change
    initial: String,
    pub text: String,
    /// Cursor position in characters
    pub cursor: usize,
    /// Highlighted option of a select editor
    pub highlighted: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CellMode {
    Display,
    Editing(EditDraft),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditableCell {
    row_index: usize,
    column_id: String,
    kind: EditKind,
    value: CellValue,
    mode: CellMode,
}

impl EditableCell {
    pub fn new(row_index: usize, column_id: &str, kind: EditKind, value: CellValue) -> Self {
        Self {
            row_index,
            column_id: column_id.to_string(),
            kind,
            value,
            mode: CellMode::Display,
        }
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    pub fn kind(&self) -> &EditKind {
        &self.kind
    }

    /// Current (last committed) value
    pub fn value(&self) -> &CellValue {
        &self.value
    }

    pub fn mode(&self) -> &CellMode {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, CellMode::Editing(_))
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        match &self.mode {
            CellMode::Editing(draft) => Some(draft),
            CellMode::Display => None,
        }
    }

    /// Display → Editing. Returns false when already editing.
    pub fn begin_edit(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let current = self.value.as_str().unwrap_or_default();
        let text = match self.kind {
            EditKind::Date if !current.is_empty() => date_portion(current.trim()),
            _ => current.to_string(),
        };
        let highlighted = match &self.kind {
            EditKind::Select(options) => options
                .iter()
                .position(|o| o.value == current)
                .or(if options.is_empty() { None } else { Some(0) }),
            _ => None,
        };
        self.mode = CellMode::Editing(EditDraft {
            initial: text.clone(),
            cursor: text.chars().count(),
            text,
            highlighted,
        });
        true
    }

    fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        if self.kind.is_select() {
            return None;
        }
        match &mut self.mode {
            CellMode::Editing(draft) => Some(draft),
            CellMode::Display => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(draft) = self.draft_mut() {
            let at = byte_offset(&draft.text, draft.cursor);
            draft.text.insert(at, c);
            draft.cursor += 1;
        }
    }

    pub fn backspace(&mut self) {
        if let Some(draft) = self.draft_mut() {
            if draft.cursor > 0 {
                draft.cursor -= 1;
                let at = byte_offset(&draft.text, draft.cursor);
                draft.text.remove(at);
            }
        }
    }

    pub fn delete(&mut self) {
        if let Some(draft) = self.draft_mut() {
            if draft.cursor < draft.text.chars().count() {
                let at = byte_offset(&draft.text, draft.cursor);
                draft.text.remove(at);
            }
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.cursor = draft.cursor.saturating_sub(1);
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.cursor = (draft.cursor + 1).min(draft.text.chars().count());
        }
    }

    pub fn cursor_home(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.cursor = 0;
        }
    }

    pub fn cursor_end(&mut self) {
        if let Some(draft) = self.draft_mut() {
            draft.cursor = draft.text.chars().count();
        }
    }

    pub fn highlight_previous(&mut self) {
        let len = self.kind.options().len();
        if let CellMode::Editing(draft) = &mut self.mode {
            if len > 0 {
                let i = draft.highlighted.unwrap_or(0);
                draft.highlighted = Some(if i == 0 { len - 1 } else { i - 1 });
            }
        }
    }

    pub fn highlight_next(&mut self) {
        let len = self.kind.options().len();
        if let CellMode::Editing(draft) = &mut self.mode {
            if len > 0 {
                let i = draft.highlighted.map_or(0, |i| (i + 1) % len);
                draft.highlighted = Some(i);
            }
        }
    }

    /// Choose an option of a select editor; commits immediately
    pub fn select_option(&mut self, index: usize) -> Commit {
        if !self.is_editing() {
            return Commit::Unchanged;
        }
        let Some(option) = self.kind.options().get(index).cloned() else {
            return Commit::Unchanged;
        };
        self.mode = CellMode::Display;
        let chosen = CellValue::choice(Some(&option.value));
        if chosen == self.value {
            return Commit::Unchanged;
        }
        self.value = chosen.clone();
        Commit::Changed(self.update(chosen))
    }

    /// Enter key: commits a text/date draft or chooses the highlighted option
    pub fn confirm(&mut self) -> Commit {
        if self.kind.is_select() {
            match self.draft().and_then(|d| d.highlighted) {
                Some(index) => self.select_option(index),
                None => self.close(),
            }
        } else {
            self.commit_draft()
        }
    }

    /// Focus left the cell. Select editors close without choosing.
    pub fn blur(&mut self) -> Commit {
        if self.kind.is_select() {
            self.close()
        } else {
            self.commit_draft()
        }
    }

    /// Escape: discard the draft and keep the original value
    pub fn cancel(&mut self) {
        self.mode = CellMode::Display;
    }

    fn close(&mut self) -> Commit {
        self.mode = CellMode::Display;
        Commit::Unchanged
    }

    fn commit_draft(&mut self) -> Commit {
        let CellMode::Editing(draft) = std::mem::replace(&mut self.mode, CellMode::Display) else {
            return Commit::Unchanged;
        };
        if draft.text == draft.initial {
            return Commit::Unchanged;
        }
        let text = draft.text.trim();
        let value = match self.kind {
            // Blank drafts clear the cell whatever the kind
            _ if text.is_empty() => CellValue::Empty,
            EditKind::Date => {
                if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_err() {
                    return Commit::Rejected {
                        reason: format!("Invalid date '{}' (expected YYYY-MM-DD)", text),
                    };
                }
                CellValue::date(Some(text))
            }
            _ => CellValue::text(Some(&draft.text)),
        };
        if value == self.value {
            return Commit::Unchanged;
        }
        self.value = value.clone();
        Commit::Changed(self.update(value))
    }

    fn update(&self, value: CellValue) -> CellUpdate {
        CellUpdate {
            row_index: self.row_index,
            column_id: self.column_id.clone(),
            value,
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_kind() -> EditKind {
        EditKind::select_from(&["未投递", "已投递", "笔试", "面试", "Offer", "感谢信", "已结束"])
    }

    #[test]
    fn test_select_commits_immediately() {
        let mut cell = EditableCell::new(3, "status", status_kind(), CellValue::choice(Some("未投递")));
        assert!(cell.begin_edit());
        let commit = cell.select_option(1);
        assert_eq!(
            commit,
            Commit::Changed(CellUpdate {
                row_index: 3,
                column_id: "status".to_string(),
                value: CellValue::Choice("已投递".to_string()),
            })
        );
        assert!(!cell.is_editing());
        assert_eq!(cell.value().as_str(), Some("已投递"));
    }

    #[test]
    fn test_select_same_option_is_unchanged() {
        let mut cell = EditableCell::new(0, "status", status_kind(), CellValue::choice(Some("面试")));
        cell.begin_edit();
        assert_eq!(cell.draft().unwrap().highlighted, Some(3));
        assert_eq!(cell.confirm(), Commit::Unchanged);
        assert!(!cell.is_editing());
    }

    #[test]
    fn test_select_blur_closes_without_update() {
        let mut cell = EditableCell::new(0, "status", status_kind(), CellValue::Empty);
        cell.begin_edit();
        cell.highlight_next();
        assert_eq!(cell.blur(), Commit::Unchanged);
        assert_eq!(cell.value(), &CellValue::Empty);
    }

    #[test]
    fn test_text_blur_commits_changed_draft() {
        let mut cell = EditableCell::new(1, "progress", EditKind::Text, CellValue::text(Some("一面")));
        cell.begin_edit();
        cell.insert_char('后');
        let commit = cell.blur();
        assert_eq!(
            commit,
            Commit::Changed(CellUpdate {
                row_index: 1,
                column_id: "progress".to_string(),
                value: CellValue::Text("一面后".to_string()),
            })
        );
    }

    #[test]
    fn test_unchanged_commit_does_not_update() {
        let mut cell = EditableCell::new(0, "company", EditKind::Text, CellValue::text(Some("ACME")));
        cell.begin_edit();
        cell.insert_char('x');
        cell.backspace();
        assert_eq!(cell.confirm(), Commit::Unchanged);

        let mut empty = EditableCell::new(0, "remarks", EditKind::Text, CellValue::Empty);
        empty.begin_edit();
        assert_eq!(empty.blur(), Commit::Unchanged);
    }

    #[test]
    fn test_whitespace_draft_on_empty_cell_is_unchanged() {
        let mut cell = EditableCell::new(0, "remarks", EditKind::Text, CellValue::Empty);
        cell.begin_edit();
        cell.insert_char(' ');
        cell.insert_char(' ');
        assert_eq!(cell.blur(), Commit::Unchanged);
        assert_eq!(cell.value(), &CellValue::Empty);

        let mut filled = EditableCell::new(0, "remarks", EditKind::Text, CellValue::text(Some("内推")));
        filled.begin_edit();
        filled.cursor_home();
        filled.delete();
        filled.delete();
        filled.insert_char(' ');
        assert_eq!(
            filled.confirm(),
            Commit::Changed(CellUpdate {
                row_index: 0,
                column_id: "remarks".to_string(),
                value: CellValue::Empty,
            })
        );
    }

    #[test]
    fn test_cancel_restores_original() {
        let original = CellValue::text(Some("华为"));
        let mut cell = EditableCell::new(0, "company", EditKind::Text, original.clone());
        cell.begin_edit();
        cell.cursor_home();
        cell.delete();
        cell.insert_char('中');
        assert_eq!(cell.draft().unwrap().text, "中为");
        cell.cancel();
        assert!(!cell.is_editing());
        assert_eq!(cell.value(), &original);
        cell.begin_edit();
        assert_eq!(cell.draft().unwrap().text, "华为");
    }

    #[test]
    fn test_date_draft_starts_from_date_portion() {
        let mut cell = EditableCell::new(
            0,
            "applied_at",
            EditKind::Date,
            CellValue::date(Some("2024-03-15T10:30:00Z")),
        );
        cell.begin_edit();
        assert_eq!(cell.draft().unwrap().text, "2024-03-15");
        assert_eq!(cell.blur(), Commit::Unchanged);
        assert_eq!(cell.value().as_str(), Some("2024-03-15T10:30:00Z"));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let mut cell = EditableCell::new(0, "applied_at", EditKind::Date, CellValue::Empty);
        cell.begin_edit();
        for c in "2024-13-01".chars() {
            cell.insert_char(c);
        }
        assert!(matches!(cell.confirm(), Commit::Rejected { .. }));
        assert!(!cell.is_editing());
        assert_eq!(cell.value(), &CellValue::Empty);
    }

    #[test]
    fn test_clearing_date_commits_empty() {
        let mut cell = EditableCell::new(2, "applied_at", EditKind::Date, CellValue::date(Some("2024-03-15")));
        cell.begin_edit();
        for _ in 0..10 {
            cell.backspace();
        }
        assert_eq!(
            cell.blur(),
            Commit::Changed(CellUpdate {
                row_index: 2,
                column_id: "applied_at".to_string(),
                value: CellValue::Empty,
            })
        );
    }

    #[test]
    fn test_cursor_editing_multibyte() {
        let mut cell = EditableCell::new(0, "company", EditKind::Text, CellValue::text(Some("国企")));
        cell.begin_edit();
        cell.cursor_left();
        cell.insert_char('央');
        assert_eq!(cell.draft().unwrap().text, "国央企");
        cell.cursor_end();
        cell.cursor_right();
        assert_eq!(cell.draft().unwrap().cursor, 3);
    }

    #[test]
    fn test_begin_edit_twice_keeps_draft() {
        let mut cell = EditableCell::new(0, "company", EditKind::Text, CellValue::Empty);
        assert!(cell.begin_edit());
        cell.insert_char('a');
        assert!(!cell.begin_edit());
        assert_eq!(cell.draft().unwrap().text, "a");
    }
}
