//! Declarative column model and per-cell display rules

use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::error::{CellError, TableError};
use super::value::{CellValue, Row, RowSchema};

/// Placeholder for an empty editable cell
pub const EDIT_HINT: &str = "双击编辑...";
/// Placeholder for an absent read-only value
pub const ABSENT: &str = "-";
/// Shown in place of a cell whose accessor failed
pub const FAILED: &str = "⚠";

type ComputeFn = Arc<dyn Fn(&Row) -> Result<String, CellError> + Send + Sync>;

/// How a column obtains its value from a row
#[derive(Clone)]
pub enum Accessor {
    Field(String),
    Computed(ComputeFn),
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Accessor::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Read-only rendering style
#[derive(Debug, Clone, PartialEq)]
pub enum Presentation {
    Plain,
    Badge,
    /// Shows a fixed label; the target is available through disclosure
    Link { label: &'static str },
    Date,
    /// Date that is highlighted once it lies in the past
    Deadline,
    /// Comma-separated list, showing at most `max_shown` entries
    Tags { max_shown: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Edit-mode type of a column
#[derive(Debug, Clone, PartialEq)]
pub enum EditKind {
    Text,
    Date,
    Select(Vec<SelectOption>),
}

impl EditKind {
    /// Select kind whose labels equal their values
    pub fn select_from(values: &[&str]) -> Self {
        EditKind::Select(values.iter().map(|v| SelectOption::new(v, v)).collect())
    }

    pub fn options(&self) -> &[SelectOption] {
        match self {
            EditKind::Select(options) => options,
            _ => &[],
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, EditKind::Select(_))
    }
}

/// One column of a table
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub id: String,
    pub header: String,
    pub accessor: Accessor,
    pub presentation: Presentation,
    pub edit: Option<EditKind>,
    pub max_len: Option<usize>,
    pub width: u16,
    pub filterable: bool,
}

impl ColumnDef {
    /// Column reading a row field of the same name
    pub fn field(id: &str, header: &str) -> Self {
        Self {
            id: id.to_string(),
            header: header.to_string(),
            accessor: Accessor::Field(id.to_string()),
            presentation: Presentation::Plain,
            edit: None,
            max_len: None,
            width: 12,
            filterable: true,
        }
    }

    pub fn computed<F>(id: &str, header: &str, compute: F) -> Self
    where
        F: Fn(&Row) -> Result<String, CellError> + Send + Sync + 'static,
    {
        Self {
            accessor: Accessor::Computed(Arc::new(compute)),
            ..Self::field(id, header)
        }
    }

    pub fn editable(mut self, kind: EditKind) -> Self {
        self.edit = Some(kind);
        self
    }

    pub fn presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn truncate(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn not_filterable(mut self) -> Self {
        self.filterable = false;
        self
    }

    pub fn is_editable(&self) -> bool {
        self.edit.is_some()
    }

    /// Raw value behind the cell
    pub fn value(&self, row: &Row) -> Result<CellValue, CellError> {
        match &self.accessor {
            Accessor::Field(field) => Ok(row.value(field)),
            Accessor::Computed(compute) => compute(row).map(|s| CellValue::text(Some(&s))),
        }
    }

    /// Display content of the cell. Accessor failures stay inside the cell.
    pub fn render(&self, row: &Row) -> CellContent {
        match self.value(row) {
            Ok(value) => self.display(&value),
            Err(e) => {
                tracing::debug!("Column '{}' failed on row {}: {}", self.id, row.id(), e);
                CellContent::Failed(e.to_string())
            }
        }
    }

    /// Display-mode content for a value of this column
    pub fn display(&self, value: &CellValue) -> CellContent {
        if value.is_blank() {
            return if self.is_editable() {
                CellContent::EditHint
            } else {
                CellContent::Absent
            };
        }
        let raw = value.as_str().unwrap_or_default();

        if let Presentation::Link { label } = self.presentation {
            return CellContent::Value {
                text: label.to_string(),
                full_text: Some(raw.to_string()),
            };
        }

        if self.is_date_like(value) {
            return CellContent::Value {
                text: date_portion(raw.trim()),
                full_text: None,
            };
        }

        let shown = match self.presentation {
            Presentation::Tags { max_shown } => tag_summary(raw, max_shown),
            _ => raw.to_string(),
        };

        match self.max_len {
            Some(max) => {
                let (text, truncated) = truncate_text(&shown, max);
                CellContent::Value {
                    text,
                    full_text: truncated.then(|| raw.to_string()),
                }
            }
            None if shown != raw => CellContent::Value {
                text: shown,
                full_text: Some(raw.to_string()),
            },
            None => CellContent::Value {
                text: shown,
                full_text: None,
            },
        }
    }

    fn is_date_like(&self, value: &CellValue) -> bool {
        value.is_date()
            || matches!(self.edit, Some(EditKind::Date))
            || matches!(self.presentation, Presentation::Date | Presentation::Deadline)
            || value.as_str().map_or(false, |s| looks_like_datetime(s.trim()))
    }
}

/// Rendered cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Value {
        text: String,
        /// Full text when the display is shortened
        full_text: Option<String>,
    },
    Absent,
    EditHint,
    Failed(String),
}

impl CellContent {
    pub fn display_text(&self) -> &str {
        match self {
            CellContent::Value { text, .. } => text,
            CellContent::Absent => ABSENT,
            CellContent::EditHint => EDIT_HINT,
            CellContent::Failed(_) => FAILED,
        }
    }

    /// Text matched by the global filter
    pub fn searchable_text(&self) -> Option<&str> {
        match self {
            CellContent::Value {
                full_text: Some(full),
                ..
            } => Some(full),
            CellContent::Value { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Full text available for on-demand disclosure
    pub fn disclosure(&self) -> Option<&str> {
        match self {
            CellContent::Value { full_text, .. } => full_text.as_deref(),
            CellContent::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, CellContent::Absent | CellContent::EditHint)
    }
}

/// Validated, ordered column list of one screen
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<ColumnDef>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDef>, schema: &RowSchema) -> Result<Self, TableError> {
        let mut ids = HashSet::new();
        for column in &columns {
            if !ids.insert(column.id.as_str()) {
                return Err(TableError::DuplicateColumn(column.id.clone()));
            }
            if let Accessor::Field(field) = &column.accessor {
                if !schema.contains(field) {
                    return Err(TableError::UnknownField {
                        column: column.id.clone(),
                        field: field.clone(),
                    });
                }
            }
            if let Some(EditKind::Select(options)) = &column.edit {
                if options.is_empty() {
                    return Err(TableError::EmptyOptions(column.id.clone()));
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDef> {
        self.columns.get(index)
    }

    pub fn by_id(&self, id: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.id == id)
    }
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid date pattern"))
}

fn datetime_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|[+-]\d{2}:?\d{2})?)?$")
            .expect("valid datetime pattern")
    })
}

/// Whole string is a date or date-time
pub fn looks_like_datetime(s: &str) -> bool {
    datetime_pattern().is_match(s)
}

/// Date part of a date-like string: the first `YYYY-MM-DD` found, otherwise
/// the first 10 characters.
pub fn date_portion(s: &str) -> String {
    match date_pattern().find(s) {
        Some(m) => m.as_str().to_string(),
        None => s.chars().take(10).collect(),
    }
}

/// Shorten `content` to `max` characters plus an ellipsis.
/// Returns the display text and whether it was shortened.
pub fn truncate_text(content: &str, max: usize) -> (String, bool) {
    if content.chars().count() > max {
        let head: String = content.chars().take(max).collect();
        (format!("{}...", head), true)
    } else {
        (content.to_string(), false)
    }
}

/// Split a comma-separated tag list
pub fn split_tags(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
}

fn tag_summary(raw: &str, max_shown: usize) -> String {
    let tags = split_tags(raw);
    let mut shown = tags.iter().take(max_shown).copied().collect::<Vec<_>>().join(" · ");
    if tags.len() > max_shown {
        shown.push_str(&format!(" +{}", tags.len() - max_shown));
    }
    shown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> RowSchema {
        RowSchema::new(&["company", "status", "applied_at", "remarks", "tags", "url"])
    }

    #[test]
    fn test_datetime_displays_date_only() {
        let column = ColumnDef::field("applied_at", "投递时间").editable(EditKind::Date);
        let content = column.display(&CellValue::Date("2024-03-15T10:30:00Z".to_string()));
        assert_eq!(content.display_text(), "2024-03-15");
    }

    #[test]
    fn test_date_portion_fallback_truncates() {
        assert_eq!(date_portion("截止 2024-03-15 17:00"), "2024-03-15");
        assert_eq!(date_portion("2024/03/15 10:30"), "2024/03/15");
        assert_eq!(date_portion("soon"), "soon");
    }

    #[test]
    fn test_plain_text_with_embedded_date_is_not_reformatted() {
        let column = ColumnDef::field("remarks", "备注").editable(EditKind::Text);
        let content = column.display(&CellValue::text(Some("面试 2024-03-15 下午")));
        assert_eq!(content.display_text(), "面试 2024-03-15 下午");

        let content = column.display(&CellValue::text(Some("2024-03-15 10:30")));
        assert_eq!(content.display_text(), "2024-03-15");
    }

    #[test]
    fn test_placeholders_differ_by_editability() {
        let editable = ColumnDef::field("remarks", "备注").editable(EditKind::Text);
        let readonly = ColumnDef::field("remarks", "备注");
        assert_eq!(editable.display(&CellValue::Empty), CellContent::EditHint);
        assert_eq!(readonly.display(&CellValue::text(Some("  "))), CellContent::Absent);
        assert_eq!(CellContent::EditHint.display_text(), EDIT_HINT);
        assert_eq!(CellContent::Absent.display_text(), ABSENT);
    }

    #[test]
    fn test_long_text_truncated_with_disclosure() {
        let column = ColumnDef::field("remarks", "备注").truncate(5);
        let content = column.display(&CellValue::text(Some("一二三四五六七")));
        assert_eq!(content.display_text(), "一二三四五...");
        assert_eq!(content.disclosure(), Some("一二三四五六七"));

        let short = column.display(&CellValue::text(Some("一二三")));
        assert_eq!(short.display_text(), "一二三");
        assert_eq!(short.disclosure(), None);
    }

    #[test]
    fn test_tags_summary() {
        let column = ColumnDef::field("tags", "标签").presentation(Presentation::Tags { max_shown: 3 });
        let content = column.display(&CellValue::text(Some("国企, 校招,北京, 技术,")));
        assert_eq!(content.display_text(), "国企 · 校招 · 北京 +1");
        assert_eq!(content.searchable_text(), Some("国企, 校招,北京, 技术,"));
    }

    #[test]
    fn test_link_shows_label() {
        let column = ColumnDef::field("url", "链接").presentation(Presentation::Link { label: "查看" });
        let content = column.display(&CellValue::text(Some("https://example.com/a")));
        assert_eq!(content.display_text(), "查看");
        assert_eq!(content.disclosure(), Some("https://example.com/a"));
    }

    #[test]
    fn test_failing_accessor_contained_to_cell() {
        let column = ColumnDef::computed("broken", "坏列", |_| Err(CellError::Custom("boom".into())));
        let row = Row::new("a");
        assert_eq!(column.render(&row), CellContent::Failed("boom".to_string()));
        assert_eq!(column.render(&row).display_text(), FAILED);
    }

    #[test]
    fn test_column_set_validates_schema() {
        let err = ColumnSet::new(vec![ColumnDef::field("salary", "薪资")], &schema()).unwrap_err();
        assert_eq!(
            err,
            TableError::UnknownField {
                column: "salary".to_string(),
                field: "salary".to_string()
            }
        );

        let err = ColumnSet::new(
            vec![ColumnDef::field("company", "公司"), ColumnDef::field("company", "公司")],
            &schema(),
        )
        .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("company".to_string()));

        let err = ColumnSet::new(
            vec![ColumnDef::field("status", "状态").editable(EditKind::Select(vec![]))],
            &schema(),
        )
        .unwrap_err();
        assert_eq!(err, TableError::EmptyOptions("status".to_string()));

        let computed = ColumnDef::computed("links", "链接", |_| Ok(String::new()));
        assert!(ColumnSet::new(vec![ColumnDef::field("company", "公司"), computed], &schema()).is_ok());
    }
}
