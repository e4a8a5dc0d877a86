//! Table renderer
//!
//! Builds the page-level view model from rows and columns: filter first,
//! then paginate, then project each visible row through the column set.
//! Nothing here mutates the rows it is given; user actions come back to the
//! host as [`TableEvent`]s.

use serde::Serialize;

use super::column::{CellContent, ColumnSet};
use super::edit::CellUpdate;
use super::filter::GlobalFilter;
use super::pagination::{PageSummary, Pagination};
use super::selection::{CheckState, RowSelection};
use super::value::Row;

/// Literal body shown when no row survives filtering
pub const NO_RESULTS: &str = "No results found.";

/// Inputs of one render pass
pub struct TableProps<'a> {
    pub rows: &'a [Row],
    pub columns: &'a ColumnSet,
    pub pagination: &'a Pagination,
    pub filter: &'a GlobalFilter,
    /// `Some` enables the checkbox column
    pub selection: Option<&'a RowSelection>,
    /// Adds the drag handle column
    pub reorderable: bool,
}

impl<'a> TableProps<'a> {
    pub fn new(
        rows: &'a [Row],
        columns: &'a ColumnSet,
        pagination: &'a Pagination,
        filter: &'a GlobalFilter,
    ) -> Self {
        Self {
            rows,
            columns,
            pagination,
            filter,
            selection: None,
            reorderable: false,
        }
    }

    pub fn with_selection(mut self, selection: &'a RowSelection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }
}

/// Actions reported back to the hosting screen
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// Row clicked or activated from the keyboard
    RowActivated { row_id: String, source_index: usize },
    SelectionChanged(RowSelection),
    /// Full row collection in its new order
    Reordered(Vec<Row>),
    CellCommitted(CellUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub column_id: String,
    pub label: String,
    pub width: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewCell {
    pub column_id: String,
    pub content: CellContent,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewRow {
    pub row_id: String,
    /// Index of the row in the unfiltered source collection
    pub source_index: usize,
    /// `None` when selection is disabled
    pub selected: Option<bool>,
    pub cells: Vec<ViewCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableBody {
    Rows(Vec<ViewRow>),
    /// Single placeholder row spanning every column
    Empty { colspan: usize, message: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    /// Rows left after filtering
    pub filtered_total: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<HeaderCell>,
    pub body: TableBody,
    pub page: PageInfo,
    /// Header checkbox state, `None` when selection is disabled
    pub select_all: Option<CheckState>,
    pub reorderable: bool,
}

impl TableView {
    pub fn rows(&self) -> &[ViewRow] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            TableBody::Empty { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, TableBody::Empty { .. })
    }

    /// Ids of the rows on the current page, in display order
    pub fn page_ids(&self) -> Vec<&str> {
        self.rows().iter().map(|r| r.row_id.as_str()).collect()
    }

    pub fn summary(&self) -> Option<PageSummary> {
        let first_row = self.page.page_index * self.page.page_size + 1;
        let shown = self.rows().len();
        (shown > 0).then(|| PageSummary {
            first_row,
            last_row: first_row + shown - 1,
            total: self.page.filtered_total,
        })
    }

    /// `Showing A to B of N entries`
    pub fn showing_text(&self) -> String {
        match self.summary() {
            Some(s) => format!("Showing {} to {} of {} entries", s.first_row, s.last_row, s.total),
            None => "Showing 0 entries".to_string(),
        }
    }

    /// `Page X of Y`
    pub fn page_text(&self) -> String {
        format!(
            "Page {} of {}",
            self.page.page_index + 1,
            self.page.page_count.max(1)
        )
    }
}

/// Render the current page
pub fn render_table(props: &TableProps<'_>) -> TableView {
    let columns = props.columns;
    let visible = props.filter.apply(props.rows, columns);
    let total = visible.len();

    let mut pagination = *props.pagination;
    pagination.clamp(total);
    let range = pagination.page_range(total);

    let rows: Vec<ViewRow> = visible[range]
        .iter()
        .map(|&source_index| {
            let row = &props.rows[source_index];
            let row_id = row.id().to_string();
            ViewRow {
                selected: props.selection.map(|s| s.is_selected(&row_id)),
                row_id,
                source_index,
                cells: columns
                    .iter()
                    .map(|column| ViewCell {
                        column_id: column.id.clone(),
                        content: column.render(row),
                        editable: column.is_editable(),
                    })
                    .collect(),
            }
        })
        .collect();

    let select_all = props.selection.map(|selection| {
        let ids: Vec<&str> = rows.iter().map(|r| r.row_id.as_str()).collect();
        selection.page_state(&ids)
    });

    let body = if rows.is_empty() {
        TableBody::Empty {
            colspan: columns.len()
                + usize::from(props.selection.is_some())
                + usize::from(props.reorderable),
            message: NO_RESULTS,
        }
    } else {
        TableBody::Rows(rows)
    };

    TableView {
        headers: columns
            .iter()
            .map(|c| HeaderCell {
                column_id: c.id.clone(),
                label: c.header.clone(),
                width: c.width,
            })
            .collect(),
        body,
        page: PageInfo {
            page_index: pagination.page_index(),
            page_count: pagination.page_count(total),
            page_size: pagination.page_size(),
            filtered_total: total,
            can_previous: pagination.can_previous(),
            can_next: pagination.can_next(total),
        },
        select_all,
        reorderable: props.reorderable,
    }
}

/// New row collection with a committed edit applied.
/// An out-of-range index leaves the collection unchanged.
pub fn apply_cell_update(rows: &[Row], update: &CellUpdate) -> Vec<Row> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if i == update.row_index {
                row.with_value(&update.column_id, update.value.clone())
            } else {
                row.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::{ColumnDef, EditKind, FAILED};
    use crate::table::error::CellError;
    use crate::table::value::{CellValue, RowSchema};

    fn columns() -> ColumnSet {
        ColumnSet::new(
            vec![
                ColumnDef::field("company", "公司"),
                ColumnDef::field("status", "状态")
                    .editable(EditKind::select_from(&["未投递", "已投递", "面试"])),
                ColumnDef::computed("check", "校验", |row| match row.value("company").as_str() {
                    Some("broken") => Err(CellError::BadValue("company".into())),
                    _ => Ok("ok".to_string()),
                }),
            ],
            &RowSchema::new(&["company", "status"]),
        )
        .unwrap()
    }

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| {
                Row::new(format!("r{}", i))
                    .with("company", CellValue::text(Some(&format!("Company {}", i))))
                    .with("status", CellValue::choice(Some("未投递")))
            })
            .collect()
    }

    #[test]
    fn test_first_page() {
        let data = rows(12);
        let columns = columns();
        let pagination = Pagination::new(5).unwrap();
        let filter = GlobalFilter::default();
        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter));

        assert_eq!(view.page_ids(), vec!["r0", "r1", "r2", "r3", "r4"]);
        assert_eq!(view.page.page_count, 3);
        assert!(!view.page.can_previous);
        assert!(view.page.can_next);
        assert_eq!(view.showing_text(), "Showing 1 to 5 of 12 entries");
        assert_eq!(view.page_text(), "Page 1 of 3");
        assert_eq!(view.select_all, None);
        assert_eq!(view.headers.len(), 3);
    }

    #[test]
    fn test_filter_runs_before_pagination() {
        let data = rows(30);
        let columns = columns();
        let mut pagination = Pagination::new(5).unwrap();
        pagination.last(30);
        let filter = GlobalFilter::new("company 2");
        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter));

        // "Company 2" and "Company 20".."Company 29"
        assert_eq!(view.page.filtered_total, 11);
        assert_eq!(view.page.page_index, 2);
        assert_eq!(view.page_ids(), vec!["r29"]);
        assert_eq!(view.rows()[0].source_index, 29);
        assert_eq!(view.showing_text(), "Showing 11 to 11 of 11 entries");
    }

    #[test]
    fn test_empty_state_spans_all_columns() {
        let data = rows(3);
        let columns = columns();
        let pagination = Pagination::default();
        let filter = GlobalFilter::new("nothing matches");
        let selection = RowSelection::new();
        let view = render_table(
            &TableProps::new(&data, &columns, &pagination, &filter)
                .with_selection(&selection)
                .reorderable(true),
        );

        assert!(view.is_empty());
        assert_eq!(
            view.body,
            TableBody::Empty {
                colspan: 5,
                message: NO_RESULTS
            }
        );
        assert_eq!(view.select_all, Some(CheckState::Unchecked));
        assert_eq!(view.showing_text(), "Showing 0 entries");
    }

    #[test]
    fn test_selection_state_for_visible_page() {
        let data = rows(4);
        let columns = columns();
        let pagination = Pagination::new(5).unwrap();
        let filter = GlobalFilter::default();
        let mut selection = RowSelection::new();
        selection.set("r1", true);

        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter).with_selection(&selection));
        assert_eq!(view.select_all, Some(CheckState::Indeterminate));
        assert_eq!(view.rows()[1].selected, Some(true));
        assert_eq!(view.rows()[0].selected, Some(false));

        selection.toggle_all(&view.page_ids());
        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter).with_selection(&selection));
        assert_eq!(view.select_all, Some(CheckState::Checked));
    }

    #[test]
    fn test_failing_column_does_not_break_table() {
        let mut data = rows(2);
        data[1] = data[1].with_value("company", CellValue::text(Some("broken")));
        let columns = columns();
        let pagination = Pagination::default();
        let filter = GlobalFilter::default();
        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter));

        assert_eq!(view.rows().len(), 2);
        assert_eq!(view.rows()[0].cells[2].content.display_text(), "ok");
        assert_eq!(view.rows()[1].cells[2].content.display_text(), FAILED);
        assert!(view.rows()[1].cells[1].editable);
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let data = rows(3);
        let columns = columns();
        let mut pagination = Pagination::new(5).unwrap();
        pagination.last(50);
        let filter = GlobalFilter::default();
        let view = render_table(&TableProps::new(&data, &columns, &pagination, &filter));
        assert_eq!(view.page.page_index, 0);
        assert_eq!(view.page_ids(), vec!["r0", "r1", "r2"]);
    }

    #[test]
    fn test_apply_cell_update_returns_new_rows() {
        let data = rows(2);
        let update = CellUpdate {
            row_index: 1,
            column_id: "status".to_string(),
            value: CellValue::choice(Some("已投递")),
        };
        let updated = apply_cell_update(&data, &update);
        assert_eq!(updated[1].value("status").as_str(), Some("已投递"));
        assert_eq!(data[1].value("status").as_str(), Some("未投递"));
        assert_eq!(updated[0], data[0]);
    }
}
