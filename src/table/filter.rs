//! Global text filter applied before pagination

use super::column::ColumnSet;
use super::value::Row;

/// Case-insensitive substring filter over the rendered text of filterable columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalFilter {
    query: String,
    needle: String,
}

impl GlobalFilter {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            needle: query.to_lowercase(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        *self = Self::new(query);
    }

    pub fn push(&mut self, c: char) {
        let mut query = std::mem::take(&mut self.query);
        query.push(c);
        self.set_query(&query);
    }

    pub fn pop(&mut self) {
        let mut query = std::mem::take(&mut self.query);
        query.pop();
        self.set_query(&query);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn matches(&self, row: &Row, columns: &ColumnSet) -> bool {
        if !self.is_active() {
            return true;
        }
        columns.iter().filter(|c| c.filterable).any(|column| {
            column
                .render(row)
                .searchable_text()
                .map_or(false, |text| text.to_lowercase().contains(&self.needle))
        })
    }

    /// Indices into `rows` of the rows passing the filter, in source order
    pub fn apply(&self, rows: &[Row], columns: &ColumnSet) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| self.matches(row, columns))
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::column::{ColumnDef, EditKind};
    use crate::table::value::{CellValue, RowSchema};
    use proptest::prelude::*;

    fn columns() -> ColumnSet {
        ColumnSet::new(
            vec![
                ColumnDef::field("company", "公司"),
                ColumnDef::field("position", "职位").truncate(4),
                ColumnDef::field("applied_at", "投递时间").editable(EditKind::Date),
                ColumnDef::field("secret", "内部").not_filterable(),
            ],
            &RowSchema::new(&["company", "position", "applied_at", "secret"]),
        )
        .unwrap()
    }

    fn row(id: &str, company: &str, position: &str) -> Row {
        Row::new(id)
            .with("company", CellValue::text(Some(company)))
            .with("position", CellValue::text(Some(position)))
            .with("applied_at", CellValue::date(Some("2024-03-15T10:30:00Z")))
            .with("secret", CellValue::text(Some("hidden")))
    }

    #[test]
    fn test_case_insensitive_match() {
        let rows = vec![row("a", "Huawei", "Engineer"), row("b", "ACME", "Analyst")];
        let filter = GlobalFilter::new("huA");
        assert_eq!(filter.apply(&rows, &columns()), vec![0]);
        assert_eq!(GlobalFilter::new("acme").apply(&rows, &columns()), vec![1]);
    }

    #[test]
    fn test_matches_untruncated_text() {
        let rows = vec![row("a", "ACME", "Backend Engineer")];
        assert_eq!(GlobalFilter::new("engineer").apply(&rows, &columns()), vec![0]);
    }

    #[test]
    fn test_matches_rendered_date_only() {
        let rows = vec![row("a", "ACME", "Dev")];
        assert_eq!(GlobalFilter::new("2024-03-15").apply(&rows, &columns()), vec![0]);
        assert!(GlobalFilter::new("T10:30").apply(&rows, &columns()).is_empty());
    }

    #[test]
    fn test_skips_unfilterable_columns() {
        let rows = vec![row("a", "ACME", "Dev")];
        assert!(GlobalFilter::new("hidden").apply(&rows, &columns()).is_empty());
    }

    #[test]
    fn test_placeholders_never_match() {
        let rows = vec![Row::new("a")];
        assert!(GlobalFilter::new("-").apply(&rows, &columns()).is_empty());
    }

    #[test]
    fn test_push_and_pop() {
        let mut filter = GlobalFilter::default();
        filter.push('A');
        filter.push('b');
        assert_eq!(filter.query(), "Ab");
        filter.pop();
        assert_eq!(filter.query(), "A");
        filter.clear();
        assert!(!filter.is_active());
    }

    proptest! {
        #[test]
        fn prop_filter_selects_exact_subset(
            names in prop::collection::vec("[a-zA-Z]{0,6}", 0..20),
            query in "[a-zA-Z]{0,2}",
        ) {
            let rows: Vec<Row> = names
                .iter()
                .enumerate()
                .map(|(i, name)| Row::new(i.to_string()).with("company", CellValue::text(Some(name))))
                .collect();
            let kept = GlobalFilter::new(&query).apply(&rows, &columns());
            let expected: Vec<usize> = names
                .iter()
                .enumerate()
                .filter(|(_, name)| {
                    query.is_empty()
                        || (!name.is_empty() && name.to_lowercase().contains(&query.to_lowercase()))
                })
                .map(|(i, _)| i)
                .collect();
            prop_assert_eq!(kept, expected);
        }

        #[test]
        fn prop_empty_filter_is_identity(count in 0usize..30) {
            let rows: Vec<Row> = (0..count).map(|i| Row::new(i.to_string())).collect();
            let kept = GlobalFilter::new("").apply(&rows, &columns());
            prop_assert_eq!(kept, (0..count).collect::<Vec<_>>());
        }
    }
}
