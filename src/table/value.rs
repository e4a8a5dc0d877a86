//! Row representation shared by every table in the dashboard

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::error::TableError;

/// Tagged value held by a row field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    /// Date or date-time string, stored as received
    Date(String),
    /// Value drawn from a fixed option list
    Choice(String),
}

impl CellValue {
    pub fn text(value: Option<&str>) -> Self {
        Self::wrap(value, CellValue::Text)
    }

    pub fn date(value: Option<&str>) -> Self {
        Self::wrap(value, CellValue::Date)
    }

    pub fn choice(value: Option<&str>) -> Self {
        Self::wrap(value, CellValue::Choice)
    }

    fn wrap(value: Option<&str>, make: fn(String) -> CellValue) -> Self {
        match value {
            Some(s) if !s.is_empty() => make(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) | CellValue::Date(s) | CellValue::Choice(s) => Some(s),
        }
    }

    /// Empty or whitespace-only
    pub fn is_blank(&self) -> bool {
        self.as_str().map_or(true, |s| s.trim().is_empty())
    }

    pub fn is_date(&self) -> bool {
        matches!(self, CellValue::Date(_))
    }

    /// Same variant carrying new content; an empty string becomes `Empty`.
    pub fn replace(&self, content: &str) -> CellValue {
        match self {
            CellValue::Date(_) => CellValue::date(Some(content)),
            CellValue::Choice(_) => CellValue::choice(Some(content)),
            _ => CellValue::text(Some(content)),
        }
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) | CellValue::Date(s) | CellValue::Choice(s) => Some(s),
        }
    }
}

/// A record flattened into named fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    id: String,
    fields: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: &str, value: CellValue) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// Value of a field, `Empty` when the row does not carry it
    pub fn value(&self, field: &str) -> CellValue {
        self.fields.get(field).cloned().unwrap_or(CellValue::Empty)
    }

    /// Copy of this row with one field replaced
    pub fn with_value(&self, field: &str, value: CellValue) -> Row {
        self.clone().with(field, value)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Declared field names of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    fields: Vec<&'static str>,
}

impl RowSchema {
    pub fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| *f == field)
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }
}

/// Records that can be shown in a data table
pub trait TableRecord {
    fn row_id(&self) -> String;

    fn to_row(&self) -> Row;

    fn schema() -> RowSchema
    where
        Self: Sized;
}

pub fn to_rows<T: TableRecord>(records: &[T]) -> Vec<Row> {
    records.iter().map(TableRecord::to_row).collect()
}

/// Reject collections where two rows share an identifier
pub fn check_unique_ids(rows: &[Row]) -> Result<(), TableError> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id()) {
            return Err(TableError::DuplicateRowId(row.id().to_string()));
        }
    }
    Ok(())
}
