//! Table-specific error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Column '{column}' reads field '{field}' which is not part of the row schema")]
    UnknownField { column: String, field: String },

    #[error("Duplicate column id '{0}'")]
    DuplicateColumn(String),

    #[error("Select column '{0}' declares no options")]
    EmptyOptions(String),

    #[error("Duplicate row id '{0}'")]
    DuplicateRowId(String),

    #[error("Unsupported page size {0}. Supported sizes: 5, 10, 25, 50")]
    InvalidPageSize(usize),
}

/// Failure of a single cell accessor. Contained to the cell that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CellError {
    #[error("Field '{0}' has an unexpected value")]
    BadValue(String),

    #[error("{0}")]
    Custom(String),
}
