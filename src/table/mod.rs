//! Generic data table
//!
//! UI-agnostic core shared by every list screen: column model, filtering,
//! pagination, row selection, inline cell editing and drag reordering.

pub mod column;
pub mod edit;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod reorder;
pub mod selection;
pub mod value;
pub mod view;

pub use column::{CellContent, ColumnDef, ColumnSet, EditKind, Presentation, SelectOption};
pub use edit::{CellUpdate, Commit, EditableCell};
pub use error::{CellError, TableError};
pub use filter::GlobalFilter;
pub use pagination::{Pagination, PAGE_SIZE_OPTIONS};
pub use reorder::{order_changes, DragReorder, OrderChange};
pub use selection::{CheckState, RowSelection};
pub use value::{CellValue, Row, RowSchema, TableRecord};
pub use view::{render_table, TableEvent, TableProps, TableView};
