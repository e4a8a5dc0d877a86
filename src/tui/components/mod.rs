//! Reusable widgets shared by the dashboard screens

pub mod data_table;
pub mod input_bar;
pub mod status_display;

pub use data_table::{DataTableState, TableInput};
pub use input_bar::{InputBar, InputOutcome};
pub use status_display::{StatusDisplay, StatusType};
