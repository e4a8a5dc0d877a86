pub mod cli;
pub mod columns;
pub mod config;
pub mod models;
pub mod storage;
pub mod table;
pub mod tui;
