use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::columns::{
    announcement_columns, application_columns, enterprise_columns, posting_columns, regulatory_unit_columns,
};
use crate::models::{
    AnnouncementImport, Enterprise, JobPosting, NewApplication, RegulatoryUnit, DEFAULT_PRIORITY, DEFAULT_STATUS,
};
use crate::storage::{RecordTable, Storage, TrackerStore};
use crate::table::value::{check_unique_ids, to_rows};
use crate::table::{render_table, ColumnSet, GlobalFilter, Pagination, Row, TableProps, TableView};
use crate::tui::ui::fit_width;

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job applications, postings and recruitment announcements from the terminal")]
#[command(version)]
pub struct Cli {
    /// Defaults to `tui` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard
    Tui,

    /// Print one filtered page of a table
    List {
        /// Table to print
        #[arg(value_enum)]
        kind: ListKind,

        /// Case-insensitive text filter across visible columns
        #[arg(short, long)]
        filter: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Rows per page (5, 10, 25 or 50)
        #[arg(long)]
        page_size: Option<usize>,

        /// Print JSON instead of a text table
        #[arg(long)]
        json: bool,
    },

    /// Add a tracked application
    Add {
        #[arg(short, long)]
        company: String,

        #[arg(long)]
        position: Option<String>,

        #[arg(short, long, default_value = DEFAULT_STATUS)]
        status: String,

        #[arg(long, default_value = DEFAULT_PRIORITY)]
        priority: String,

        #[arg(long)]
        progress: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        /// Application date (YYYY-MM-DD)
        #[arg(long)]
        applied_at: Option<String>,

        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,

        #[arg(long)]
        referral_code: Option<String>,

        #[arg(long)]
        remarks: Option<String>,

        #[arg(long)]
        apply_url: Option<String>,
    },

    /// Add a published application form
    AddPosting {
        #[arg(short, long)]
        company: String,

        #[arg(long)]
        position: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        /// Comma separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Recruitment batch, e.g. 2025秋招
        #[arg(long)]
        batch: Option<String>,

        #[arg(long)]
        location: Option<String>,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        apply_url: Option<String>,

        #[arg(long)]
        announcement_url: Option<String>,
    },

    /// Add an enterprise to the directory
    AddEnterprise {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Regulatory unit id or name
        #[arg(long)]
        unit: Option<String>,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Add a regulatory unit to the directory
    AddUnit {
        #[arg(short, long)]
        name: String,

        /// e.g. 中央 or 地方
        #[arg(long)]
        level: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Set one field of a record; omit the value to clear it
    Set {
        #[arg(value_enum)]
        kind: ListKind,

        id: String,

        field: String,

        value: Option<String>,
    },

    /// Delete records by id
    Delete {
        #[arg(value_enum)]
        kind: ListKind,

        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Import crawler output: JSON arrays of {title, url, publish_date, source, category}
    ImportAnnouncements {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Insert demo data into empty tables
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Applications,
    Postings,
    Announcements,
    Enterprises,
    Units,
}

impl ListKind {
    /// `None` for my applications, which have their own store operations
    pub fn record_table(&self) -> Option<RecordTable> {
        match self {
            ListKind::Applications => None,
            ListKind::Postings => Some(RecordTable::Postings),
            ListKind::Announcements => Some(RecordTable::Announcements),
            ListKind::Enterprises => Some(RecordTable::Enterprises),
            ListKind::Units => Some(RecordTable::RegulatoryUnits),
        }
    }
}

/// Column set and rows of one table
pub async fn load_table(storage: &Storage, kind: ListKind, long_text_max: usize) -> Result<(ColumnSet, Vec<Row>)> {
    let table = match kind {
        ListKind::Applications => (
            application_columns(long_text_max)?,
            to_rows(&storage.list_applications().await?),
        ),
        ListKind::Postings => (posting_columns(long_text_max)?, to_rows(&storage.list_postings().await?)),
        ListKind::Announcements => (
            announcement_columns(long_text_max)?,
            to_rows(&storage.list_announcements().await?),
        ),
        ListKind::Enterprises => (
            enterprise_columns(long_text_max)?,
            to_rows(&storage.list_enterprises().await?),
        ),
        ListKind::Units => (
            regulatory_unit_columns(long_text_max)?,
            to_rows(&storage.list_regulatory_units().await?),
        ),
    };
    check_unique_ids(&table.1)?;
    Ok(table)
}

/// The page the dashboard would show for these settings. `page` starts at 1
/// and is clamped to the last page.
pub fn page_view(columns: &ColumnSet, rows: &[Row], filter: &str, page: usize, page_size: usize) -> Result<TableView> {
    let filter = GlobalFilter::new(filter);
    let mut pagination = Pagination::new(page_size)?;
    let total = filter.apply(rows, columns).len();
    for _ in 1..page.min(pagination.page_count(total).max(1)) {
        pagination.next(total);
    }
    Ok(render_table(&TableProps::new(rows, columns, &pagination, &filter)))
}

/// Text rendering of a page: header, one line per row, footer
pub fn format_page(view: &TableView) -> String {
    let mut lines = Vec::new();
    let header: Vec<String> = view
        .headers
        .iter()
        .map(|h| fit_width(&h.label, usize::from(h.width)))
        .collect();
    lines.push(header.join(" ").trim_end().to_string());
    lines.push("-".repeat(view.headers.iter().map(|h| usize::from(h.width) + 1).sum::<usize>()));

    if view.is_empty() {
        lines.push(crate::table::view::NO_RESULTS.to_string());
    }
    for row in view.rows() {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&view.headers)
            .map(|(cell, h)| fit_width(cell.content.display_text(), usize::from(h.width)))
            .collect();
        lines.push(cells.join(" ").trim_end().to_string());
    }

    lines.push(String::new());
    lines.push(format!("{} · {}", view.showing_text(), view.page_text()));
    lines.join("\n")
}

/// JSON rendering of a page; cells carry the full text when truncated
pub fn page_json(view: &TableView) -> Value {
    let rows: Vec<Value> = view
        .rows()
        .iter()
        .map(|row| {
            let cells: serde_json::Map<String, Value> = row
                .cells
                .iter()
                .map(|cell| {
                    let text = cell
                        .content
                        .searchable_text()
                        .map_or(Value::Null, |t| Value::String(t.to_string()));
                    (cell.column_id.clone(), text)
                })
                .collect();
            json!({ "id": row.row_id, "cells": cells })
        })
        .collect();
    json!({
        "columns": view.headers,
        "page": view.page,
        "rows": rows,
    })
}

pub async fn run_list(
    storage: &Storage,
    kind: ListKind,
    filter: Option<&str>,
    page: usize,
    page_size: usize,
    long_text_max: usize,
    as_json: bool,
) -> Result<String> {
    let (columns, rows) = load_table(storage, kind, long_text_max).await?;
    let view = page_view(&columns, &rows, filter.unwrap_or_default(), page, page_size)?;
    if as_json {
        Ok(serde_json::to_string_pretty(&page_json(&view))?)
    } else {
        Ok(format_page(&view))
    }
}

/// Read and import every file; returns how many announcements were new
pub async fn import_announcement_files(storage: &Storage, files: &[PathBuf]) -> Result<usize> {
    let mut imported = 0;
    for file in files {
        let content = std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
        let items: Vec<AnnouncementImport> = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a JSON array of announcements", file.display()))?;
        let added = storage.import_announcements(&items).await?;
        info!("Imported {} of {} announcements from {}", added, items.len(), file.display());
        imported += added;
    }
    Ok(imported)
}

impl Commands {
    /// Application fields of an `add` command
    pub fn new_application(&self) -> Option<NewApplication> {
        match self {
            Commands::Add {
                company,
                position,
                status,
                priority,
                progress,
                location,
                industry,
                applied_at,
                tags,
                referral_code,
                remarks,
                apply_url,
            } => Some(NewApplication {
                company: company.trim().to_string(),
                position: position.clone(),
                status: status.clone(),
                priority: priority.clone(),
                progress: progress.clone(),
                location: location.clone(),
                industry: industry.clone(),
                applied_at: applied_at.clone(),
                tags: tags.clone(),
                referral_code: referral_code.clone(),
                remarks: remarks.clone(),
                apply_url: apply_url.clone(),
            }),
            _ => None,
        }
    }
}

/// Set or clear one field of any record
pub async fn run_set(storage: &Storage, kind: ListKind, id: &str, field: &str, value: Option<&str>) -> Result<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty());
    match kind.record_table() {
        None => {
            storage
                .update_application_field(id, field, value)
                .await
                .with_context(|| format!("Failed to update {} of {}", field, id))?;
        }
        Some(table) => {
            storage
                .update_record_field(table, id, field, value)
                .await
                .with_context(|| format!("Failed to update {} of {}", field, id))?;
        }
    }
    Ok(match value {
        Some(value) => format!("Set {} of {} to {}", field, id, value),
        None => format!("Cleared {} of {}", field, id),
    })
}

pub async fn run_delete(storage: &Storage, kind: ListKind, ids: &[String]) -> Result<String> {
    let removed = match kind.record_table() {
        None => storage.delete_applications(ids).await?,
        Some(table) => storage.delete_records(table, ids).await?,
    };
    if (removed as usize) < ids.len() {
        warn!("{} of {} ids were not found", ids.len() - removed as usize, ids.len());
    }
    Ok(format!("Deleted {} records", removed))
}

/// Add a posting, enterprise or unit from an `add-*` command
pub async fn run_add_record(storage: &Storage, command: &Commands) -> Result<String> {
    match command {
        Commands::AddPosting {
            company,
            position,
            industry,
            tags,
            batch,
            location,
            deadline,
            apply_url,
            announcement_url,
        } => {
            anyhow::ensure!(!company.trim().is_empty(), "Company name must not be empty");
            let posting = JobPosting {
                position: position.clone(),
                industry: industry.clone(),
                tags: tags.clone(),
                batch: batch.clone(),
                location: location.clone(),
                deadline: deadline.clone(),
                apply_url: apply_url.clone(),
                announcement_url: announcement_url.clone(),
                ..JobPosting::new(company.trim())
            };
            storage.insert_posting(&posting).await?;
            Ok(format!("Added posting {} ({})", posting.id, posting.company_name))
        }
        Commands::AddEnterprise {
            name,
            website,
            category,
            unit,
            comment,
        } => {
            anyhow::ensure!(!name.trim().is_empty(), "Enterprise name must not be empty");
            let regulatory_unit_id = match unit {
                Some(key) => Some(
                    storage
                        .find_regulatory_unit(key)
                        .await?
                        .with_context(|| format!("No regulatory unit named {}", key))?
                        .id,
                ),
                None => None,
            };
            let enterprise = Enterprise {
                website: website.clone(),
                category: category.clone(),
                regulatory_unit_id,
                comment: comment.clone(),
                ..Enterprise::new(name.trim())
            };
            storage.insert_enterprise(&enterprise).await?;
            Ok(format!("Added enterprise {} ({})", enterprise.id, enterprise.name))
        }
        Commands::AddUnit {
            name,
            level,
            description,
        } => {
            anyhow::ensure!(!name.trim().is_empty(), "Unit name must not be empty");
            let unit = RegulatoryUnit {
                level: level.clone(),
                description: description.clone(),
                ..RegulatoryUnit::new(name.trim())
            };
            storage.insert_regulatory_unit(&unit).await?;
            Ok(format!("Added regulatory unit {} ({})", unit.id, unit.name))
        }
        _ => anyhow::bail!("not an add-posting, add-enterprise or add-unit command"),
    }
}

/// Add an application from the command line
pub async fn run_add(storage: &Storage, new: &NewApplication) -> Result<String> {
    let app = storage
        .add_application(new)
        .await
        .context("Failed to add application")?;
    Ok(format!("Added application {} ({})", app.id, app.company))
}
