use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use jobtrack::cli::{self, Cli, Commands};
use jobtrack::config::Config;
use jobtrack::storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "jobtrack=info");
    }

    let config = Config::from_env()?;
    // The dashboard owns the terminal, so it only logs to the file
    init_logging(&config.log_file, !matches!(command, Commands::Tui));
    config.validate()?;

    match &command {
        Commands::Tui => {
            info!("Launching dashboard");
            if let Err(e) = jobtrack::tui::run_tui(&config).await {
                error!("Dashboard failed: {:#}", e);
                return Err(e);
            }
        }

        Commands::List {
            kind,
            filter,
            page,
            page_size,
            json,
        } => {
            let storage = open_storage(&config).await?;
            let output = cli::run_list(
                &storage,
                *kind,
                filter.as_deref(),
                *page,
                page_size.unwrap_or(config.table.page_size),
                config.table.long_text_max,
                *json,
            )
            .await?;
            println!("{}", output);
        }

        Commands::Add { .. } => {
            let new = command
                .new_application()
                .context("add command without application fields")?;
            let storage = open_storage(&config).await?;
            println!("{}", cli::run_add(&storage, &new).await?);
        }

        Commands::AddPosting { .. } | Commands::AddEnterprise { .. } | Commands::AddUnit { .. } => {
            let storage = open_storage(&config).await?;
            println!("{}", cli::run_add_record(&storage, &command).await?);
        }

        Commands::Set { kind, id, field, value } => {
            let storage = open_storage(&config).await?;
            println!("{}", cli::run_set(&storage, *kind, id, field, value.as_deref()).await?);
        }

        Commands::Delete { kind, ids } => {
            let storage = open_storage(&config).await?;
            println!("{}", cli::run_delete(&storage, *kind, ids).await?);
        }

        Commands::ImportAnnouncements { files } => {
            let storage = open_storage(&config).await?;
            let imported = cli::import_announcement_files(&storage, files).await?;
            println!("Imported {} new announcements", imported);
        }

        Commands::Seed => {
            let storage = open_storage(&config).await?;
            let inserted = storage.seed_demo_data().await?;
            println!("Inserted {} demo records", inserted);
        }
    }

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Storage> {
    Storage::new(config.database_path_str())
        .await
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))
}

/// File logging always; stderr logging only outside the dashboard
fn init_logging(log_file: &Path, to_stderr: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let directory = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new("jobtrack.log"));
    let file_appender = tracing_appender::rolling::never(directory, file_name);

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();
}
