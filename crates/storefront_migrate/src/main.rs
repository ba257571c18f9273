//! Migrate the legacy storefront database into the document store.
//!
//! Takes no arguments; see [`storefront_migrate::MigrationConfig`] for the
//! environment variables it reads.

use std::path::Path;
use std::process::ExitCode;

use storefront_migrate::{MigrationConfig, migrate};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "storefront_migrate=info,storefront_db=info,warn";

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let config = match MigrationConfig::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            return ExitCode::from(1);
        }
    };

    let _guard = init_tracing(config.log_dir.as_deref());

    let report = match migrate(&config).await {
        Ok(report) => report,
        Err(e) => {
            error!("Migration aborted: {}", e);
            eprintln!("{:?}", miette::Report::new(e));
            return ExitCode::from(1);
        }
    };

    if let Some(path) = &config.report_path {
        if let Err(e) = report.write_to(path).await {
            warn!("{}", e);
        }
    }

    info!(passes_failed = report.failed_passes().count(), "Done");
    ExitCode::SUCCESS
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Terminal logging, plus a daily rolling file when a log directory is set.
/// The returned guard must live until exit so buffered lines get flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let terminal_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(env_filter());

    let mut setup_error = None;
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).ok();
            match RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("storefront-migrate")
                .filename_suffix("log")
                .build(dir)
            {
                Ok(appender) => {
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                    let layer = fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking)
                        .with_filter(env_filter());
                    (Some(layer), Some(guard))
                }
                Err(e) => {
                    setup_error = Some(format!(
                        "Could not open log file in {}: {}",
                        dir.display(),
                        e
                    ));
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(terminal_layer)
        .with(file_layer)
        .init();

    if let Some(message) = setup_error {
        warn!("{}", message);
    } else if let Some(dir) = log_dir {
        info!("Logs are also being written to {}", dir.display());
    }

    guard
}
