use crate::modules::logger::{parse_log_level, LocalTimer};
use crate::modules::settings::cli::SETTINGS;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

pub static LOG_WORKER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub fn setup_file_logger() -> Result<(), tracing::dispatcher::SetGlobalDefaultError> {
    let level = parse_log_level(&SETTINGS.rustcampaign_log_level);
    let with_ansi = SETTINGS.rustcampaign_ansi_logs;

    let (server_nonb, server_guard) = server_log_writer();
    let _ = LOG_WORKER_GUARD.set(server_guard);

    let server_layer = fmt::layer()
        .with_timer(LocalTimer)
        .with_ansi(with_ansi)
        .with_level(true)
        .with_writer(server_nonb)
        .with_target(true);

    let subscriber = tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(server_layer);

    tracing::subscriber::set_global_default(subscriber)
}

fn server_log_writer() -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("server")
        .max_log_files(SETTINGS.rustcampaign_max_server_log_files)
        .build(&SETTINGS.rustcampaign_log_dir);
    match appender {
        Ok(rolling) => tracing_appender::non_blocking(rolling),
        Err(e) => {
            eprintln!(
                "Failed to initialize rolling file appender in {:?}: {:#?}. Falling back to stdout.",
                SETTINGS.rustcampaign_log_dir, e
            );
            tracing_appender::non_blocking(std::io::stdout())
        }
    }
}
