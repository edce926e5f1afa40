//! Logging Module
//!
//! Structured logging for the engine and the CLI:
//! - JSON file output with daily rotation (tracing-appender)
//! - Optional pretty stdout output
//! - `log` crate events forwarded into `tracing`
//! - Background gzip compression of rotated files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "plotweaver.log";

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize the logging system.
///
/// Returns the file writer's `WorkerGuard` when file output is enabled. It
/// must be kept alive for the duration of the process so buffered lines are
/// flushed on shutdown.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
    let log_dir = config.log_dir();
    let filter = env_filter(&config.filter);

    let (file_layer, guard) = if config.file {
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!("Failed to create logs directory {}: {}", log_dir.display(), e);
        }
        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .with_filter(filter.clone());
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let stdout_layer = config.stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .pretty()
            .with_filter(filter)
    });

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
    {
        eprintln!("Logging already initialized: {}", e);
        return guard;
    }

    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to initialize LogTracer: {}", e);
    }

    if config.file {
        let dir = log_dir.clone();
        std::thread::spawn(move || compress_old_logs(&dir));
        log::info!(
            "Logging initialized. Writing to: {:?} (daily rolling)",
            log_dir.join(LOG_FILE_PREFIX)
        );
    }

    guard
}

/// Compact human-readable logs on stderr only.
///
/// Used by the CLI when stdout carries the JSON result.
pub fn init_stderr(filter: &str) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .compact()
        .with_target(false)
        .with_filter(env_filter(filter));

    if tracing_subscriber::registry().with(layer).try_init().is_ok() {
        if let Err(e) = tracing_log::LogTracer::init() {
            eprintln!("Failed to initialize LogTracer: {}", e);
        }
    }
}

/// Rotated files are `plotweaver.log.YYYY-MM-DD`; today's file is still open.
fn should_compress(name: &str, today_suffix: &str) -> bool {
    name.starts_with(LOG_FILE_PREFIX)
        && name.len() > LOG_FILE_PREFIX.len()
        && !name.ends_with(today_suffix)
        && !name.ends_with(".gz")
}

fn compress_old_logs(log_dir: &Path) {
    let today_suffix = chrono::Local::now().format("%Y-%m-%d").to_string();

    let Ok(entries) = fs::read_dir(log_dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !should_compress(name, &today_suffix) {
            continue;
        }
        match compress_file(&path) {
            Ok(Some(gz)) => log::info!("Compressed old log: {:?}", gz),
            Ok(None) => {}
            Err(e) => log::warn!("Failed to compress old log {:?}: {}", path, e),
        }
    }
}

/// Gzip `path` next to itself and remove the original. Returns the new path,
/// or `None` if a compressed copy already exists.
fn compress_file(path: &Path) -> io::Result<Option<PathBuf>> {
    let mut gz_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No filename"))?
        .to_os_string();
    gz_name.push(".gz");
    let gz_path = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "No parent directory"))?
        .join(gz_name);

    if gz_path.exists() {
        return Ok(None);
    }

    let mut reader = io::BufReader::new(fs::File::open(path)?);
    let mut encoder = GzEncoder::new(fs::File::create(&gz_path)?, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?;

    fs::remove_file(path)?;
    Ok(Some(gz_path))
}
