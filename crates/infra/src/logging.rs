//! Logging setup driven by the option set
//!
//! - `verbose` enables trace events (request and response dumps), `debug`
//!   enables debug events; otherwise `RUST_LOG` or `info` applies
//! - `silent` turns console output off, `noTs` drops timestamps
//! - `logToFile` adds a non-blocking file writer, either at the given path or
//!   at `output/seed_<timestamp>.log`

use std::io;
use std::path::{Path, PathBuf};

use apiseed_domain::{option_names, OptionValue, OptionsProvider, Result, SeedError};
use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::errors::InfraError;

const DEFAULT_LOG_DIR: &str = "output";

/// Keeps the file writer alive. Dropping it flushes the log file.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// # Errors
/// - `SeedError::Config` if the log directory cannot be created
/// - `SeedError::Internal` if a global subscriber is already installed
pub fn init_logging(options: &dyn OptionsProvider) -> Result<LoggingGuard> {
    let filter = match level_directive(options) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let no_ts = options.flag(option_names::NO_TS);

    let console = (!options.flag(option_names::SILENT)).then(|| {
        let layer = fmt::layer().with_writer(io::stderr).with_target(false);
        if no_ts {
            layer.without_time().boxed()
        } else {
            layer.boxed()
        }
    });

    let mut file_guard = None;
    let file = match log_file_path(options, Local::now()) {
        Some(path) => {
            let (dir, name) = split_log_path(&path)?;
            std::fs::create_dir_all(&dir).map_err(InfraError::from)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);

            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            Some(if no_ts { layer.without_time().boxed() } else { layer.boxed() })
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| SeedError::Internal(format!("Failed to install logger: {e}")))?;

    Ok(LoggingGuard { _file_guard: file_guard })
}

/// Level forced by the `verbose`/`debug` options, if any.
fn level_directive(options: &dyn OptionsProvider) -> Option<&'static str> {
    if options.flag(option_names::VERBOSE) {
        Some("trace")
    } else if options.flag(option_names::DEBUG) {
        Some("debug")
    } else {
        None
    }
}

/// Target of the file writer: an explicit path, or a timestamped default
/// when `logToFile` is a plain switch.
fn log_file_path(options: &dyn OptionsProvider, now: DateTime<Local>) -> Option<PathBuf> {
    match options.get(option_names::LOG_TO_FILE)? {
        OptionValue::Text(path) if !path.is_empty() => Some(PathBuf::from(path)),
        OptionValue::Flag(true) => Some(
            Path::new(DEFAULT_LOG_DIR).join(format!("seed_{}.log", now.format("%Y-%m-%dT%H-%M-%S"))),
        ),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let name = path
        .file_name()
        .ok_or_else(|| SeedError::Config(format!("Invalid log file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

#[cfg(test)]
mod tests {
    use apiseed_domain::SharedOptions;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn verbose_wins_over_debug() {
        let options = SharedOptions::new();
        assert_eq!(level_directive(&options), None);

        options.set(option_names::DEBUG, true.into());
        assert_eq!(level_directive(&options), Some("debug"));

        options.set(option_names::VERBOSE, true.into());
        assert_eq!(level_directive(&options), Some("trace"));
    }

    #[test]
    fn log_file_defaults_to_timestamped_output() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let options = SharedOptions::new();
        assert_eq!(log_file_path(&options, now), None);

        options.set(option_names::LOG_TO_FILE, false.into());
        assert_eq!(log_file_path(&options, now), None);

        options.set(option_names::LOG_TO_FILE, true.into());
        assert_eq!(
            log_file_path(&options, now),
            Some(PathBuf::from("output/seed_2024-03-09T14-05-07.log"))
        );

        options.set(option_names::LOG_TO_FILE, "logs/run.log".into());
        assert_eq!(log_file_path(&options, now), Some(PathBuf::from("logs/run.log")));
    }

    #[test]
    fn split_log_path_handles_bare_file_names() {
        let (dir, name) = split_log_path(Path::new("run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("run.log"));

        let (dir, name) = split_log_path(Path::new("logs/nested/run.log")).unwrap();
        assert_eq!(dir, PathBuf::from("logs/nested"));
        assert_eq!(name, PathBuf::from("run.log"));

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
