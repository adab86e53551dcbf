use std::{
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

fn local_timer() -> ChronoLocal {
    ChronoLocal::new(TIMESTAMP_FORMAT.to_string())
}

fn make_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once at startup.
///
/// Records carry a local timestamp, the level and `file:line`. They go to
/// stderr so command output on stdout stays machine-readable, colored only
/// when stderr is a terminal. With `log_file` they are also appended there
/// without color; the directory must already exist. The level is `info`
/// unless `RUST_LOG` says otherwise.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let file_layer = log_file
        .map(|path| {
            File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))
        })
        .transpose()?
        .map(|file| {
            fmt::layer()
                .with_timer(local_timer())
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
        });

    let stderr_layer = fmt::layer()
        .with_timer(local_timer())
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(make_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use tracing::info;

    use super::*;

    #[test]
    fn log_file_gets_local_timestamped_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tax-class.log");

        init_logging(Some(&path)).expect("first init should succeed");
        info!(class_id = 7, "tax class created");

        let contents = std::fs::read_to_string(&path).unwrap();
        let line = contents
            .lines()
            .find(|l| l.contains("tax class created"))
            .expect("record should be in the log file");
        assert!(line.contains("INFO"), "level missing: {line}");
        assert!(line.contains("class_id=7"), "fields missing: {line}");
        assert!(line.contains("logging.rs:"), "file:line missing: {line}");
        assert!(!line.contains('\x1b'), "file output must be plain: {line}");

        assert!(
            has_utc_offset(line),
            "timestamp should end in a UTC offset: {line}"
        );

        assert!(init_logging(None).is_err(), "second init must fail");
    }

    /// `2026-01-02T03:04:05.123456+01:00 ...`: the first token carries `%:z`.
    fn has_utc_offset(line: &str) -> bool {
        let stamp = line.split_whitespace().next().unwrap_or_default();
        let tail = &stamp[stamp.len().saturating_sub(6)..];
        (tail.starts_with('+') || tail.starts_with('-')) && tail.as_bytes().get(3) == Some(&b':')
    }
}
