use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::CONFIG;

pub const TIMING_TARGET: &str = "explorer.timing";

/// Keeps the non-blocking file writers flushing until dropped.
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Everything except timing events, with noisy dependencies held at warn.
fn session_filter(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
        .with_target("sqlx", LevelFilter::WARN)
}

fn timing_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO)
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
    guards.push(guard);
    writer
}

/// Text and jsonl files for the session log and the timing log. The console
/// layer writes to stderr so stdout stays free for session output.
pub fn init_logging() -> LoggingGuards {
    let logs_dir = Path::new(&CONFIG.log_dir);
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!("Failed to create logs directory: {err}");
    }

    let mut guards = Vec::with_capacity(4);
    let session = session_filter(parse_log_level(&CONFIG.log_level));

    let layers = vec![
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(session.clone())
            .boxed(),
        tracing_subscriber::fmt::layer()
            .with_writer(daily_writer(logs_dir, "explorer.log", &mut guards))
            .with_ansi(false)
            .with_filter(session.clone())
            .boxed(),
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(daily_writer(logs_dir, "explorer.jsonl", &mut guards))
            .with_filter(session)
            .boxed(),
        tracing_subscriber::fmt::layer()
            .with_writer(daily_writer(logs_dir, "timing.log", &mut guards))
            .with_ansi(false)
            .with_filter(timing_filter())
            .boxed(),
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(daily_writer(logs_dir, "timing.jsonl", &mut guards))
            .with_filter(timing_filter())
            .boxed(),
    ];

    tracing_subscriber::registry().with(layers).init();

    LoggingGuards { _guards: guards }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn unknown_levels_default_to_info() {
        assert_eq!(parse_log_level(" Warning "), LevelFilter::WARN);
        assert_eq!(parse_log_level("verbose"), LevelFilter::INFO);
    }

    #[test]
    fn timing_events_only_reach_timing_files() {
        let session = session_filter(LevelFilter::DEBUG);
        assert!(!session.would_enable(TIMING_TARGET, &Level::INFO));
        assert!(session.would_enable("explorer.imagen", &Level::DEBUG));
        assert!(!session.would_enable("sqlx", &Level::INFO));

        let timing = timing_filter();
        assert!(timing.would_enable(TIMING_TARGET, &Level::INFO));
        assert!(!timing.would_enable("aesthetic_explorer::session", &Level::INFO));
    }
}
