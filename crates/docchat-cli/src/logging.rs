//! Log setup.
//!
//! The REPL owns the terminal, so logs go to a daily rolling file under the
//! docchat log directory. `--verbose` adds a stderr layer.

use anyhow::Result;
use docchat_infrastructure::DocchatPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "docchat.log";

const CRATES: [&str; 4] = [
    "docchat",
    "docchat_core",
    "docchat_application",
    "docchat_infrastructure",
];

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Keep the returned guard alive for
/// the life of the process or buffered lines are lost.
pub fn init(paths: &DocchatPaths, level: &str, verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths.log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(env_filter(level));

    let stderr_layer = verbose.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter(level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// `level` for the docchat crates, `warn` for everything else.
fn default_directives(level: &str) -> String {
    let mut directives: Vec<String> = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}
