//! Log subscriber setup for the binary

use std::path::Path;

use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log file written next to the working directory
pub const LOG_FILE: &str = "campaign-dash.log";

/// Subscriber that always writes to `log_dir/LOG_FILE`. CLI commands also log
/// to stderr; the TUI owns the terminal, so it gets the file only.
pub fn subscriber(tui: bool, log_dir: &Path) -> impl Subscriber + Send + Sync {
    let stderr_layer = (!tui).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(EnvFilter::from_default_env())
    });

    // Create a file appender for logging
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);

    tracing_subscriber::registry().with(stderr_layer).with(
        fmt::layer()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(EnvFilter::from_default_env()),
    )
}

/// Install the subscriber for the whole process
pub fn init(tui: bool) {
    subscriber(tui, Path::new(".")).init();
}
