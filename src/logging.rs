use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter, e.g. `SIFTDUPE_LOG=debug`.
pub const LOG_ENV: &str = "SIFTDUPE_LOG";

/// Log to stderr so stdout stays clean for reports and JSON.
pub fn init_logger() {
    let filter_layer = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .init();
}
