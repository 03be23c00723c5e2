use tracing_subscriber::{EnvFilter, fmt};

/// Variable consulted before `RUST_LOG` for the log filter.
pub const LOG_ENV: &str = "THREADS_LOG";

/// Install the stderr subscriber.
///
/// The filter comes from `THREADS_LOG`, then `RUST_LOG`, then `default_level`.
/// Stdout stays reserved for command output. Calling this twice is a no-op.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();

    tracing::debug!(version = env!("THREADS_VERSION"), "logging initialised");
}
