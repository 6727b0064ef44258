//! Tracing setup for the `specloop` binary.
//!
//! Logs go to stderr so stdout carries nothing but JSON results.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter, e.g. `specloop_feedback=info`.
pub const LOG_ENV: &str = "SPECLOOP_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber. Later calls are ignored.
pub fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
