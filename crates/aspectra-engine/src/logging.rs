//! Tracing subscriber bootstrap
//!
//! The engine itself only emits `tracing` events: `debug` on registrations
//! and weaving transitions, `warn` on replaced aspects, `trace` on advice
//! chain execution. Hosts (and tests) install a subscriber with
//! [`init_tracing`].

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::WeaverConfig;

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "ASPECTRA_LOG";

/// Install a fmt subscriber filtered by `ASPECTRA_LOG`, else `default_filter`
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Install a subscriber using the configured filter
pub fn init_from_config(config: &WeaverConfig) -> bool {
    init_tracing(&config.log_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("aspectra=debug");
        assert!(!init_tracing("aspectra=debug"));
    }
}
