//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogConfig;

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with(&LogConfig::default());
}

/// Initialize tracing subscriber from a [`LogConfig`].
///
/// `RUST_LOG` wins over the configured filter when set. Output always goes to
/// stderr so that tables and JSON written to stdout stay machine-readable.
pub fn init_tracing_with(config: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!config.json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
