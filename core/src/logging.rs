//! Standardized logging configuration for the Z-Economy service.
//!
//! Provides two initialisers selected by `service.log_format` in config:
//! human-readable (for interactive operation) and JSON (for log
//! aggregators). Both read `RUST_LOG` and default to `info`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise human-readable logging.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialise JSON logging, for shipping to aggregators.
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .init();
}

/// Initialise the configured format, falling back to human-readable.
pub fn init_from_format(format: &str) {
    match format {
        "json" => init_json_logging(),
        _ => init_logging(),
    }
}
