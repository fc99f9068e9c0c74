use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes tracing once at startup.
///
/// `level` is one of trace/debug/info/warn/error; `format` selects
/// structured JSON output or human-readable console output.
pub fn init_logging(level: &str, format: &str) {
    let level_filter = match level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            panic!(
                "Invalid PBM_LOG_LEVEL '{}'. Valid values: trace, debug, info, warn, error",
                level
            );
        }
    };

    // Env-based overrides still apply on top of the configured default.
    let filter_layer = EnvFilter::default().add_directive(level_filter.into());

    match format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().json())
                .init();
        }
        // Fallback to console if unknown
        _ => {
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
