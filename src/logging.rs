use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogLevel};

/// Initializes the global `tracing` subscriber from the resolved log
/// level and format (§6). `RUST_LOG`, if set, always wins over `level` —
/// this mirrors the usual `tracing_subscriber` convention and gives
/// operators an escape hatch without touching `config.yaml`.
pub fn init(level: LogLevel, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter_str()));

    let builder = fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().flatten_event(true).init(),
    }
}
