//! Tracing/logging setup shared by every binary and test harness.

use serde::Deserialize;

/// Tracing configuration (filters, output format).
pub mod tracing;

/// Logging settings, usually read from the `logging` config section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info", "dairyledger_stock=debug").
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &LoggingConfig) {
    tracing::init(config);
}
