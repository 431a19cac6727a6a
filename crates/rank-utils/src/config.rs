//! Logging configuration

use serde::{Deserialize, Serialize};

/// Default filter directive when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,rank_core=info,rank_cli=info";

/// Logging configuration shared by the workspace binaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is absent
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Switch to JSON output
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Replace the filter directive
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Raise the crate-level verbosity to `debug`
    pub fn verbose(self) -> Self {
        self.with_filter("warn,rank_core=debug,rank_cli=debug")
    }
}
