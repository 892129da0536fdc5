//! Configuration for the Quill suggestion host.
//!
//! Values resolve in layers: built-in defaults, then an optional TOML file
//! named by `--config-path` or `QUILL_CONFIG_PATH`, then `QUILL_*`
//! environment variables, then command-line flags. The core only ever reads
//! a resolved [`Config`].

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BLOCK_POSSIBLY_OFFENSIVE, DEFAULT_CLIPBOARD_SUGGESTIONS_ENABLED,
    DEFAULT_CLIPBOARD_TIMEOUT_SECS, DEFAULT_DEBUG_TRACE_ENABLED, DEFAULT_LOG_FILTER,
    DEFAULT_MAX_NGRAM_LEVEL, DEFAULT_MAX_SUGGESTION_COUNT, DEFAULT_OVERRIDE_HIDDEN_FLAG,
    DEFAULT_SHARED_ACTIONS_AUTO_EXPAND_COLLAPSE, DEFAULT_SMARTBAR_ENABLED,
    DEFAULT_SUGGESTIONS_ENABLED, default_log_filter, default_log_filter_string,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved host configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "QUILL")]
pub struct Config {
    /// Whether word suggestions are shown at all.
    #[serde(default = "defaults::default_true")]
    #[ortho_config(default = true)]
    pub suggestions_enabled: bool,

    /// Whether the clipboard may contribute suggestions.
    #[serde(default = "defaults::default_true")]
    #[ortho_config(default = true)]
    pub clipboard_suggestions_enabled: bool,

    /// Seconds after copying during which a clipboard item is suggested.
    #[serde(default = "defaults::default_clipboard_timeout_secs")]
    #[ortho_config(default = 60)]
    pub clipboard_timeout_secs: u64,

    /// Whether possibly offensive words are withheld from suggestions.
    #[serde(default = "defaults::default_true")]
    #[ortho_config(default = true)]
    pub block_possibly_offensive: bool,

    /// Whether the smartbar is displayed.
    #[serde(default = "defaults::default_true")]
    #[ortho_config(default = true)]
    pub smartbar_enabled: bool,

    /// Whether the smartbar toggles its shared actions automatically.
    #[serde(default = "defaults::default_true")]
    #[ortho_config(default = true)]
    pub shared_actions_auto_expand_collapse: bool,

    /// Upper bound on suggestions requested from a provider.
    #[serde(default = "defaults::default_max_suggestion_count")]
    #[ortho_config(default = 8)]
    pub max_suggestion_count: u16,

    /// Longest n-gram providers may consider.
    #[serde(default = "defaults::default_max_ngram_level")]
    #[ortho_config(default = 3)]
    pub max_ngram_level: u8,

    /// Whether words flagged hidden may still be suggested.
    #[serde(default = "defaults::default_false")]
    #[ortho_config(default = false)]
    pub override_hidden_flag: bool,

    /// Whether spelling results are kept in the debug trace.
    #[serde(default = "defaults::default_false")]
    #[ortho_config(default = false)]
    pub debug_trace_enabled: bool,

    /// `tracing` filter directive, e.g. `info,quill_host=debug`.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,

    /// Output format for log events.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suggestions_enabled: DEFAULT_SUGGESTIONS_ENABLED,
            clipboard_suggestions_enabled: DEFAULT_CLIPBOARD_SUGGESTIONS_ENABLED,
            clipboard_timeout_secs: DEFAULT_CLIPBOARD_TIMEOUT_SECS,
            block_possibly_offensive: DEFAULT_BLOCK_POSSIBLY_OFFENSIVE,
            smartbar_enabled: DEFAULT_SMARTBAR_ENABLED,
            shared_actions_auto_expand_collapse: DEFAULT_SHARED_ACTIONS_AUTO_EXPAND_COLLAPSE,
            max_suggestion_count: DEFAULT_MAX_SUGGESTION_COUNT,
            max_ngram_level: DEFAULT_MAX_NGRAM_LEVEL,
            override_hidden_flag: DEFAULT_OVERRIDE_HIDDEN_FLAG,
            debug_trace_enabled: DEFAULT_DEBUG_TRACE_ENABLED,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Clipboard eligibility window as a [`Duration`].
    #[must_use]
    pub const fn clipboard_timeout(&self) -> Duration {
        Duration::from_secs(self.clipboard_timeout_secs)
    }

    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
