//! Default values for every configuration field.

use crate::logging::LogFormat;

/// Default for [`Config::suggestions_enabled`](crate::Config::suggestions_enabled).
pub const DEFAULT_SUGGESTIONS_ENABLED: bool = true;

/// Default for clipboard-derived suggestions.
pub const DEFAULT_CLIPBOARD_SUGGESTIONS_ENABLED: bool = true;

/// How long, in seconds, a clipboard item stays eligible for suggestion.
pub const DEFAULT_CLIPBOARD_TIMEOUT_SECS: u64 = 60;

/// Default for filtering possibly offensive words.
pub const DEFAULT_BLOCK_POSSIBLY_OFFENSIVE: bool = true;

/// Default for showing the smartbar.
pub const DEFAULT_SMARTBAR_ENABLED: bool = true;

/// Default for letting the smartbar expand and collapse shared actions.
pub const DEFAULT_SHARED_ACTIONS_AUTO_EXPAND_COLLAPSE: bool = true;

/// Upper bound on suggestions requested from a provider.
pub const DEFAULT_MAX_SUGGESTION_COUNT: u16 = 8;

/// Longest n-gram providers may consider.
pub const DEFAULT_MAX_NGRAM_LEVEL: u8 = 3;

/// Default for suggesting words flagged hidden.
pub const DEFAULT_OVERRIDE_HIDDEN_FLAG: bool = false;

/// Default for recording spelling diagnostics.
pub const DEFAULT_DEBUG_TRACE_ENABLED: bool = false;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

pub(crate) const fn default_true() -> bool {
    true
}

pub(crate) const fn default_false() -> bool {
    false
}

pub(crate) const fn default_clipboard_timeout_secs() -> u64 {
    DEFAULT_CLIPBOARD_TIMEOUT_SECS
}

pub(crate) const fn default_max_suggestion_count() -> u16 {
    DEFAULT_MAX_SUGGESTION_COUNT
}

pub(crate) const fn default_max_ngram_level() -> u8 {
    DEFAULT_MAX_NGRAM_LEVEL
}
