//! Narrow views onto the rest of the keyboard.
//!
//! The orchestrator never owns preferences, editor state, keyboard state or
//! layout; it reads snapshots through these traits and reports layout
//! decisions back.

use std::time::Duration;

use quill_config::Config;
use quill_protocol::payload::InputShiftState;

use crate::subtype::Subtype;

/// Suggestion-related preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionPreferences {
    /// Whether word suggestions are shown.
    pub suggestions_enabled: bool,
    /// Whether the clipboard may contribute suggestions.
    pub clipboard_suggestions_enabled: bool,
    /// How long a clipboard item stays eligible.
    pub clipboard_timeout: Duration,
    /// Whether possibly offensive words are withheld.
    pub block_possibly_offensive: bool,
    /// Upper bound on suggestions per request.
    pub max_suggestion_count: u16,
    /// Longest n-gram providers may consider.
    pub max_ngram_level: u8,
    /// Whether hidden words may be suggested.
    pub override_hidden_flag: bool,
    /// Whether spelling results are traced.
    pub debug_trace_enabled: bool,
}

impl From<&Config> for SuggestionPreferences {
    fn from(config: &Config) -> Self {
        Self {
            suggestions_enabled: config.suggestions_enabled,
            clipboard_suggestions_enabled: config.clipboard_suggestions_enabled,
            clipboard_timeout: config.clipboard_timeout(),
            block_possibly_offensive: config.block_possibly_offensive,
            max_suggestion_count: config.max_suggestion_count,
            max_ngram_level: config.max_ngram_level,
            override_hidden_flag: config.override_hidden_flag,
            debug_trace_enabled: config.debug_trace_enabled,
        }
    }
}

/// Smartbar preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmartbarPreferences {
    /// Whether the smartbar is shown.
    pub enabled: bool,
    /// Whether shared actions toggle automatically.
    pub shared_actions_auto_expand_collapse: bool,
}

impl From<&Config> for SmartbarPreferences {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.smartbar_enabled,
            shared_actions_auto_expand_collapse: config.shared_actions_auto_expand_collapse,
        }
    }
}

/// Read-only access to user preferences.
pub trait PreferenceSource: Send + Sync {
    /// Current suggestion preferences.
    fn suggestion(&self) -> SuggestionPreferences;

    /// Current smartbar preferences.
    fn smartbar(&self) -> SmartbarPreferences;
}

impl PreferenceSource for Config {
    fn suggestion(&self) -> SuggestionPreferences {
        SuggestionPreferences::from(self)
    }

    fn smartbar(&self) -> SmartbarPreferences {
        SmartbarPreferences::from(self)
    }
}

/// Snapshot of the text around the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorContent {
    /// Word currently being composed.
    pub composing_text: String,
    /// Words before the composing region, oldest first.
    pub preceding_words: Vec<String>,
    /// Word under the cursor, composed or not.
    pub current_word_text: String,
    /// Whether a non-empty selection exists.
    pub is_selection_mode: bool,
}

/// Read-only access to the editor.
pub trait EditorSource: Send + Sync {
    /// Current editor content.
    fn active_content(&self) -> EditorContent;
}

/// Snapshot of the keyboard's input state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardSnapshot {
    /// Whether the field accepts composing input.
    pub is_composing_enabled: bool,
    /// Whether input must not be learnt from.
    pub is_incognito_mode: bool,
    /// Shift state when the current word began.
    pub shift_state_start: InputShiftState,
    /// Shift state now.
    pub shift_state_current: InputShiftState,
    /// Whether the last key down was a repeatable key still held.
    pub is_repeatable_key_down: bool,
    /// Whether the actions overflow menu is open.
    pub is_actions_overflow_visible: bool,
}

impl Default for KeyboardSnapshot {
    fn default() -> Self {
        Self {
            is_composing_enabled: true,
            is_incognito_mode: false,
            shift_state_start: InputShiftState::Unshifted,
            shift_state_current: InputShiftState::Unshifted,
            is_repeatable_key_down: false,
            is_actions_overflow_visible: false,
        }
    }
}

/// Read-only access to keyboard state.
pub trait KeyboardState: Send + Sync {
    /// Current keyboard state.
    fn snapshot(&self) -> KeyboardSnapshot;
}

/// Receiver of smartbar layout decisions.
pub trait SmartbarLayout: Send + Sync {
    /// Expands or collapses the shared actions row.
    fn set_shared_actions_expanded(&self, expanded: bool, animate: bool);
}

/// Read-only access to configured subtypes.
pub trait SubtypeSource: Send + Sync {
    /// The subtype currently in use.
    fn active_subtype(&self) -> Subtype;

    /// Every configured subtype.
    fn subtypes(&self) -> Vec<Subtype>;
}
