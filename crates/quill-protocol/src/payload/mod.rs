//! Typed arguments and results carried in message payloads.
//!
//! Scalars travel in the string payload; structured values travel in the
//! binary payload as JSON. The helpers at the bottom of this module are the
//! only place either encoding is spelled out.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayloadError;

/// Subtype identity resolved for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedSubtype {
    /// Subtype id.
    pub id: i64,
    /// Primary locale tag, e.g. `en-US`.
    pub primary_locale: String,
    /// Additional locale tags.
    #[serde(default)]
    pub secondary_locales: Vec<String>,
}

/// Support level reported for a subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportState {
    /// The provider fully supports the subtype.
    Supported,
    /// The provider cannot serve the subtype.
    Unsupported,
    /// No answer was obtained.
    Unspecified,
}

/// Answer to an evaluate-support request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtypeSupportInfo {
    state: SupportState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl SubtypeSupportInfo {
    /// Full support.
    #[must_use]
    pub const fn fully_supported() -> Self {
        Self {
            state: SupportState::Supported,
            reason: None,
        }
    }

    /// No support, with an explanation.
    #[must_use]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self {
            state: SupportState::Unsupported,
            reason: Some(reason.into()),
        }
    }

    /// The result used when no provider answered.
    #[must_use]
    pub const fn unspecified() -> Self {
        Self {
            state: SupportState::Unspecified,
            reason: None,
        }
    }

    /// Returns the support state.
    #[must_use]
    pub const fn state(&self) -> SupportState {
        self.state
    }

    /// Returns the explanation for unsupported subtypes.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

/// Shift state of the keyboard when a request was issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShiftState {
    /// No shift applied.
    #[default]
    Unshifted,
    /// Shift pressed by the user.
    ShiftedManual,
    /// Shift applied by auto-capitalisation.
    ShiftedAutomatic,
    /// Caps lock engaged.
    CapsLock,
}

/// Tuning knobs sent with every spell and suggest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequestFlags {
    /// Upper bound on returned suggestions.
    pub max_suggestion_count: u16,
    /// Shift state when the word was started.
    pub shift_state_start: InputShiftState,
    /// Shift state now.
    pub shift_state_current: InputShiftState,
    /// Longest n-gram the provider may consider.
    pub max_ngram_level: u8,
    /// Whether possibly offensive words may be suggested.
    pub allow_possibly_offensive: bool,
    /// Whether words flagged hidden may be suggested.
    pub override_hidden_flag: bool,
    /// Whether the provider must avoid learning from this input.
    pub is_private_session: bool,
}

impl Default for SuggestionRequestFlags {
    fn default() -> Self {
        Self {
            max_suggestion_count: 8,
            shift_state_start: InputShiftState::Unshifted,
            shift_state_current: InputShiftState::Unshifted,
            max_ngram_level: 3,
            allow_possibly_offensive: false,
            override_hidden_flag: false,
            is_private_session: false,
        }
    }
}

/// Arguments of a spell or suggest request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRequest {
    /// Subtype the word belongs to.
    pub subtype_id: i64,
    /// The word being typed or checked.
    pub word: String,
    /// Words preceding `word`, oldest first.
    #[serde(default)]
    pub prev_words: Vec<String>,
    /// Request tuning.
    pub flags: SuggestionRequestFlags,
}

/// Bit set describing a spelling result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellingAttributes(u32);

impl SpellingAttributes {
    /// The word is in the dictionary.
    pub const IN_THE_DICTIONARY: Self = Self(0x0001);
    /// The word looks like a typo.
    pub const LOOKS_LIKE_TYPO: Self = Self(0x0002);
    /// The provider has strong recommendations.
    pub const HAS_RECOMMENDED_SUGGESTIONS: Self = Self(0x0004);

    /// Wraps raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SpellingAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Result of a spell request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellingResult {
    /// Attribute bits.
    pub suggestion_attributes: SpellingAttributes,
    /// Suggested replacements, best first.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl SpellingResult {
    /// The result used when no provider answered.
    #[must_use]
    pub const fn unspecified() -> Self {
        Self {
            suggestion_attributes: SpellingAttributes::from_bits(0),
            suggestions: Vec::new(),
        }
    }

    /// A word the dictionary knows.
    #[must_use]
    pub const fn valid_word() -> Self {
        Self {
            suggestion_attributes: SpellingAttributes::IN_THE_DICTIONARY,
            suggestions: Vec::new(),
        }
    }

    /// A probable typo with replacements.
    #[must_use]
    pub fn typo(suggestions: Vec<String>) -> Self {
        Self {
            suggestion_attributes: SpellingAttributes::LOOKS_LIKE_TYPO,
            suggestions,
        }
    }

    /// Returns `true` when the result carries no information.
    #[must_use]
    pub fn is_unspecified(&self) -> bool {
        self.suggestion_attributes.bits() == 0 && self.suggestions.is_empty()
    }
}

/// Wire form of one suggestion candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateData {
    /// Text inserted on commit.
    pub text: String,
    /// Optional secondary label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
    /// Provider confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// Whether the candidate may be committed without explicit selection.
    #[serde(default)]
    pub is_eligible_for_auto_commit: bool,
    /// Whether the user may remove the candidate.
    #[serde(default)]
    pub is_eligible_for_user_removal: bool,
}

impl CandidateData {
    /// A plain candidate with default metadata.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secondary_text: None,
            confidence: 0.0,
            is_eligible_for_auto_commit: false,
            is_eligible_for_user_removal: true,
        }
    }
}

/// Arguments of accept, revert, and remove notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateNotice {
    /// Subtype the candidate was produced for.
    pub subtype_id: i64,
    /// The candidate concerned.
    pub candidate: CandidateData,
}

/// Encodes a structured payload.
///
/// # Errors
///
/// Returns [`PayloadError::Malformed`] when the value cannot be represented
/// as JSON.
pub fn encode_binary<T: Serialize>(value: &T) -> Result<Value, PayloadError> {
    Ok(serde_json::to_value(value)?)
}

/// Decodes a structured payload.
///
/// # Errors
///
/// Returns [`PayloadError::Missing`] when no payload is present, or
/// [`PayloadError::Malformed`] when it does not match `T`.
pub fn decode_binary<T: DeserializeOwned>(payload: Option<&Value>) -> Result<T, PayloadError> {
    let value = payload.ok_or(PayloadError::Missing { expected: "binary" })?;
    Ok(T::deserialize(value)?)
}

/// Encodes a boolean as a string payload.
#[must_use]
pub const fn encode_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Decodes a boolean string payload.
///
/// # Errors
///
/// Returns [`PayloadError::Missing`] when no payload is present, or
/// [`PayloadError::NotBoolean`] for any text other than `true`/`false`.
pub fn decode_bool(payload: Option<&str>) -> Result<bool, PayloadError> {
    match payload {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(PayloadError::NotBoolean {
            value: other.to_owned(),
        }),
        None => Err(PayloadError::Missing { expected: "string" }),
    }
}

#[cfg(test)]
mod tests;
