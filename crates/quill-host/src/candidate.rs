//! Suggestion values shown to the user.

use quill_protocol::payload::CandidateData;

use crate::provider::ProviderId;

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateKind {
    /// A word produced by a language provider.
    Word,
    /// Content taken from the clipboard item `item_id`.
    Clipboard {
        /// Clipboard item id.
        item_id: i64,
    },
}

/// One suggestion in the active list.
///
/// Candidates are never mutated once built; a new assembly pass replaces the
/// whole list.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCandidate {
    text: String,
    secondary_text: Option<String>,
    confidence: f64,
    is_eligible_for_auto_commit: bool,
    is_eligible_for_user_removal: bool,
    source: Option<ProviderId>,
    kind: CandidateKind,
}

impl SuggestionCandidate {
    /// A word candidate with no source.
    #[must_use]
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            secondary_text: None,
            confidence: 0.0,
            is_eligible_for_auto_commit: false,
            is_eligible_for_user_removal: true,
            source: None,
            kind: CandidateKind::Word,
        }
    }

    /// A clipboard candidate for item `item_id`.
    #[must_use]
    pub fn clipboard(text: impl Into<String>, item_id: i64, source: ProviderId) -> Self {
        Self {
            source: Some(source),
            kind: CandidateKind::Clipboard { item_id },
            ..Self::word(text)
        }
    }

    /// Rebuilds a candidate received from `source`.
    #[must_use]
    pub fn from_data(data: CandidateData, source: ProviderId) -> Self {
        Self {
            text: data.text,
            secondary_text: data.secondary_text,
            confidence: data.confidence,
            is_eligible_for_auto_commit: data.is_eligible_for_auto_commit,
            is_eligible_for_user_removal: data.is_eligible_for_user_removal,
            source: Some(source),
            kind: CandidateKind::Word,
        }
    }

    /// Wire form of the candidate.
    #[must_use]
    pub fn to_data(&self) -> CandidateData {
        CandidateData {
            text: self.text.clone(),
            secondary_text: self.secondary_text.clone(),
            confidence: self.confidence,
            is_eligible_for_auto_commit: self.is_eligible_for_auto_commit,
            is_eligible_for_user_removal: self.is_eligible_for_user_removal,
        }
    }

    /// Sets the auto-commit eligibility.
    #[must_use]
    pub const fn with_auto_commit(mut self, eligible: bool) -> Self {
        self.is_eligible_for_auto_commit = eligible;
        self
    }

    /// Sets the confidence.
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the secondary label.
    #[must_use]
    pub fn with_secondary_text(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }

    /// Sets the source provider.
    #[must_use]
    pub fn with_source(mut self, source: ProviderId) -> Self {
        self.source = Some(source);
        self
    }

    /// Text inserted on commit.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Optional secondary label.
    #[must_use]
    pub fn secondary_text(&self) -> Option<&str> {
        self.secondary_text.as_deref()
    }

    /// Provider confidence.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Whether the candidate may be committed without selection.
    #[must_use]
    pub const fn is_eligible_for_auto_commit(&self) -> bool {
        self.is_eligible_for_auto_commit
    }

    /// Whether the user may remove the candidate.
    #[must_use]
    pub const fn is_eligible_for_user_removal(&self) -> bool {
        self.is_eligible_for_user_removal
    }

    /// Provider that produced the candidate, looked up by id.
    #[must_use]
    pub const fn source(&self) -> Option<&ProviderId> {
        self.source.as_ref()
    }

    /// Where the candidate came from.
    #[must_use]
    pub const fn kind(&self) -> &CandidateKind {
        &self.kind
    }

    /// Clipboard item id for clipboard candidates.
    #[must_use]
    pub const fn clipboard_item_id(&self) -> Option<i64> {
        match self.kind {
            CandidateKind::Clipboard { item_id } => Some(item_id),
            CandidateKind::Word => None,
        }
    }
}

/// An autofill suggestion supplied by the editor, shown beside candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSuggestion {
    /// Label shown to the user.
    pub label: String,
}

impl InlineSuggestion {
    /// Builds an inline suggestion.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}
