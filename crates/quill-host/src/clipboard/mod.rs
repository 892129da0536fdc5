//! Suggestions derived from the clipboard.
//!
//! A freshly copied item is offered once as a suggestion while the user is
//! not typing. Text items also yield the email addresses, URLs and phone
//! numbers found inside them. Once the user accepts, reverts or removes one
//! of these candidates the item counts as seen and is not offered again.

mod matcher;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use quill_protocol::payload::{ComputedSubtype, SpellingResult, SubtypeSupportInfo, WordRequest};
use tracing::debug;

pub use self::matcher::extract_matches;
use crate::candidate::SuggestionCandidate;
use crate::clock::Clock;
use crate::collaborators::PreferenceSource;
use crate::errors::ProviderError;
use crate::provider::{ProviderMetadata, SuggestionProvider};

/// Identifier of the built-in clipboard provider.
pub const CLIPBOARD_PROVIDER_ID: &str = "org.quill.nlp.clipboard";

const CLIPBOARD_TARGET: &str = "quill_host::clipboard";

/// Kind of content held by a clipboard item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardItemKind {
    /// Plain text.
    Text,
    /// An image, referenced by URI.
    Image,
    /// A video, referenced by URI.
    Video,
}

/// One clipboard history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    /// Unique item id.
    pub id: i64,
    /// Content kind.
    pub kind: ClipboardItemKind,
    /// Text for text items, URI otherwise.
    pub content: String,
    /// Copy time in wall-clock milliseconds.
    pub creation_timestamp_ms: i64,
}

/// Read-only access to the primary clip.
pub trait ClipboardSource: Send + Sync {
    /// The current primary clipboard item.
    fn primary_clip(&self) -> Option<ClipboardItem>;
}

/// The in-process clipboard provider.
pub struct ClipboardSuggestionProvider {
    metadata: ProviderMetadata,
    source: Arc<dyn ClipboardSource>,
    preferences: Arc<dyn PreferenceSource>,
    clock: Arc<dyn Clock>,
    last_seen_item: Mutex<Option<i64>>,
}

impl ClipboardSuggestionProvider {
    /// Builds the provider.
    #[must_use]
    pub fn new(
        source: Arc<dyn ClipboardSource>,
        preferences: Arc<dyn PreferenceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            metadata: ProviderMetadata::new(CLIPBOARD_PROVIDER_ID),
            source,
            preferences,
            clock,
            last_seen_item: Mutex::new(None),
        }
    }

    /// Id of the item most recently accepted, reverted or removed.
    #[must_use]
    pub fn last_seen_item(&self) -> Option<i64> {
        *self
            .last_seen_item
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_seen(&self, candidate: &SuggestionCandidate) -> bool {
        let Some(item_id) = candidate.clipboard_item_id() else {
            return false;
        };
        *self
            .last_seen_item
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(item_id);
        debug!(target: CLIPBOARD_TARGET, item_id, "clipboard item marked as seen");
        true
    }

    /// Returns the item when it may be suggested for `word`.
    fn eligible_item(&self, word: &str) -> Option<ClipboardItem> {
        let preferences = self.preferences.suggestion();
        if !preferences.clipboard_suggestions_enabled || !word.trim().is_empty() {
            return None;
        }
        let item = self.source.primary_clip()?;
        if self.last_seen_item() == Some(item.id) {
            return None;
        }
        let age_ms = self
            .clock
            .wall_millis()
            .saturating_sub(item.creation_timestamp_ms);
        let timeout_ms = i64::try_from(preferences.clipboard_timeout.as_millis()).unwrap_or(i64::MAX);
        (age_ms < timeout_ms).then_some(item)
    }

    fn candidates_for(&self, item: &ClipboardItem) -> Vec<SuggestionCandidate> {
        let id = self.metadata.id.clone();
        let mut candidates = vec![SuggestionCandidate::clipboard(
            item.content.clone(),
            item.id,
            id.clone(),
        )];
        if item.kind == ClipboardItemKind::Text {
            candidates.extend(
                extract_matches(&item.content)
                    .into_iter()
                    .map(|found| SuggestionCandidate::clipboard(found, item.id, id.clone())),
            );
        }
        candidates
    }
}

#[async_trait]
impl SuggestionProvider for ClipboardSuggestionProvider {
    fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }

    async fn evaluate_is_supported(
        &self,
        _subtype: &ComputedSubtype,
    ) -> Result<SubtypeSupportInfo, ProviderError> {
        Ok(SubtypeSupportInfo::fully_supported())
    }

    async fn preload(&self, _subtype: &ComputedSubtype) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn spell(&self, _request: &WordRequest) -> Result<SpellingResult, ProviderError> {
        Ok(SpellingResult::unspecified())
    }

    async fn suggest(
        &self,
        request: &WordRequest,
    ) -> Result<Vec<SuggestionCandidate>, ProviderError> {
        Ok(self
            .eligible_item(&request.word)
            .map(|item| self.candidates_for(&item))
            .unwrap_or_default())
    }

    async fn notify_suggestion_accepted(
        &self,
        _subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError> {
        self.mark_seen(candidate);
        Ok(())
    }

    async fn notify_suggestion_reverted(
        &self,
        _subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError> {
        self.mark_seen(candidate);
        Ok(())
    }

    async fn remove_suggestion(
        &self,
        _subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<bool, ProviderError> {
        Ok(self.mark_seen(candidate))
    }
}
