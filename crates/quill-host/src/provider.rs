//! The capability every suggestion source implements.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use quill_protocol::payload::{ComputedSubtype, SpellingResult, SubtypeSupportInfo, WordRequest};

use crate::candidate::SuggestionCandidate;
use crate::errors::ProviderError;

/// Stable identifier of a provider, e.g. `org.quill.nlp.latin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderId(Arc<str>);

impl ProviderId {
    /// Wraps an identifier.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Static facts about a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMetadata {
    /// Provider identifier.
    pub id: ProviderId,
    /// Suggestions stay on even when the user disabled them.
    pub require_always_enabled: bool,
}

impl ProviderMetadata {
    /// Metadata for a provider that honours the user's suggestion setting.
    #[must_use]
    pub fn new(id: impl Into<ProviderId>) -> Self {
        Self {
            id: id.into(),
            require_always_enabled: false,
        }
    }

    /// Marks the provider as requiring suggestions to stay enabled.
    #[must_use]
    pub fn always_enabled(mut self) -> Self {
        self.require_always_enabled = true;
        self
    }
}

/// A source of spelling results and word suggestions.
///
/// Implementations may live in-process or behind a channel; callers cannot
/// tell the difference.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Returns the provider metadata.
    fn metadata(&self) -> &ProviderMetadata;

    /// Returns the provider identifier.
    fn id(&self) -> &ProviderId {
        &self.metadata().id
    }

    /// Returns `false` once the provider can no longer serve requests.
    fn is_bound(&self) -> bool {
        true
    }

    /// Reports how well the provider supports `subtype`.
    async fn evaluate_is_supported(
        &self,
        subtype: &ComputedSubtype,
    ) -> Result<SubtypeSupportInfo, ProviderError>;

    /// Loads whatever the provider needs for `subtype`.
    async fn preload(&self, subtype: &ComputedSubtype) -> Result<(), ProviderError>;

    /// Checks the spelling of `request.word`.
    async fn spell(&self, request: &WordRequest) -> Result<SpellingResult, ProviderError>;

    /// Produces suggestions for the word being composed.
    async fn suggest(
        &self,
        request: &WordRequest,
    ) -> Result<Vec<SuggestionCandidate>, ProviderError>;

    /// Tells the provider the user committed `candidate`.
    async fn notify_suggestion_accepted(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError>;

    /// Tells the provider the user undid a commit of `candidate`.
    async fn notify_suggestion_reverted(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<(), ProviderError>;

    /// Asks the provider to stop offering `candidate`.
    ///
    /// Returns `true` when the provider removed it.
    async fn remove_suggestion(
        &self,
        subtype_id: i64,
        candidate: &SuggestionCandidate,
    ) -> Result<bool, ProviderError>;
}
