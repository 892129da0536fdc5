//! The operations a suggestion plugin implements.

use async_trait::async_trait;
use quill_protocol::payload::{
    CandidateData, CandidateNotice, ComputedSubtype, SpellingResult, SubtypeSupportInfo,
    WordRequest,
};

/// Plugin-side counterpart of the host's provider capability.
///
/// Each method answers one request action. Implementations report "nothing
/// to say" with empty or unspecified values rather than errors; the host
/// treats both the same way.
#[async_trait]
pub trait PluginService: Send + Sync {
    /// Reports how well the plugin supports `subtype`.
    async fn evaluate_is_supported(&self, subtype: ComputedSubtype) -> SubtypeSupportInfo;

    /// Loads dictionaries or models for `subtype`.
    async fn preload(&self, subtype: ComputedSubtype);

    /// Checks the spelling of `request.word`.
    async fn spell(&self, request: WordRequest) -> SpellingResult;

    /// Suggests words for the current input.
    async fn suggest(&self, request: WordRequest) -> Vec<CandidateData>;

    /// The user committed a suggestion.
    async fn notify_suggestion_accepted(&self, notice: CandidateNotice);

    /// The user undid a committed suggestion.
    async fn notify_suggestion_reverted(&self, notice: CandidateNotice);

    /// The user asked never to see a suggestion again. Returns `true` when
    /// the plugin removed it.
    async fn remove_suggestion(&self, notice: CandidateNotice) -> bool;
}
