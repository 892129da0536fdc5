//! The single producer of the active suggestion list.
//!
//! Word suggestions arrive asynchronously from the subtype's provider and are
//! kept in one result slot guarded by request issue time, so a slow response
//! to an older request can never replace the result of a newer one. Every
//! change triggers an assembly pass that picks clipboard candidates when there
//! are any and the stored word suggestions otherwise, then publishes the list
//! as a whole. Assembly passes never overlap; triggers that arrive while a
//! pass runs are folded into the next pass.

mod layout;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use quill_protocol::payload::{SpellingResult, SuggestionRequestFlags, WordRequest};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use self::layout::{LayoutInputs, shared_actions_expanded};
use crate::candidate::{CandidateKind, InlineSuggestion, SuggestionCandidate};
use crate::clipboard::ClipboardSuggestionProvider;
use crate::clock::Clock;
use crate::collaborators::{
    EditorSource, KeyboardState, PreferenceSource, SmartbarLayout, SubtypeSource,
};
use crate::debug_trace::DebugTrace;
use crate::provider::{ProviderId, SuggestionProvider};
use crate::registry::{ProviderRegistry, SharedProvider};
use crate::subtype::Subtype;

/// Log target for orchestrator events.
const ORCHESTRATOR_TARGET: &str = "quill_host::orchestrator";

/// Everything the orchestrator reads from or reports to.
#[derive(Clone)]
pub struct Collaborators {
    /// Bound providers.
    pub registry: Arc<ProviderRegistry>,
    /// The built-in clipboard provider.
    pub clipboard: Arc<ClipboardSuggestionProvider>,
    /// User preferences.
    pub preferences: Arc<dyn PreferenceSource>,
    /// Editor content.
    pub editor: Arc<dyn EditorSource>,
    /// Keyboard state.
    pub keyboard: Arc<dyn KeyboardState>,
    /// Smartbar layout.
    pub layout: Arc<dyn SmartbarLayout>,
    /// Configured subtypes.
    pub subtypes: Arc<dyn SubtypeSource>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// The newest accepted provider result.
struct LatestAsyncResult {
    issued_at: Option<Instant>,
    candidates: Arc<[SuggestionCandidate]>,
}

/// Serialises assembly passes and folds redundant triggers.
///
/// Each trigger takes a ticket. A pass records the newest ticket it saw
/// before reading any state; a trigger whose ticket is already covered by a
/// finished pass has nothing left to do.
#[derive(Default)]
struct AssemblyGate {
    requested: AtomicU64,
    completed: Mutex<u64>,
}

struct Inner {
    collaborators: Collaborators,
    latest: Mutex<LatestAsyncResult>,
    candidates: watch::Sender<Arc<[SuggestionCandidate]>>,
    inline_suggestions: watch::Sender<Arc<[InlineSuggestion]>>,
    gate: AssemblyGate,
    trace: DebugTrace,
}

/// Merges provider and clipboard suggestions into the active list.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SuggestionOrchestrator {
    inner: Arc<Inner>,
}

impl SuggestionOrchestrator {
    /// Builds the orchestrator and registers the clipboard provider.
    #[must_use]
    pub fn new(collaborators: Collaborators) -> Self {
        let clipboard: SharedProvider = collaborators.clipboard.clone();
        collaborators.registry.register(clipboard);
        let (candidates, _) = watch::channel(Arc::from(Vec::new()));
        let (inline_suggestions, _) = watch::channel(Arc::from(Vec::new()));
        let trace = DebugTrace::new(Arc::clone(&collaborators.clock));
        Self {
            inner: Arc::new(Inner {
                collaborators,
                latest: Mutex::new(LatestAsyncResult {
                    issued_at: None,
                    candidates: Arc::from(Vec::new()),
                }),
                candidates,
                inline_suggestions,
                gate: AssemblyGate::default(),
                trace,
            }),
        }
    }

    fn collaborators(&self) -> &Collaborators {
        &self.inner.collaborators
    }

    fn provider(&self, id: &ProviderId) -> Option<SharedProvider> {
        self.collaborators().registry.get(id)
    }

    // -------------------------------------------------------------------
    // Suggestion requests
    // -------------------------------------------------------------------

    /// Asks the subtype's suggestion provider for candidates and reassembles.
    ///
    /// The request is stamped with the time of this call. Its result is
    /// discarded if a newer result has already been stored.
    pub async fn request_suggestions(
        &self,
        subtype: &Subtype,
        composing_text: &str,
        preceding_words: Vec<String>,
    ) {
        let issued_at = self.collaborators().clock.now();
        self.suggest_issued_at(issued_at, subtype, composing_text, preceding_words)
            .await;
    }

    /// Fire-and-forget form of [`Self::request_suggestions`].
    ///
    /// The request is stamped before the task is spawned, so issue order
    /// follows call order.
    pub fn spawn_suggestions(
        &self,
        subtype: Subtype,
        composing_text: String,
        preceding_words: Vec<String>,
    ) -> JoinHandle<()> {
        let issued_at = self.collaborators().clock.now();
        let this = self.clone();
        tokio::spawn(async move {
            this.suggest_issued_at(issued_at, &subtype, &composing_text, preceding_words)
                .await;
        })
    }

    async fn suggest_issued_at(
        &self,
        issued_at: Instant,
        subtype: &Subtype,
        composing_text: &str,
        preceding_words: Vec<String>,
    ) {
        let provider_id = &subtype.nlp_providers.suggestion;
        let candidates = match self.provider(provider_id) {
            Some(provider) => {
                let request = self.word_request(subtype.id, composing_text, preceding_words);
                match provider.suggest(&request).await {
                    Ok(candidates) => candidates,
                    Err(error) => {
                        warn!(target: ORCHESTRATOR_TARGET, %error, "suggest failed");
                        Vec::new()
                    }
                }
            }
            None => {
                debug!(target: ORCHESTRATOR_TARGET, provider = %provider_id, "no bound suggestion provider");
                Vec::new()
            }
        };
        self.store_latest(issued_at, candidates).await;
        self.assemble().await;
    }

    /// Stores `candidates` unless a result from a newer request is held.
    async fn store_latest(&self, issued_at: Instant, candidates: Vec<SuggestionCandidate>) {
        let mut latest = self.inner.latest.lock().await;
        if latest.issued_at.is_some_and(|stored| issued_at < stored) {
            debug!(
                target: ORCHESTRATOR_TARGET,
                discarded = candidates.len(),
                "stale suggestion result rejected"
            );
            return;
        }
        latest.issued_at = Some(issued_at);
        latest.candidates = Arc::from(candidates);
    }

    /// Stores `candidates` as the newest result and reassembles.
    pub async fn direct_set(&self, candidates: Vec<SuggestionCandidate>) {
        let issued_at = self.collaborators().clock.now();
        self.store_latest(issued_at, candidates).await;
        self.assemble().await;
    }

    /// Equivalent to `direct_set(vec![])`.
    pub async fn clear(&self) {
        self.direct_set(Vec::new()).await;
    }

    /// Builds the request sent to providers for `word`.
    #[must_use]
    pub fn word_request(
        &self,
        subtype_id: i64,
        word: &str,
        prev_words: Vec<String>,
    ) -> WordRequest {
        let preferences = self.collaborators().preferences.suggestion();
        let keyboard = self.collaborators().keyboard.snapshot();
        WordRequest {
            subtype_id,
            word: word.to_owned(),
            prev_words,
            flags: SuggestionRequestFlags {
                max_suggestion_count: preferences.max_suggestion_count,
                shift_state_start: keyboard.shift_state_start,
                shift_state_current: keyboard.shift_state_current,
                max_ngram_level: preferences.max_ngram_level,
                allow_possibly_offensive: !preferences.block_possibly_offensive,
                override_hidden_flag: preferences.override_hidden_flag,
                is_private_session: keyboard.is_incognito_mode,
            },
        }
    }

    // -------------------------------------------------------------------
    // Assembly
    // -------------------------------------------------------------------

    /// Rebuilds and publishes the active list.
    ///
    /// Never runs concurrently with itself. A call made while a pass is
    /// running waits for it and runs once more only if no later pass has
    /// already covered it.
    pub async fn assemble(&self) {
        let gate = &self.inner.gate;
        let ticket = gate.requested.fetch_add(1, Ordering::AcqRel) + 1;
        let mut completed = gate.completed.lock().await;
        if *completed >= ticket {
            return;
        }
        let covered = gate.requested.load(Ordering::Acquire);
        self.assemble_pass().await;
        *completed = covered;
    }

    async fn assemble_pass(&self) {
        let collaborators = self.collaborators();
        let content = collaborators.editor.active_content();
        let candidates = if self.is_suggestion_enabled() {
            let subtype_id = collaborators.subtypes.active_subtype().id;
            let request = self.word_request(subtype_id, &content.current_word_text, Vec::new());
            let clipboard = match collaborators.clipboard.suggest(&request).await {
                Ok(candidates) => candidates,
                Err(error) => {
                    warn!(target: ORCHESTRATOR_TARGET, %error, "clipboard suggest failed");
                    Vec::new()
                }
            };
            if clipboard.is_empty() {
                Arc::clone(&self.inner.latest.lock().await.candidates)
            } else {
                Arc::from(clipboard)
            }
        } else {
            Arc::from(Vec::new())
        };

        debug!(target: ORCHESTRATOR_TARGET, count = candidates.len(), "publishing candidates");
        self.inner.candidates.send_replace(Arc::clone(&candidates));

        let has_inline_suggestions = !self.inner.inline_suggestions.borrow().is_empty();
        self.decide_layout(LayoutInputs {
            has_candidates: !candidates.is_empty(),
            has_inline_suggestions,
            is_selection_mode: content.is_selection_mode,
        });
    }

    fn decide_layout(&self, inputs: LayoutInputs) {
        let collaborators = self.collaborators();
        let smartbar = collaborators.preferences.smartbar();
        let keyboard = collaborators.keyboard.snapshot();
        if let Some(expanded) = shared_actions_expanded(smartbar, &keyboard, inputs) {
            collaborators
                .layout
                .set_shared_actions_expanded(expanded, false);
        }
    }

    /// Whether suggestions are shown for the active subtype.
    ///
    /// Requires composing input, plus either the user preference or a
    /// suggestion provider that insists on staying enabled.
    #[must_use]
    pub fn is_suggestion_enabled(&self) -> bool {
        let collaborators = self.collaborators();
        if !collaborators.keyboard.snapshot().is_composing_enabled {
            return false;
        }
        collaborators.preferences.suggestion().suggestions_enabled || {
            let subtype = collaborators.subtypes.active_subtype();
            collaborators
                .registry
                .requires_always_enabled(&subtype.nlp_providers.suggestion)
        }
    }

    // -------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------

    /// The published list.
    #[must_use]
    pub fn active_candidates(&self) -> Arc<[SuggestionCandidate]> {
        Arc::clone(&self.inner.candidates.borrow())
    }

    /// Receiver that observes every publish.
    #[must_use]
    pub fn subscribe_candidates(&self) -> watch::Receiver<Arc<[SuggestionCandidate]>> {
        self.inner.candidates.subscribe()
    }

    /// First active candidate eligible for auto-commit.
    #[must_use]
    pub fn auto_commit_candidate(&self) -> Option<SuggestionCandidate> {
        self.inner
            .candidates
            .borrow()
            .iter()
            .find(|candidate| candidate.is_eligible_for_auto_commit())
            .cloned()
    }

    /// The published inline suggestions.
    #[must_use]
    pub fn inline_suggestions(&self) -> Arc<[InlineSuggestion]> {
        Arc::clone(&self.inner.inline_suggestions.borrow())
    }

    /// Receiver that observes inline suggestion changes.
    #[must_use]
    pub fn subscribe_inline_suggestions(&self) -> watch::Receiver<Arc<[InlineSuggestion]>> {
        self.inner.inline_suggestions.subscribe()
    }

    /// Spelling results recorded while tracing is enabled.
    #[must_use]
    pub fn debug_trace(&self) -> &DebugTrace {
        &self.inner.trace
    }

    // -------------------------------------------------------------------
    // Inline suggestions and change hooks
    // -------------------------------------------------------------------

    /// Publishes editor-supplied inline suggestions.
    pub fn show_inline_suggestions(&self, suggestions: Vec<InlineSuggestion>) {
        let has_inline_suggestions = !suggestions.is_empty();
        self.inner
            .inline_suggestions
            .send_replace(Arc::from(suggestions));
        let content = self.collaborators().editor.active_content();
        let has_candidates = !self.inner.candidates.borrow().is_empty();
        self.decide_layout(LayoutInputs {
            has_candidates,
            has_inline_suggestions,
            is_selection_mode: content.is_selection_mode,
        });
    }

    /// Drops inline suggestions.
    pub fn clear_inline_suggestions(&self) {
        self.show_inline_suggestions(Vec::new());
    }

    /// Reassembles after the primary clip changed.
    pub async fn on_clipboard_changed(&self) {
        self.assemble().await;
    }

    /// Reassembles after preferences changed.
    pub async fn on_preferences_changed(&self) {
        self.assemble().await;
    }

    // -------------------------------------------------------------------
    // Delegation to providers
    // -------------------------------------------------------------------

    /// Asks the candidate's provider to drop it.
    ///
    /// On success clipboard candidates trigger a reassembly, while word
    /// candidates trigger a fresh request so the provider can offer an
    /// alternative.
    pub async fn remove_suggestion(&self, candidate: &SuggestionCandidate) -> bool {
        let Some(provider) = candidate.source().and_then(|id| self.provider(id)) else {
            debug!(target: ORCHESTRATOR_TARGET, "candidate has no bound source");
            return false;
        };
        let subtype = self.collaborators().subtypes.active_subtype();
        match provider.remove_suggestion(subtype.id, candidate).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(error) => {
                warn!(target: ORCHESTRATOR_TARGET, %error, "remove_suggestion failed");
                return false;
            }
        }
        match candidate.kind() {
            CandidateKind::Clipboard { .. } => self.assemble().await,
            CandidateKind::Word => {
                let content = self.collaborators().editor.active_content();
                self.request_suggestions(&subtype, &content.composing_text, content.preceding_words)
                    .await;
            }
        }
        true
    }

    /// Tells the candidate's provider the user committed it.
    pub async fn notify_suggestion_accepted(&self, candidate: &SuggestionCandidate) {
        let Some(provider) = candidate.source().and_then(|id| self.provider(id)) else {
            return;
        };
        let subtype_id = self.collaborators().subtypes.active_subtype().id;
        if let Err(error) = provider
            .notify_suggestion_accepted(subtype_id, candidate)
            .await
        {
            warn!(target: ORCHESTRATOR_TARGET, %error, "notify accepted failed");
        }
    }

    /// Tells the candidate's provider the user undid its commit.
    pub async fn notify_suggestion_reverted(&self, candidate: &SuggestionCandidate) {
        let Some(provider) = candidate.source().and_then(|id| self.provider(id)) else {
            return;
        };
        let subtype_id = self.collaborators().subtypes.active_subtype().id;
        if let Err(error) = provider
            .notify_suggestion_reverted(subtype_id, candidate)
            .await
        {
            warn!(target: ORCHESTRATOR_TARGET, %error, "notify reverted failed");
        }
    }

    /// Preloads every provider `subtype` names.
    pub async fn preload(&self, subtype: &Subtype) {
        let computed = subtype.compute();
        for id in subtype.nlp_providers.ids() {
            let Some(provider) = self.provider(id) else {
                debug!(target: ORCHESTRATOR_TARGET, provider = %id, "skipping preload of unbound provider");
                continue;
            };
            if let Err(error) = provider.preload(&computed).await {
                warn!(target: ORCHESTRATOR_TARGET, %error, "preload failed");
            }
        }
    }

    /// Preloads the providers of each subtype in turn.
    pub async fn preload_all(&self, subtypes: &[Subtype]) {
        for subtype in subtypes {
            self.preload(subtype).await;
        }
    }

    /// Checks `word` with the subtype's spelling provider.
    ///
    /// Falls back to an unspecified result when no provider answers, and
    /// records the result when debug tracing is enabled.
    pub async fn spell(
        &self,
        subtype: &Subtype,
        word: &str,
        preceding_words: Vec<String>,
    ) -> SpellingResult {
        let result = match self.provider(&subtype.nlp_providers.spelling) {
            Some(provider) => {
                let request = self.word_request(subtype.id, word, preceding_words);
                provider.spell(&request).await.unwrap_or_else(|error| {
                    warn!(target: ORCHESTRATOR_TARGET, %error, "spell failed");
                    SpellingResult::unspecified()
                })
            }
            None => SpellingResult::unspecified(),
        };
        if self.collaborators().preferences.suggestion().debug_trace_enabled {
            self.inner.trace.record(word, result.clone());
        }
        result
    }
}
