//! End-to-end tests wiring host proxies to plugin servers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quill_config::Config;
use quill_host::collaborators::{
    EditorContent, EditorSource, KeyboardSnapshot, KeyboardState, PreferenceSource,
    SmartbarLayout, SubtypeSource,
};
use quill_host::clipboard::{ClipboardItem, ClipboardSource};
use quill_host::{
    ClipboardSuggestionProvider, Collaborators, ManualClock, ProviderId,
    ProviderMetadata, ProviderProxy, ProviderRegistry, Subtype, SubtypeNlpProviders,
    SuggestionCandidate, SuggestionOrchestrator, SuggestionProvider,
};
use quill_plugin::{PluginServer, PluginService};
use quill_protocol::payload::{
    CandidateData, CandidateNotice, ComputedSubtype, SpellingAttributes, SpellingResult,
    SubtypeSupportInfo, SuggestionRequestFlags, SupportState, WordRequest,
};
use quill_protocol::{Channel, LocalChannel, StreamChannel};
use rstest::rstest;
use tokio::time::timeout;

const DICTIONARY: &[&str] = &["hello", "help", "helmet", "world"];

/// Prefix-completing plugin over a fixed word list.
struct DictionaryPlugin;

#[async_trait]
impl PluginService for DictionaryPlugin {
    async fn evaluate_is_supported(&self, subtype: ComputedSubtype) -> SubtypeSupportInfo {
        if subtype.primary_locale == "en-US" {
            SubtypeSupportInfo::fully_supported()
        } else {
            SubtypeSupportInfo::unsupported("english only")
        }
    }

    async fn preload(&self, _subtype: ComputedSubtype) {}

    async fn spell(&self, request: WordRequest) -> SpellingResult {
        if DICTIONARY.contains(&request.word.as_str()) {
            SpellingResult::valid_word()
        } else {
            SpellingResult::typo(completions(request.word.get(..1).unwrap_or_default()))
        }
    }

    async fn suggest(&self, request: WordRequest) -> Vec<CandidateData> {
        completions(&request.word)
            .into_iter()
            .take(usize::from(request.flags.max_suggestion_count))
            .map(|text| CandidateData {
                is_eligible_for_auto_commit: text.len() == request.word.len() + 1,
                ..CandidateData::new(text)
            })
            .collect()
    }

    async fn notify_suggestion_accepted(&self, _notice: CandidateNotice) {}

    async fn notify_suggestion_reverted(&self, _notice: CandidateNotice) {}

    async fn remove_suggestion(&self, notice: CandidateNotice) -> bool {
        DICTIONARY.contains(&notice.candidate.text.as_str())
    }
}

fn completions(prefix: &str) -> Vec<String> {
    DICTIONARY
        .iter()
        .filter(|word| word.starts_with(prefix))
        .map(|word| (*word).to_owned())
        .collect()
}

fn word_request(word: &str) -> WordRequest {
    WordRequest {
        subtype_id: 1,
        word: word.to_owned(),
        prev_words: Vec::new(),
        flags: SuggestionRequestFlags::default(),
    }
}

fn english() -> ComputedSubtype {
    ComputedSubtype {
        id: 1,
        primary_locale: "en-US".into(),
        secondary_locales: Vec::new(),
    }
}

fn local_link() -> (ProviderProxy, PluginServer) {
    let (host, plugin) = LocalChannel::pair();
    let server = PluginServer::bind(Arc::new(DictionaryPlugin), Arc::new(plugin));
    let proxy = ProviderProxy::new(ProviderMetadata::new("dictionary"), Arc::new(host));
    (proxy, server)
}

fn stream_link() -> (ProviderProxy, PluginServer) {
    let (host_io, plugin_io) = tokio::io::duplex(4096);
    let (host_read, host_write) = tokio::io::split(host_io);
    let (plugin_read, plugin_write) = tokio::io::split(plugin_io);
    let host: Arc<dyn Channel> = Arc::new(StreamChannel::spawn(host_read, host_write));
    let plugin: Arc<dyn Channel> = Arc::new(StreamChannel::spawn(plugin_read, plugin_write));
    let server = PluginServer::bind(Arc::new(DictionaryPlugin), plugin);
    let proxy = ProviderProxy::new(ProviderMetadata::new("dictionary"), host);
    (proxy, server)
}

// -----------------------------------------------------------------------
// Proxy to server
// -----------------------------------------------------------------------

#[rstest]
#[case::local(local_link as fn() -> (ProviderProxy, PluginServer))]
#[case::stream(stream_link as fn() -> (ProviderProxy, PluginServer))]
#[tokio::test]
async fn every_operation_round_trips(#[case] link: fn() -> (ProviderProxy, PluginServer)) {
    let (proxy, _server) = link();

    let support = proxy
        .evaluate_is_supported(&english())
        .await
        .expect("support");
    assert_eq!(support.state(), SupportState::Supported);

    proxy.preload(&english()).await.expect("preload");

    let suggestions = proxy.suggest(&word_request("hel")).await.expect("suggest");
    let texts: Vec<&str> = suggestions.iter().map(SuggestionCandidate::text).collect();
    assert_eq!(texts, vec!["hello", "help", "helmet"]);
    assert!(
        suggestions
            .iter()
            .all(|candidate| candidate.source() == Some(&ProviderId::new("dictionary")))
    );

    let spelled = proxy.spell(&word_request("wrld")).await.expect("spell");
    assert!(
        spelled
            .suggestion_attributes
            .contains(SpellingAttributes::LOOKS_LIKE_TYPO)
    );
    assert_eq!(spelled.suggestions, vec!["world"]);

    let first = suggestions.first().expect("a suggestion");
    proxy
        .notify_suggestion_accepted(1, first)
        .await
        .expect("accepted");
    proxy
        .notify_suggestion_reverted(1, first)
        .await
        .expect("reverted");
    assert!(proxy.remove_suggestion(1, first).await.expect("removed"));
    assert_eq!(proxy.pending_count(), 0);
}

#[rstest]
#[tokio::test]
async fn concurrent_requests_resolve_independently() {
    let (proxy, _server) = local_link();

    let hel_request = word_request("hel");
    let wor_request = word_request("wor");
    let (hel, wor) = tokio::join!(
        proxy.suggest(&hel_request),
        proxy.suggest(&wor_request)
    );

    assert_eq!(hel.expect("hel").len(), 3);
    let world = wor.expect("wor");
    assert_eq!(
        world.iter().map(SuggestionCandidate::text).collect::<Vec<_>>(),
        vec!["world"]
    );
}

#[rstest]
#[tokio::test]
async fn plugin_shutdown_unbinds_the_proxy() {
    let (proxy, server) = local_link();

    server.shutdown();

    assert!(!proxy.is_bound());
    assert!(proxy.suggest(&word_request("hel")).await.is_err());
}

#[rstest]
#[tokio::test]
async fn stream_disconnect_unbinds_the_proxy() {
    let (proxy, server) = stream_link();

    server.shutdown();
    timeout(Duration::from_secs(5), async {
        while proxy.is_bound() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("proxy unbound after disconnect");

    assert_eq!(proxy.pending_count(), 0);
}

// -----------------------------------------------------------------------
// Orchestrator over a live plugin
// -----------------------------------------------------------------------

struct NoClipboard;

impl ClipboardSource for NoClipboard {
    fn primary_clip(&self) -> Option<ClipboardItem> {
        None
    }
}

struct Editor;

impl EditorSource for Editor {
    fn active_content(&self) -> EditorContent {
        EditorContent {
            composing_text: "hel".into(),
            ..EditorContent::default()
        }
    }
}

struct Keyboard;

impl KeyboardState for Keyboard {
    fn snapshot(&self) -> KeyboardSnapshot {
        KeyboardSnapshot::default()
    }
}

struct Layout;

impl SmartbarLayout for Layout {
    fn set_shared_actions_expanded(&self, _expanded: bool, _animate: bool) {}
}

struct Subtypes;

impl SubtypeSource for Subtypes {
    fn active_subtype(&self) -> Subtype {
        Subtype {
            id: 1,
            primary_locale: "en-US".into(),
            secondary_locales: Vec::new(),
            nlp_providers: SubtypeNlpProviders::single(ProviderId::new("dictionary")),
        }
    }

    fn subtypes(&self) -> Vec<Subtype> {
        vec![self.active_subtype()]
    }
}

#[rstest]
#[tokio::test]
async fn orchestrator_publishes_plugin_suggestions() {
    let (proxy, _server) = local_link();
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(Arc::new(proxy));
    let clock = Arc::new(ManualClock::new(0));
    let preferences: Arc<dyn PreferenceSource> = Arc::new(Config::default());
    let clipboard = Arc::new(ClipboardSuggestionProvider::new(
        Arc::new(NoClipboard),
        Arc::clone(&preferences),
        clock.clone(),
    ));
    let orchestrator = SuggestionOrchestrator::new(Collaborators {
        registry,
        clipboard,
        preferences,
        editor: Arc::new(Editor),
        keyboard: Arc::new(Keyboard),
        layout: Arc::new(Layout),
        subtypes: Arc::new(Subtypes),
        clock,
    });
    let subtype = Subtypes.active_subtype();

    orchestrator
        .request_suggestions(&subtype, "hel", Vec::new())
        .await;

    let texts: Vec<String> = orchestrator
        .active_candidates()
        .iter()
        .map(|candidate| candidate.text().to_owned())
        .collect();
    assert_eq!(texts, vec!["hello", "help", "helmet"]);
    // "help" is one letter longer than "hel".
    assert_eq!(
        orchestrator
            .auto_commit_candidate()
            .map(|candidate| candidate.text().to_owned()),
        Some("help".to_owned())
    );

    let spelled = orchestrator.spell(&subtype, "helo", Vec::new()).await;
    assert!(!spelled.is_unspecified());
}
