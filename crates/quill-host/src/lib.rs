//! Host side of the Quill suggestion pipeline.
//!
//! The host talks to suggestion provider plugins through
//! [`ProviderProxy`], keeps bound providers in a [`ProviderRegistry`], and
//! merges their results with clipboard-derived candidates in the
//! [`SuggestionOrchestrator`], which owns the single observable list of active
//! candidates.
//!
//! Everything the orchestrator needs from the surrounding keyboard arrives
//! through the traits in [`collaborators`], so hosts and tests can supply
//! their own preferences, editor, keyboard state and layout.

mod bootstrap;
mod candidate;
pub mod clipboard;
mod clock;
pub mod collaborators;
mod debug_trace;
mod errors;
mod orchestrator;
mod provider;
mod proxy;
mod registry;
mod subtype;
pub mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, HostRuntime, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use candidate::{CandidateKind, InlineSuggestion, SuggestionCandidate};
pub use clipboard::{CLIPBOARD_PROVIDER_ID, ClipboardSuggestionProvider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use debug_trace::{DebugTrace, TRACE_CAPACITY, TraceEntry};
pub use errors::ProviderError;
pub use orchestrator::{Collaborators, SuggestionOrchestrator};
pub use provider::{ProviderId, ProviderMetadata, SuggestionProvider};
pub use proxy::ProviderProxy;
pub use registry::{ProviderRegistry, SharedProvider};
pub use subtype::{Subtype, SubtypeNlpProviders};
