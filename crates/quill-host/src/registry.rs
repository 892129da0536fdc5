//! Bound providers keyed by id.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::provider::{ProviderId, SuggestionProvider};

/// Log target for registry events.
const REGISTRY_TARGET: &str = "quill_host::registry";

/// Shared handle to a provider.
pub type SharedProvider = Arc<dyn SuggestionProvider>;

/// The set of providers the host can call.
///
/// Lookups discard providers that have become unbound, so callers only ever
/// see live providers.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<ProviderId, SharedProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `provider`, returning any provider it replaced.
    pub fn register(&self, provider: SharedProvider) -> Option<SharedProvider> {
        let id = provider.id().clone();
        info!(target: REGISTRY_TARGET, provider = %id, "provider registered");
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, provider)
    }

    /// Removes the provider registered under `id`.
    pub fn unregister(&self, id: &ProviderId) -> Option<SharedProvider> {
        let removed = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed.is_some() {
            info!(target: REGISTRY_TARGET, provider = %id, "provider unregistered");
        }
        removed
    }

    /// Returns the bound provider registered under `id`.
    #[must_use]
    pub fn get(&self, id: &ProviderId) -> Option<SharedProvider> {
        let provider = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()?;
        if provider.is_bound() {
            return Some(provider);
        }

        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if providers
            .get(id)
            .is_some_and(|current| Arc::ptr_eq(current, &provider))
        {
            providers.remove(id);
            info!(target: REGISTRY_TARGET, provider = %id, "discarded unbound provider");
        }
        None
    }

    /// Whether the provider under `id` keeps suggestions on regardless of
    /// user preference.
    #[must_use]
    pub fn requires_always_enabled(&self, id: &ProviderId) -> bool {
        self.get(id)
            .is_some_and(|provider| provider.metadata().require_always_enabled)
    }

    /// Ids of every registered provider, sorted.
    #[must_use]
    pub fn ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<_> = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}
