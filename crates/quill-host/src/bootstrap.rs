//! Host start-up: configuration, telemetry and plugin binding.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use quill_config::Config;
use quill_protocol::Channel;
use thiserror::Error;

use crate::proxy::ProviderProxy;
use crate::provider::ProviderMetadata;
use crate::registry::ProviderRegistry;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the host configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// A configured host ready to bind plugins.
pub struct HostRuntime {
    config: Arc<Config>,
    registry: Arc<ProviderRegistry>,
    telemetry: TelemetryHandle,
}

impl HostRuntime {
    /// The resolved configuration, shareable as a preference source.
    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The provider registry.
    #[must_use]
    pub fn registry(&self) -> Arc<ProviderRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Wraps `channel` in a proxy and registers it.
    ///
    /// Must be called within a Tokio runtime.
    pub fn bind_plugin(
        &self,
        metadata: ProviderMetadata,
        channel: Arc<dyn Channel>,
    ) -> Arc<ProviderProxy> {
        let proxy = Arc::new(ProviderProxy::new(metadata, channel));
        self.registry.register(proxy.clone());
        proxy
    }
}

/// Loads configuration and installs telemetry.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<HostRuntime, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    Ok(HostRuntime {
        config: Arc::new(config),
        registry: Arc::new(ProviderRegistry::new()),
        telemetry,
    })
}

#[cfg(test)]
mod tests {
    use quill_protocol::LocalChannel;
    use rstest::rstest;

    use super::*;
    use crate::provider::{ProviderId, SuggestionProvider};

    #[rstest]
    fn bootstrap_uses_the_loaded_configuration() {
        let config = Config {
            max_suggestion_count: 4,
            ..Config::default()
        };

        let runtime = bootstrap_with(&StaticConfigLoader::new(config)).expect("bootstrap");

        assert_eq!(runtime.config().max_suggestion_count, 4);
        assert!(runtime.registry().ids().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn bound_plugins_are_registered_until_their_channel_closes() {
        let runtime =
            bootstrap_with(&StaticConfigLoader::new(Config::default())).expect("bootstrap");
        let (host, plugin) = LocalChannel::pair();

        let proxy = runtime.bind_plugin(ProviderMetadata::new("remote"), Arc::new(host));

        let id = ProviderId::new("remote");
        assert!(proxy.is_bound());
        assert!(runtime.registry().get(&id).is_some());

        plugin.close();
        assert!(runtime.registry().get(&id).is_none());
    }
}
