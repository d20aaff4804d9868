//! Startup capability probe.
//!
//! Decides once, from compiled-in Cargo features and configuration, which
//! providers exist and in what order. The resulting list never changes for
//! the life of the process, so nothing downstream re-checks availability.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{ScorerConfig, ScoringMode};
use crate::provider::FeedbackProvider;
use crate::resolver::Resolver;

/// Ordered, fixed set of providers for one process.
pub struct ProviderRegistry {
    mode: ScoringMode,
    providers: Vec<Arc<dyn FeedbackProvider>>,
}

impl ProviderRegistry {
    /// Build the provider list for `config`.
    ///
    /// Live mode registers the local provider, then the cloud provider, each
    /// only when its feature is compiled in and its section is enabled.
    /// Simulated mode registers no network providers.
    pub fn probe(config: &ScorerConfig) -> Self {
        let mut providers: Vec<Arc<dyn FeedbackProvider>> = Vec::new();

        if config.resolver.mode == ScoringMode::Simulated {
            info!("simulated mode: no network providers registered");
            return Self {
                mode: ScoringMode::Simulated,
                providers,
            };
        }

        if config.local.enabled {
            #[cfg(feature = "local-backend")]
            {
                info!(url = %config.local.url, model = %config.local.model, "local provider registered");
                providers.push(Arc::new(crate::provider::ollama::OllamaProvider::from_config(
                    &config.local,
                )));
            }
            #[cfg(not(feature = "local-backend"))]
            debug!("local backend enabled in config but not compiled in");
        } else {
            debug!("local backend disabled in config");
        }

        if config.cloud.enabled {
            #[cfg(feature = "cloud-backend")]
            {
                info!(base_url = %config.cloud.base_url, model = %config.cloud.model, "cloud provider registered");
                providers.push(Arc::new(crate::provider::openai::OpenAiProvider::from_config(
                    &config.cloud,
                )));
            }
            #[cfg(not(feature = "cloud-backend"))]
            debug!("cloud backend enabled in config but not compiled in");
        } else {
            debug!("cloud backend disabled in config");
        }

        Self {
            mode: ScoringMode::Live,
            providers,
        }
    }

    /// Registry over an explicit provider list (live mode).
    pub fn from_providers(providers: Vec<Arc<dyn FeedbackProvider>>) -> Self {
        Self {
            mode: ScoringMode::Live,
            providers,
        }
    }

    /// Mode the registry was probed for.
    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Registered provider names, in fallback order.
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Hand the providers to a resolver.
    pub fn into_resolver(self) -> Resolver {
        Resolver::new(self.providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_mode_registers_nothing() {
        let mut config = ScorerConfig::default();
        config.resolver.mode = ScoringMode::Simulated;
        let registry = ProviderRegistry::probe(&config);
        assert_eq!(registry.mode(), ScoringMode::Simulated);
        assert!(registry.names().is_empty());
    }

    #[cfg(all(feature = "local-backend", feature = "cloud-backend"))]
    #[test]
    fn test_live_mode_orders_local_before_cloud() {
        use crate::provider::ProviderKind;

        let registry = ProviderRegistry::probe(&ScorerConfig::default());
        assert_eq!(registry.names(), vec!["Ollama (local)", "OpenAI (cloud)"]);
        let resolver = registry.into_resolver();
        let kinds: Vec<_> = resolver.providers().iter().map(|p| p.kind()).collect();
        assert_eq!(kinds, vec![ProviderKind::Local, ProviderKind::Cloud]);
    }

    #[cfg(feature = "cloud-backend")]
    #[test]
    fn test_disabled_local_is_not_registered() {
        let mut config = ScorerConfig::default();
        config.local.enabled = false;
        let registry = ProviderRegistry::probe(&config);
        assert_eq!(registry.names(), vec!["OpenAI (cloud)"]);
    }

    #[test]
    fn test_everything_disabled_yields_empty_live_registry() {
        let mut config = ScorerConfig::default();
        config.local.enabled = false;
        config.cloud.enabled = false;
        let registry = ProviderRegistry::probe(&config);
        assert_eq!(registry.mode(), ScoringMode::Live);
        assert!(registry.names().is_empty());
    }
}
