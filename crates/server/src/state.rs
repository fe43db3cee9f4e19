use std::sync::Arc;

use providers::gemini::{GeminiConfig, GeminiProvider};
use providers::noop::NoopProvider;
use providers::{ProviderRegistry, VisionProvider};

use super::config::ServerConfig;

pub struct AppState {
    pub provider: Arc<dyn VisionProvider>,
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let provider = build_registry(&config).vision(None)?;
        Ok(Self::with_provider(provider, config))
    }

    pub fn with_provider(provider: Arc<dyn VisionProvider>, config: ServerConfig) -> Arc<Self> {
        Arc::new(Self { provider, config })
    }
}

/// Gemini when a key is configured, otherwise the no-op provider.
pub fn build_registry(config: &ServerConfig) -> ProviderRegistry {
    let reg = ProviderRegistry::new().with_vision("noop", Arc::new(NoopProvider));
    match &config.gemini_api_key {
        Some(key) => reg
            .with_vision(
                "gemini",
                Arc::new(GeminiProvider::new(GeminiConfig {
                    api_key: key.clone(),
                    base_url: config.gemini_base_url.clone(),
                    model: config.gemini_model.clone(),
                })),
            )
            .set_preferred_vision("gemini"),
        None => reg.set_preferred_vision("noop"),
    }
}
