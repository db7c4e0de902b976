use crate::config::ModelSettings;
use crate::errors::ConfigError;
use crate::model::LlmResponse;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque text completion: prompt in, completion text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
    fn model_name(&self) -> &str;
}

pub fn from_settings(settings: &ModelSettings) -> Result<Arc<dyn ModelClient>, ConfigError> {
    match settings.provider.as_str() {
        "ollama" => Ok(Arc::new(ollama::OllamaClient::new(
            &settings.base_url,
            &settings.name,
            settings.temperature,
        )?)),
        "fake" => Ok(Arc::new(fake::FakeClient::canned(&settings.name))),
        other => Err(ConfigError(format!(
            "unknown model provider '{}' (expected ollama or fake)",
            other
        ))),
    }
}

pub mod fake;
pub mod ollama;
