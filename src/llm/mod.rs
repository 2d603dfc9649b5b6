use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LlmConfig;

mod gemini;

pub use gemini::GeminiClient;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single-turn prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Stand-in used when no API key is configured.
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
        anyhow::bail!("LLM not configured")
    }
}

pub fn from_config(config: &LlmConfig) -> Arc<dyn LlmClient> {
    match &config.api_key {
        Some(key) => Arc::new(GeminiClient::new(
            key.clone(),
            config.model.clone(),
            config.base_url.clone(),
        )),
        None => {
            tracing::warn!("GEMINI_KEY not set; spending extraction disabled");
            Arc::new(DisabledClient)
        }
    }
}
