use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{ModelConfig, ProviderKind};
use crate::errors::{ConfigError, ConfigResult, ProviderResult};
use crate::gemini::GeminiClient;
use crate::openai::OpenAiClient;
use crate::types::ChatMessage;

/// Common trait for all language model clients
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Complete a conversation under the given system instruction.
    ///
    /// `messages` are ordered oldest first; the last one is the current user turn.
    async fn complete(&self, system_prompt: &str, messages: &[ChatMessage])
        -> ProviderResult<String>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Get the model name being used
    fn model_name(&self) -> String;
}

/// Shared reqwest client construction with the relay's timeouts
pub(crate) fn build_http_client(timeout_secs: u64) -> ConfigResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("neelakshi-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::Invalid(format!("Failed to create HTTP client: {}", e)))
}

/// Creates the language model client selected by the configuration.
pub fn create_llm_client(config: &ModelConfig) -> ConfigResult<Arc<dyn LanguageModelClient>> {
    match config.provider {
        ProviderKind::Gemini => {
            info!("Creating Gemini LLM client");
            Ok(Arc::new(GeminiClient::new(config)?))
        }
        ProviderKind::OpenAi => {
            info!("Creating OpenAI LLM client");
            Ok(Arc::new(OpenAiClient::new(config)?))
        }
    }
}
