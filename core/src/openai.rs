use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{build_http_client, LanguageModelClient};
use crate::config::ModelConfig;
use crate::errors::{ConfigError, ConfigResult, ProviderError, ProviderResult};
use crate::types::ChatMessage;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize, Debug)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Deserialize, Debug)]
struct OpenAiError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

/// OpenAI-compatible chat completions client
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    /// Create a new OpenAI client
    pub fn new(config: &ModelConfig) -> ConfigResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;

        let base_url = config
            .base_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            api_key,
            model_name: config.resolved_model_name(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_tokens: config.max_output_tokens,
        })
    }

    /// Build the OpenAI API URL
    fn api_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LanguageModelClient for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        debug!("Generating text with OpenAI model: {}", self.model_name);

        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.trim().is_empty() {
            wire_messages.push(OpenAiMessage {
                role: "system",
                content: system_prompt,
            });
        }
        wire_messages.extend(messages.iter().map(|message| OpenAiMessage {
            role: message.role.as_str(),
            content: &message.content,
        }));

        let request = OpenAiRequest {
            model: &self.model_name,
            messages: wire_messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http_client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("Failed to send request to OpenAI API: {}", e.without_url())))?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<OpenAiErrorResponse>(&response_text) {
                Ok(error_response) => format!(
                    "{} (type: {})",
                    error_response.error.message,
                    error_response.error.error_type.as_deref().unwrap_or("unknown")
                ),
                Err(_) => response_text,
            };
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                message,
            });
        }

        let openai_response: OpenAiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ProviderError::Parsing(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(usage) = &openai_response.usage {
            debug!(
                "OpenAI token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse("No text generated by OpenAI".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}
