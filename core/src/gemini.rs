use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{build_http_client, LanguageModelClient};
use crate::config::ModelConfig;
use crate::errors::{ConfigError, ConfigResult, ProviderError, ProviderResult};
use crate::types::*;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Deserialize, Debug)]
struct GeminiErrorResponse {
    error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Create a new Gemini API client
    pub fn new(config: &ModelConfig) -> ConfigResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("GEMINI_API_KEY"))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client: build_http_client(config.timeout_secs)?,
            api_key,
            model_name: config.resolved_model_name(),
            base_url: base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    /// Get the generateContent URL for the configured model
    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model_name
        )
    }

    /// Builds the request body. System turns are folded into the system instruction.
    fn build_request(&self, system_prompt: &str, messages: &[ChatMessage]) -> GenerateContentRequest {
        let mut instruction = system_prompt.to_string();
        let mut contents = Vec::with_capacity(messages.len());

        for message in messages {
            let role = match message.role {
                Role::System => {
                    instruction.push('\n');
                    instruction.push_str(&message.content);
                    continue;
                }
                Role::User => "user",
                Role::Assistant => "model",
            };
            contents.push(Content {
                parts: vec![Part::text(message.content.clone())],
                role: Some(role.to_string()),
            });
        }

        let system_instruction = (!instruction.trim().is_empty()).then(|| Content {
            parts: vec![Part::text(instruction)],
            role: None,
        });

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: Some(self.max_output_tokens),
            }),
        }
    }

    /// Helper method to extract text from a response
    pub fn extract_text_from_response(response: &GenerateContentResponse) -> ProviderResult<String> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::EmptyResponse("No candidates in response".to_string()))?;

        if let Some(reason) = &candidate.finish_reason {
            if reason != "STOP" {
                warn!("Gemini generation finish reason: {}", reason);
            }
        }

        let content = candidate
            .content
            .as_ref()
            .ok_or_else(|| ProviderError::EmptyResponse("No content in candidate".to_string()))?;

        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();

        let text = text.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse("No text in candidate".to_string()));
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl LanguageModelClient for GeminiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        debug!("Generating text with Gemini model: {}", self.model_name);

        let request = self.build_request(system_prompt, messages);

        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(format!("Failed to send request: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<GeminiErrorResponse>(&error_body) {
                Ok(parsed) => format!("{} ({})", parsed.error.message, parsed.error.status),
                Err(_) => error_body,
            };
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                message,
            });
        }

        let response_body = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| ProviderError::Parsing(format!("Failed to parse response: {}", e.without_url())))?;

        Self::extract_text_from_response(&response_body)
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}
