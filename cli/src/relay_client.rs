use anyhow::{anyhow, Context, Result};
use neelakshi_core::types::ChatMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "no_history")]
    history: &'a [ChatMessage],
}

fn no_history(history: &&[ChatMessage]) -> bool {
    history.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: Option<String>,
    error: Option<String>,
}

/// HTTP client for the relay's `/chat` endpoint
#[derive(Debug, Clone)]
pub struct RelayClient {
    http_client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one message with the prior conversation and return the reply text.
    ///
    /// `{ "error" }` bodies and non-2xx statuses become errors.
    #[instrument(skip(self, history), fields(history_len = history.len()))]
    pub async fn send(&self, message: &str, history: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat", self.base_url);
        debug!("POST {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&ChatRequest { message, history })
            .send()
            .await
            .with_context(|| format!("Could not reach the relay at {}", self.base_url))?;

        let status = response.status();
        let body = response.text().await.context("Failed to read relay response")?;

        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(ChatResponse {
                error: Some(error), ..
            }) => Err(anyhow!("Relay error ({}): {}", status.as_u16(), error)),
            Ok(ChatResponse {
                reply: Some(reply), ..
            }) if status.is_success() => Ok(reply),
            _ if !status.is_success() => Err(anyhow!(
                "Relay returned {}: {}",
                status,
                body.trim()
            )),
            _ => Err(anyhow!("Unexpected relay response: {}", body.trim())),
        }
    }
}
