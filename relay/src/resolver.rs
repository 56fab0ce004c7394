//! Response resolver: walks the strategy table and produces exactly one reply.
//!
//! Only an empty message is reported as an error. Every collaborator failure
//! is turned into an ordinary reply here so the transport never sees it.

use neelakshi_core::config::{PromptConfig, RelayConfig};
use neelakshi_core::errors::ConfigResult;
use neelakshi_core::types::{ChatMessage, Role};
use neelakshi_core::{
    create_llm_client, GoogleNewsClient, LanguageModelClient, NewsClient, OpenMeteoClient,
    SearchClient, SerpApiClient, WeatherClient,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::message::{IncomingMessage, NormalizedText, Reply, ReplySource};
use crate::strategy::{extract_weather_place, news_topic, Handler, StrategyTable};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No message provided")]
    InvalidInput,
}

/// Downstream services the strategies may call
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LanguageModelClient>,
    /// Absent when no search key is configured
    pub search: Option<Arc<dyn SearchClient>>,
    pub weather: Arc<dyn WeatherClient>,
    pub news: Arc<dyn NewsClient>,
}

impl Collaborators {
    pub fn from_config(config: &RelayConfig) -> ConfigResult<Self> {
        let llm = create_llm_client(&config.model)?;

        let search: Option<Arc<dyn SearchClient>> = if config.search.is_active() {
            info!("Web search augmentation enabled");
            Some(Arc::new(SerpApiClient::new(&config.search)?))
        } else {
            info!("Web search augmentation disabled");
            None
        };

        Ok(Self {
            llm,
            search,
            weather: Arc::new(OpenMeteoClient::new(&config.weather)?),
            news: Arc::new(GoogleNewsClient::new(&config.news)?),
        })
    }
}

#[derive(Clone)]
pub struct Resolver {
    table: StrategyTable,
    prompts: PromptConfig,
    collaborators: Collaborators,
}

impl Resolver {
    pub fn new(table: StrategyTable, prompts: PromptConfig, collaborators: Collaborators) -> Self {
        Self {
            table,
            prompts,
            collaborators,
        }
    }

    /// Builds the table and every vendor binding from a validated config.
    pub fn from_config(config: &RelayConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            StrategyTable::from_config(config.facts.as_deref()),
            config.prompts.clone(),
            Collaborators::from_config(config)?,
        ))
    }

    /// (provider, model) of the language model behind the fallback strategy
    pub fn model_info(&self) -> (&'static str, String) {
        (
            self.collaborators.llm.provider_name(),
            self.collaborators.llm.model_name(),
        )
    }

    /// Resolve one message into one reply.
    pub async fn resolve(&self, message: IncomingMessage) -> Result<Reply, ResolveError> {
        let normalized = NormalizedText::new(&message.text);
        if normalized.is_empty() {
            return Err(ResolveError::InvalidInput);
        }

        let entry = self.table.select(&normalized);
        debug!(strategy = %entry.name, "Strategy selected");

        let reply = match &entry.handler {
            Handler::Fact(answer) => Reply::new(answer.clone(), ReplySource::Hardcoded),
            Handler::Weather => self.weather_reply(&normalized).await,
            Handler::News => self.news_reply(&normalized).await,
            Handler::Model => self.model_reply(message.text.trim(), &message.history).await,
        };

        info!(strategy = %entry.name, source = ?reply.source, "Reply resolved");
        Ok(reply)
    }

    async fn weather_reply(&self, text: &NormalizedText) -> Reply {
        let Some(place) = extract_weather_place(text) else {
            return Reply::new(
                "🌤️ Which place would you like the weather for? Try \"weather in Jaipur\".",
                ReplySource::DomainData,
            );
        };

        match self.collaborators.weather.lookup(&place).await {
            Ok(Some(report)) => Reply::new(
                format!(
                    "🌤️ Weather in {}: {}°C, wind speed {} km/h.",
                    place,
                    format_measurement(report.temperature),
                    format_measurement(report.windspeed)
                ),
                ReplySource::DomainData,
            ),
            Ok(None) => {
                debug!(place = %place, "Weather lookup found no such place");
                Reply::new(
                    format!("❌ Couldn't find weather for {}.", place),
                    ReplySource::Error,
                )
            }
            Err(e) => {
                warn!(error = %e, place = %place, "Weather lookup failed");
                Reply::new(
                    "❌ Weather service is currently unavailable.",
                    ReplySource::Error,
                )
            }
        }
    }

    async fn news_reply(&self, text: &NormalizedText) -> Reply {
        let (topic, label) = news_topic(text);

        match self.collaborators.news.fetch_headlines(&topic).await {
            Ok(headlines) if headlines.is_empty() => {
                Reply::new("❌ No news found for this query.", ReplySource::Error)
            }
            Ok(headlines) => {
                let mut reply = format!("📰 Latest news for {}:", label);
                for (i, headline) in headlines.iter().enumerate() {
                    reply.push_str(&format!("\n{}. {}", i + 1, headline));
                }
                Reply::new(reply, ReplySource::DomainData)
            }
            Err(e) => {
                warn!(error = %e, topic = %topic, "News lookup failed");
                Reply::new(
                    "❌ News service is currently unavailable.",
                    ReplySource::Error,
                )
            }
        }
    }

    async fn model_reply(&self, question: &str, history: &[ChatMessage]) -> Reply {
        let snippet = self.search_snippet(question).await;

        let (prompt, source) = match &snippet {
            Some(snippet) => (
                render_template(&self.prompts.search_template, snippet, question),
                ReplySource::SearchAugmented,
            ),
            None => (
                render_template(&self.prompts.plain_template, "", question),
                ReplySource::ModelOnly,
            ),
        };

        let mut messages: Vec<ChatMessage> = history
            .iter()
            .filter(|turn| turn.role != Role::System && !turn.content.trim().is_empty())
            .cloned()
            .collect();
        messages.push(ChatMessage::user(prompt));

        match self
            .collaborators
            .llm
            .complete(&self.prompts.system_prompt, &messages)
            .await
        {
            Ok(text) if !text.trim().is_empty() => Reply::new(text.trim(), source),
            Ok(_) => {
                warn!("Language model returned an empty reply");
                Reply::new(self.prompts.apology.clone(), ReplySource::ModelOnly)
            }
            Err(e) => {
                warn!(error = %e, "Language model call failed");
                Reply::new(self.prompts.apology.clone(), ReplySource::ModelOnly)
            }
        }
    }

    async fn search_snippet(&self, question: &str) -> Option<String> {
        let search = self.collaborators.search.as_ref()?;
        match search.search(question).await {
            Ok(Some(snippet)) if !snippet.text.trim().is_empty() => Some(snippet.text),
            Ok(_) => {
                debug!("Search returned no usable snippet");
                None
            }
            Err(e) => {
                warn!(error = %e, "Search failed, answering without a snippet");
                None
            }
        }
    }
}

/// Whole numbers print without a decimal part
fn format_measurement(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Fills `{snippet}` and `{question}` in one pass, so placeholder text inside
/// the substituted values is left alone.
fn render_template(template: &str, snippet: &str, question: &str) -> String {
    let mut rendered = String::with_capacity(template.len() + snippet.len() + question.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{snippet}") {
            rendered.push_str(snippet);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            rendered.push_str(question);
            rest = after;
        } else {
            rendered.push('{');
            rest = &tail[1..];
        }
    }
    rendered.push_str(rest);
    rendered
}
