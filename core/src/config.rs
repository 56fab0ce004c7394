use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which vendor API backs the language model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Environment variable holding this provider's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" | "open_ai" => Ok(ProviderKind::OpenAi),
            other => Err(ConfigError::Invalid(format!(
                "unknown LLM provider '{}' (expected 'gemini' or 'openai')",
                other
            ))),
        }
    }
}

/// Listening socket and static assets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the chat widget (`index.html`, `script.js`, ...)
    pub public_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            public_dir: Some(PathBuf::from("public")),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    /// Override for proxies or OpenAI-compatible endpoints
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            model_name: None,
            base_url: None,
            temperature: 0.7,
            max_output_tokens: 800,
            timeout_secs: 45,
        }
    }
}

impl ModelConfig {
    pub fn resolved_model_name(&self) -> String {
        self.model_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

/// Web search augmentation (SerpAPI)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: "https://serpapi.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl SearchConfig {
    /// Search runs only when switched on and a key is present
    pub fn is_active(&self) -> bool {
        self.enabled
            && self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Open-Meteo endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub geocoding_url: String,
    pub forecast_url: String,
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocoding_url: "https://geocoding-api.open-meteo.com".to_string(),
            forecast_url: "https://api.open-meteo.com".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Google News RSS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub base_url: String,
    pub language: String,
    pub country: String,
    pub max_headlines: usize,
    pub timeout_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://news.google.com".to_string(),
            language: "hi".to_string(),
            country: "IN".to_string(),
            max_headlines: 5,
            timeout_secs: 10,
        }
    }
}

/// Prompt wording. Templates use `{snippet}` and `{question}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub search_template: String,
    pub plain_template: String,
    pub apology: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are Neelakshi AI, a helpful assistant. Reply in the same language \
                            the user wrote in: if the user writes in Hindi (Devanagari script), reply \
                            in Hindi using Devanagari script; otherwise reply in the user's language. \
                            Keep answers clear and accurate."
                .to_string(),
            search_template:
                "Using this information: \"{snippet}\", answer the question accurately.\nQuestion: {question}"
                    .to_string(),
            plain_template: "Answer this question accurately: {question}".to_string(),
            apology: "Sorry, I couldn't generate a reply right now. Please try again.".to_string(),
        }
    }
}

/// One hardcoded answer row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FactConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub answer: String,
}

/// Process-wide configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub weather: WeatherConfig,
    pub news: NewsConfig,
    pub prompts: PromptConfig,
    /// Replaces the built-in fact table when present
    pub facts: Option<Vec<FactConfig>>,
}

impl RelayConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Overlays process environment variables
    pub fn apply_process_env(&mut self) -> ConfigResult<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlays values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(host) = var("HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {}", port)))?;
        }
        if let Some(dir) = var("PUBLIC_DIR") {
            self.server.public_dir = Some(PathBuf::from(dir));
        }

        // Provider first, its key variable depends on it
        if let Some(provider) = var("LLM_PROVIDER") {
            self.model.provider = provider.parse()?;
        }
        self.apply_provider_env(&var);

        if let Some(key) = var("SERPAPI_API_KEY") {
            self.search.api_key = Some(key);
        }

        Ok(())
    }

    /// Switches to another provider after the environment overlay ran.
    ///
    /// Key, model and base URL belonged to the previous provider, so they are
    /// dropped and re-read from the environment for the new one.
    pub fn override_provider<F>(&mut self, provider: ProviderKind, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if provider == self.model.provider {
            return;
        }

        self.model.provider = provider;
        self.model.api_key = None;
        self.model.model_name = None;
        self.model.base_url = None;

        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        self.apply_provider_env(&var);
    }

    fn apply_provider_env<F>(&mut self, var: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = var(self.model.provider.api_key_env()) {
            self.model.api_key = Some(key);
        }
        if let Some(model) = var("MODEL_NAME") {
            self.model.model_name = Some(model);
        }
        if self.model.provider == ProviderKind::OpenAi {
            if let Some(base_url) = var("OPENAI_BASE_URL") {
                self.model.base_url = Some(base_url);
            }
        }
    }

    /// Checks credentials and value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        let has_key = self
            .model
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(ConfigError::MissingCredential(
                self.model.provider.api_key_env(),
            ));
        }

        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid(format!(
                "model.temperature must be between 0 and 2, got {}",
                self.model.temperature
            )));
        }

        for (field, value) in [
            ("prompts.apology", &self.prompts.apology),
            ("prompts.plain_template", &self.prompts.plain_template),
            ("prompts.search_template", &self.prompts.search_template),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }

        if self.news.max_headlines == 0 {
            return Err(ConfigError::Invalid(
                "news.max_headlines must be at least 1".to_string(),
            ));
        }

        if let Some(facts) = &self.facts {
            for fact in facts {
                if fact.answer.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "fact '{}' has an empty answer",
                        fact.name
                    )));
                }
                if fact.keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(ConfigError::Invalid(format!(
                        "fact '{}' has no keywords",
                        fact.name
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> ConfigResult<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::Invalid("Could not determine config directory".to_string())
    })?;

    Ok(config_dir.join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> ConfigResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
