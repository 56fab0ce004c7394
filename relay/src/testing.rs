//! Stub collaborators shared by the resolver and HTTP tests.

use async_trait::async_trait;
use neelakshi_core::errors::{ProviderError, ProviderResult};
use neelakshi_core::types::{ChatMessage, SearchSnippet, WeatherReport};
use neelakshi_core::{LanguageModelClient, NewsClient, SearchClient, WeatherClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::resolver::{Collaborators, Resolver};
use crate::strategy::StrategyTable;
use neelakshi_core::config::PromptConfig;

pub struct StubModel {
    reply: Option<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl StubModel {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(text.to_string()),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// (system prompt, messages) of the most recent call
    pub fn last_request(&self) -> Option<(String, Vec<ChatMessage>)> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LanguageModelClient for StubModel {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), messages.to_vec()));
        self.reply
            .clone()
            .ok_or_else(|| ProviderError::Http {
                status_code: 503,
                message: "model unavailable".to_string(),
            })
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }

    fn model_name(&self) -> String {
        "stub-model".to_string()
    }
}

pub struct StubSearch {
    snippet: Result<Option<String>, ()>,
    calls: AtomicUsize,
}

impl StubSearch {
    pub fn returning(snippet: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            snippet: Ok(snippet.map(str::to_string)),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            snippet: Err(()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(&self, _query: &str) -> ProviderResult<Option<SearchSnippet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.snippet {
            Ok(snippet) => Ok(snippet.clone().map(|text| SearchSnippet { text })),
            Err(()) => Err(ProviderError::Request("search timed out".to_string())),
        }
    }
}

pub struct StubWeather {
    report: Result<Option<(f64, f64)>, ()>,
    calls: AtomicUsize,
    places: Mutex<Vec<String>>,
}

impl StubWeather {
    pub fn reporting(temperature: f64, windspeed: f64) -> Arc<Self> {
        Arc::new(Self {
            report: Ok(Some((temperature, windspeed))),
            calls: AtomicUsize::new(0),
            places: Mutex::new(Vec::new()),
        })
    }

    pub fn unknown_place() -> Arc<Self> {
        Arc::new(Self {
            report: Ok(None),
            calls: AtomicUsize::new(0),
            places: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            report: Err(()),
            calls: AtomicUsize::new(0),
            places: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn places(&self) -> Vec<String> {
        self.places.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherClient for StubWeather {
    async fn lookup(&self, place: &str) -> ProviderResult<Option<WeatherReport>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.places.lock().unwrap().push(place.to_string());
        match self.report {
            Ok(Some((temperature, windspeed))) => Ok(Some(WeatherReport {
                place: place.to_string(),
                temperature,
                windspeed,
            })),
            Ok(None) => Ok(None),
            Err(()) => Err(ProviderError::Http {
                status_code: 500,
                message: "weather down".to_string(),
            }),
        }
    }
}

pub struct StubNews {
    headlines: Result<Vec<String>, ()>,
    calls: AtomicUsize,
    topics: Mutex<Vec<String>>,
}

impl StubNews {
    pub fn with_headlines(headlines: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            headlines: Ok(headlines.iter().map(|h| h.to_string()).collect()),
            calls: AtomicUsize::new(0),
            topics: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            headlines: Err(()),
            calls: AtomicUsize::new(0),
            topics: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsClient for StubNews {
    async fn fetch_headlines(&self, topic: &str) -> ProviderResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.topics.lock().unwrap().push(topic.to_string());
        self.headlines
            .clone()
            .map_err(|()| ProviderError::Parsing("bad feed".to_string()))
    }
}

/// All four stubs, kept for call-count assertions
pub struct Stubs {
    pub model: Arc<StubModel>,
    pub search: Option<Arc<StubSearch>>,
    pub weather: Arc<StubWeather>,
    pub news: Arc<StubNews>,
}

impl Stubs {
    pub fn new(model: Arc<StubModel>) -> Self {
        Self {
            model,
            search: None,
            weather: StubWeather::reporting(30.0, 10.0),
            news: StubNews::with_headlines(&["Headline one", "Headline two"]),
        }
    }

    pub fn with_search(mut self, search: Arc<StubSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_weather(mut self, weather: Arc<StubWeather>) -> Self {
        self.weather = weather;
        self
    }

    pub fn with_news(mut self, news: Arc<StubNews>) -> Self {
        self.news = news;
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            llm: self.model.clone(),
            search: self
                .search
                .clone()
                .map(|search| search as Arc<dyn SearchClient>),
            weather: self.weather.clone(),
            news: self.news.clone(),
        }
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(
            StrategyTable::default(),
            PromptConfig::default(),
            self.collaborators(),
        )
    }

    pub fn total_calls(&self) -> usize {
        self.model.calls()
            + self.search.as_ref().map_or(0, |search| search.calls())
            + self.weather.calls()
            + self.news.calls()
    }
}
