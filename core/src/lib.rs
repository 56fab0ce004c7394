// Shared building blocks of the Neelakshi chat relay:
// - Collaborator interfaces (language model, search, weather, news)
// - Concrete vendor bindings for each of them
// - Conversation and wire types
// - Configuration loading
// - Shared error types

// Export client module - language model trait and factory
pub mod client;
pub use client::*;

pub mod gemini;
pub use gemini::GeminiClient;

pub mod openai;
pub use openai::OpenAiClient;

pub mod search;
pub use search::{SearchClient, SerpApiClient};

pub mod weather;
pub use weather::{OpenMeteoClient, WeatherClient};

pub mod news;
pub use news::{GoogleNewsClient, NewsClient};

// Export types module - conversation and wire structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;
