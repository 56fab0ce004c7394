use thiserror::Error;

/// Failure of an outbound collaborator (model, search, weather or news API).
///
/// These never reach a chat caller: the resolver turns them into degraded
/// replies.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request Error: {0}")]
    Request(String),

    #[error("HTTP Error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error("Parsing Error: {0}")]
    Parsing(String),

    #[error("Empty Response: {0}")]
    EmptyResponse(String),

    /// Transport failure. Always stored with its URL stripped, since query
    /// strings carry API keys.
    #[error(transparent)]
    Reqwest(reqwest::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        Self::Reqwest(e.without_url())
    }
}

/// Startup configuration errors. Fatal for the daemon, reported to the operator.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for collaborator calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;
