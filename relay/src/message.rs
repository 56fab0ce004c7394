use neelakshi_core::types::ChatMessage;

/// A chat request as the resolver sees it.
///
/// `history` is owned by the caller and passed through verbatim; the relay
/// keeps no conversation state between requests.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub text: String,
    pub history: Vec<ChatMessage>,
}

impl IncomingMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// Trimmed, case-folded text used for keyword matching.
///
/// Only letter case changes: diacritics and non-Latin scripts such as
/// Devanagari are kept as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

/// Which path produced a reply. Used for logs and tests, never sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Hardcoded,
    DomainData,
    SearchAugmented,
    ModelOnly,
    /// Degraded domain reply; the text explains what was unavailable
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    pub fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}
