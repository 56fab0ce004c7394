//! Ordered strategy table.
//!
//! The table is plain data: which keywords select which handler, and in what
//! order. Dispatch lives in the resolver. Order is fixed: hardcoded facts,
//! then weather, then news, then the general model fallback.

use neelakshi_core::config::FactConfig;

use crate::message::NormalizedText;

/// Substring keywords, stored case-folded
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| NormalizedText::new(keyword.as_ref()).as_str().to_string())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        Self { keywords }
    }

    /// True when any keyword occurs in the text
    pub fn matches(&self, text: &NormalizedText) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// What to do once an entry is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    /// Canned answer, no downstream calls
    Fact(String),
    Weather,
    News,
    /// Optional web search, then the language model
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyEntry {
    pub name: String,
    pub keywords: KeywordSet,
    pub handler: Handler,
}

impl StrategyEntry {
    fn new(name: &str, keywords: KeywordSet, handler: Handler) -> Self {
        Self {
            name: name.to_string(),
            keywords,
            handler,
        }
    }

    pub fn matches(&self, text: &NormalizedText) -> bool {
        match self.handler {
            Handler::Model => true,
            _ => self.keywords.matches(text),
        }
    }
}

pub const WEATHER_KEYWORDS: &[&str] = &["weather", "temperature", "मौसम", "तापमान"];
pub const NEWS_KEYWORDS: &[&str] = &["news", "headlines", "खबर", "समाचार"];

/// Places the relay knows by name, with their spellings in both scripts
pub const KNOWN_PLACES: &[(&str, &[&str])] = &[
    ("Jaipur", &["jaipur", "जयपुर"]),
    ("Delhi", &["delhi", "दिल्ली"]),
    ("Udaipur", &["udaipur", "उदयपुर"]),
    ("Kota", &["kota", "कोटा"]),
    ("Rajasthan", &["rajasthan", "राजस्थान"]),
    ("Mumbai", &["mumbai", "मुंबई"]),
];

/// Built-in hardcoded answers, in priority order
pub fn default_facts() -> Vec<FactConfig> {
    vec![
        FactConfig {
            name: "jaipur-collector".to_string(),
            keywords: vec![
                "collector".to_string(),
                "कलेक्टर".to_string(),
                "जिलाधिकारी".to_string(),
            ],
            answer: "जयपुर के जिला कलेक्टर डॉ. जितेन्द्र कुमार सोनी (IAS) हैं। \
                     Jaipur's District Collector is Dr. Jitendra Kumar Soni (IAS)."
                .to_string(),
        },
        FactConfig {
            name: "greeting".to_string(),
            keywords: vec![
                "hello".to_string(),
                "namaste".to_string(),
                "नमस्ते".to_string(),
            ],
            answer: "Hello! 👋 How are you today? Ask me anything.".to_string(),
        },
        FactConfig {
            name: "identity".to_string(),
            keywords: vec![
                "your name".to_string(),
                "who are you".to_string(),
                "तुम्हारा नाम".to_string(),
                "आपका नाम".to_string(),
            ],
            answer: "I'm Neelakshi AI Chatbot 🤖, your smart assistant!".to_string(),
        },
    ]
}

/// Priority-ordered strategies ending in a catch-all model entry
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: Vec<StrategyEntry>,
    fallback: StrategyEntry,
}

impl StrategyTable {
    pub fn new(facts: &[FactConfig]) -> Self {
        let mut entries: Vec<StrategyEntry> = facts
            .iter()
            .map(|fact| {
                StrategyEntry::new(
                    &fact.name,
                    KeywordSet::new(&fact.keywords),
                    Handler::Fact(fact.answer.clone()),
                )
            })
            .filter(|entry| !entry.keywords.is_empty())
            .collect();

        entries.push(StrategyEntry::new(
            "weather",
            KeywordSet::new(WEATHER_KEYWORDS),
            Handler::Weather,
        ));
        entries.push(StrategyEntry::new(
            "news",
            KeywordSet::new(NEWS_KEYWORDS),
            Handler::News,
        ));

        Self {
            entries,
            fallback: StrategyEntry::new("model", KeywordSet::default(), Handler::Model),
        }
    }

    /// Uses configured facts when given, the built-in ones otherwise
    pub fn from_config(facts: Option<&[FactConfig]>) -> Self {
        match facts {
            Some(facts) => Self::new(facts),
            None => Self::new(&default_facts()),
        }
    }

    /// First matching entry wins; the model entry catches everything else
    pub fn select(&self, text: &NormalizedText) -> &StrategyEntry {
        self.entries
            .iter()
            .find(|entry| entry.matches(text))
            .unwrap_or(&self.fallback)
    }

    /// All entries in evaluation order, fallback last
    pub fn entries(&self) -> impl Iterator<Item = &StrategyEntry> {
        self.entries.iter().chain(std::iter::once(&self.fallback))
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::from_config(None)
    }
}

/// Canonical name of the first known place mentioned in the text
pub fn find_known_place(text: &NormalizedText) -> Option<&'static str> {
    KNOWN_PLACES
        .iter()
        .find(|(_, spellings)| spellings.iter().any(|spelling| text.contains(spelling)))
        .map(|(name, _)| *name)
}

const PLACE_MARKERS: &[&str] = &[" in ", " at ", " for "];
const TRAILING_FILLERS: &[&str] = &[
    "in celsius",
    "in fahrenheit",
    "celsius",
    "fahrenheit",
    "right now",
    "today",
    "now",
    "please",
    "currently",
    "tomorrow",
];

/// Place named in a weather question.
///
/// A known place wins. Otherwise takes the words after the last `in`/`at`/`for`
/// that still name something once units and fillers are stripped.
pub fn extract_weather_place(text: &NormalizedText) -> Option<String> {
    if let Some(place) = find_known_place(text) {
        return Some(place.to_string());
    }

    let raw = text.as_str();
    let weather_words = KeywordSet::new(WEATHER_KEYWORDS);

    let mut starts: Vec<usize> = PLACE_MARKERS
        .iter()
        .flat_map(|marker| raw.match_indices(marker).map(move |(pos, _)| pos + marker.len()))
        .collect();
    starts.sort_unstable_by(|a, b| b.cmp(a));

    starts
        .into_iter()
        .map(|start| clean_place(&raw[start..]))
        .find(|place| !place.is_empty() && !weather_words.matches(&NormalizedText::new(place)))
        .map(|place| title_case(&place))
}

fn clean_place(raw: &str) -> String {
    let mut place = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c == '।')
        .trim()
        .to_string();

    loop {
        let before = place.len();
        for filler in TRAILING_FILLERS {
            if let Some(stripped) = place.strip_suffix(filler) {
                if stripped.is_empty() || stripped.ends_with(' ') {
                    place = stripped
                        .trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
                        .to_string();
                }
            }
        }
        if place.len() == before {
            break;
        }
    }

    place
}

fn title_case(place: &str) -> String {
    place
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Search topic for a news request: `<place> news`, or national headlines
pub fn news_topic(text: &NormalizedText) -> (String, &'static str) {
    match find_known_place(text) {
        Some(place) => (format!("{} news", place.to_lowercase()), place),
        None => ("India news".to_string(), "India"),
    }
}
