use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::client::build_http_client;
use crate::config::NewsConfig;
use crate::errors::{ConfigResult, ProviderError, ProviderResult};

/// Headline feed. Returns titles newest first; an empty list means nothing matched.
#[async_trait]
pub trait NewsClient: Send + Sync {
    async fn fetch_headlines(&self, topic: &str) -> ProviderResult<Vec<String>>;
}

/// Google News RSS search binding
#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    http_client: Client,
    base_url: String,
    language: String,
    country: String,
    max_headlines: usize,
}

impl GoogleNewsClient {
    pub fn new(config: &NewsConfig) -> ConfigResult<Self> {
        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            country: config.country.clone(),
            max_headlines: config.max_headlines,
        })
    }
}

#[async_trait]
impl NewsClient for GoogleNewsClient {
    async fn fetch_headlines(&self, topic: &str) -> ProviderResult<Vec<String>> {
        debug!(topic, "Fetching Google News RSS");

        let edition = format!("{}:{}", self.country, self.language);
        let response = self
            .http_client
            .get(format!("{}/rss/search", self.base_url))
            .query(&[
                ("q", topic),
                ("hl", self.language.as_str()),
                ("gl", self.country.as_str()),
                ("ceid", edition.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                message: format!("Google News returned {}", status),
            });
        }

        let feed = response.text().await?;
        if !feed.contains("<rss") && !feed.contains("<feed") {
            return Err(ProviderError::Parsing(
                "Google News response is not an RSS feed".to_string(),
            ));
        }

        Ok(parse_rss_titles(&feed, self.max_headlines))
    }
}

/// Pull `<title>` text out of each `<item>` of an RSS document.
fn parse_rss_titles(feed: &str, max_titles: usize) -> Vec<String> {
    let mut titles = Vec::new();
    let mut search_from = 0;

    while titles.len() < max_titles {
        let Some(item_pos) = feed[search_from..].find("<item") else {
            break;
        };
        let item_start = search_from + item_pos;
        let item_end = feed[item_start..]
            .find("</item>")
            .map(|end| item_start + end)
            .unwrap_or(feed.len());
        search_from = item_end.min(feed.len());

        if let Some(title) = extract_element_text(&feed[item_start..item_end], "title") {
            titles.push(title);
        }

        if item_end >= feed.len() {
            break;
        }
    }

    titles
}

/// Text of the first `<tag>...</tag>` element, CDATA unwrapped and entities decoded.
fn extract_element_text(fragment: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let open_pos = fragment.find(&open)?;
    let content_start = open_pos + fragment[open_pos..].find('>')? + 1;
    let content_len = fragment[content_start..].find(&close)?;
    let raw = fragment[content_start..content_start + content_len].trim();

    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
        .unwrap_or(raw);

    let text = decode_xml_entities(raw).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Decode the predefined XML entities plus the common numeric ones.
fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&amp;", "&")
}
