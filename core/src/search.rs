use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::client::build_http_client;
use crate::config::SearchConfig;
use crate::errors::{ConfigError, ConfigResult, ProviderError, ProviderResult};
use crate::types::SearchSnippet;

/// Web search used to ground model prompts.
///
/// `Ok(None)` means the search ran but produced nothing usable. Callers treat
/// an error the same way.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> ProviderResult<Option<SearchSnippet>>;
}

#[derive(Deserialize, Debug, Default)]
struct SerpApiResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    knowledge_graph: Option<KnowledgeGraph>,
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize, Debug)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Deserialize, Debug)]
struct KnowledgeGraph {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OrganicResult {
    #[serde(default)]
    snippet: Option<String>,
}

impl SerpApiResponse {
    /// Most direct answer first: answer box, knowledge graph, then top organic hit
    fn best_snippet(self) -> Option<String> {
        let answer_box = self
            .answer_box
            .and_then(|answer| answer.answer.or(answer.snippet));
        let knowledge = self.knowledge_graph.and_then(|graph| graph.description);
        let organic = self
            .organic_results
            .into_iter()
            .find_map(|result| result.snippet);

        [answer_box, knowledge, organic]
            .into_iter()
            .flatten()
            .map(|text| text.trim().to_string())
            .find(|text| !text.is_empty())
    }
}

/// SerpAPI Google search binding
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig) -> ConfigResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential("SERPAPI_API_KEY"))?;

        Ok(Self {
            http_client: build_http_client(config.timeout_secs)?,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SearchClient for SerpApiClient {
    async fn search(&self, query: &str) -> ProviderResult<Option<SearchSnippet>> {
        debug!(query, "Searching the web with SerpAPI");

        let response = self
            .http_client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status_code: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parsing(format!("Failed to parse SerpAPI response: {}", e.without_url())))?;

        if let Some(error) = &body.error {
            return Err(ProviderError::Request(error.clone()));
        }

        Ok(body.best_snippet().map(|text| SearchSnippet { text }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SerpApiClient {
        SerpApiClient::new(&SearchConfig {
            enabled: true,
            api_key: Some("serp-key".to_string()),
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_answer_box_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("engine", "google"))
            .and(query_param("q", "capital of India"))
            .and(query_param("api_key", "serp-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "answer_box": { "answer": "New Delhi" },
                "knowledge_graph": { "description": "India is a country in South Asia." },
                "organic_results": [{ "position": 1, "snippet": "New Delhi is the capital." }]
            })))
            .mount(&server)
            .await;

        let snippet = client_for(&server).search("capital of India").await.unwrap();
        assert_eq!(snippet.unwrap().text, "New Delhi");
    }

    #[tokio::test]
    async fn test_falls_back_to_organic_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organic_results": [
                    { "position": 1 },
                    { "position": 2, "snippet": "Hawa Mahal was built in 1799." }
                ]
            })))
            .mount(&server)
            .await;

        let snippet = client_for(&server).search("hawa mahal").await.unwrap();
        assert_eq!(snippet.unwrap().text, "Hawa Mahal was built in 1799.");
    }

    #[tokio::test]
    async fn test_no_results_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "organic_results": [] })))
            .mount(&server)
            .await;

        assert!(client_for(&server).search("zzzz").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_api_error_field_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "Invalid API key." })))
            .mount(&server)
            .await;

        assert!(client_for(&server).search("q").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let client = SerpApiClient::new(&SearchConfig {
            enabled: true,
            api_key: Some("SECRET-SERP-KEY".to_string()),
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 5,
        })
        .unwrap();

        let err = client.search("q").await.unwrap_err();
        assert!(!err.to_string().contains("SECRET-SERP-KEY"), "{}", err);
        assert!(!format!("{:?}", err).contains("SECRET-SERP-KEY"), "{:?}", err);
    }

    #[tokio::test]
    async fn test_malformed_body_hides_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).search("q").await.unwrap_err();
        assert!(matches!(err, ProviderError::Parsing(_)));
        assert!(!err.to_string().contains("serp-key"), "{}", err);
    }

    #[test]
    fn test_requires_key() {
        assert!(matches!(
            SerpApiClient::new(&SearchConfig::default()),
            Err(ConfigError::MissingCredential("SERPAPI_API_KEY"))
        ));
    }
}
