//! Exa search-and-contents adapter.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{build_http_client, ClientConfig};
use super::{SearchHit, SearchOptions, SearchProvider, SearchResult};
use crate::error::{Error, Result};

/// [`SearchProvider`] backed by the Exa search API.
pub struct ExaSearch {
    config: ClientConfig,
    http: Client,
}

impl ExaSearch {
    const DEFAULT_BASE_URL: &'static str = "https://api.exa.ai";
    const PROVIDER: &'static str = "exa";

    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self { config, http })
    }

    /// Build from `EXA_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env("EXA_API_KEY")?)
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<ExaResponse> {
        let url = format!("{}{}", self.base_url(), path);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| Error::provider(Self::PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::provider(Self::PROVIDER, format!("Failed to read response: {}", e))
        })?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ExaError>(&body) {
                return Err(Error::provider(
                    Self::PROVIDER,
                    format!("API error ({}): {}", status, error.error),
                ));
            }
            return Err(Error::provider(
                Self::PROVIDER,
                format!("API error ({}): {}", status, body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::provider(Self::PROVIDER, format!("Failed to parse response: {}", e))
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    num_results: usize,
    #[serde(rename = "type")]
    search_type: &'static str,
    contents: ExaContentOptions,
}

#[derive(Debug, Serialize)]
struct ExaContentOptions {
    text: bool,
    summary: bool,
    highlights: bool,
}

#[derive(Debug, Serialize)]
struct ExaContentsRequest<'a> {
    urls: &'a [String],
    text: bool,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Debug, Deserialize)]
struct ExaResult {
    #[serde(default)]
    url: String,
    title: Option<String>,
    text: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    highlights: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ExaError {
    error: String,
}

impl From<ExaResult> for SearchHit {
    fn from(r: ExaResult) -> Self {
        Self {
            url: r.url,
            title: r.title,
            text: r.text,
            summary: r.summary,
            highlights: r.highlights,
        }
    }
}

impl From<ExaResponse> for SearchResult {
    fn from(r: ExaResponse) -> Self {
        SearchResult::new(r.results.into_iter().map(SearchHit::from).collect()).validated()
    }
}

#[async_trait]
impl SearchProvider for ExaSearch {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult> {
        let request = ExaSearchRequest {
            query,
            num_results: options.num_results,
            search_type: "auto",
            contents: ExaContentOptions {
                text: options.fetch_text,
                summary: options.summary,
                highlights: options.highlights,
            },
        };

        let response = self.post("/search", &request).await?;
        debug!(query, hits = response.results.len(), "Exa search returned");
        Ok(response.into())
    }

    async fn get_contents(&self, urls: &[String]) -> Result<SearchResult> {
        if urls.is_empty() {
            return Ok(SearchResult::empty());
        }
        let request = ExaContentsRequest { urls, text: true };
        let response = self.post("/contents", &request).await?;
        Ok(response.into())
    }

    fn name(&self) -> &str {
        Self::PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_shape() {
        let request = ExaSearchRequest {
            query: "electric vehicles",
            num_results: 5,
            search_type: "auto",
            contents: ExaContentOptions {
                text: true,
                summary: true,
                highlights: false,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "electric vehicles");
        assert_eq!(value["numResults"], 5);
        assert_eq!(value["type"], "auto");
        assert_eq!(value["contents"]["text"], true);
        assert_eq!(value["contents"]["highlights"], false);
    }

    #[test]
    fn test_response_conversion_validates() {
        let body = r#"{
            "results": [
                {"url": "https://a.example", "title": "A", "text": "body", "highlights": []},
                {"url": "", "title": "", "summary": "only summary"}
            ]
        }"#;
        let response: ExaResponse = serde_json::from_str(body).unwrap();
        let result: SearchResult = response.into();

        assert_eq!(result.results.len(), 2);
        assert_eq!(result.results[0].content(), "body");
        assert_eq!(result.results[1].url, super::super::UNKNOWN_SOURCE);
        assert_eq!(result.results[1].title, None);
        assert_eq!(result.results[1].content(), "only summary");
    }

    #[test]
    fn test_exa_name() {
        let exa = ExaSearch::new(ClientConfig::new("test")).unwrap();
        assert_eq!(exa.name(), "exa");
        assert_eq!(exa.base_url(), "https://api.exa.ai");
    }
}
