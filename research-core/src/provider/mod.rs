//! Capability ports for the research loop.
//!
//! The engine only ever talks to two external capabilities:
//!
//! - [`SearchProvider`]: web search that also fetches page content
//! - [`ReasoningProvider`]: free-text generation from a prompt
//!
//! Both are async traits so that HTTP adapters ([`ExaSearch`],
//! [`OpenAIReasoner`]) and test doubles plug in the same way. Provider output
//! is normalized at this boundary (see [`SearchResult::validated`]) before the
//! engine reads it.

mod client;
mod exa;
mod openai;

pub use client::ClientConfig;
pub use exa::ExaSearch;
pub use openai::OpenAIReasoner;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sentinel finding text used when a hit carries no usable content.
pub const NO_CONTENT: &str = "No content extracted";

/// Source label used when a hit carries no URL.
pub const UNKNOWN_SOURCE: &str = "Unknown source";

/// Options for a search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Number of results to request
    pub num_results: usize,
    /// Fetch full page text
    pub fetch_text: bool,
    /// Request a provider-written summary
    pub summary: bool,
    /// Request highlighted passages
    pub highlights: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            num_results: 5,
            fetch_text: true,
            summary: true,
            highlights: true,
        }
    }
}

impl SearchOptions {
    pub fn with_num_results(mut self, n: usize) -> Self {
        self.num_results = n;
        self
    }
}

/// A single search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Fetched page body
    #[serde(default)]
    pub text: Option<String>,
    /// Provider-written summary
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_highlights(mut self, highlights: Vec<String>) -> Self {
        self.highlights = highlights;
        self
    }

    /// Content used as finding text: body, else summary, else joined
    /// highlights, else [`NO_CONTENT`].
    pub fn content(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        if let Some(summary) = &self.summary {
            return summary.clone();
        }
        if !self.highlights.is_empty() {
            return self.highlights.join("\n");
        }
        NO_CONTENT.to_string()
    }

    /// Title for display, falling back to the URL.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }

    /// Short description used as the relevance blurb of a source record.
    pub fn relevance(&self) -> &str {
        self.summary
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("No description available")
    }

    fn normalized(mut self) -> Self {
        let url = self.url.trim();
        self.url = if url.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            url.to_string()
        };
        self.title = non_blank(self.title);
        self.text = non_blank(self.text);
        self.summary = non_blank(self.summary);
        self.highlights.retain(|h| !h.trim().is_empty());
        self
    }
}

/// Result of a search call. An empty `results` list means "no hits", not failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub results: Vec<SearchHit>,
}

impl SearchResult {
    pub fn new(results: Vec<SearchHit>) -> Self {
        Self { results }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Normalize provider output: blank strings become absent and a missing URL
    /// is labelled [`UNKNOWN_SOURCE`].
    pub fn validated(self) -> Self {
        Self {
            results: self.results.into_iter().map(SearchHit::normalized).collect(),
        }
    }
}

/// Web search with content retrieval.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`.
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult>;

    /// Fetch the contents of specific URLs.
    async fn get_contents(&self, _urls: &[String]) -> Result<SearchResult> {
        Ok(SearchResult::empty())
    }

    /// Provider name for logs and errors.
    fn name(&self) -> &str;
}

/// Text generation used for analysis, planning and synthesis.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate_text(&self, prompt: &str) -> Result<String>;

    /// Provider name for logs and errors.
    fn name(&self) -> &str;
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_content_precedence() {
        let hit = SearchHit::new("https://a.example")
            .with_text("body")
            .with_summary("summary");
        assert_eq!(hit.content(), "body");

        let hit = SearchHit::new("https://a.example").with_summary("summary");
        assert_eq!(hit.content(), "summary");

        let hit = SearchHit::new("https://a.example")
            .with_highlights(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(hit.content(), "one\ntwo");

        assert_eq!(SearchHit::new("https://a.example").content(), NO_CONTENT);
    }

    #[test]
    fn test_hit_display_fallbacks() {
        let hit = SearchHit::new("https://a.example");
        assert_eq!(hit.display_title(), "https://a.example");
        assert_eq!(hit.relevance(), "No description available");

        let hit = hit.with_title("A").with_text("body");
        assert_eq!(hit.display_title(), "A");
        assert_eq!(hit.relevance(), "body");
    }

    #[test]
    fn test_validated_normalizes_blanks() {
        let result = SearchResult::new(vec![SearchHit {
            url: "   ".to_string(),
            title: Some("".to_string()),
            text: Some("  ".to_string()),
            summary: Some("kept".to_string()),
            highlights: vec!["".to_string(), "h".to_string()],
        }])
        .validated();

        let hit = &result.results[0];
        assert_eq!(hit.url, UNKNOWN_SOURCE);
        assert_eq!(hit.title, None);
        assert_eq!(hit.text, None);
        assert_eq!(hit.content(), "kept");
        assert_eq!(hit.highlights, vec!["h".to_string()]);
    }

    #[test]
    fn test_search_options_default() {
        let options = SearchOptions::default();
        assert_eq!(options.num_results, 5);
        assert!(options.fetch_text);
        assert_eq!(options.with_num_results(3).num_results, 3);
    }
}
