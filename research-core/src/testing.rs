//! Scripted providers shared by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::provider::{ReasoningProvider, SearchHit, SearchOptions, SearchProvider, SearchResult};

const ANALYSIS_PREFIX: &str = "You are a research agent";
const INTERMEDIATE_PREFIX: &str = "Create an organized summary";

/// Reasoning provider that answers from a script, routed by prompt kind.
pub struct ScriptedReasoner {
    analyses: Mutex<VecDeque<String>>,
    default_analysis: String,
    intermediate: String,
    report: Option<String>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoner {
    /// Answer every prompt with `response`.
    pub fn always(response: impl Into<String>) -> Self {
        let response = response.into();
        Self {
            analyses: Mutex::new(VecDeque::new()),
            default_analysis: response.clone(),
            intermediate: response.clone(),
            report: Some(response),
            delay: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Analysis prompts get `analyses` in order, then the last one repeated.
    pub fn with_analyses<I, S>(mut self, analyses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let analyses: VecDeque<String> = analyses.into_iter().map(Into::into).collect();
        if let Some(last) = analyses.back() {
            self.default_analysis = last.clone();
        }
        self.analyses = Mutex::new(analyses);
        self
    }

    pub fn with_report(mut self, report: impl Into<String>) -> Self {
        self.report = Some(report.into());
        self
    }

    /// Make the final report call fail.
    pub fn failing_report(mut self) -> Self {
        self.report = None;
        self
    }

    /// Sleep before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedReasoner {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.starts_with(ANALYSIS_PREFIX) {
            let next = self.analyses.lock().unwrap().pop_front();
            return Ok(next.unwrap_or_else(|| self.default_analysis.clone()));
        }
        if prompt.starts_with(INTERMEDIATE_PREFIX) {
            return Ok(self.intermediate.clone());
        }
        self.report
            .clone()
            .ok_or_else(|| Error::provider("mock", "report generation unavailable"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Reasoning provider that always fails.
pub struct FailingReasoner;

#[async_trait]
impl ReasoningProvider for FailingReasoner {
    async fn generate_text(&self, _prompt: &str) -> Result<String> {
        Err(Error::provider("mock", "reasoning unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Search provider returning `hits_per_query` synthetic hits per query.
///
/// Queries listed in `empty_for` yield no results; with `failing` set every
/// call errors.
pub struct ScriptedSearch {
    hits_per_query: usize,
    empty_for: Vec<String>,
    failing: bool,
    queries: Mutex<Vec<String>>,
    content_requests: Mutex<Vec<Vec<String>>>,
    calls: AtomicUsize,
}

impl ScriptedSearch {
    pub fn with_hits(hits_per_query: usize) -> Self {
        Self {
            hits_per_query,
            empty_for: Vec::new(),
            failing: false,
            queries: Mutex::new(Vec::new()),
            content_requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every query comes back empty.
    pub fn empty() -> Self {
        Self::with_hits(0)
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::with_hits(0)
        }
    }

    pub fn empty_for(mut self, query: impl Into<String>) -> Self {
        self.empty_for.push(query.into());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn content_requests(&self) -> Vec<Vec<String>> {
        self.content_requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Hit `i` for `query`, as served by [`ScriptedSearch`].
pub fn hit_for(query: &str, i: usize) -> SearchHit {
    let slug = query.replace(' ', "-");
    SearchHit::new(format!("https://{}.example/{}", slug, i))
        .with_title(format!("{} #{}", query, i))
        .with_text(format!("{} finding {} about battery chemistry", query, i))
        .with_summary(format!("summary of {} {}", query, i))
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &str, _options: &SearchOptions) -> Result<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        if self.failing {
            return Err(Error::provider("mock", "search unavailable"));
        }
        if self.empty_for.iter().any(|q| q == query) {
            return Ok(SearchResult::empty());
        }
        Ok(SearchResult::new(
            (0..self.hits_per_query).map(|i| hit_for(query, i)).collect(),
        ))
    }

    async fn get_contents(&self, urls: &[String]) -> Result<SearchResult> {
        self.content_requests.lock().unwrap().push(urls.to_vec());
        Ok(SearchResult::new(
            urls.iter()
                .map(|url| SearchHit::new(url.clone()).with_text(format!("page body of {}", url)))
                .collect(),
        ))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
