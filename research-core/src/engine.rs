//! The deep research engine.
//!
//! [`DeepResearch`] runs the iterative loop: search the current topic,
//! extract findings from the top hits, analyze them to plan the next
//! direction, and decide whether to continue. When the loop ends (analysis
//! says stop, depth cap, time budget, or too many failed searches) the
//! findings are synthesized into a markdown report.
//!
//! Every phase reports progress through an [`EventSink`]. A run never returns
//! an error: failures become a `success: false` [`ResearchOutput`].
//!
//! ```rust,ignore
//! use research_core::{DeepResearch, ExaSearch, OpenAIReasoner, ResearchRequest, TracingSink};
//! use std::sync::Arc;
//!
//! let engine = DeepResearch::new(
//!     Arc::new(ExaSearch::from_env()?),
//!     Arc::new(OpenAIReasoner::from_env()?),
//! );
//! let output = engine
//!     .run(ResearchRequest::new("electric vehicles").with_max_depth(3), &TracingSink)
//!     .await;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, field, info, instrument, warn, Span};

use crate::analysis::{Analysis, PlanOutcome, Planner};
use crate::config::ResearchConfig;
use crate::error::{Error, Result};
use crate::events::{
    ActivityStatus, ActivityType, ChannelSink, EventSink, EventStream, FinishPayload,
    ResearchEvent, SourceRecord,
};
use crate::provider::{ReasoningProvider, SearchHit, SearchOptions, SearchProvider};
use crate::session::{Finding, ResearchSession, TerminationReason};
use crate::synthesis::Synthesizer;

/// Name under which the engine is registered as a chat tool.
pub const TOOL_NAME: &str = "deepResearch";

const TOOL_DESCRIPTION: &str = "Perform deep research on a topic using an AI agent that coordinates search, extract, and analysis tools with reasoning steps. After research completes, you should either: 1) If createArtifact is true, call the createDocument tool with the research content to save it as a document, or 2) If createArtifact is false, include the full research content directly in your response. Never just provide a link to a report without either creating a document or showing the content.";

/// Guidance returned when the report should be saved as a document.
pub const ARTIFACT_GUIDANCE: &str = "You should call the createDocument tool with this research content to save it as a document. Use an appropriate title based on the topic.";

/// Guidance returned when the report should be shown inline.
pub const INLINE_GUIDANCE: &str =
    "You should include this full research content directly in your response to the user.";

/// Guidance returned when research failed.
pub const FAILURE_GUIDANCE: &str =
    "Report the research error to the user and share any partial findings that were gathered.";

/// Receives the final report before the `finish` event is emitted.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn on_finish(&self, payload: &FinishPayload) -> Result<()>;
}

/// A research invocation, as received from the chat layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default)]
    pub max_depth: Option<u32>,
    #[serde(default)]
    pub create_artifact: bool,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            max_depth: None,
            create_artifact: false,
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_create_artifact(mut self, create: bool) -> Self {
        self.create_artifact = create;
        self
    }
}

/// Result of a research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchOutput {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub data: ResearchData,
}

/// Payload of a [`ResearchOutput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchData {
    pub findings: Vec<Finding>,
    /// The final report; absent on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    pub completed_steps: u32,
    pub total_steps: u32,
    pub create_artifact: bool,
    pub topic: String,
    /// What the calling agent should do with the result
    pub next_steps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub termination_reason: Option<TerminationReason>,
}

/// Tool registration metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

/// A research run on a background task.
pub struct ResearchHandle {
    /// Events of the run; ends when the run finishes.
    pub events: EventStream,
    pub result: JoinHandle<ResearchOutput>,
}

/// Multi-step research engine.
///
/// Cheap to clone; clones share providers but every run owns its own
/// [`ResearchSession`].
#[derive(Clone)]
pub struct DeepResearch {
    search: Arc<dyn SearchProvider>,
    reasoner: Arc<dyn ReasoningProvider>,
    config: ResearchConfig,
    artifact_sink: Option<Arc<dyn ArtifactSink>>,
}

impl DeepResearch {
    pub fn new(search: Arc<dyn SearchProvider>, reasoner: Arc<dyn ReasoningProvider>) -> Self {
        Self {
            search,
            reasoner,
            config: ResearchConfig::default(),
            artifact_sink: None,
        }
    }

    pub fn with_config(mut self, config: ResearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_artifact_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.artifact_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Name, description and parameter schema for registering the engine as a tool.
    pub fn tool_definition() -> ToolDefinition {
        ToolDefinition {
            name: TOOL_NAME,
            description: TOOL_DESCRIPTION,
            parameters: json!({
                "type": "object",
                "properties": {
                    "topic": {
                        "type": "string",
                        "description": "The topic or question to research"
                    },
                    "maxDepth": {
                        "type": "number",
                        "description": "Maximum research depth (default: 7)"
                    },
                    "createArtifact": {
                        "type": "boolean",
                        "description": "Whether to create a document artifact with the research results (default: false)"
                    }
                },
                "required": ["topic"]
            }),
        }
    }

    /// Run on a background task, streaming events as they happen.
    pub fn spawn(&self, request: ResearchRequest) -> ResearchHandle {
        let (sink, events) = ChannelSink::new();
        let engine = self.clone();
        let result = tokio::spawn(async move { engine.run(request, &sink).await });
        ResearchHandle { events, result }
    }

    /// Run one research session to completion.
    #[instrument(
        skip(self, request, sink),
        fields(topic = %request.topic, session_id = field::Empty, max_depth = field::Empty)
    )]
    pub async fn run(&self, request: ResearchRequest, sink: &dyn EventSink) -> ResearchOutput {
        let max_depth = request.max_depth.unwrap_or(self.config.default_max_depth);
        let mut session = ResearchSession::new(request.topic.clone(), max_depth, &self.config);

        let span = Span::current();
        span.record("session_id", field::display(session.id()));
        span.record("max_depth", session.max_depth());

        sink.emit(session.progress_init());

        match self.execute(&mut session, &request, sink).await {
            Ok(report) => {
                info!(
                    completed_steps = session.completed_steps(),
                    findings = session.findings().len(),
                    reason = ?session.termination(),
                    "Research finished"
                );
                ResearchOutput {
                    success: true,
                    error: None,
                    data: ResearchData {
                        findings: session.findings().to_vec(),
                        analysis: Some(report),
                        completed_steps: session.completed_steps(),
                        total_steps: session.total_expected_steps(),
                        create_artifact: request.create_artifact,
                        topic: request.topic,
                        next_steps: if request.create_artifact {
                            ARTIFACT_GUIDANCE
                        } else {
                            INLINE_GUIDANCE
                        }
                        .to_string(),
                        termination_reason: session.termination(),
                    },
                }
            }
            Err(error) => {
                warn!(%error, "Research failed");
                sink.emit(session.activity(
                    ActivityType::Thought,
                    ActivityStatus::Error,
                    format!("Research failed: {}", error),
                ));
                ResearchOutput {
                    success: false,
                    error: Some(error.to_string()),
                    data: ResearchData {
                        findings: session.findings().to_vec(),
                        analysis: None,
                        completed_steps: session.completed_steps(),
                        total_steps: session.total_expected_steps(),
                        create_artifact: request.create_artifact,
                        topic: request.topic,
                        next_steps: FAILURE_GUIDANCE.to_string(),
                        termination_reason: None,
                    },
                }
            }
        }
    }

    async fn execute(
        &self,
        session: &mut ResearchSession,
        request: &ResearchRequest,
        sink: &dyn EventSink,
    ) -> Result<String> {
        if request.topic.trim().is_empty() {
            return Err(Error::config("research topic must not be empty"));
        }
        self.config.validate()?;

        let planner = Planner::new(Arc::clone(&self.reasoner), self.config.clone());
        let synthesizer = Synthesizer::new(Arc::clone(&self.reasoner));

        self.iterate(session, &planner, &synthesizer, sink).await;

        let report = synthesizer.final_report(session, sink).await;
        let payload = FinishPayload::markdown(report.clone(), request.create_artifact, session.topic());

        if let Some(artifacts) = &self.artifact_sink {
            artifacts.on_finish(&payload).await.map_err(|e| match e {
                Error::Artifact(_) => e,
                other => Error::Artifact(other.to_string()),
            })?;
        }
        sink.emit(ResearchEvent::Finish(payload));

        Ok(report)
    }

    async fn iterate(
        &self,
        session: &mut ResearchSession,
        planner: &Planner,
        synthesizer: &Synthesizer,
        sink: &dyn EventSink,
    ) {
        let mut topic = session.topic().to_string();
        let mut depth = 1;

        while depth <= session.max_depth() && !session.budget_exhausted() {
            session.begin_iteration(depth);
            info!(depth, topic = %topic, "Starting research iteration");

            let Some(hits) = self.search_step(session, &topic, sink).await else {
                if session.record_search_failure() {
                    warn!(
                        attempts = session.failed_attempts(),
                        "Too many failed searches, moving to synthesis"
                    );
                    session.terminate(TerminationReason::TooManyFailures);
                    break;
                }
                topic = session.next_alternate_topic();
                debug!(next = %topic, "Retrying with alternate topic");
                if self.time_limit_reached(session, sink) {
                    break;
                }
                continue;
            };

            self.extract_step(session, hits, sink).await;
            let analysis = self.analyze_step(session, planner, &topic, sink).await;

            if depth % self.config.intermediate_synthesis_interval == 0
                && session.findings().len() > self.config.intermediate_synthesis_min_findings
            {
                synthesizer.intermediate(session, sink).await;
            }

            let wants_more = analysis.should_continue || depth < session.minimum_iterations();
            match analysis.next_search_topic {
                Some(next) if wants_more && depth < session.max_depth() => {
                    topic = next;
                    depth += 1;
                    if depth <= session.minimum_iterations() {
                        let message = format!(
                            "Continuing to iteration {}/{} (minimum required)",
                            depth,
                            session.minimum_iterations()
                        );
                        sink.emit(session.activity(
                            ActivityType::Thought,
                            ActivityStatus::Complete,
                            message,
                        ));
                    }
                }
                _ => {
                    let (message, reason) = if analysis.should_continue {
                        ("Maximum depth reached", TerminationReason::MaxDepthReached)
                    } else {
                        (
                            "Research complete based on analysis",
                            TerminationReason::AnalysisComplete,
                        )
                    };
                    sink.emit(session.activity(
                        ActivityType::Thought,
                        ActivityStatus::Complete,
                        message,
                    ));
                    session.terminate(reason);
                    break;
                }
            }

            if self.time_limit_reached(session, sink) {
                break;
            }
        }

        if session.termination().is_none() && session.budget_exhausted() {
            session.terminate(TerminationReason::TimeLimit);
        }
        session.terminate(TerminationReason::DepthExhausted);
        info!(
            depth = session.current_depth(),
            reason = ?session.termination(),
            "Research loop ended"
        );
    }

    /// Emit the time-limit notice and record termination once the budget is spent.
    fn time_limit_reached(&self, session: &mut ResearchSession, sink: &dyn EventSink) -> bool {
        if !session.budget_exhausted() {
            return false;
        }
        warn!(elapsed_ms = session.elapsed().as_millis() as u64, "Research time limit reached");
        sink.emit(session.activity(
            ActivityType::Thought,
            ActivityStatus::Error,
            "Research terminated due to time limit",
        ));
        session.terminate(TerminationReason::TimeLimit);
        true
    }

    /// Search `topic`. Returns `None` when the search failed or found nothing.
    async fn search_step(
        &self,
        session: &mut ResearchSession,
        topic: &str,
        sink: &dyn EventSink,
    ) -> Option<Vec<SearchHit>> {
        let message = format!(
            "Searching for \"{}\" (Depth: {}/{})",
            topic,
            session.current_depth(),
            session.max_depth()
        );
        sink.emit(session.activity(ActivityType::Search, ActivityStatus::Pending, message));

        let options = SearchOptions::default().with_num_results(self.config.results_per_search);
        let result = match self.search.search(topic, &options).await {
            Ok(result) => result.validated(),
            Err(error) => {
                warn!(provider = self.search.name(), %error, "Search failed");
                sink.emit(session.activity(
                    ActivityType::Search,
                    ActivityStatus::Error,
                    format!("Search failed for \"{}\": {}", topic, error),
                ));
                return None;
            }
        };

        if result.is_empty() {
            sink.emit(session.activity(
                ActivityType::Search,
                ActivityStatus::Error,
                format!("No results found for \"{}\"", topic),
            ));
            return None;
        }

        let message = format!(
            "Found {} relevant results for \"{}\"",
            result.results.len(),
            topic
        );
        sink.emit(session.activity(ActivityType::Search, ActivityStatus::Complete, message));

        for hit in &result.results {
            sink.emit(ResearchEvent::SourceDelta(SourceRecord {
                url: hit.url.clone(),
                title: hit.display_title().to_string(),
                relevance: hit.relevance().to_string(),
            }));
        }

        Some(result.results)
    }

    async fn extract_step(
        &self,
        session: &mut ResearchSession,
        hits: Vec<SearchHit>,
        sink: &dyn EventSink,
    ) {
        let top = hits.len().min(self.config.results_per_search);
        sink.emit(session.activity(
            ActivityType::Extract,
            ActivityStatus::Pending,
            format!("Analyzing top {} results", top),
        ));

        let mut findings: Vec<Finding> = hits
            .iter()
            .take(top)
            .map(|hit| Finding::new(hit.content(), hit.url.clone()))
            .collect();

        let pending_url = session.take_pending_url();
        if let (true, Some(url)) = (self.config.follow_urls, pending_url) {
            match self.search.get_contents(std::slice::from_ref(&url)).await {
                Ok(contents) => {
                    let followed = contents.validated().results;
                    debug!(url = %url, pages = followed.len(), "Followed proposed URL");
                    findings.extend(
                        followed
                            .iter()
                            .map(|hit| Finding::new(hit.content(), hit.url.clone())),
                    );
                }
                Err(error) => {
                    warn!(url = %url, %error, "Failed to fetch proposed URL");
                    sink.emit(session.activity(
                        ActivityType::Extract,
                        ActivityStatus::Error,
                        format!("Failed to fetch content from {}", url),
                    ));
                }
            }
        }

        let count = findings.len();
        session.extend_findings(findings);
        sink.emit(session.activity(
            ActivityType::Extract,
            ActivityStatus::Complete,
            format!("Extracted content from {} sources", count),
        ));
    }

    async fn analyze_step(
        &self,
        session: &mut ResearchSession,
        planner: &Planner,
        topic: &str,
        sink: &dyn EventSink,
    ) -> Analysis {
        sink.emit(session.activity(
            ActivityType::Analyze,
            ActivityStatus::Pending,
            "Analyzing findings to determine next research direction",
        ));

        let outcome = planner.analyze(session, topic, sink).await;
        match &outcome {
            PlanOutcome::Parsed(_) => debug!("Planning step parsed"),
            PlanOutcome::Fallback { reason, .. } => {
                debug!(%reason, "Planning step used keyword fallback")
            }
            PlanOutcome::Failed { error, .. } => debug!(%error, "Planning step failed"),
        }
        let analysis = outcome.into_analysis();

        let message = match &analysis.next_search_topic {
            Some(next) => format!("Next research direction: \"{}\"", next),
            None => "Research path complete".to_string(),
        };
        sink.emit(session.activity(ActivityType::Analyze, ActivityStatus::Complete, message));

        session.record_analysis(&analysis);
        analysis
    }
}
