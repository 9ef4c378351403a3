//! # research-core
//!
//! Iterative multi-step research orchestration. Starting from a topic, the
//! engine repeatedly searches the web, extracts findings, asks a reasoning
//! model what was learned and where to look next, and finally synthesizes a
//! markdown report. Progress is streamed as structured events.
//!
//! ## Core Components
//!
//! - **Engine**: the research loop and its output contract
//! - **Session**: per-run mutable state and progress counters
//! - **Analysis**: planning prompt, lenient JSON parsing, keyword fallback
//! - **Synthesis**: intermediate summaries and the final report
//! - **Events**: the event protocol and sink backends
//! - **Provider**: search and reasoning ports plus Exa/OpenAI adapters
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_core::{ChannelSink, DeepResearch, ExaSearch, OpenAIReasoner, ResearchRequest};
//! use std::sync::Arc;
//!
//! let engine = DeepResearch::new(
//!     Arc::new(ExaSearch::from_env()?),
//!     Arc::new(OpenAIReasoner::from_env()?),
//! );
//! let handle = engine.spawn(ResearchRequest::new("solid-state batteries"));
//! ```

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod provider;
pub mod session;
pub mod synthesis;

#[cfg(test)]
pub(crate) mod testing;

pub use analysis::{extract_json_object, extract_keywords, parse_analysis, Analysis, PlanOutcome, Planner};
pub use config::{FallbackContinuation, ResearchConfig};
pub use engine::{
    ArtifactSink, DeepResearch, ResearchData, ResearchHandle, ResearchOutput, ResearchRequest,
    ToolDefinition, TOOL_NAME,
};
pub use error::{Error, Result};
pub use events::{
    export_events, Activity, ActivityStatus, ActivityType, BroadcastSink, ChannelSink,
    CollectingSink, EventSink, EventStream, ExportFormat, FinishPayload, NullSink, ProgressInit,
    ResearchEvent, SourceRecord, TracingSink,
};
pub use provider::{
    ClientConfig, ExaSearch, OpenAIReasoner, ReasoningProvider, SearchHit, SearchOptions,
    SearchProvider, SearchResult,
};
pub use session::{Finding, ResearchSession, TerminationReason};
pub use synthesis::Synthesizer;
