//! Mutable state of a single research session.
//!
//! A [`ResearchSession`] is created when research starts, threaded by
//! `&mut` through every phase of the loop, and dropped after synthesis. It
//! is never shared between sessions and never persisted.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::analysis::Analysis;
use crate::config::ResearchConfig;
use crate::events::{Activity, ActivityStatus, ActivityType, ProgressInit, ResearchEvent};

/// A unit of extracted text attributed to a source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub text: String,
    pub source: String,
}

impl Finding {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// Why the research loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The planner saw no reason (or no topic) to continue
    AnalysisComplete,
    /// The planner wanted to continue but the depth cap was hit
    MaxDepthReached,
    /// The wall-clock budget ran out
    TimeLimit,
    /// Too many searches came back empty or failed
    TooManyFailures,
    /// The loop guard ended the loop without an explicit decision
    DepthExhausted,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnalysisComplete => write!(f, "analysis complete"),
            Self::MaxDepthReached => write!(f, "maximum depth reached"),
            Self::TimeLimit => write!(f, "time limit"),
            Self::TooManyFailures => write!(f, "too many failed searches"),
            Self::DepthExhausted => write!(f, "depth exhausted"),
        }
    }
}

/// State of one research session.
#[derive(Debug, Clone)]
pub struct ResearchSession {
    id: Uuid,
    topic: String,
    max_depth: u32,
    current_depth: u32,
    minimum_iterations: u32,
    findings: Vec<Finding>,
    summaries: Vec<String>,
    themes: Vec<String>,
    identified_gaps: VecDeque<String>,
    failed_attempts: u32,
    max_failed_attempts: u32,
    completed_steps: u32,
    total_expected_steps: u32,
    started: Instant,
    time_limit: Duration,
    pending_url: Option<String>,
    termination: Option<TerminationReason>,
}

impl ResearchSession {
    /// Start a session. `max_depth` is clamped to at least 1.
    pub fn new(topic: impl Into<String>, max_depth: u32, config: &ResearchConfig) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            max_depth,
            current_depth: 0,
            minimum_iterations: config.minimum_iterations_cap.min(max_depth),
            findings: Vec::new(),
            summaries: Vec::new(),
            themes: Vec::new(),
            identified_gaps: VecDeque::new(),
            failed_attempts: 0,
            max_failed_attempts: config.max_failed_attempts,
            completed_steps: 0,
            total_expected_steps: max_depth.saturating_mul(config.steps_per_depth),
            started: Instant::now(),
            time_limit: config.time_limit(),
            pending_url: None,
            termination: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn current_depth(&self) -> u32 {
        self.current_depth
    }

    pub fn minimum_iterations(&self) -> u32 {
        self.minimum_iterations
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn summaries(&self) -> &[String] {
        &self.summaries
    }

    /// Themes in the order they were reported, duplicates included.
    pub fn themes(&self) -> &[String] {
        &self.themes
    }

    pub fn identified_gaps(&self) -> &VecDeque<String> {
        &self.identified_gaps
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn completed_steps(&self) -> u32 {
        self.completed_steps
    }

    pub fn total_expected_steps(&self) -> u32 {
        self.total_expected_steps
    }

    pub fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    /// Mark the start of the iteration at `depth`.
    pub fn begin_iteration(&mut self, depth: u32) {
        self.current_depth = depth.min(self.max_depth);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn time_remaining(&self) -> Duration {
        self.time_limit.saturating_sub(self.elapsed())
    }

    /// Whether the wall-clock budget is used up.
    pub fn budget_exhausted(&self) -> bool {
        self.elapsed() >= self.time_limit
    }

    /// Build the `progress-init` event.
    pub fn progress_init(&self) -> ResearchEvent {
        ResearchEvent::ProgressInit(ProgressInit {
            max_depth: self.max_depth,
            total_steps: self.total_expected_steps,
        })
    }

    /// Build an activity event stamped with the current progress snapshot.
    ///
    /// This is the only place `completed_steps` changes: it goes up by one for
    /// each `Complete` activity.
    pub fn activity(
        &mut self,
        activity_type: ActivityType,
        status: ActivityStatus,
        message: impl Into<String>,
    ) -> ResearchEvent {
        if status == ActivityStatus::Complete {
            self.completed_steps += 1;
        }
        ResearchEvent::ActivityDelta(Activity {
            activity_type,
            status,
            message: message.into(),
            timestamp: Utc::now(),
            depth: self.current_depth,
            completed_steps: self.completed_steps,
            total_steps: self.total_expected_steps,
        })
    }

    pub fn extend_findings(&mut self, findings: impl IntoIterator<Item = Finding>) {
        self.findings.extend(findings);
    }

    pub fn push_summary(&mut self, summary: impl Into<String>) {
        self.summaries.push(summary.into());
    }

    /// Fold an analysis into the session: summary, themes, gaps and the
    /// proposed URL.
    pub fn record_analysis(&mut self, analysis: &Analysis) {
        if !analysis.summary.is_empty() {
            self.summaries.push(analysis.summary.clone());
        }
        self.themes.extend(analysis.themes.iter().cloned());
        self.identified_gaps.extend(analysis.gaps.iter().cloned());
        self.pending_url = analysis.url_to_search.clone();
    }

    /// Count a failed search. Returns `true` once the failure budget is spent.
    pub fn record_search_failure(&mut self) -> bool {
        self.failed_attempts += 1;
        self.failed_attempts >= self.max_failed_attempts
    }

    /// Topic to retry with after a failed search: the oldest queued gap, or an
    /// alternative angle on the root topic.
    pub fn next_alternate_topic(&mut self) -> String {
        self.identified_gaps
            .pop_front()
            .unwrap_or_else(|| format!("alternative perspective on {}", self.topic))
    }

    pub fn take_pending_url(&mut self) -> Option<String> {
        self.pending_url.take()
    }

    /// Deduplicated themes, first occurrence order.
    pub fn unique_themes(&self) -> Vec<&str> {
        dedup(&self.themes)
    }

    /// Deduplicated gaps still queued, first occurrence order.
    pub fn unique_gaps(&self) -> Vec<&str> {
        dedup(&self.identified_gaps)
    }

    /// Record why the loop stopped. The first reason wins.
    pub fn terminate(&mut self, reason: TerminationReason) {
        self.termination.get_or_insert(reason);
    }
}

fn dedup<'a, I>(items: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}
