//! Intermediate and final synthesis of research findings.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::analysis::truncate_chars;
use crate::events::{ActivityStatus, ActivityType, EventSink};
use crate::provider::ReasoningProvider;
use crate::session::{Finding, ResearchSession};

const INTERMEDIATE_WINDOW: usize = 10;
const INTERMEDIATE_EXCERPT_CHARS: usize = 1500;
const FINAL_SOURCE_LIMIT: usize = 10;
const FINAL_EXCERPT_CHARS: usize = 2000;
const FINAL_THEME_LIMIT: usize = 10;
const SECTION_THEME_LIMIT: usize = 5;

/// Prompt for an organized summary of the most recent findings.
pub fn intermediate_prompt(topic: &str, findings: &[Finding], summaries: &[String]) -> String {
    let start = findings.len().saturating_sub(INTERMEDIATE_WINDOW);
    let current = findings[start..]
        .iter()
        .map(|f| {
            format!(
                "Source: {}\n{}...",
                f.source,
                truncate_chars(&f.text, INTERMEDIATE_EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Create an organized summary of the research findings so far on: {topic}

Current findings:
{current}

Previous summaries:
{previous}

Organize the key points into clear themes or categories.
Highlight the most important discoveries and note areas that need further investigation.

Format your response as a well-structured summary with clear sections by theme.",
        topic = topic,
        current = current,
        previous = summaries.join("\n\n"),
    )
}

/// Prompt for the final markdown report.
pub fn final_prompt(session: &ResearchSession) -> String {
    let topic = session.topic();
    let sources = session
        .findings()
        .iter()
        .take(FINAL_SOURCE_LIMIT)
        .enumerate()
        .map(|(i, f)| {
            format!(
                "Source {} ({}): {}...",
                i + 1,
                f.source,
                truncate_chars(&f.text, FINAL_EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let summaries = session
        .summaries()
        .iter()
        .enumerate()
        .map(|(i, s)| format!("[Summary {}]: {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n\n");

    let themes = session.unique_themes();
    let key_themes = themes
        .iter()
        .take(FINAL_THEME_LIMIT)
        .enumerate()
        .map(|(i, t)| format!("{}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n");
    let sections = themes
        .iter()
        .take(SECTION_THEME_LIMIT)
        .map(|t| format!("### {}\n[Analyze this theme based on the research findings]", t))
        .collect::<Vec<_>>()
        .join("\n\n");

    let gaps = session.unique_gaps();
    let gap_hint = if gaps.is_empty() {
        String::new()
    } else {
        format!(
            "Consider these identified gaps:\n{}",
            gaps.iter()
                .map(|g| format!("- {}", g))
                .collect::<Vec<_>>()
                .join("\n")
        )
    };

    format!(
        "Create a comprehensive research report on: {topic}

Based on these research findings:
{sources}

Previous analysis summaries:
{summaries}

Key themes identified during research:
{key_themes}

Your report should be structured as follows:

# Research Report: {topic}

## Executive Summary
[Provide a concise overview of the key findings and conclusions]

## Key Findings
[List the most important discoveries and insights, organized by themes]

## Detailed Analysis
{sections}

## Supporting Evidence
[Present relevant facts, statistics, expert opinions, and examples that support your analysis]

## Limitations & Gaps
[Discuss any limitations in the current research and areas where information is lacking]
{gap_hint}

## Conclusions
[Summarize the main conclusions and their implications]

Throughout your report:
- Include relevant citations to sources where appropriate (use Source 1, Source 2, etc. format)
- Provide balanced perspectives and consider alternative viewpoints
- Prioritize accuracy and depth of analysis
- Use clear, professional language

This should be a comprehensive, detailed research report that thoroughly addresses the topic.",
    )
}

/// Deterministic report used when final synthesis fails.
pub fn fallback_report(topic: &str, findings: &[Finding], iterations: u32) -> String {
    let body = findings
        .iter()
        .enumerate()
        .map(|(i, f)| {
            format!(
                "Source {}: {}\n{}...\n",
                i + 1,
                f.source,
                truncate_chars(&f.text, FINAL_EXCERPT_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Research findings for \"{}\":\n\n{}\n\nResearch completed with {} iterations, finding {} relevant sources.",
        topic,
        body,
        iterations,
        findings.len()
    )
}

/// Produces intermediate summaries and the final report.
pub struct Synthesizer {
    reasoner: Arc<dyn ReasoningProvider>,
}

impl Synthesizer {
    pub fn new(reasoner: Arc<dyn ReasoningProvider>) -> Self {
        Self { reasoner }
    }

    /// Summarize recent findings into the session's summaries.
    ///
    /// Returns whether a summary was recorded. Provider failures are reported
    /// as a `synthesis error` activity and otherwise ignored.
    pub async fn intermediate(&self, session: &mut ResearchSession, sink: &dyn EventSink) -> bool {
        sink.emit(session.activity(
            ActivityType::Synthesis,
            ActivityStatus::Pending,
            "Creating intermediate research summary",
        ));

        let prompt = intermediate_prompt(session.topic(), session.findings(), session.summaries());
        match self.reasoner.generate_text(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                let depth = session.current_depth();
                session.push_summary(format!(
                    "[Intermediate Summary at Depth {}]: {}",
                    depth, text
                ));
                sink.emit(session.activity(
                    ActivityType::Synthesis,
                    ActivityStatus::Complete,
                    "Created intermediate research summary",
                ));
                debug!(depth, "Intermediate summary recorded");
                true
            }
            Ok(_) => false,
            Err(error) => {
                warn!(%error, "Intermediate synthesis failed");
                sink.emit(session.activity(
                    ActivityType::Synthesis,
                    ActivityStatus::Error,
                    "Failed to create intermediate summary",
                ));
                false
            }
        }
    }

    /// Produce the final markdown report, falling back to a plain listing of
    /// findings if the provider fails.
    pub async fn final_report(&self, session: &mut ResearchSession, sink: &dyn EventSink) -> String {
        sink.emit(session.activity(
            ActivityType::Synthesis,
            ActivityStatus::Pending,
            "Preparing final analysis",
        ));

        let report = match self.reasoner.generate_text(&final_prompt(session)).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "Final synthesis failed, using plain findings report");
                fallback_report(session.topic(), session.findings(), session.current_depth())
            }
        };

        sink.emit(session.activity(
            ActivityType::Synthesis,
            ActivityStatus::Complete,
            "Research completed",
        ));
        report
    }
}
