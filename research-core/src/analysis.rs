//! Analysis and planning step.
//!
//! After each extraction the [`Planner`] asks the reasoning capability to
//! summarize what has been learned and propose the next search direction.
//! The reply is untrusted free text, so it goes through two stages:
//!
//! 1. [`extract_json_object`]: find the first balanced `{...}` substring that
//!    is valid JSON, tolerating prose and code fences around it
//! 2. [`parse_analysis`]: validate it against the [`Analysis`] schema
//!
//! When either stage fails the planner switches to the keyword fallback
//! ([`keyword_fallback`]); when the provider call itself fails it stops the
//! research. Both paths are explicit [`PlanOutcome`] variants.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

use crate::config::{FallbackContinuation, ResearchConfig};
use crate::error::{Error, Result};
use crate::events::{ActivityStatus, ActivityType, EventSink};
use crate::provider::ReasoningProvider;
use crate::session::{Finding, ResearchSession};

/// Summary used when the reasoning output could not be parsed.
pub const PARSE_FALLBACK_SUMMARY: &str =
    "Analysis parsing failed, using keyword extraction as fallback";

/// Summary used when the reasoning provider failed.
pub const PROVIDER_FAILURE_SUMMARY: &str = "Analysis failed";

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "with", "by", "about",
    "as",
];

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w{4,}\b").expect("invalid regex"));

/// Structured result of one analysis step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub themes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gaps: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub next_steps: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub should_continue: bool,
    #[serde(default)]
    pub next_search_topic: Option<String>,
    #[serde(default)]
    pub url_to_search: Option<String>,
}

impl Analysis {
    fn normalized(mut self) -> Self {
        self.next_search_topic = non_blank(self.next_search_topic);
        self.url_to_search = non_blank(self.url_to_search);
        self.themes.retain(|t| !t.trim().is_empty());
        self.gaps.retain(|g| !g.trim().is_empty());
        self
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// How an analysis was obtained.
#[derive(Debug)]
pub enum PlanOutcome {
    /// The reasoning output parsed cleanly.
    Parsed(Analysis),
    /// The output was malformed; the keyword fallback produced the analysis.
    Fallback { analysis: Analysis, reason: String },
    /// The provider call failed; research should stop.
    Failed { analysis: Analysis, error: Error },
}

impl PlanOutcome {
    pub fn analysis(&self) -> &Analysis {
        match self {
            Self::Parsed(a) => a,
            Self::Fallback { analysis, .. } | Self::Failed { analysis, .. } => analysis,
        }
    }

    pub fn into_analysis(self) -> Analysis {
        match self {
            Self::Parsed(a) => a,
            Self::Fallback { analysis, .. } | Self::Failed { analysis, .. } => analysis,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Find the first balanced-brace substring of `text` that is a JSON object.
///
/// A single pass pairs every `{` with its closing `}`; candidates are then
/// tried in order of their opening brace. Quotes only open a string inside
/// braces, so prose around the object is ignored, and braces inside JSON
/// strings (including escaped quotes) do not count.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable();
    spans
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .find(|candidate| matches!(serde_json::from_str::<Value>(candidate), Ok(Value::Object(_))))
}

/// Parse reasoning output into an [`Analysis`].
///
/// Accepts `{"analysis": {...}}` or a bare analysis object. `summary` is
/// required; every other field defaults when absent or null.
pub fn parse_analysis(text: &str) -> Result<Analysis> {
    let json = extract_json_object(text)
        .ok_or_else(|| Error::parse("no JSON object found in reasoning output"))?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| Error::parse(format!("invalid JSON: {}", e)))?;

    let body = match value {
        Value::Object(mut map) => match map.remove("analysis") {
            Some(inner @ Value::Object(_)) => inner,
            Some(_) => return Err(Error::parse("`analysis` is not an object")),
            None => Value::Object(map),
        },
        _ => return Err(Error::parse("reasoning output is not a JSON object")),
    };

    let analysis: Analysis = serde_json::from_value(body)
        .map_err(|e| Error::parse(format!("analysis does not match schema: {}", e)))?;
    Ok(analysis.normalized())
}

/// Most frequent words of `text`, top five.
///
/// Words are lowercased runs of at least four word characters, stopwords
/// removed. Ties keep first-occurrence order.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (order, m) in WORD_PATTERN.find_iter(&lowered).enumerate() {
        let word = m.as_str();
        if STOPWORDS.contains(&word) {
            continue;
        }
        counts.entry(word).or_insert((0, order)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(5)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Deterministic analysis built from keyword frequencies over `findings`.
pub fn keyword_fallback(
    findings: &[Finding],
    current_topic: &str,
    root_topic: &str,
    policy: FallbackContinuation,
) -> Analysis {
    let text = findings
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let keywords = extract_keywords(&text);
    let top = keywords.first().map(String::as_str).unwrap_or("");

    Analysis {
        summary: PARSE_FALLBACK_SUMMARY.to_string(),
        themes: Vec::new(),
        gaps: Vec::new(),
        next_steps: vec![format!("Research \"{} {}\"", current_topic, top)],
        should_continue: policy.should_continue(current_topic, root_topic),
        next_search_topic: keywords
            .first()
            .map(|kw| format!("{} {}", current_topic, kw)),
        url_to_search: None,
    }
}

/// Analysis returned when the reasoning provider itself failed.
pub fn provider_failure_analysis() -> Analysis {
    Analysis {
        summary: PROVIDER_FAILURE_SUMMARY.to_string(),
        ..Analysis::default()
    }
}

/// First `max` characters of `s`, on a char boundary.
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Drives the analysis/planning step against a reasoning provider.
pub struct Planner {
    reasoner: Arc<dyn ReasoningProvider>,
    config: ResearchConfig,
}

impl Planner {
    pub fn new(reasoner: Arc<dyn ReasoningProvider>, config: ResearchConfig) -> Self {
        Self { reasoner, config }
    }

    /// Build the planning prompt for the latest findings.
    pub fn build_prompt(&self, session: &ResearchSession, current_topic: &str) -> String {
        let findings = session.findings();
        let window_start = findings.len().saturating_sub(self.config.analysis_window);
        let recent = findings[window_start..]
            .iter()
            .map(|f| {
                format!(
                    "[From {}]: {}",
                    f.source,
                    truncate_chars(&f.text, self.config.analysis_excerpt_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let minutes_remaining = session.time_remaining().as_secs_f64() / 60.0;

        format!(
            r#"You are a research agent working to write a thorough research report on: {topic}
You have {minutes:.1} minutes remaining to complete the research but you don't need to use all of it.

Current findings: {recent}

What has been learned? What gaps remain? What specific aspects should be investigated next if any?
Identify key themes emerging from the research that will be useful for structuring the final report.
If you need to search for more information, include a nextSearchTopic.
If you need to search for more information in a specific URL, include a urlToSearch.

IMPORTANT: Be conservative about concluding the research. Only set shouldContinue to false if:
1. You have extremely comprehensive information from multiple sources that thoroughly answers the topic
2. You have less than 30 seconds remaining
3. You've already explored 5+ different angles on the topic

Generally, aim to continue research for at least 3-5 iterations to ensure depth and comprehensiveness.
Current depth is {depth} of a target minimum of {minimum}.

Respond in this exact JSON format:
{{
  "analysis": {{
    "summary": "summary of findings so far",
    "themes": ["theme1", "theme2", "theme3"],
    "gaps": ["gap1", "gap2"],
    "nextSteps": ["step1", "step2"],
    "shouldContinue": true/false,
    "nextSearchTopic": "optional topic for next search",
    "urlToSearch": "optional url to explore further"
  }}
}}"#,
            topic = current_topic,
            minutes = minutes_remaining,
            recent = recent,
            depth = session.current_depth(),
            minimum = session.minimum_iterations(),
        )
    }

    /// Analyze the session's findings and plan the next step.
    ///
    /// Emits `reasoning` activities (and a `thought` when the minimum-iteration
    /// floor is enforced). Never fails: parse and provider errors become
    /// [`PlanOutcome::Fallback`] and [`PlanOutcome::Failed`].
    pub async fn analyze(
        &self,
        session: &mut ResearchSession,
        current_topic: &str,
        sink: &dyn EventSink,
    ) -> PlanOutcome {
        let prompt = self.build_prompt(session, current_topic);

        sink.emit(session.activity(
            ActivityType::Reasoning,
            ActivityStatus::Pending,
            "Analyzing findings and planning next steps",
        ));

        let response = match self.reasoner.generate_text(&prompt).await {
            Ok(text) => text,
            Err(error) => {
                warn!(provider = self.reasoner.name(), %error, "Analysis failed");
                sink.emit(session.activity(
                    ActivityType::Reasoning,
                    ActivityStatus::Error,
                    format!("Analysis failed: {}", error),
                ));
                return PlanOutcome::Failed {
                    analysis: provider_failure_analysis(),
                    error,
                };
            }
        };

        match parse_analysis(&response) {
            Ok(mut analysis) => {
                sink.emit(session.activity(
                    ActivityType::Reasoning,
                    ActivityStatus::Complete,
                    format!(
                        "Analysis complete: {}...",
                        truncate_chars(&analysis.summary, 100)
                    ),
                ));
                self.enforce_minimum_iterations(session, current_topic, &mut analysis, sink);
                PlanOutcome::Parsed(analysis)
            }
            Err(error) => {
                warn!(%error, "Failed to parse analysis response, using keyword fallback");
                debug!(raw = %response, "Unparsed reasoning output");
                sink.emit(session.activity(
                    ActivityType::Reasoning,
                    ActivityStatus::Error,
                    "Failed to parse analysis response",
                ));
                let analysis = keyword_fallback(
                    session.findings(),
                    current_topic,
                    session.topic(),
                    self.config.fallback_continuation,
                );
                PlanOutcome::Fallback {
                    analysis,
                    reason: error.to_string(),
                }
            }
        }
    }

    fn enforce_minimum_iterations(
        &self,
        session: &mut ResearchSession,
        current_topic: &str,
        analysis: &mut Analysis,
        sink: &dyn EventSink,
    ) {
        if session.current_depth() >= session.minimum_iterations()
            || session.time_remaining() <= self.config.min_time_for_forced_continue()
        {
            return;
        }

        sink.emit(session.activity(
            ActivityType::Thought,
            ActivityStatus::Pending,
            format!(
                "Enforcing minimum iteration requirement ({}/{})",
                session.current_depth(),
                session.minimum_iterations()
            ),
        ));

        analysis.should_continue = true;
        if analysis.next_search_topic.is_none() {
            analysis.next_search_topic = Some(
                analysis
                    .gaps
                    .first()
                    .cloned()
                    .unwrap_or_else(|| format!("{} deeper analysis", current_topic)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingSink;
    use crate::testing::{FailingReasoner, ScriptedReasoner};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_extract_json_with_prose() {
        let text = r#"Sure! Here is the analysis: {"analysis": {"summary": "s"}} Hope it helps."#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"analysis": {"summary": "s"}}"#)
        );
    }

    #[test]
    fn test_extract_json_skips_non_json_braces() {
        let text = r#"Use {placeholders} like this. {"summary": "real", "gaps": ["a}b"]} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"summary": "real", "gaps": ["a}b"]}"#)
        );
    }

    #[test]
    fn test_extract_json_handles_escaped_quotes() {
        let text = r#"{"summary": "he said \"{hi}\""}"#;
        assert_eq!(extract_json_object(text), Some(text));
    }

    #[test]
    fn test_extract_json_from_code_fence() {
        let text = "```json\n{\"summary\": \"fenced\"}\n```";
        assert_eq!(extract_json_object(text), Some("{\"summary\": \"fenced\"}"));
    }

    #[test]
    fn test_extract_json_after_unclosed_brace() {
        let text = r#"Note { the plan: {"summary": "inner"} and more"#;
        assert_eq!(extract_json_object(text), Some(r#"{"summary": "inner"}"#));
    }

    #[test]
    fn test_extract_json_scales_on_unbalanced_input() {
        let mut text = "{ ".repeat(200_000);
        text.push_str(r#"{"summary": "deep"}"#);
        assert_eq!(extract_json_object(&text), Some(r#"{"summary": "deep"}"#));

        let unbalanced = "{".repeat(200_000);
        assert_eq!(extract_json_object(&unbalanced), None);
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("{unterminated"), None);
    }

    #[test]
    fn test_parse_analysis_envelope() {
        let text = r#"{"analysis":{"summary":"s","themes":["battery"],"gaps":[],"nextSteps":[],"shouldContinue":false,"nextSearchTopic":"ev batteries"}}"#;
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(
            analysis,
            Analysis {
                summary: "s".to_string(),
                themes: vec!["battery".to_string()],
                gaps: vec![],
                next_steps: vec![],
                should_continue: false,
                next_search_topic: Some("ev batteries".to_string()),
                url_to_search: None,
            }
        );
    }

    #[test]
    fn test_parse_analysis_bare_object_and_nulls() {
        let text = r#"{"summary":"bare","themes":null,"nextSearchTopic":"  ","urlToSearch":null}"#;
        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.summary, "bare");
        assert!(analysis.themes.is_empty());
        assert_eq!(analysis.next_search_topic, None);
        assert!(!analysis.should_continue);
    }

    #[test]
    fn test_parse_analysis_requires_summary() {
        let err = parse_analysis(r#"{"analysis": {"themes": ["x"]}}"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_parse_analysis_rejects_prose() {
        let err = parse_analysis("The research is going well, keep searching.").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_extract_keywords_ranking() {
        let text = "Battery battery battery. Charging charging. Grid with about the grid, grid. cost";
        let keywords = extract_keywords(text);
        assert_eq!(keywords, vec!["battery", "grid", "charging", "cost"]);
    }

    #[test]
    fn test_extract_keywords_ties_keep_first_occurrence() {
        let keywords = extract_keywords("zebra apple mango zebra apple mango");
        assert_eq!(keywords, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_extract_keywords_filters_stopwords_and_short_words() {
        let keywords = extract_keywords("about about with with the and cat dog");
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_keyword_fallback() {
        let findings = vec![
            Finding::new("Solid-state batteries improve range. Batteries matter.", "a"),
            Finding::new("batteries again", "b"),
        ];
        let analysis = keyword_fallback(
            &findings,
            "electric vehicles",
            "electric vehicles",
            FallbackContinuation::UnlessRootTopic,
        );

        assert_eq!(analysis.summary, PARSE_FALLBACK_SUMMARY);
        assert_eq!(
            analysis.next_search_topic.as_deref(),
            Some("electric vehicles batteries")
        );
        assert_eq!(
            analysis.next_steps,
            vec!["Research \"electric vehicles batteries\"".to_string()]
        );
        assert!(!analysis.should_continue);

        let analysis = keyword_fallback(
            &findings,
            "ev batteries",
            "electric vehicles",
            FallbackContinuation::UnlessRootTopic,
        );
        assert!(analysis.should_continue);
    }

    #[test]
    fn test_keyword_fallback_without_keywords() {
        let analysis = keyword_fallback(&[], "ev", "ev", FallbackContinuation::Always);
        assert_eq!(analysis.next_search_topic, None);
        assert!(analysis.should_continue);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    fn session_with_findings(config: &ResearchConfig, depth: u32) -> ResearchSession {
        let mut session = ResearchSession::new("electric vehicles", 7, config);
        session.begin_iteration(depth);
        session.extend_findings(vec![Finding::new(
            "Charging networks charging networks expand",
            "https://a.example",
        )]);
        session
    }

    #[test]
    fn test_build_prompt_windows_findings() {
        let config = ResearchConfig::default();
        let planner = Planner::new(Arc::new(ScriptedReasoner::always("")), config.clone());
        let mut session = ResearchSession::new("ev", 7, &config);
        session.begin_iteration(2);
        session.extend_findings((0..7).map(|i| Finding::new(format!("text{}", i), format!("src{}", i))));

        let prompt = planner.build_prompt(&session, "ev charging");
        assert!(prompt.contains("thorough research report on: ev charging"));
        assert!(!prompt.contains("[From src1]"));
        assert!(prompt.contains("[From src2]: text2"));
        assert!(prompt.contains("[From src6]: text6"));
        assert!(prompt.contains("Current depth is 2 of a target minimum of 3."));
        assert!(prompt.contains("\"analysis\": {"));
    }

    #[tokio::test]
    async fn test_analyze_parsed_enforces_minimum() {
        let config = ResearchConfig::default();
        let reasoner = ScriptedReasoner::always(
            r#"{"analysis":{"summary":"done","gaps":["charging cost"],"shouldContinue":false}}"#,
        );
        let planner = Planner::new(Arc::new(reasoner), config.clone());
        let mut session = session_with_findings(&config, 1);
        let sink = CollectingSink::new();

        let outcome = planner.analyze(&mut session, "electric vehicles", &sink).await;

        assert!(outcome.is_parsed());
        let analysis = outcome.into_analysis();
        assert!(analysis.should_continue);
        assert_eq!(analysis.next_search_topic.as_deref(), Some("charging cost"));

        let kinds: Vec<_> = sink
            .activities()
            .iter()
            .map(|a| (a.activity_type, a.status))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ActivityType::Reasoning, ActivityStatus::Pending),
                (ActivityType::Reasoning, ActivityStatus::Complete),
                (ActivityType::Thought, ActivityStatus::Pending),
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_minimum_defaults_topic() {
        let config = ResearchConfig::default();
        let reasoner = ScriptedReasoner::always(r#"{"analysis":{"summary":"done"}}"#);
        let planner = Planner::new(Arc::new(reasoner), config.clone());
        let mut session = session_with_findings(&config, 1);

        let analysis = planner
            .analyze(&mut session, "ev", &CollectingSink::new())
            .await
            .into_analysis();
        assert_eq!(analysis.next_search_topic.as_deref(), Some("ev deeper analysis"));
    }

    #[tokio::test]
    async fn test_analyze_respects_stop_past_minimum() {
        let config = ResearchConfig::default();
        let reasoner = ScriptedReasoner::always(r#"{"analysis":{"summary":"done"}}"#);
        let planner = Planner::new(Arc::new(reasoner), config.clone());
        let mut session = session_with_findings(&config, 3);

        let analysis = planner
            .analyze(&mut session, "ev", &CollectingSink::new())
            .await
            .into_analysis();
        assert!(!analysis.should_continue);
        assert_eq!(analysis.next_search_topic, None);
    }

    #[tokio::test]
    async fn test_analyze_prose_falls_back_to_keywords() {
        let config = ResearchConfig::default();
        let reasoner = ScriptedReasoner::always("I think you should look at charging next.");
        let planner = Planner::new(Arc::new(reasoner), config.clone());
        let mut session = session_with_findings(&config, 1);
        let sink = CollectingSink::new();

        let outcome = planner.analyze(&mut session, "electric vehicles", &sink).await;

        assert!(outcome.is_fallback());
        let analysis = outcome.into_analysis();
        assert_eq!(
            analysis.next_search_topic.as_deref(),
            Some("electric vehicles charging")
        );
        let last = sink.activities().pop().unwrap();
        assert_eq!(last.status, ActivityStatus::Error);
        assert_eq!(last.message, "Failed to parse analysis response");
    }

    #[tokio::test]
    async fn test_analyze_provider_failure_stops() {
        let config = ResearchConfig::default();
        let planner = Planner::new(Arc::new(FailingReasoner), config.clone());
        let mut session = session_with_findings(&config, 1);
        let sink = CollectingSink::new();

        let outcome = planner.analyze(&mut session, "ev", &sink).await;

        assert!(matches!(outcome, PlanOutcome::Failed { .. }));
        let analysis = outcome.analysis();
        assert_eq!(analysis.summary, PROVIDER_FAILURE_SUMMARY);
        assert!(!analysis.should_continue);
        assert!(sink
            .activities()
            .last()
            .unwrap()
            .message
            .starts_with("Analysis failed: "));
    }

    proptest! {
        /// Keyword extraction never returns more than five distinct, long, non-stopword words.
        #[test]
        fn keywords_are_bounded_and_distinct(text in "[a-zA-Z ,.]{0,400}") {
            let keywords = extract_keywords(&text);
            prop_assert!(keywords.len() <= 5);
            let mut seen = std::collections::HashSet::new();
            for kw in &keywords {
                prop_assert!(kw.chars().count() >= 4);
                prop_assert!(!STOPWORDS.contains(&kw.as_str()));
                prop_assert!(seen.insert(kw.clone()));
            }
        }

        /// Whatever the extractor returns is a JSON object found verbatim in the input.
        #[test]
        fn extracted_json_is_object_substring(prefix in "[a-z {}]{0,30}", suffix in "[a-z {}]{0,30}") {
            let text = format!("{}{{\"summary\": \"x\"}}{}", prefix, suffix);
            let json = extract_json_object(&text);
            prop_assert!(json.is_some());
            let json = json.unwrap();
            prop_assert!(text.contains(json));
            let is_object = matches!(serde_json::from_str::<Value>(json), Ok(Value::Object(_)));
            prop_assert!(is_object);
        }
    }
}
