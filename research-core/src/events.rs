//! Progress events emitted during a research session.
//!
//! Every phase transition of the loop produces a [`ResearchEvent`] that is
//! pushed into an [`EventSink`]. The serialized shape is a discriminated
//! record, `{"type": "activity-delta", "content": {...}}`, which is what the
//! chat UI consumes. Sinks decide the transport:
//!
//! - [`ChannelSink`]: per-session stream for server-push responses
//! - [`BroadcastSink`]: fan-out to several subscribers
//! - [`CollectingSink`]: in-memory capture for tests and replay
//! - [`TracingSink`]: structured log records
//! - [`NullSink`]: discard

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};

/// Kind of work an activity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Search,
    Extract,
    Analyze,
    Reasoning,
    Synthesis,
    Thought,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Search => "search",
            Self::Extract => "extract",
            Self::Analyze => "analyze",
            Self::Reasoning => "reasoning",
            Self::Synthesis => "synthesis",
            Self::Thought => "thought",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Complete,
    Error,
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A timestamped progress record for one phase of one iteration.
///
/// `depth`, `completed_steps` and `total_steps` are a snapshot of the session
/// taken when the activity was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub depth: u32,
    pub completed_steps: u32,
    pub total_steps: u32,
}

/// A discovered search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub url: String,
    pub title: String,
    #[serde(alias = "description")]
    pub relevance: String,
}

/// Emitted once when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInit {
    pub max_depth: u32,
    pub total_steps: u32,
}

/// The final report, emitted once when a session ends successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishPayload {
    pub text: String,
    pub format: String,
    pub create_artifact: bool,
    pub topic: String,
}

impl FinishPayload {
    /// A markdown report for `topic`.
    pub fn markdown(text: impl Into<String>, create_artifact: bool, topic: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: "markdown".to_string(),
            create_artifact,
            topic: topic.into(),
        }
    }
}

/// Event stream record sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum ResearchEvent {
    ProgressInit(ProgressInit),
    ActivityDelta(Activity),
    SourceDelta(SourceRecord),
    Finish(FinishPayload),
}

impl ResearchEvent {
    /// Wire name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ProgressInit(_) => "progress-init",
            Self::ActivityDelta(_) => "activity-delta",
            Self::SourceDelta(_) => "source-delta",
            Self::Finish(_) => "finish",
        }
    }

    /// The activity carried by this event, if any.
    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            Self::ActivityDelta(a) => Some(a),
            _ => None,
        }
    }

    /// Format as a single-line log entry.
    pub fn as_log_line(&self) -> String {
        match self {
            Self::ProgressInit(p) => format!(
                "progress-init: max depth {}, {} steps",
                p.max_depth, p.total_steps
            ),
            Self::ActivityDelta(a) => format!(
                "[{}] {}{} {}: {} ({}/{})",
                a.timestamp.format("%H:%M:%S%.3f"),
                "  ".repeat(a.depth as usize),
                a.activity_type,
                a.status,
                a.message,
                a.completed_steps,
                a.total_steps
            ),
            Self::SourceDelta(s) => format!("source: {} <{}>", s.title, s.url),
            Self::Finish(f) => format!("finish: {} chars of {}", f.text.len(), f.format),
        }
    }
}

/// Export format for event transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// JSON Lines format (one event per line)
    JsonLines,
    /// Pretty-printed JSON array
    JsonPretty,
    /// Markdown summary
    Markdown,
}

/// Serialize a list of events to the specified format.
pub fn export_events(events: &[ResearchEvent], format: ExportFormat) -> String {
    match format {
        ExportFormat::JsonLines => events
            .iter()
            .filter_map(|e| serde_json::to_string(e).ok())
            .collect::<Vec<_>>()
            .join("\n"),
        ExportFormat::JsonPretty => {
            serde_json::to_string_pretty(events).unwrap_or_else(|_| "[]".to_string())
        }
        ExportFormat::Markdown => events_to_markdown(events),
    }
}

fn events_to_markdown(events: &[ResearchEvent]) -> String {
    let mut md = String::from("# Research Trajectory\n\n");

    for event in events {
        match event {
            ResearchEvent::ActivityDelta(a) => {
                let indent = "  ".repeat(a.depth as usize);
                md.push_str(&format!(
                    "{}- **{}** _{}_ `{}`: {}\n",
                    indent, a.activity_type, a.status, a.timestamp, a.message
                ));
            }
            ResearchEvent::SourceDelta(s) => {
                md.push_str(&format!("  - source: [{}]({})\n", s.title, s.url));
            }
            ResearchEvent::ProgressInit(p) => {
                md.push_str(&format!(
                    "Max depth {}, {} expected steps\n\n",
                    p.max_depth, p.total_steps
                ));
            }
            ResearchEvent::Finish(f) => {
                md.push_str(&format!("\n## Report: {}\n\n{}\n", f.topic, f.text));
            }
        }
    }

    md
}

/// A boxed stream of research events.
pub type EventStream = Pin<Box<dyn Stream<Item = ResearchEvent> + Send>>;

/// Destination for research events.
///
/// Emission is fire-and-forget: sinks must not block and never report
/// delivery failures back to the engine.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ResearchEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: ResearchEvent) {
        (**self).emit(event)
    }
}

/// Collecting sink that stores events in a Vec.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<ResearchEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<ResearchEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Collected activities, in emission order.
    pub fn activities(&self) -> Vec<Activity> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ResearchEvent::ActivityDelta(a) => Some(a),
                _ => None,
            })
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: ResearchEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Broadcast-based sink for multiple subscribers.
pub struct BroadcastSink {
    sender: broadcast::Sender<ResearchEvent>,
}

impl BroadcastSink {
    /// Create new broadcast sink with channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to research events.
    pub fn subscribe(&self) -> broadcast::Receiver<ResearchEvent> {
        self.sender.subscribe()
    }

    /// Get number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: ResearchEvent) {
        let _ = self.sender.send(event);
    }
}

/// Unbounded channel sink feeding a single consumer stream.
#[derive(Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<ResearchEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream that receives its events.
    ///
    /// The stream ends once every clone of the sink has been dropped.
    pub fn new() -> (Self, EventStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stream = futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        });
        (Self { sender }, Box::pin(stream))
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ResearchEvent) {
        let _ = self.sender.send(event);
    }
}

/// Sink that turns events into `tracing` records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ResearchEvent) {
        match &event {
            ResearchEvent::ActivityDelta(a) => match a.status {
                ActivityStatus::Error => tracing::warn!(
                    kind = %a.activity_type,
                    depth = a.depth,
                    "{}",
                    a.message
                ),
                ActivityStatus::Complete => tracing::info!(
                    kind = %a.activity_type,
                    depth = a.depth,
                    completed = a.completed_steps,
                    total = a.total_steps,
                    "{}",
                    a.message
                ),
                ActivityStatus::Pending => {
                    tracing::debug!(kind = %a.activity_type, depth = a.depth, "{}", a.message)
                }
            },
            other => tracing::info!("{}", other.as_log_line()),
        }
    }
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ResearchEvent) {}
}
