//! Error capture and correlation.
//!
//! Two discovery paths exist in the editor: a structured `execution_error`
//! event that fires early but only for some error classes, and a best-effort
//! dialog text scrape that fires late but catches everything. The correlator
//! bridges the two: it retains the most recent structured capture and answers
//! later "what is the current error" queries, trusting the capture only while
//! it is fresh.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::sanitize;

/// Provenance of an [`ErrorRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    /// Structured `execution_error` event pushed by the editor.
    ExecutionEvent,
    /// Synthesized from scraped dialog text at query time.
    DialogText,
}

/// Best-known description of an execution error.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Capture id, for log correlation.
    pub id: Uuid,
    pub source: ErrorSource,
    pub message: String,
    /// Graph node that raised the error, if known.
    pub node_id: Option<String>,
    pub node_type: Option<String>,
    pub traceback: Option<String>,
    /// Serialized workflow snapshot taken at capture time.
    pub workflow: Option<String>,
    /// Monotonic capture time, used for freshness comparison.
    pub captured_at: Instant,
}

/// Inbound `execution_error` payload, consumed verbatim from the editor.
///
/// Every field tolerates being absent or malformed. The editor is not
/// consistent about types across builds: `node_id` arrives as a JSON number or
/// a string, `traceback` as one string or a list of frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionErrorEvent {
    #[serde(default, deserialize_with = "node_id_lenient")]
    pub node_id: Option<String>,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub exception_message: Option<String>,
    #[serde(default, deserialize_with = "traceback_lenient")]
    pub traceback: Option<String>,
}

fn node_id_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(i64),
        Str(String),
    }
    let repr = Option::<Repr>::deserialize(deserializer)?;
    Ok(repr.map(|r| match r {
        Repr::Num(n) => n.to_string(),
        Repr::Str(s) => s,
    }))
}

fn traceback_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Lines(Vec<String>),
        Text(String),
    }
    let repr = Option::<Repr>::deserialize(deserializer)?;
    Ok(repr.map(|r| match r {
        Repr::Lines(lines) => lines.join("\n"),
        Repr::Text(text) => text,
    }))
}

/// Bridges the editor's push-based error events with later pull-based
/// "describe the current error" queries.
///
/// The two call sites are not causally linked: the event and the query arrive
/// from independent triggers, in any order. A freshness window decides whether
/// the cached capture still describes the dialog being asked about; an
/// unbounded window would risk stitching an unrelated prior error to the
/// current dialog.
///
/// The slot holds at most one structured capture; a new one overwrites it
/// (last-write-wins, no merging).
pub struct ErrorCorrelator {
    last: Mutex<Option<ErrorRecord>>,
}

impl ErrorCorrelator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    /// Capture a structured execution-error event, overwriting any prior
    /// capture. Never fails; missing payload fields stay empty.
    pub fn record(&self, event: ExecutionErrorEvent, workflow: Option<String>) -> ErrorRecord {
        let record = ErrorRecord {
            id: Uuid::new_v4(),
            source: ErrorSource::ExecutionEvent,
            message: event.exception_message.unwrap_or_default(),
            node_id: event.node_id,
            node_type: event.node_type,
            traceback: event.traceback,
            workflow,
            captured_at: Instant::now(),
        };
        info!(
            id = %record.id,
            node_id = ?record.node_id,
            node_type = ?record.node_type,
            "captured execution error event"
        );
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(record.clone());
        record
    }

    /// Best-known error description right now.
    ///
    /// A structured capture younger than `freshness_window` wins; it carries
    /// node identity and traceback the scrape cannot recover. Otherwise the
    /// caller's raw dialog text is cleaned up and returned instead. Never
    /// fails; an empty fallback yields an empty message.
    pub fn resolve(&self, raw_fallback: &str, freshness_window: Duration) -> ErrorRecord {
        {
            let last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(record) = last.as_ref() {
                if record.captured_at.elapsed() < freshness_window {
                    debug!(id = %record.id, "resolving from recent execution event");
                    return record.clone();
                }
            }
        }
        let record = ErrorRecord {
            id: Uuid::new_v4(),
            source: ErrorSource::DialogText,
            message: sanitize::clean_message(raw_fallback),
            node_id: None,
            node_type: None,
            traceback: None,
            workflow: None,
            captured_at: Instant::now(),
        };
        debug!(
            id = %record.id,
            chars = record.message.chars().count(),
            "resolving from dialog text fallback"
        );
        record
    }

    /// The retained structured capture, without freshness filtering.
    pub fn last_structured(&self) -> Option<ErrorRecord> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ErrorCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
