//! Progress events and their text wire encoding.
//!
//! Events cross process boundaries as server-sent-event style frames:
//! `event: <name>\ndata: <json>\n\n`. Emission order is the only ordering
//! guarantee consumers get, so encoding and decoding both preserve it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::CatalogError;

use super::summary::TransferSummary;

/// Log-line severity carried inside `TransferEvent::Log`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One entry in a transfer's ordered progress stream.
///
/// Exactly one terminal event (`Complete`, `Error` or `Cancelled`) ends
/// every stream; nothing follows it. All non-terminal payloads are
/// human-readable messages, never credentials or raw provider payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum TransferEvent {
    /// First event of every transfer.
    Start { message: String },
    /// Forward motion through the pipeline's phases.
    Progress { message: String },
    /// Status line; warnings and per-item failures land here.
    Log { message: String, severity: Severity },
    /// Terminal: the transfer aborted on an unrecoverable failure.
    Error { message: String },
    /// Terminal: the caller cancelled the transfer.
    Cancelled { message: String },
    /// Terminal: the transfer ran to completion.
    Complete { summary: TransferSummary },
}

impl TransferEvent {
    /// Wire name used in the frame's `event:` line.
    pub fn name(&self) -> &'static str {
        match self {
            TransferEvent::Start { .. } => "start",
            TransferEvent::Progress { .. } => "progress",
            TransferEvent::Log { .. } => "log",
            TransferEvent::Error { .. } => "error",
            TransferEvent::Cancelled { .. } => "cancelled",
            TransferEvent::Complete { .. } => "complete",
        }
    }

    /// True for events after which the stream must end.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::Error { .. }
                | TransferEvent::Cancelled { .. }
                | TransferEvent::Complete { .. }
        )
    }

    /// Encodes the event as one wire frame, trailing blank line included.
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.data())
    }

    fn data(&self) -> serde_json::Value {
        match self {
            TransferEvent::Start { message }
            | TransferEvent::Progress { message }
            | TransferEvent::Error { message }
            | TransferEvent::Cancelled { message } => json!({ "message": message }),
            TransferEvent::Log { message, severity } => {
                json!({ "message": message, "severity": severity })
            }
            TransferEvent::Complete { summary } => json!({ "summary": summary }),
        }
    }
}

/// Incremental decoder for the frame encoding, tolerant of chunk
/// boundaries that split frames anywhere.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: String,
}

impl EventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one received chunk, returning every frame it completes.
    ///
    /// Partial trailing frames stay buffered for the next call.
    ///
    /// # Errors
    ///
    /// `CatalogError::Parse` when a completed frame is missing its event
    /// line or carries malformed JSON.
    pub fn feed(&mut self, chunk: &str) -> Result<Vec<TransferEvent>, CatalogError> {
        self.buffer.push_str(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            let frame = frame.trim_end();
            if frame.is_empty() {
                continue;
            }
            events.push(Self::decode_frame(frame)?);
        }
        Ok(events)
    }

    fn decode_frame(frame: &str) -> Result<TransferEvent, CatalogError> {
        let mut name = None;
        let mut data = None;
        for line in frame.lines() {
            if let Some(rest) = line.strip_prefix("event:") {
                name = Some(rest.trim());
            } else if let Some(rest) = line.strip_prefix("data:") {
                data = Some(rest.trim());
            }
        }

        let name = name.ok_or_else(|| CatalogError::Parse {
            reason: "event frame has no event line".to_string(),
        })?;
        let data: serde_json::Value = match data {
            Some(raw) => serde_json::from_str(raw).map_err(|e| CatalogError::Parse {
                reason: format!("event frame has malformed data: {e}"),
            })?,
            None => json!({}),
        };

        serde_json::from_value(json!({ "event": name, "data": data })).map_err(|e| {
            CatalogError::Parse {
                reason: format!("unrecognized event frame '{name}': {e}"),
            }
        })
    }
}
