//! The event model.
//!
//! The agent emits two overlapping shapes. The legacy shape carries its
//! discriminant in `data.type` and its body in `data.payload`:
//!
//! ```json
//! {"data": {"type": "...", "payload": {}, "id": "...", "timestamp": "...", "status": null}, "event_source": "..."}
//! ```
//!
//! The current shape uses `event_type`, either nested in `data` or at the top
//! level, and splits the body into `input_params` and `output_params`:
//!
//! ```json
//! {"data": {"tool_name": "...", "input_params": {}, "output_params": {}, "id": "..."}, "event_type": "...", "timestamp": "..."}
//! ```
//!
//! Both map onto the same [`Event`] through a single discriminant detection
//! step, see [`Event::from_object`].

use serde_json::{Map, Value};
use tracing::warn;

/// Reserved discriminant carrying the conversation identity.
pub const CONVERSATION_STARTED: &str = "conversation_started";

/// Discriminants reporting that a tool or step has started.
pub const TOOL_STARTED: &[&str] = &["tool_started", "tool_call", "step_started"];

/// Discriminants reporting that a tool or step has ended.
pub const TOOL_ENDED: &[&str] = &["tool_completed", "tool_result", "step_completed"];

/// Discriminants reporting an application-level error.
pub const ERROR: &[&str] = &["error"];

/// Discriminants of user-facing notifications.
pub const NOTIFICATION: &[&str] = &["user_notification", "notification"];

/// A decoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// What the event reports.
    pub kind: EventKind,

    /// The discriminant as it appeared on the wire, if any.
    pub discriminant: Option<String>,

    pub id: Option<String>,
    pub status: Option<String>,
    pub timestamp: Option<String>,

    /// The legacy `event_source` field.
    pub source: Option<String>,

    /// The complete object as received.
    ///
    /// Kept for every event, so that nothing the agent sent is lost, even for
    /// [`EventKind::Unknown`] events.
    pub raw: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The control event establishing the conversation identity.
    ConversationStarted { conversation_id: String },

    /// A tool or step has started.
    ToolStarted {
        tool_name: Option<String>,
        input: Option<Value>,
    },

    /// A tool or step has ended.
    ToolEnded {
        tool_name: Option<String>,
        output: Option<Value>,
    },

    /// The agent reported an error.
    Error { message: String },

    /// A notification meant for the user.
    Notification { payload: Value },

    /// Any other shape. See [`Event::raw`] for the content.
    Unknown,
}

impl Event {
    /// Build an event from a parsed JSON object.
    ///
    /// This never fails: shapes that are not recognized become
    /// [`EventKind::Unknown`].
    #[must_use]
    pub fn from_object(raw: Map<String, Value>) -> Self {
        let data = raw.get("data").and_then(Value::as_object);

        let discriminant = data
            .and_then(|data| str_field(data, "type").or_else(|| str_field(data, "event_type")))
            .or_else(|| str_field(&raw, "event_type"))
            .map(str::to_owned);

        let kind = match (discriminant.as_deref(), data) {
            (Some(d), Some(data)) => classify(d, data),
            _ => EventKind::Unknown,
        };

        let field = |name: &str| {
            data.and_then(|data| str_field(data, name))
                .or_else(|| str_field(&raw, name))
                .map(str::to_owned)
        };

        let id = field("id");
        let status = field("status");
        let timestamp = field("timestamp");
        let source = str_field(&raw, "event_source").map(str::to_owned);

        Self {
            kind,
            discriminant,
            id,
            status,
            timestamp,
            source,
            raw,
        }
    }

    /// The `data` object of the event, if present.
    #[must_use]
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.raw.get("data").and_then(Value::as_object)
    }

    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self.kind, EventKind::ConversationStarted { .. })
    }

    /// The application error carried by this event.
    ///
    /// Either an [`EventKind::Error`], or a notification whose payload carries
    /// an `error` field.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Error { message } => Some(message.as_str()),
            EventKind::Notification { payload } => payload
                .get("error")
                .and_then(Value::as_str)
                .or_else(|| self.data().and_then(|data| str_field(data, "error"))),
            _ => None,
        }
    }

    /// The tool name of a tool start or end event.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        match &self.kind {
            EventKind::ToolStarted { tool_name, .. } | EventKind::ToolEnded { tool_name, .. } => {
                tool_name.as_deref()
            }
            _ => None,
        }
    }
}

fn classify(discriminant: &str, data: &Map<String, Value>) -> EventKind {
    let payload = data.get("payload");

    if discriminant == CONVERSATION_STARTED {
        let id = payload
            .and_then(|p| p.get("conversation_id"))
            .and_then(Value::as_str)
            .or_else(|| str_field(data, "conversation_id"));

        return match id {
            Some(id) if !id.is_empty() => EventKind::ConversationStarted {
                conversation_id: id.to_owned(),
            },
            _ => {
                warn!("Control event without a conversation ID. Treating it as unknown.");
                EventKind::Unknown
            }
        };
    }

    if TOOL_STARTED.contains(&discriminant) {
        return EventKind::ToolStarted {
            tool_name: tool_name(data),
            input: data.get("input_params").or(payload).cloned(),
        };
    }

    if TOOL_ENDED.contains(&discriminant) {
        return EventKind::ToolEnded {
            tool_name: tool_name(data),
            output: data.get("output_params").or(payload).cloned(),
        };
    }

    if ERROR.contains(&discriminant) {
        return EventKind::Error {
            message: error_message(data),
        };
    }

    if NOTIFICATION.contains(&discriminant) {
        return EventKind::Notification {
            payload: payload.cloned().unwrap_or(Value::Null),
        };
    }

    EventKind::Unknown
}

fn tool_name(data: &Map<String, Value>) -> Option<String> {
    str_field(data, "tool_name")
        .or_else(|| {
            let payload = data.get("payload")?;
            payload
                .get("tool_name")
                .or_else(|| payload.get("name"))
                .and_then(Value::as_str)
        })
        .map(str::to_owned)
}

fn error_message(data: &Map<String, Value>) -> String {
    let from_payload = match data.get("payload") {
        Some(Value::String(message)) => Some(message.as_str()),
        Some(payload) => payload
            .get("message")
            .or_else(|| payload.get("error"))
            .and_then(Value::as_str),
        None => None,
    };

    from_payload
        .or_else(|| str_field(data, "message"))
        .or_else(|| str_field(data, "error"))
        .unwrap_or("Unknown error")
        .to_owned()
}

fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
