use aw_conversation::{ConversationId, LogEntry};

use crate::TurnPhase;

/// Transient flags shown alongside the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Indicators {
    /// A turn is waiting for the agent.
    pub loading: bool,

    /// The response body is streaming.
    pub connected: bool,

    /// What the agent is currently doing.
    pub status: Option<String>,

    /// The agent rejected the turn for lack of credits or tokens.
    pub upgrade_required: bool,
}

/// A state change, sent in the order it happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Phase(TurnPhase),

    /// The conversation was established, or replaced by the agent.
    ConversationId(ConversationId),

    Status(String),
    Appended(LogEntry),
    UpgradeRequired,
    Indicators(Indicators),
}
