use aw_config::{StatusConfig, UpgradeConfig};
use aw_event::{Event, EventKind};

/// How a decoded event is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Update the conversation identity. Never shown in the log.
    Identity(String),

    /// Replace the status phrase. Not part of the log.
    Status(String),

    /// Restore the default status phrase. Not part of the log.
    StatusReset(String),

    /// Append the event, then clear the loading indicator.
    AppError { upgrade_required: bool },

    /// Append the event to the log as-is.
    Append,
}

impl Route {
    /// Whether the event ends up in the visible log.
    #[must_use]
    pub fn is_logged(&self) -> bool {
        matches!(self, Self::AppError { .. } | Self::Append)
    }
}

/// Decides, for every decoded event, which side effect it has.
///
/// Every event gets a route. Events that match nothing more specific,
/// including unknown shapes, are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Router {
    status: StatusConfig,
    upgrade: UpgradeConfig,
}

impl Router {
    #[must_use]
    pub fn new(status: StatusConfig, upgrade: UpgradeConfig) -> Self {
        Self { status, upgrade }
    }

    #[must_use]
    pub fn default_phrase(&self) -> &str {
        &self.status.default_phrase
    }

    /// Whether `message` is one of the known upgrade-required errors.
    #[must_use]
    pub fn requires_upgrade(&self, message: &str) -> bool {
        self.upgrade.requires_upgrade(message)
    }

    #[must_use]
    pub fn classify(&self, event: &Event) -> Route {
        match &event.kind {
            EventKind::ConversationStarted { conversation_id } => {
                Route::Identity(conversation_id.clone())
            }
            EventKind::ToolStarted { tool_name, .. } => {
                Route::Status(self.status.phrase_for(tool_name.as_deref()).to_owned())
            }
            EventKind::ToolEnded { .. } => Route::StatusReset(self.default_phrase().to_owned()),
            _ => match event.error_message() {
                Some(message) => Route::AppError {
                    upgrade_required: self.requires_upgrade(message),
                },
                None => Route::Append,
            },
        }
    }
}
