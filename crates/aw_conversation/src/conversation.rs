//! Session-scoped conversation state.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    LogEntry, PendingFile, Turn,
    error::{Error, Result},
};

/// Opaque conversation identifier, assigned by the agent.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::EmptyId);
        }

        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConversationId").field(&self.0).finish()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConversationId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConversationId {
    type Error = Error;

    fn try_from(id: String) -> Result<Self> {
        Self::new(id)
    }
}

impl From<ConversationId> for String {
    fn from(id: ConversationId) -> Self {
        id.0
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The effect of [`ConversationState::set_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdUpdate {
    /// No ID was set before.
    Established,

    /// The same ID was already set. Nothing changed.
    Unchanged,

    /// A different ID was set before, and has been replaced.
    Replaced { previous: ConversationId },
}

impl IdUpdate {
    #[must_use]
    pub fn is_changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// The state of the current conversation.
///
/// Lives for the duration of a session. Only the conversation ID is shared
/// with the agent; the log is local.
#[derive(Debug, Default)]
pub struct ConversationState {
    id: Option<ConversationId>,
    pending_files: Vec<PendingFile>,
    turns: Vec<Turn>,
}

impl ConversationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume an existing conversation.
    #[must_use]
    pub fn with_id(id: ConversationId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&ConversationId> {
        self.id.as_ref()
    }

    /// Record the conversation ID reported by the agent.
    ///
    /// Setting the ID that is already set is a no-op.
    pub fn set_id(&mut self, id: ConversationId) -> IdUpdate {
        match self.id.replace(id) {
            None => {
                debug!(id = ?self.id, "Conversation established.");
                IdUpdate::Established
            }
            Some(previous) if Some(&previous) == self.id.as_ref() => IdUpdate::Unchanged,
            Some(previous) => {
                warn!(%previous, current = ?self.id, "Agent replaced the conversation ID.");
                IdUpdate::Replaced { previous }
            }
        }
    }

    pub fn add_pending_file(&mut self, file: PendingFile) {
        self.pending_files.push(file);
    }

    #[must_use]
    pub fn pending_files(&self) -> &[PendingFile] {
        &self.pending_files
    }

    /// Turn a user query into the query sent to the agent.
    ///
    /// Every pending file is appended as a reference token, each on its own
    /// line, after a blank line. The pending files are consumed.
    pub fn compose_query(&mut self, query: &str) -> String {
        if self.pending_files.is_empty() {
            return query.to_owned();
        }

        let tokens = self
            .pending_files
            .drain(..)
            .map(|file| file.reference_token())
            .collect::<Vec<_>>();

        format!("{query}\n\n{}", tokens.join("\n"))
    }

    /// Start a new turn.
    ///
    /// Fails if the previous turn has not finished yet.
    pub fn begin_turn(&mut self, query: impl Into<String>) -> Result<&mut Turn> {
        if self.current_turn().is_some() {
            return Err(Error::TurnInProgress);
        }

        self.turns.push(Turn::new(query));
        let index = self.turns.len() - 1;
        Ok(&mut self.turns[index])
    }

    /// The unfinished turn, if any.
    #[must_use]
    pub fn current_turn(&self) -> Option<&Turn> {
        self.turns.last().filter(|turn| !turn.is_finished())
    }

    pub fn current_turn_mut(&mut self) -> Option<&mut Turn> {
        self.turns.last_mut().filter(|turn| !turn.is_finished())
    }

    #[must_use]
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The visible log: every entry of every turn, in order.
    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.turns.iter().flat_map(Turn::entries)
    }

    /// Forget the conversation, starting afresh.
    ///
    /// Clears the ID, the pending files and the log.
    pub fn new_conversation(&mut self) {
        debug!(id = ?self.id, "Starting new conversation.");
        self.id = None;
        self.pending_files.clear();
        self.turns.clear();
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
