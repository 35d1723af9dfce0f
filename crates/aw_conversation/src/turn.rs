//! A single request/response exchange and the entries it produced.

use std::fmt;

use aw_event::Event;

use crate::error::{Error, Result};

/// Why a turn failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection failure, or the stream broke while reading.
    Transport,

    /// The server answered with a non-success status code.
    Http(u16),

    /// The turn was cancelled before it completed.
    Cancelled,
}

/// The terminal log entry of a failed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,

    /// Human-readable description, shown to the user.
    pub message: String,
}

impl Failure {
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Request cancelled.")
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// An entry in the visible event log.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Event(Event),
    Failure(Failure),
}

impl LogEntry {
    #[must_use]
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(event) => Some(event),
            Self::Failure(_) => None,
        }
    }

    #[must_use]
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            Self::Event(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Failed(FailureKind),
}

/// One submitted query, the entries it produced, and how it ended.
///
/// Entries are only ever appended, in the order they were received. Once the
/// turn has an outcome, it no longer accepts entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    query: String,
    entries: Vec<LogEntry>,
    decode_errors: Vec<String>,
    outcome: Option<TurnOutcome>,
}

impl Turn {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            entries: vec![],
            decode_errors: vec![],
            outcome: None,
        }
    }

    /// The query as sent, including any file reference tokens.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter().filter_map(LogEntry::as_event)
    }

    /// Diagnostics of frames that were dropped because they failed to decode.
    #[must_use]
    pub fn decode_errors(&self) -> &[String] {
        &self.decode_errors
    }

    #[must_use]
    pub fn outcome(&self) -> Option<TurnOutcome> {
        self.outcome
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn push_event(&mut self, event: Event) -> Result<&LogEntry> {
        self.push(LogEntry::Event(event))
    }

    pub fn record_decode_error(&mut self, error: impl fmt::Display) {
        self.decode_errors.push(error.to_string());
    }

    /// Mark the turn as completed.
    pub fn complete(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.outcome = Some(TurnOutcome::Completed);
        Ok(())
    }

    /// Append the terminal failure entry and mark the turn as failed.
    pub fn fail(&mut self, failure: Failure) -> Result<&LogEntry> {
        let kind = failure.kind;
        self.ensure_open()?;
        self.entries.push(LogEntry::Failure(failure));
        self.outcome = Some(TurnOutcome::Failed(kind));

        Ok(&self.entries[self.entries.len() - 1])
    }

    fn push(&mut self, entry: LogEntry) -> Result<&LogEntry> {
        self.ensure_open()?;
        self.entries.push(entry);

        Ok(&self.entries[self.entries.len() - 1])
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_finished() {
            return Err(Error::TurnFinished);
        }

        Ok(())
    }
}
