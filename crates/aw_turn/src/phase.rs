use std::fmt;

use aw_conversation::FailureKind;

/// The lifecycle of a turn.
///
/// ```text
/// Idle -> Sending -> Streaming -> Completed
///            \           \
///             `-----------`----> Failed
/// ```
///
/// Terminal phases go back to `Idle` before the next submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnPhase {
    #[default]
    Idle,

    /// The request is issued, no response body has arrived yet.
    Sending,

    /// The response body is being read.
    Streaming,

    Completed,
    Failed(FailureKind),
}

/// An input to the turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A non-empty query was submitted.
    Submit,

    /// The first chunk of the response body arrived.
    FirstChunk,

    /// The response body ended cleanly.
    EndOfStream,

    Fail(FailureKind),

    /// Return a finished turn to idle.
    Reset,
}

impl TurnPhase {
    /// The phase after `signal`, or `None` if the signal is not valid in this
    /// phase.
    #[must_use]
    pub fn next(self, signal: Signal) -> Option<Self> {
        let next = match (self, signal) {
            (Self::Idle, Signal::Submit) => Self::Sending,
            (Self::Sending, Signal::FirstChunk) => Self::Streaming,

            // An empty body is a completed turn without events.
            (Self::Sending | Self::Streaming, Signal::EndOfStream) => Self::Completed,
            (Self::Sending | Self::Streaming, Signal::Fail(kind)) => Self::Failed(kind),
            (Self::Completed | Self::Failed(_), Signal::Reset) => Self::Idle,
            _ => return None,
        };

        Some(next)
    }

    /// Whether a request is in flight.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Sending | Self::Streaming)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Sending => f.write_str("sending"),
            Self::Streaming => f.write_str("streaming"),
            Self::Completed => f.write_str("completed"),
            Self::Failed(FailureKind::Cancelled) => f.write_str("cancelled"),
            Self::Failed(_) => f.write_str("failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ALL_SIGNALS: [Signal; 5] = [
        Signal::Submit,
        Signal::FirstChunk,
        Signal::EndOfStream,
        Signal::Fail(FailureKind::Transport),
        Signal::Reset,
    ];

    #[test]
    fn test_happy_path() {
        let phase = TurnPhase::Idle;
        let phase = phase.next(Signal::Submit).unwrap();
        assert_eq!(phase, TurnPhase::Sending);
        assert!(phase.is_active());

        let phase = phase.next(Signal::FirstChunk).unwrap();
        assert_eq!(phase, TurnPhase::Streaming);

        let phase = phase.next(Signal::EndOfStream).unwrap();
        assert_eq!(phase, TurnPhase::Completed);
        assert!(phase.is_terminal());

        assert_eq!(phase.next(Signal::Reset), Some(TurnPhase::Idle));
    }

    #[test]
    fn test_failures() {
        for phase in [TurnPhase::Sending, TurnPhase::Streaming] {
            assert_eq!(
                phase.next(Signal::Fail(FailureKind::Http(500))),
                Some(TurnPhase::Failed(FailureKind::Http(500)))
            );
        }

        let failed = TurnPhase::Failed(FailureKind::Cancelled);
        assert_eq!(failed.to_string(), "cancelled");
        assert_eq!(failed.next(Signal::Reset), Some(TurnPhase::Idle));
    }

    #[test]
    fn test_empty_body_completes() {
        assert_eq!(
            TurnPhase::Sending.next(Signal::EndOfStream),
            Some(TurnPhase::Completed)
        );
    }

    #[test]
    fn test_invalid_transitions() {
        let valid = |phase: TurnPhase, signal: Signal| {
            matches!(
                (phase, signal),
                (TurnPhase::Idle, Signal::Submit)
                    | (TurnPhase::Sending, Signal::FirstChunk)
                    | (
                        TurnPhase::Sending | TurnPhase::Streaming,
                        Signal::EndOfStream | Signal::Fail(_)
                    )
                    | (TurnPhase::Completed | TurnPhase::Failed(_), Signal::Reset)
            )
        };

        for phase in [
            TurnPhase::Idle,
            TurnPhase::Sending,
            TurnPhase::Streaming,
            TurnPhase::Completed,
            TurnPhase::Failed(FailureKind::Transport),
        ] {
            for signal in ALL_SIGNALS {
                assert_eq!(
                    phase.next(signal).is_some(),
                    valid(phase, signal),
                    "{phase:?} + {signal:?}"
                );
            }
        }
    }
}
