pub mod conversation;
pub mod error;
pub mod file;
pub mod turn;

pub use conversation::{ConversationId, ConversationState, IdUpdate};
pub use error::Error;
pub use file::PendingFile;
pub use turn::{Failure, FailureKind, LogEntry, Turn, TurnOutcome};
