pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("conversation ID must not be empty")]
    EmptyId,

    #[error("turn already finished")]
    TurnFinished,

    #[error("previous turn is still in progress")]
    TurnInProgress,
}
