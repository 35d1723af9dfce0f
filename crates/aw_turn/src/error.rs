pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("query must not be empty")]
    EmptyQuery,

    #[error("a turn is already in progress")]
    TurnInProgress,

    #[error("no turn is in progress")]
    NoActiveTurn,

    #[error("invalid frame markers: {0}")]
    Frame(#[from] aw_frame::Error),

    #[error(transparent)]
    Conversation(#[from] aw_conversation::Error),

    #[error(transparent)]
    Client(#[from] aw_client::Error),
}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        if std::mem::discriminant(self) != std::mem::discriminant(other) {
            return false;
        }

        // Good enough for testing purposes
        format!("{self:?}") == format!("{other:?}")
    }
}
