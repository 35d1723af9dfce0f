use std::io;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// CLI Error types
#[derive(Debug, thiserror::Error)]
pub(crate) enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] aw_config::Error),

    #[error("CLI Config error: {0}")]
    CliConfig(String),

    #[error("Conversation error: {0}")]
    Conversation(#[from] aw_conversation::Error),

    #[error("Turn error: {0}")]
    Turn(#[from] aw_turn::Error),

    #[error("Unable to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },
}
