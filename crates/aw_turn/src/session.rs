use std::sync::Arc;

use aw_client::UploadRequest;
use aw_conversation::{ConversationState, PendingFile, TurnOutcome};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    TurnController,
    error::{Error, Result},
};

/// A shareable handle to a [`TurnController`].
///
/// Clones refer to the same conversation. While a turn is streaming, other
/// operations that would touch the conversation are rejected with
/// [`Error::TurnInProgress`] instead of waiting for it to finish.
#[derive(Debug, Clone)]
pub struct Session {
    controller: Arc<tokio::sync::Mutex<TurnController>>,
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl Session {
    #[must_use]
    pub fn new(controller: TurnController) -> Self {
        Self {
            controller: Arc::new(tokio::sync::Mutex::new(controller)),
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Run a turn. See [`TurnController::submit`].
    pub async fn submit(&self, query: &str) -> Result<TurnOutcome> {
        let mut controller = self
            .controller
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?;

        let token = CancellationToken::new();
        let _active = ActiveTurn::start(&self.active, token.clone());

        controller.submit(query, token).await
    }

    /// Cancel the active turn.
    ///
    /// Returns `false` if no turn was active.
    pub fn cancel(&self) -> bool {
        let Some(token) = self.active.lock().clone() else {
            return false;
        };

        debug!("Cancelling active turn.");
        token.cancel();
        true
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Upload a file to reference in the next turn.
    pub async fn upload(&self, request: UploadRequest) -> Result<PendingFile> {
        let mut controller = self
            .controller
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?;

        controller.upload(request).await
    }

    /// Forget the current conversation, starting afresh.
    pub fn new_conversation(&self) -> Result<()> {
        self.controller
            .try_lock()
            .map_err(|_| Error::TurnInProgress)?
            .new_conversation()
    }

    /// Inspect the conversation, waiting for the active turn to end.
    pub async fn with_state<R>(&self, f: impl FnOnce(&ConversationState) -> R) -> R {
        f(self.controller.lock().await.state())
    }
}

/// Marks a turn as active for as long as it lives.
struct ActiveTurn<'a>(&'a Mutex<Option<CancellationToken>>);

impl<'a> ActiveTurn<'a> {
    fn start(slot: &'a Mutex<Option<CancellationToken>>, token: CancellationToken) -> Self {
        *slot.lock() = Some(token);
        Self(slot)
    }
}

impl Drop for ActiveTurn<'_> {
    fn drop(&mut self) {
        self.0.lock().take();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
