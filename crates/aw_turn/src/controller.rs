use std::{fmt, sync::Arc};

use aw_client::{RunRequest, Transport, UploadRequest};
use aw_config::Config;
use aw_conversation::{
    ConversationId, ConversationState, Failure, FailureKind, PendingFile, Turn, TurnOutcome,
};
use aw_event::{Event, EventDecoder};
use aw_frame::{FrameDemux, FrameMarkers};
use futures::StreamExt as _;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{
    Indicators, Notification,
    error::{Error, Result},
    phase::{Signal, TurnPhase},
    router::{Route, Router},
};

/// Drives turns of a single conversation, one at a time.
///
/// The controller owns the conversation state. Every change to it is
/// reported on the notification channel, if one is set, in the order the
/// events that caused it were received.
pub struct TurnController {
    transport: Arc<dyn Transport>,
    router: Router,
    markers: FrameMarkers,
    max_frame_len: Option<usize>,
    state: ConversationState,
    phase: TurnPhase,
    indicators: Indicators,
    notifier: Option<UnboundedSender<Notification>>,
}

impl fmt::Debug for TurnController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnController")
            .field("router", &self.router)
            .field("markers", &self.markers)
            .field("max_frame_len", &self.max_frame_len)
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("indicators", &self.indicators)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Result<Self> {
        let markers = FrameMarkers::new(&config.stream.start_marker, &config.stream.end_marker)?;

        Ok(Self {
            transport,
            router: Router::new(config.status.clone(), config.upgrade.clone()),
            markers,
            max_frame_len: config.stream.frame_limit(),
            state: ConversationState::new(),
            phase: TurnPhase::Idle,
            indicators: Indicators::default(),
            notifier: None,
        })
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: UnboundedSender<Notification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Continue an existing conversation.
    #[must_use]
    pub fn with_conversation_id(mut self, id: ConversationId) -> Self {
        self.state = ConversationState::with_id(id);
        self
    }

    #[must_use]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    /// Run one turn to its end.
    ///
    /// Pending files are attached to the query as reference tokens. The
    /// request carries the current conversation ID, if any.
    ///
    /// Transport failures and cancellation do not return an error: they end
    /// the turn as [`TurnOutcome::Failed`], with a single failure entry in the
    /// log. Cancelling `cancel` stops reading the response and discards any
    /// partially received frame.
    pub async fn submit(&mut self, query: &str, cancel: CancellationToken) -> Result<TurnOutcome> {
        if query.trim().is_empty() {
            return Err(Error::EmptyQuery);
        }

        // Only reachable if a previous `submit` future was dropped mid-turn.
        if self.phase.is_active() {
            warn!(phase = %self.phase, "Previous turn was abandoned. Cancelling it.");
            self.fail(Failure::cancelled())?;
        }

        if self.phase.is_terminal() {
            self.transition(Signal::Reset);
        }

        let query = self.state.compose_query(query);
        self.state.begin_turn(query.clone())?;
        self.transition(Signal::Submit);
        self.indicators = Indicators {
            loading: true,
            connected: false,
            status: Some(self.router.default_phrase().to_owned()),
            upgrade_required: false,
        };
        self.notify(Notification::Indicators(self.indicators.clone()));

        let request = RunRequest::new(query).with_conversation_id(self.state.id().cloned());
        debug!(conversation_id = ?request.conversation_id, "Submitting turn.");

        let transport = Arc::clone(&self.transport);
        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            response = transport.run(&request) => Some(response),
        };

        let mut chunks = match response {
            None => return self.cancelled(),
            Some(Ok(chunks)) => chunks,
            Some(Err(error)) => return self.failed(&error),
        };

        let mut decoder = EventDecoder::new(self.demux());
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                chunk = chunks.next() => Some(chunk),
            };

            let chunk = match next {
                None => {
                    decoder.reset();
                    return self.cancelled();
                }
                Some(None) => break,
                Some(Some(Err(error))) => {
                    decoder.reset();
                    return self.failed(&error);
                }
                Some(Some(Ok(chunk))) => chunk,
            };

            if self.phase == TurnPhase::Sending {
                self.transition(Signal::FirstChunk);
                self.indicators.connected = true;
                self.notify(Notification::Indicators(self.indicators.clone()));
            }

            trace!(len = chunk.len(), "Received chunk.");
            for result in decoder.push(chunk) {
                match result {
                    Ok(event) => self.dispatch(event)?,
                    Err(error) => self.turn()?.record_decode_error(error),
                }
            }
        }

        if let Some(error) = decoder.finish() {
            self.turn()?.record_decode_error(error);
        }

        self.turn()?.complete()?;
        self.transition(Signal::EndOfStream);
        self.clear_indicators();
        debug!("Turn completed.");

        Ok(TurnOutcome::Completed)
    }

    /// Upload a file to reference in the next turn.
    ///
    /// If the upload established a conversation, it is adopted.
    pub async fn upload(&mut self, request: UploadRequest) -> Result<PendingFile> {
        if self.phase.is_active() {
            return Err(Error::TurnInProgress);
        }

        let request = request.with_conversation_id(self.state.id().cloned());
        let response = self.transport.upload(request).await?;
        debug!(file = %response.file.original_filename, "File uploaded.");

        if let Some(id) = response.conversation_id {
            self.adopt_id(id);
        }

        self.state.add_pending_file(response.file.clone());
        Ok(response.file)
    }

    /// Forget the current conversation.
    pub fn new_conversation(&mut self) -> Result<()> {
        if self.phase.is_active() {
            return Err(Error::TurnInProgress);
        }

        if self.phase.is_terminal() {
            self.transition(Signal::Reset);
        }

        self.state.new_conversation();
        self.indicators = Indicators::default();
        self.notify(Notification::Indicators(self.indicators.clone()));

        Ok(())
    }

    fn demux(&self) -> FrameDemux {
        let demux = FrameDemux::new(self.markers.clone());
        match self.max_frame_len {
            Some(max) => demux.with_max_frame_len(max),
            None => demux,
        }
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        let route = self.router.classify(&event);
        trace!(?route, discriminant = ?event.discriminant, "Routing event.");

        match route {
            Route::Identity(id) => match ConversationId::new(id) {
                Ok(id) => self.adopt_id(id),
                Err(error) => warn!(%error, "Ignoring invalid conversation ID."),
            },
            Route::Status(phrase) | Route::StatusReset(phrase) => {
                self.indicators.status = Some(phrase.clone());
                self.notify(Notification::Status(phrase));
            }
            Route::AppError { upgrade_required } => {
                self.append(event)?;
                if upgrade_required {
                    self.require_upgrade();
                }

                self.indicators.loading = false;
                self.notify(Notification::Indicators(self.indicators.clone()));
            }
            Route::Append => self.append(event)?,
        }

        Ok(())
    }

    fn append(&mut self, event: Event) -> Result<()> {
        let entry = self.turn()?.push_event(event)?.clone();
        self.notify(Notification::Appended(entry));
        Ok(())
    }

    fn adopt_id(&mut self, id: ConversationId) {
        if self.state.set_id(id.clone()).is_changed() {
            self.notify(Notification::ConversationId(id));
        }
    }

    fn require_upgrade(&mut self) {
        self.indicators.upgrade_required = true;
        self.indicators.loading = false;
        self.indicators.connected = false;
        self.notify(Notification::UpgradeRequired);
    }

    fn cancelled(&mut self) -> Result<TurnOutcome> {
        debug!("Turn cancelled.");
        self.fail(Failure::cancelled())
    }

    fn failed(&mut self, error: &aw_client::Error) -> Result<TurnOutcome> {
        warn!(%error, "Turn failed.");

        let kind = error.status().map_or(FailureKind::Transport, FailureKind::Http);
        let message = error.user_message();
        if self.router.requires_upgrade(&message) {
            self.require_upgrade();
        }

        self.fail(Failure::new(kind, message))
    }

    fn fail(&mut self, failure: Failure) -> Result<TurnOutcome> {
        let kind = failure.kind;
        let entry = self.turn()?.fail(failure)?.clone();
        self.notify(Notification::Appended(entry));
        self.transition(Signal::Fail(kind));
        self.clear_indicators();

        Ok(TurnOutcome::Failed(kind))
    }

    fn clear_indicators(&mut self) {
        self.indicators.loading = false;
        self.indicators.connected = false;
        self.indicators.status = None;
        self.notify(Notification::Indicators(self.indicators.clone()));
    }

    fn turn(&mut self) -> Result<&mut Turn> {
        self.state.current_turn_mut().ok_or(Error::NoActiveTurn)
    }

    fn transition(&mut self, signal: Signal) {
        match self.phase.next(signal) {
            Some(next) => {
                debug!(from = %self.phase, to = %next, "Turn transition.");
                self.phase = next;
                self.notify(Notification::Phase(next));
            }
            None => warn!(phase = %self.phase, ?signal, "Ignoring invalid turn transition."),
        }
    }

    fn notify(&self, notification: Notification) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        if notifier.send(notification).is_err() {
            trace!("Notification receiver dropped.");
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
