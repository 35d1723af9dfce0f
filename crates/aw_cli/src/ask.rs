use std::{path::PathBuf, sync::Arc};

use aw_client::{Client, UploadRequest};
use aw_config::Config;
use aw_conversation::{ConversationId, TurnOutcome};
use aw_turn::{Session, TurnController};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    render,
};

#[derive(Debug, clap::Args)]
pub(crate) struct Ask {
    /// The query to send.
    pub query: String,

    /// Upload a file and reference it in the query.
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Continue an existing conversation.
    #[arg(long, value_name = "ID")]
    pub conversation: Option<String>,
}

impl Ask {
    pub(crate) async fn run(self, config: Config) -> Result<TurnOutcome> {
        let transport = Arc::new(Client::from_config(&config.api));
        let (tx, rx) = mpsc::unbounded_channel();

        let mut controller = TurnController::new(transport, &config)?.with_notifier(tx);
        if let Some(id) = self.conversation {
            controller = controller.with_conversation_id(ConversationId::new(id)?);
        }

        let session = Session::new(controller);
        let printer = tokio::spawn(render::print_notifications(rx));

        for path in &self.files {
            let request = UploadRequest::from_path(path)
                .await
                .map_err(|source| Error::File {
                    path: path.display().to_string(),
                    source,
                })?;

            session.upload(request).await?;
        }

        let interrupt = tokio::spawn({
            let session = session.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("Received interrupt.");
                    session.cancel();
                }
            }
        });

        let outcome = session.submit(&self.query).await;

        // Dropping every session handle closes the notification channel, which
        // ends the printer.
        interrupt.abort();
        interrupt.await.ok();
        drop(session);

        match printer.await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(%error, "Failed to print events."),
            Err(error) => warn!(%error, "Printer task failed."),
        }

        outcome.map_err(Into::into)
    }
}
