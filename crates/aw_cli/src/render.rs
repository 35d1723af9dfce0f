use std::io::{self, Write};

use aw_conversation::LogEntry;
use aw_event::{Event, EventKind};
use aw_turn::Notification;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

pub(crate) async fn print_notifications(
    mut rx: UnboundedReceiver<Notification>,
) -> io::Result<()> {
    while let Some(notification) = rx.recv().await {
        let mut stdout = io::stdout().lock();
        print(&mut stdout, &notification)?;
        stdout.flush()?;
    }

    Ok(())
}

fn print(out: &mut impl Write, notification: &Notification) -> io::Result<()> {
    match notification {
        Notification::Appended(LogEntry::Event(event)) => writeln!(out, "{}", describe(event)),
        Notification::Appended(LogEntry::Failure(failure)) => writeln!(out, "error: {failure}"),
        Notification::Status(status) => writeln!(out, "[{status}]"),
        Notification::ConversationId(id) => writeln!(out, "conversation: {id}"),
        Notification::UpgradeRequired => writeln!(
            out,
            "Your plan has run out of credits. Upgrade to continue."
        ),
        Notification::Phase(_) | Notification::Indicators(_) => Ok(()),
    }
}

fn describe(event: &Event) -> String {
    match &event.kind {
        EventKind::Error { message } => format!("error: {message}"),
        EventKind::Notification { payload } => ["text", "message", "error"]
            .into_iter()
            .find_map(|key| payload.get(key).and_then(Value::as_str))
            .map_or_else(|| payload.to_string(), str::to_owned),
        _ => Value::Object(event.raw.clone()).to_string(),
    }
}
