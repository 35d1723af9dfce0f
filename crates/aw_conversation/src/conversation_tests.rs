use assert_matches::assert_matches;
use aw_event::decode;
use pretty_assertions::assert_eq;
use test_log::test;

use super::*;
use crate::{Failure, FailureKind};

fn id(id: &str) -> ConversationId {
    ConversationId::new(id).unwrap()
}

fn file(name: &str) -> PendingFile {
    PendingFile {
        filename: format!("stored-{name}"),
        original_filename: name.to_owned(),
        size: 42,
        path: format!("/uploads/stored-{name}"),
    }
}

#[test]
fn test_conversation_id_rejects_empty() {
    assert_eq!(ConversationId::new(""), Err(Error::EmptyId));
    assert_eq!("".parse::<ConversationId>(), Err(Error::EmptyId));
    assert_eq!("abc".parse::<ConversationId>().unwrap().as_str(), "abc");
}

#[test]
fn test_conversation_id_serde() {
    let id: ConversationId = serde_json::from_str(r#""abc123""#).unwrap();
    assert_eq!(id, self::id("abc123"));
    assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc123""#);

    assert!(serde_json::from_str::<ConversationId>(r#""""#).is_err());
}

#[test]
fn test_set_id_is_idempotent() {
    let mut state = ConversationState::new();

    assert_eq!(state.set_id(id("abc")), IdUpdate::Established);
    assert_eq!(state.set_id(id("abc")), IdUpdate::Unchanged);
    assert_eq!(state.id(), Some(&id("abc")));

    assert_eq!(state.set_id(id("def")), IdUpdate::Replaced {
        previous: id("abc")
    });
    assert_eq!(state.id(), Some(&id("def")));
}

#[test]
fn test_compose_query_without_files() {
    let mut state = ConversationState::new();

    assert_eq!(state.compose_query("hello"), "hello");
}

#[test]
fn test_compose_query_consumes_pending_files() {
    let mut state = ConversationState::new();
    state.add_pending_file(file("a.csv"));
    state.add_pending_file(file("b.pdf"));

    assert_eq!(
        state.compose_query("summarize"),
        "summarize\n\n[file: a.csv](/uploads/stored-a.csv)\n[file: b.pdf](/uploads/stored-b.pdf)"
    );
    assert!(state.pending_files().is_empty());
    assert_eq!(state.compose_query("again"), "again");
}

#[test]
fn test_only_one_unfinished_turn() {
    let mut state = ConversationState::new();

    state.begin_turn("first").unwrap();
    assert_matches!(state.begin_turn("second"), Err(Error::TurnInProgress));

    state.current_turn_mut().unwrap().complete().unwrap();
    assert!(state.current_turn().is_none());
    assert_eq!(state.last_turn().unwrap().query(), "first");

    state.begin_turn("second").unwrap();
    assert_eq!(state.turns().len(), 2);
}

#[test]
fn test_log_spans_turns_in_order() {
    let mut state = ConversationState::new();
    let event = decode(r#"{"data":{"type":"user_notification","payload":{}}}"#).unwrap();

    let turn = state.begin_turn("first").unwrap();
    turn.push_event(event.clone()).unwrap();
    turn.complete().unwrap();

    let turn = state.begin_turn("second").unwrap();
    turn.push_event(event.clone()).unwrap();
    turn.fail(Failure::new(FailureKind::Transport, "connection reset"))
        .unwrap();

    let log = state.log().collect::<Vec<_>>();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0], &LogEntry::Event(event.clone()));
    assert_eq!(log[1], &LogEntry::Event(event));
    assert_matches!(log[2], LogEntry::Failure(Failure { kind: FailureKind::Transport, .. }));
}

#[test]
fn test_new_conversation_clears_everything() {
    let mut state = ConversationState::with_id(id("abc"));
    state.add_pending_file(file("a.csv"));
    state.begin_turn("first").unwrap();

    state.new_conversation();

    assert_eq!(state.id(), None);
    assert!(state.pending_files().is_empty());
    assert!(state.turns().is_empty());
    assert_eq!(state.log().count(), 0);
}
