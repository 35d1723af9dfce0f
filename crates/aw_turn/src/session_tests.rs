use std::sync::Arc;

use assert_matches::assert_matches;
use aw_client::{
    UploadRequest,
    mock::{MockChunk, MockResponse, MockTransport},
};
use aw_config::Config;
use aw_conversation::FailureKind;
use test_log::test;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use super::*;
use crate::{Notification, TurnPhase};

const EVENT: &str =
    r#"<event>{"data":{"type":"user_notification","payload":{"text":"hi"}}}</event>"#;

fn session(transport: &MockTransport) -> (Session, UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = TurnController::new(Arc::new(transport.clone()), &Config::default())
        .unwrap()
        .with_notifier(tx);

    (Session::new(controller), rx)
}

async fn wait_for_event(rx: &mut UnboundedReceiver<Notification>) {
    loop {
        match rx.recv().await {
            Some(Notification::Appended(_)) => return,
            Some(_) => {}
            None => panic!("session dropped"),
        }
    }
}

#[test(tokio::test)]
async fn test_single_active_stream() {
    let transport = MockTransport::new(vec![MockResponse::Stream(vec![
        MockChunk::data(EVENT),
        MockChunk::Stall,
    ])]);
    let (session, mut rx) = session(&transport);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("first").await }
    });

    wait_for_event(&mut rx).await;
    assert!(session.is_active());

    assert_matches!(session.submit("second").await, Err(Error::TurnInProgress));
    assert_matches!(session.new_conversation(), Err(Error::TurnInProgress));
    assert_matches!(
        session.upload(UploadRequest::new("data.csv", "a,b")).await,
        Err(Error::TurnInProgress)
    );

    assert!(session.cancel());
    assert_matches!(
        first.await.unwrap(),
        Ok(TurnOutcome::Failed(FailureKind::Cancelled))
    );

    assert!(!session.is_active());
    assert!(!session.cancel());
    assert_eq!(transport.requests().len(), 1);
    assert!(transport.uploads().is_empty());

    let turns = session.with_state(|state| state.turns().len()).await;
    assert_eq!(turns, 1);
}

#[test(tokio::test)]
async fn test_submit_after_cancel() {
    let transport = MockTransport::new(vec![MockResponse::Stream(vec![MockChunk::Stall])]);
    transport.push_response(MockResponse::Stream(vec![MockChunk::data(EVENT)]));
    let (session, mut rx) = session(&transport);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("first").await }
    });

    // Wait for the request to be in flight.
    loop {
        if let Some(Notification::Phase(TurnPhase::Sending)) = rx.recv().await {
            break;
        }
    }

    session.cancel();
    first.await.unwrap().unwrap();

    let outcome = session.submit("second").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);

    let events = session
        .with_state(|state| state.last_turn().map(|turn| turn.events().count()))
        .await;
    assert_eq!(events, Some(1));
}

#[test(tokio::test)]
async fn test_cancel_without_active_turn() {
    let (session, _rx) = session(&MockTransport::default());

    assert!(!session.is_active());
    assert!(!session.cancel());
    session.new_conversation().unwrap();
}

#[test(tokio::test)]
async fn test_dropped_submit_releases_session() {
    let transport = MockTransport::new(vec![MockResponse::Stream(vec![MockChunk::Stall])]);
    transport.push_response(MockResponse::Stream(vec![MockChunk::data(EVENT)]));
    let (session, mut rx) = session(&transport);

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.submit("first").await }
    });

    loop {
        if let Some(Notification::Phase(TurnPhase::Sending)) = rx.recv().await {
            break;
        }
    }

    first.abort();
    assert!(first.await.unwrap_err().is_cancelled());
    assert!(!session.is_active());

    // The abandoned turn is closed as cancelled before the next one starts.
    let outcome = session.submit("second").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);

    let outcomes = session
        .with_state(|state| {
            state
                .turns()
                .iter()
                .map(|turn| turn.outcome())
                .collect::<Vec<_>>()
        })
        .await;
    assert_eq!(outcomes, vec![
        Some(TurnOutcome::Failed(FailureKind::Cancelled)),
        Some(TurnOutcome::Completed),
    ]);
}
