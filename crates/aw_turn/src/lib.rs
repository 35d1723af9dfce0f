//! Turns of a conversation with the agent.
//!
//! A [`TurnController`] issues the request, feeds the response body through
//! the frame demultiplexer and the event decoder, and applies every decoded
//! event through the [`Router`]. A [`Session`] wraps a controller so that it
//! can be shared, guaranteeing at most one active stream at a time.

mod controller;
mod error;
mod notification;
mod phase;
mod router;
mod session;

pub use controller::TurnController;
pub use error::{Error, Result};
pub use notification::{Indicators, Notification};
pub use phase::{Signal, TurnPhase};
pub use router::{Route, Router};
pub use session::Session;
