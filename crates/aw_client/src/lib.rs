//! HTTP transport for the agent service.
//!
//! The [`Transport`] trait is the seam between the turn controller and the
//! network. [`Client`] implements it over HTTP, [`mock::MockTransport`]
//! replays scripted responses.

mod client;
mod error;
pub mod mock;
mod transport;
pub mod types;

pub use client::Client;
pub use error::{Error, Result};
pub use transport::{ChunkStream, Transport};
pub use types::{RunRequest, UploadRequest, UploadResponse};
