use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::{
    error::Result,
    types::{RunRequest, UploadRequest, UploadResponse},
};

/// The raw response body of an agent run, as it arrives.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Start an agent run.
    ///
    /// Resolves once the response headers are in. A non-success status is
    /// returned as [`Error::Api`](crate::Error::Api).
    async fn run(&self, request: &RunRequest) -> Result<ChunkStream>;

    /// Upload a file for use in a later query.
    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse>;
}
