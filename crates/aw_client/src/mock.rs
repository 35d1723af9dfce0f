//! Mock transport for testing turns without network calls.
//!
//! # Example
//!
//! ```ignore
//! use aw_client::mock::{MockChunk, MockResponse, MockTransport};
//!
//! let transport = MockTransport::new(vec![MockResponse::Stream(vec![
//!     MockChunk::data("<event>{\"data\":{\"type\":\"user_notification\"}}</eve"),
//!     MockChunk::data("nt>"),
//! ])]);
//! ```

use std::{collections::VecDeque, io, sync::Arc, time::Duration};

use async_stream::stream;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    Transport,
    error::{Error, Result},
    transport::ChunkStream,
    types::{RunRequest, UploadRequest, UploadResponse},
};

/// A single step of a scripted response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockChunk {
    /// Deliver bytes.
    Data(Bytes),

    /// Wait before continuing.
    Delay(Duration),

    /// Fail the stream with the given message.
    Error(String),

    /// Never deliver anything again, without ending the stream.
    Stall,
}

impl MockChunk {
    #[must_use]
    pub fn data(data: impl Into<Bytes>) -> Self {
        Self::Data(data.into())
    }
}

/// The scripted outcome of a single [`Transport::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// A successful response streaming the given chunks.
    Stream(Vec<MockChunk>),

    /// An error status, with the message extracted from the body.
    Status { status: u16, message: String },

    /// The connection could not be established.
    Unreachable,
}

impl MockResponse {
    /// A response delivering `body` split into chunks of `size` bytes.
    #[must_use]
    pub fn chunked(body: &str, size: usize) -> Self {
        Self::Stream(
            body.as_bytes()
                .chunks(size.max(1))
                .map(|chunk| MockChunk::Data(Bytes::copy_from_slice(chunk)))
                .collect(),
        )
    }
}

/// A transport replaying scripted responses, in order.
///
/// Every request is recorded and can be inspected afterwards. Clones share
/// the same script and recordings.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    upload_responses: Arc<Mutex<VecDeque<std::result::Result<UploadResponse, MockResponse>>>>,
    requests: Arc<Mutex<Vec<RunRequest>>>,
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
}

impl MockTransport {
    #[must_use]
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// Create a transport answering a single run with `body`, delivered in
    /// one chunk.
    #[must_use]
    pub fn with_body(body: &str) -> Self {
        Self::new(vec![MockResponse::Stream(vec![MockChunk::data(
            body.to_owned(),
        )])])
    }

    /// Queue another run response.
    pub fn push_response(&self, response: MockResponse) {
        self.responses.lock().push_back(response);
    }

    /// Queue a successful upload response.
    pub fn push_upload(&self, response: UploadResponse) {
        self.upload_responses.lock().push_back(Ok(response));
    }

    /// Queue a failed upload.
    pub fn push_upload_failure(&self, response: MockResponse) {
        self.upload_responses.lock().push_back(Err(response));
    }

    /// All run requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RunRequest> {
        self.requests.lock().clone()
    }

    /// All upload requests received so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn run(&self, request: &RunRequest) -> Result<ChunkStream> {
        self.requests.lock().push(request.clone());

        let response = self.responses.lock().pop_front().ok_or_else(|| Error::Api {
            status: 500,
            message: "No mock response left.".to_owned(),
        })?;

        let chunks = match response {
            MockResponse::Stream(chunks) => chunks,
            other => return Err(failure(other)),
        };

        Ok(Box::pin(stream! {
            for chunk in chunks {
                match chunk {
                    MockChunk::Data(data) => yield Ok(data),
                    MockChunk::Delay(duration) => tokio::time::sleep(duration).await,
                    MockChunk::Error(message) => {
                        yield Err(Error::Stream(message));
                        return;
                    }
                    MockChunk::Stall => futures::future::pending::<()>().await,
                }
            }
        }))
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
        self.uploads.lock().push(request);

        match self.upload_responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(response)) => Err(failure(response)),
            None => Err(Error::Api {
                status: 500,
                message: "No mock upload response left.".to_owned(),
            }),
        }
    }
}

fn failure(response: MockResponse) -> Error {
    match response {
        MockResponse::Status { status, message } => Error::Api { status, message },
        MockResponse::Unreachable => Error::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        )),
        MockResponse::Stream(_) => Error::Stream("unexpected stream response".to_owned()),
    }
}
