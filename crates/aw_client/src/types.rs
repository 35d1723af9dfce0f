use std::{io, path::Path};

use aw_conversation::{ConversationId, PendingFile};
use serde::{Deserialize, Deserializer, Serialize};

/// Body of the agent-run request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRequest {
    pub query: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
}

impl RunRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            conversation_id: None,
        }
    }

    #[must_use]
    pub fn with_conversation_id(mut self, id: Option<ConversationId>) -> Self {
        self.conversation_id = id;
        self
    }
}

/// A file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_name: String,
    pub content: Vec<u8>,
    pub conversation_id: Option<ConversationId>,
}

impl UploadRequest {
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            conversation_id: None,
        }
    }

    /// Read the file at `path` into an upload request.
    pub async fn from_path(path: &Path) -> io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;

        Ok(Self::new(file_name, content))
    }

    #[must_use]
    pub fn with_conversation_id(mut self, id: Option<ConversationId>) -> Self {
        self.conversation_id = id;
        self
    }
}

/// Response of the file-upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: PendingFile,

    /// Set when the upload started a new conversation.
    #[serde(default, deserialize_with = "non_empty_id")]
    pub conversation_id: Option<ConversationId>,
}

/// An empty ID is treated as no ID, rather than failing the whole upload.
fn non_empty_id<'de, D>(deserializer: D) -> Result<Option<ConversationId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<String>::deserialize(deserializer)?;
    Ok(id.and_then(|id| ConversationId::new(id).ok()))
}
