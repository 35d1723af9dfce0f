use serde::{Deserialize, Serialize};

/// A file uploaded ahead of the turn that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFile {
    /// The name the server stored the file under.
    pub filename: String,

    /// The name of the file as uploaded by the user.
    pub original_filename: String,

    /// Size in bytes.
    pub size: u64,

    /// Server-side location of the file.
    pub path: String,
}

impl PendingFile {
    /// The inline token referencing this file in a query.
    #[must_use]
    pub fn reference_token(&self) -> String {
        format!("[file: {}]({})", self.original_filename, self.path)
    }
}
