use serde::{Deserialize, Serialize};

/// Agent API configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the agent service, without a trailing path.
    pub base_url: String,

    /// Path of the agent-run endpoint, relative to `base_url`.
    pub run_path: String,

    /// Path of the file-upload endpoint, relative to `base_url`.
    pub upload_path: String,

    /// Bearer token sent with every request, if set.
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            run_path: "/api/v1/agent/run".to_owned(),
            upload_path: "/api/v1/files/upload".to_owned(),
            token: None,
        }
    }
}
