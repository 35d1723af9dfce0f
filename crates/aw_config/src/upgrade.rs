use serde::{Deserialize, Serialize};

/// Application errors that call for an upgrade prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeConfig {
    /// Error messages signalling insufficient credits or tokens.
    ///
    /// Matched exactly, ignoring surrounding whitespace.
    pub messages: Vec<String>,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            messages: vec![
                "Insufficient credits to process request".to_owned(),
                "Insufficient tokens to process request".to_owned(),
                "Insufficient credits".to_owned(),
            ],
        }
    }
}

impl UpgradeConfig {
    #[must_use]
    pub fn requires_upgrade(&self, message: &str) -> bool {
        let message = message.trim();
        self.messages.iter().any(|known| known.trim() == message)
    }
}
