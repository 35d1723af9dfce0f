use serde::{Deserialize, Serialize};

/// Wire-format configuration of the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    pub start_marker: String,
    pub end_marker: String,

    /// Frames with a larger payload are dropped. Unlimited if unset or `0`.
    pub max_frame_bytes: Option<usize>,
}

impl StreamConfig {
    /// The effective frame size limit, if any.
    #[must_use]
    pub fn frame_limit(&self) -> Option<usize> {
        self.max_frame_bytes.filter(|&max| max > 0)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            start_marker: "<event>".to_owned(),
            end_marker: "</event>".to_owned(),
            max_frame_bytes: Some(4 * 1024 * 1024),
        }
    }
}
