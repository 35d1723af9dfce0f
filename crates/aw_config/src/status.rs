use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Human-readable status phrases shown while a tool is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Shown when no tool is running, or the tool is not listed in `tools`.
    #[serde(rename = "default")]
    pub default_phrase: String,

    /// Phrase per tool name.
    pub tools: IndexMap<String, String>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        let tools = [
            ("web_search", "searching the web"),
            ("browser", "browsing the web"),
            ("python", "running code"),
            ("code_interpreter", "running code"),
            ("file_reader", "reading files"),
            ("image_generation", "generating an image"),
        ];

        Self {
            default_phrase: "agent is thinking".to_owned(),
            tools: tools
                .into_iter()
                .map(|(tool, phrase)| (tool.to_owned(), phrase.to_owned()))
                .collect(),
        }
    }
}

impl StatusConfig {
    /// The phrase for the given tool, falling back to the default phrase.
    #[must_use]
    pub fn phrase_for(&self, tool: Option<&str>) -> &str {
        tool.and_then(|tool| self.tools.get(tool))
            .unwrap_or(&self.default_phrase)
    }
}
