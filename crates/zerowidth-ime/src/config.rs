//! Plugin configuration.

use serde::{Deserialize, Serialize};
use zerowidth_editor::CommandPriority;

/// Settings for one plugin registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroWidthImeConfig {
    /// Payload reported as the text content of every marker created.
    pub text_content: String,
    /// Repair markers that the host merged into the following text node
    /// instead of deleting the decorator they served.
    pub merge_artifact_workaround: bool,
    /// Priority of the caret command handlers.
    pub priority: CommandPriority,
}

impl Default for ZeroWidthImeConfig {
    fn default() -> Self {
        Self {
            text_content: String::new(),
            merge_artifact_workaround: true,
            priority: CommandPriority::Editor,
        }
    }
}

impl ZeroWidthImeConfig {
    pub fn with_text_content(mut self, text_content: impl Into<String>) -> Self {
        self.text_content = text_content.into();
        self
    }

    pub fn with_merge_artifact_workaround(mut self, enabled: bool) -> Self {
        self.merge_artifact_workaround = enabled;
        self
    }

    pub fn with_priority(mut self, priority: CommandPriority) -> Self {
        self.priority = priority;
        self
    }
}
