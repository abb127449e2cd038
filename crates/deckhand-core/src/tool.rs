//! Managed CLI tool identifiers

use serde::{Deserialize, Serialize};

/// One of the CLI tools whose profiles and proxy this crate coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    /// Claude Code
    ClaudeCode,
    /// OpenAI Codex CLI
    Codex,
    /// Gemini CLI
    Gemini,
}

impl Tool {
    /// All managed tools, in display order
    pub const ALL: [Tool; 3] = [Tool::ClaudeCode, Tool::Codex, Tool::Gemini];

    /// Stable identifier used by the store, the proxy and the frontend
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tool::ClaudeCode => "claude-code",
            Tool::Codex => "codex",
            Tool::Gemini => "gemini",
        }
    }

    /// Parse a tool identifier as received from the frontend
    #[must_use]
    pub fn from_id(id: &str) -> Option<Tool> {
        match id {
            "claude-code" => Some(Tool::ClaudeCode),
            "codex" => Some(Tool::Codex),
            "gemini" => Some(Tool::Gemini),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
