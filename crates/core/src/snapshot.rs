use serde::{Deserialize, Serialize};

use crate::buffer::{EditError, TextBuffer};
use crate::runs::Run;

const DEFAULT_SCHEMA: &str = "inkpad";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid snapshot json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot {schema} v{version}")]
    Unsupported { schema: String, version: u32 },
    #[error("snapshot run does not fit its text: {0}")]
    Run(#[from] EditError),
}

/// Styling stored next to a document's plain text. Only runs that carry
/// attributes are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl DocumentSnapshot {
    pub fn from_buffer(buffer: &TextBuffer) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            text: buffer.text(),
            runs: buffer
                .runs()
                .into_iter()
                .filter(|run| !run.attrs.is_plain())
                .collect(),
        }
    }

    pub fn into_buffer(self) -> Result<TextBuffer, SnapshotError> {
        if self.schema != DEFAULT_SCHEMA || self.version > DEFAULT_VERSION {
            return Err(SnapshotError::Unsupported {
                schema: self.schema,
                version: self.version,
            });
        }
        Ok(TextBuffer::from_parts(&self.text, &self.runs)?)
    }

    /// Whether the stored styling was captured for `text`.
    pub fn matches_text(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
