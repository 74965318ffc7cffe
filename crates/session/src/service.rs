use std::fmt;
use std::future::Future;

use inkpad_core::MentionCandidate;
use serde::{Deserialize, Serialize};

use crate::error::{CompletionError, LookupError, StorageError};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredDocument {
    pub text: String,
    /// Serialized styling written by the previous save, if any.
    pub metadata: Option<String>,
}

pub trait CompletionService: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

pub trait EntityLookup: Send + Sync {
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<MentionCandidate>, LookupError>> + Send;
}

/// Saves must be idempotent: writing the same text twice is harmless.
pub trait DocumentStore: Send + Sync {
    fn load_document(&self, id: &DocumentId) -> impl Future<Output = Result<StoredDocument, StorageError>> + Send;

    fn save_document(
        &self,
        id: &DocumentId,
        text: &str,
        metadata: Option<&str>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}
