use inkpad_core::EditError;

use crate::service::DocumentId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("no credential is configured for the assistant")]
    NoCredential,
    #[error("could not reach the assistant: {0}")]
    Transport(String),
    #[error("assistant server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("the assistant returned no usable text")]
    MalformedResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssistError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("the text changed while the assistant was working")]
    Stale,
    #[error("the request was cancelled")]
    Cancelled,
    #[error("the assistant did not answer in time")]
    TimedOut,
    #[error("select some text first")]
    EmptySelection,
    #[error("no suggestion at index {0}")]
    NoSuchSuggestion(usize),
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl AssistError {
    /// Whether retrying the same request can succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AssistError::Completion(CompletionError::NoCredential) => false,
            AssistError::Completion(_)
            | AssistError::Stale
            | AssistError::Cancelled
            | AssistError::TimedOut => true,
            AssistError::EmptySelection | AssistError::NoSuchSuggestion(_) | AssistError::Edit(_) => {
                false
            }
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AssistError::Completion(CompletionError::Server { status, .. }) => {
                format!("The assistant is unavailable right now (error {status}). Try again.")
            }
            AssistError::Completion(CompletionError::MalformedResponse) => {
                "The assistant didn't suggest anything useful. Try again.".to_string()
            }
            AssistError::Completion(CompletionError::Transport(_)) => {
                "Couldn't reach the assistant. Check your connection and try again.".to_string()
            }
            AssistError::Stale => "The text changed before the suggestion arrived.".to_string(),
            other => {
                let mut message = other.to_string();
                if let Some(first) = message.get(..1) {
                    let upper = first.to_uppercase();
                    message.replace_range(..1, &upper);
                }
                message.push('.');
                message
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("entity lookup failed: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("document {0} does not exist")]
    NotFound(DocumentId),
    #[error("storage backend failed: {0}")]
    Backend(String),
    #[error("autosave has stopped")]
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}
