use std::future::Future;
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use inkpad_core::{Editor, EditRecord, TextBuffer};
use inkpad_diff::Review;
use serde::{Deserialize, Serialize};

use crate::error::{AssistError, CompletionError};
use crate::service::CompletionService;

pub const VARIANT_MARKER: &str = "---VARIANT---";
pub const REPHRASE_VARIANTS: usize = 3;

const EXPAND_PROMPT: &str = "You expand text. Rewrite the user's text with more detail and \
    supporting points while keeping its meaning, tone and language. Reply with the rewritten \
    text only.";
const CONDENSE_PROMPT: &str = "You condense text. Rewrite the user's text to its essentials \
    while keeping its meaning, tone and language. Reply with the rewritten text only.";
const REPHRASE_PROMPT: &str = "You rephrase text. Write three alternative phrasings of the \
    user's text that keep its meaning and language. Put a line containing only ---VARIANT--- \
    between the phrasings. Reply with the phrasings only.";
const CONTINUE_PROMPT: &str = "You continue text. Write the next few sentences that follow \
    the user's text, matching its tone and language. Reply with the new sentences only.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistAction {
    Expand,
    Condense,
    Rephrase,
    Continue,
}

impl AssistAction {
    pub fn system_prompt(self) -> &'static str {
        match self {
            AssistAction::Expand => EXPAND_PROMPT,
            AssistAction::Condense => CONDENSE_PROMPT,
            AssistAction::Rephrase => REPHRASE_PROMPT,
            AssistAction::Continue => CONTINUE_PROMPT,
        }
    }

    /// Whether the action rewrites a selection rather than writing at the
    /// caret.
    pub fn needs_selection(self) -> bool {
        self != AssistAction::Continue
    }
}

/// Identifies the buffer state a request was made against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionToken {
    pub revision: u64,
    pub selection: Range<usize>,
}

impl RevisionToken {
    pub fn capture(buffer: &TextBuffer) -> Self {
        Self {
            revision: buffer.revision(),
            selection: buffer.selected_range(),
        }
    }

    pub fn is_current(&self, buffer: &TextBuffer) -> bool {
        self.revision == buffer.revision() && self.selection == buffer.selected_range()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub action: AssistAction,
    pub token: RevisionToken,
    /// Where accepted text goes: the selection, or the caret for `Continue`.
    pub target: Range<usize>,
    pub source_text: String,
}

impl RewriteRequest {
    pub fn capture(action: AssistAction, buffer: &TextBuffer) -> Result<Self, AssistError> {
        let token = RevisionToken::capture(buffer);
        let (target, source_text) = if action.needs_selection() {
            let selection = buffer.selected_range();
            let text = buffer.slice(selection.clone());
            if text.trim().is_empty() {
                return Err(AssistError::EmptySelection);
            }
            (selection, text)
        } else {
            let cursor = buffer.cursor();
            let text = buffer.slice(0..cursor);
            if text.trim().is_empty() {
                return Err(AssistError::EmptySelection);
            }
            (cursor..cursor, text)
        };
        Ok(Self {
            action,
            token,
            target,
            source_text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteResult {
    pub request: RewriteRequest,
    pub suggestions: Vec<String>,
}

impl RewriteResult {
    /// The text to put at the request target for suggestion `index`.
    pub fn replacement(&self, index: usize) -> Result<String, AssistError> {
        let suggestion = self
            .suggestions
            .get(index)
            .ok_or(AssistError::NoSuchSuggestion(index))?;
        if self.request.action != AssistAction::Continue {
            return Ok(suggestion.clone());
        }
        let needs_space = self
            .request
            .source_text
            .chars()
            .next_back()
            .is_some_and(|ch| !ch.is_whitespace());
        Ok(if needs_space {
            format!(" {suggestion}")
        } else {
            suggestion.clone()
        })
    }

    /// Word-level review of suggestion `index` against the selected text.
    pub fn review(&self, index: usize) -> Result<Review, AssistError> {
        let suggestion = self
            .suggestions
            .get(index)
            .ok_or(AssistError::NoSuchSuggestion(index))?;
        Ok(Review::new(&self.request.source_text, suggestion))
    }
}

/// Splits a raw completion into suggestions. Rephrasings are separated by
/// [`VARIANT_MARKER`]; every suggestion is trimmed and empty ones dropped.
pub fn parse_suggestions(action: AssistAction, raw: &str) -> Result<Vec<String>, CompletionError> {
    let suggestions: Vec<String> = match action {
        AssistAction::Rephrase => raw
            .split(VARIANT_MARKER)
            .map(str::trim)
            .filter(|variant| !variant.is_empty())
            .take(REPHRASE_VARIANTS)
            .map(str::to_string)
            .collect(),
        _ => {
            let text = raw.trim();
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text.to_string()]
            }
        }
    };
    if suggestions.is_empty() {
        return Err(CompletionError::MalformedResponse);
    }
    if action == AssistAction::Rephrase && suggestions.len() < REPHRASE_VARIANTS {
        tracing::debug!(count = suggestions.len(), "fewer rephrasings than requested");
    }
    Ok(suggestions)
}

/// Runs rewrite requests against the completion service. Cheap to clone, so
/// a host can move it into a spawned task while the editor stays put.
pub struct Assistant<C> {
    service: Arc<C>,
    timeout: Duration,
}

impl<C> Clone for Assistant<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            timeout: self.timeout,
        }
    }
}

impl<C: CompletionService> Assistant<C> {
    pub fn new(service: Arc<C>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sends `request` and waits for the answer, the timeout, or `cancel`,
    /// whichever comes first.
    pub async fn run(
        &self,
        request: RewriteRequest,
        cancel: impl Future<Output = ()>,
    ) -> Result<RewriteResult, AssistError> {
        let action = request.action;
        tracing::debug!(?action, chars = request.source_text.len(), "assistant request started");
        let call = self
            .service
            .complete(action.system_prompt(), &request.source_text);

        let outcome = tokio::select! {
            biased;
            _ = cancel => Err(AssistError::Cancelled),
            response = tokio::time::timeout(self.timeout, call) => match response {
                Err(_) => Err(AssistError::TimedOut),
                Ok(Err(err)) => Err(AssistError::Completion(err)),
                Ok(Ok(raw)) => parse_suggestions(action, &raw)
                    .map_err(AssistError::Completion),
            },
        };

        match outcome {
            Ok(suggestions) => {
                tracing::debug!(?action, suggestions = suggestions.len(), "assistant request finished");
                Ok(RewriteResult {
                    request,
                    suggestions,
                })
            }
            Err(err) => {
                tracing::warn!(?action, %err, "assistant request failed");
                Err(err)
            }
        }
    }

    /// Puts suggestion `index` into the editor, unless the buffer moved on
    /// since the request was made.
    pub fn apply(editor: &mut Editor, result: &RewriteResult, index: usize) -> Result<EditRecord, AssistError> {
        let text = result.replacement(index)?;
        Self::apply_text(editor, result, &text)
    }

    /// Like [`Assistant::apply`] with text resolved by the caller, e.g. from
    /// a partially accepted review.
    pub fn apply_text(editor: &mut Editor, result: &RewriteResult, text: &str) -> Result<EditRecord, AssistError> {
        if !result.request.token.is_current(editor.buffer()) {
            tracing::debug!(
                requested = result.request.token.revision,
                current = editor.buffer().revision(),
                "discarding stale assistant result"
            );
            return Err(AssistError::Stale);
        }
        Ok(editor.replace_range(result.request.target.clone(), text, None)?)
    }
}
