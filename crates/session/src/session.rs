use std::future::Future;
use std::sync::Arc;

use inkpad_core::{
    CommandError, DocumentSnapshot, EditRecord, Editor, EditorEvent, MentionCandidate, TextBuffer,
    TriggerEvent, TriggerKind,
};
use inkpad_diff::Review;
use tokio::sync::mpsc;

use crate::assistant::{AssistAction, Assistant, RewriteRequest, RewriteResult};
use crate::autosave::Autosaver;
use crate::config::SessionConfig;
use crate::error::{AssistError, LookupError, SessionError, StorageError};
use crate::mention::MentionSearch;
use crate::service::{CompletionService, DocumentId, DocumentStore, EntityLookup, StoredDocument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Editor(EditorEvent),
    Saved { id: DocumentId },
    SaveFailed { message: String },
    MentionCandidates {
        query: String,
        candidates: Vec<MentionCandidate>,
    },
}

pub struct Collaborators<C, L, S> {
    pub completion: Arc<C>,
    pub lookup: Arc<L>,
    pub store: Arc<S>,
}

/// One open document: the editor plus the services around it. Editor events
/// and save notifications arrive on the receiver returned by
/// [`EditingSession::open`].
pub struct EditingSession<C, L, S> {
    id: DocumentId,
    editor: Editor,
    assistant: Assistant<C>,
    mentions: MentionSearch<L>,
    autosaver: Autosaver,
    store: Arc<S>,
    events: mpsc::UnboundedSender<SessionEvent>,
    config: SessionConfig,
}

impl<C, L, S> EditingSession<C, L, S>
where
    C: CompletionService,
    L: EntityLookup,
    S: DocumentStore + 'static,
{
    pub async fn open(
        id: DocumentId,
        collaborators: Collaborators<C, L, S>,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>), SessionError> {
        let config = config.with_defaults();
        let Collaborators {
            completion,
            lookup,
            store,
        } = collaborators;

        let stored = store.load_document(&id).await?;
        let buffer = restore_buffer(&id, &stored);
        tracing::info!(%id, bytes = stored.text.len(), "document opened");

        let (events, receiver) = mpsc::unbounded_channel();
        let autosaver = Autosaver::spawn(
            Arc::clone(&store),
            id.clone(),
            config.autosave_delay(),
            events.clone(),
            Some((stored.text, stored.metadata)),
        );
        let session = Self {
            editor: Editor::from_buffer(buffer, config.editor.clone()),
            assistant: Assistant::new(completion, config.completion_timeout()),
            mentions: MentionSearch::new(lookup, config.mention_limit),
            id,
            autosaver,
            store,
            events,
            config,
        };
        Ok((session, receiver))
    }

    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs `f` against the editor, then forwards its events and schedules
    /// a save if the text or styling changed.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let revision = self.editor.buffer().revision();
        let output = f(&mut self.editor);
        self.after_edit(revision);
        output
    }

    fn after_edit(&mut self, revision: u64) {
        for event in self.editor.take_events() {
            if event == EditorEvent::Trigger(TriggerEvent::DismissMenu) {
                self.mentions.invalidate();
            }
            let _ = self.events.send(SessionEvent::Editor(event));
        }
        if self.editor.buffer().revision() != revision {
            self.schedule_save();
        }
    }

    fn schedule_save(&self) {
        let buffer = self.editor.buffer();
        let metadata = match serde_json::to_string(&DocumentSnapshot::from_buffer(buffer)) {
            Ok(json) => Some(json),
            Err(err) => {
                tracing::warn!(id = %self.id, %err, "could not serialize styling; saving text only");
                None
            }
        };
        self.autosaver.schedule(buffer.text(), metadata);
    }

    /// A handle for running lookups off the session, e.g. in a spawned task.
    pub fn mention_search(&self) -> MentionSearch<L> {
        self.mentions.clone()
    }

    /// Looks up candidates for the active mention query and reports them as
    /// a [`SessionEvent::MentionCandidates`]. Results that a newer query or
    /// a dismissal overtook are dropped.
    pub async fn search_mentions(&self) -> Result<Option<Vec<MentionCandidate>>, LookupError> {
        let state = self.editor.trigger_state();
        let Some(query) = state.query().filter(|_| state.kind() == Some(TriggerKind::Mention)) else {
            return Ok(None);
        };
        let query = query.to_string();
        let found = self.mentions.search(&query).await?;
        if let Some(candidates) = &found {
            let _ = self.events.send(SessionEvent::MentionCandidates {
                query,
                candidates: candidates.clone(),
            });
        }
        Ok(found)
    }

    pub fn insert_mention(&mut self, candidate: &MentionCandidate) -> Result<(), CommandError> {
        self.edit(|editor| editor.insert_mention(candidate).map(|_| ()))
    }

    pub fn assistant(&self) -> Assistant<C> {
        self.assistant.clone()
    }

    pub fn request_rewrite(&self, action: AssistAction) -> Result<RewriteRequest, AssistError> {
        RewriteRequest::capture(action, self.editor.buffer())
    }

    /// Captures a request from the current selection and runs it.
    pub async fn rewrite(
        &self,
        action: AssistAction,
        cancel: impl Future<Output = ()>,
    ) -> Result<RewriteResult, AssistError> {
        let request = self.request_rewrite(action)?;
        self.assistant.run(request, cancel).await
    }

    pub fn apply_rewrite(&mut self, result: &RewriteResult, choice: usize) -> Result<EditRecord, AssistError> {
        self.edit(|editor| Assistant::<C>::apply(editor, result, choice))
    }

    /// Applies the text a word review resolved to, keeping only the hunks
    /// the user accepted.
    pub fn apply_review(&mut self, result: &RewriteResult, review: &Review) -> Result<EditRecord, AssistError> {
        let text = review.resolved_text();
        self.edit(|editor| Assistant::<C>::apply_text(editor, result, &text))
    }

    pub async fn flush(&self) -> Result<(), StorageError> {
        self.autosaver.flush().await
    }

    /// Writes pending changes and stops autosaving.
    pub async fn close(self) -> Result<(), StorageError> {
        let result = self.autosaver.flush().await;
        self.autosaver.shutdown().await;
        tracing::info!(id = %self.id, "document closed");
        result
    }
}

fn restore_buffer(id: &DocumentId, stored: &StoredDocument) -> TextBuffer {
    let Some(metadata) = stored.metadata.as_deref() else {
        return TextBuffer::from_str(&stored.text);
    };
    let snapshot = match DocumentSnapshot::from_json_str(metadata) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(%id, %err, "ignoring unreadable styling");
            return TextBuffer::from_str(&stored.text);
        }
    };
    if !snapshot.matches_text(&stored.text) {
        tracing::warn!(%id, "styling was saved for different text; opening plain");
        return TextBuffer::from_str(&stored.text);
    }
    match snapshot.into_buffer() {
        Ok(mut buffer) => {
            buffer.set_cursor(buffer.len());
            buffer
        }
        Err(err) => {
            tracing::warn!(%id, %err, "ignoring unusable styling");
            TextBuffer::from_str(&stored.text)
        }
    }
}
