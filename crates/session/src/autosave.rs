use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::StorageError;
use crate::service::{DocumentId, DocumentStore};
use crate::session::SessionEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Content {
    text: String,
    metadata: Option<String>,
}

enum Command {
    Edit(Content),
    Flush(oneshot::Sender<Result<(), StorageError>>),
}

/// Debounced background saving. Every scheduled edit restarts the delay;
/// the latest content is written once the document has been quiet for it.
pub struct Autosaver {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Autosaver {
    /// `saved` is the content already in the store, so rescheduling it
    /// unchanged does not write.
    pub fn spawn<S: DocumentStore + 'static>(
        store: Arc<S>,
        id: DocumentId,
        delay: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
        saved: Option<(String, Option<String>)>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            store,
            id,
            events,
            pending: None,
            saved: saved.map(|(text, metadata)| Content { text, metadata }),
        };
        let task = tokio::spawn(worker.run(rx, delay).instrument(tracing::Span::current()));
        Self { commands, task }
    }

    pub fn schedule(&self, text: String, metadata: Option<String>) {
        if self
            .commands
            .send(Command::Edit(Content { text, metadata }))
            .is_err()
        {
            tracing::warn!("autosave task is gone; edit not scheduled");
        }
    }

    /// Writes pending content now instead of waiting out the delay.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Flush(reply))
            .map_err(|_| StorageError::Closed)?;
        response.await.map_err(|_| StorageError::Closed)?
    }

    /// Stops the task after it writes whatever is still pending.
    pub async fn shutdown(self) {
        drop(self.commands);
        if let Err(err) = self.task.await {
            tracing::warn!(%err, "autosave task ended abnormally");
        }
    }
}

struct Worker<S> {
    store: Arc<S>,
    id: DocumentId,
    events: mpsc::UnboundedSender<SessionEvent>,
    pending: Option<Content>,
    saved: Option<Content>,
}

impl<S: DocumentStore> Worker<S> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>, delay: Duration) {
        let mut deadline: Option<Instant> = None;
        loop {
            let command = match deadline {
                Some(at) => tokio::select! {
                    command = rx.recv() => command,
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        let _ = self.save_pending().await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match command {
                Some(Command::Edit(content)) => {
                    self.pending = Some(content);
                    deadline = Some(Instant::now() + delay);
                }
                Some(Command::Flush(reply)) => {
                    deadline = None;
                    let _ = reply.send(self.save_pending().await);
                }
                None => {
                    let _ = self.save_pending().await;
                    break;
                }
            }
        }
        tracing::debug!(id = %self.id, "autosave stopped");
    }

    async fn save_pending(&mut self) -> Result<(), StorageError> {
        let Some(content) = self.pending.take() else {
            return Ok(());
        };
        if self.saved.as_ref() == Some(&content) {
            tracing::debug!(id = %self.id, "content unchanged since last save");
            return Ok(());
        }

        let result = self
            .store
            .save_document(&self.id, &content.text, content.metadata.as_deref())
            .await;
        match result {
            Ok(()) => {
                tracing::info!(id = %self.id, bytes = content.text.len(), "document saved");
                self.saved = Some(content);
                let _ = self.events.send(SessionEvent::Saved { id: self.id.clone() });
                Ok(())
            }
            Err(err) => {
                tracing::warn!(id = %self.id, %err, "document save failed");
                // Retried by the next flush unless newer content replaces it.
                self.pending = Some(content);
                let _ = self.events.send(SessionEvent::SaveFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
