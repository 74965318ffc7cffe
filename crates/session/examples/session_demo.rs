//! Opens an in-memory document, types into it, asks a canned assistant to
//! condense the text and saves on close. Run with `RUST_LOG=debug` to see
//! the session's logging.

use std::collections::HashMap;
use std::future::{Future, pending};
use std::sync::{Arc, Mutex};

use inkpad_core::MentionCandidate;
use inkpad_session::{
    AssistAction, Collaborators, CompletionError, CompletionService, DocumentId, DocumentStore,
    EditingSession, EntityLookup, LookupError, SessionConfig, StorageError, StoredDocument,
};
use tracing_subscriber::EnvFilter;

struct CannedCompletion;

impl CompletionService for CannedCompletion {
    fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send {
        let first = user_prompt.split('.').next().unwrap_or_default().trim().to_string();
        async move { Ok(format!("{first}.")) }
    }
}

struct NoEntities;

impl EntityLookup for NoEntities {
    fn search(
        &self,
        _query: &str,
        _limit: usize,
    ) -> impl Future<Output = Result<Vec<MentionCandidate>, LookupError>> + Send {
        async { Ok(Vec::new()) }
    }
}

#[derive(Default)]
struct MemoryStore(Mutex<HashMap<DocumentId, StoredDocument>>);

impl DocumentStore for MemoryStore {
    fn load_document(&self, id: &DocumentId) -> impl Future<Output = Result<StoredDocument, StorageError>> + Send {
        let document = self
            .0
            .lock()
            .map(|docs| docs.get(id).cloned().unwrap_or_default())
            .map_err(|err| StorageError::Backend(err.to_string()));
        async move { document }
    }

    fn save_document(
        &self,
        id: &DocumentId,
        text: &str,
        metadata: Option<&str>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        let result = self
            .0
            .lock()
            .map(|mut docs| {
                docs.insert(
                    id.clone(),
                    StoredDocument {
                        text: text.to_string(),
                        metadata: metadata.map(str::to_string),
                    },
                );
            })
            .map_err(|err| StorageError::Backend(err.to_string()));
        async move { result }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let store = Arc::new(MemoryStore::default());
    let collaborators = Collaborators {
        completion: Arc::new(CannedCompletion),
        lookup: Arc::new(NoEntities),
        store: store.clone(),
    };
    let (mut session, mut events) =
        EditingSession::open(DocumentId::new("demo"), collaborators, SessionConfig::new()).await?;

    session.edit(|editor| {
        editor.insert_text("- Plans are **useful**. Nobody reads them twice.");
    });
    println!("typed:     {}", session.editor().buffer().text());

    let len = session.editor().buffer().len();
    session.edit(|editor| editor.set_selection(2..len));
    let result = session.rewrite(AssistAction::Condense, pending()).await?;
    for hunk in result.review(0)?.hunks() {
        println!("hunk {}: -{:?} +{:?}", hunk.index, hunk.removed, hunk.added);
    }
    session.apply_rewrite(&result, 0)?;
    println!("condensed: {}", session.editor().buffer().text());

    session.close().await?;
    while let Ok(event) = events.try_recv() {
        println!("event:     {event:?}");
    }
    Ok(())
}
