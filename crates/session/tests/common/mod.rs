#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use inkpad_core::MentionCandidate;
use inkpad_session::{
    Collaborators, CompletionError, CompletionService, DocumentId, DocumentStore, EditingSession,
    EntityLookup, LookupError, SessionConfig, SessionEvent, StorageError, StoredDocument,
};
use tokio::sync::mpsc;

pub struct FakeCompletion {
    response: Mutex<Result<String, CompletionError>>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeCompletion {
    pub fn answering(text: &str) -> Self {
        Self::with_result(Ok(text.to_string()))
    }

    pub fn with_result(result: Result<String, CompletionError>) -> Self {
        Self {
            response: Mutex::new(result),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CompletionService for FakeCompletion {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        let response = self.response.lock().unwrap().clone();
        let delay = *self.delay.lock().unwrap();
        async move {
            tokio::time::sleep(delay).await;
            response
        }
    }
}

/// Returns every entity whose title contains the query, ignoring the limit.
pub struct FakeLookup {
    entities: Vec<MentionCandidate>,
    delays: HashMap<String, Duration>,
}

impl FakeLookup {
    pub fn new(entities: Vec<MentionCandidate>) -> Self {
        Self {
            entities,
            delays: HashMap::new(),
        }
    }

    pub fn delay_query(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }
}

impl EntityLookup for FakeLookup {
    fn search(
        &self,
        query: &str,
        _limit: usize,
    ) -> impl Future<Output = Result<Vec<MentionCandidate>, LookupError>> + Send {
        let needle = query.to_lowercase();
        let found: Vec<MentionCandidate> = self
            .entities
            .iter()
            .filter(|entity| entity.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        let delay = self.delays.get(query).copied().unwrap_or_default();
        async move {
            tokio::time::sleep(delay).await;
            Ok(found)
        }
    }
}

pub fn people() -> Vec<MentionCandidate> {
    vec![
        MentionCandidate::new("p1", "person", "Ada Lovelace"),
        MentionCandidate::new("p2", "person", "Adam Smith"),
        MentionCandidate::new("p3", "person", "Grace Hopper"),
        MentionCandidate::new("p4", "person", "Alan Turing"),
    ]
}

#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<DocumentId, StoredDocument>>,
    saves: Mutex<Vec<StoredDocument>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn with_document(id: &str, text: &str, metadata: Option<String>) -> Self {
        let store = Self::default();
        store.documents.lock().unwrap().insert(
            DocumentId::new(id),
            StoredDocument {
                text: text.to_string(),
                metadata,
            },
        );
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn saves(&self) -> Vec<StoredDocument> {
        self.saves.lock().unwrap().clone()
    }

    pub fn saved_texts(&self) -> Vec<String> {
        self.saves().into_iter().map(|doc| doc.text).collect()
    }
}

impl DocumentStore for MemoryStore {
    fn load_document(&self, id: &DocumentId) -> impl Future<Output = Result<StoredDocument, StorageError>> + Send {
        let found = self
            .documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.clone()));
        async move { found }
    }

    fn save_document(
        &self,
        id: &DocumentId,
        text: &str,
        metadata: Option<&str>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Backend("disk full".to_string()))
        } else {
            let document = StoredDocument {
                text: text.to_string(),
                metadata: metadata.map(str::to_string),
            };
            self.documents
                .lock()
                .unwrap()
                .insert(id.clone(), document.clone());
            self.saves.lock().unwrap().push(document);
            Ok(())
        };
        async move { result }
    }
}

pub type TestSession = EditingSession<FakeCompletion, FakeLookup, MemoryStore>;

pub async fn open_session(
    completion: FakeCompletion,
    store: Arc<MemoryStore>,
    config: SessionConfig,
) -> (TestSession, mpsc::UnboundedReceiver<SessionEvent>) {
    open_with_lookup(completion, FakeLookup::new(people()), store, config).await
}

pub async fn open_with_lookup(
    completion: FakeCompletion,
    lookup: FakeLookup,
    store: Arc<MemoryStore>,
    config: SessionConfig,
) -> (TestSession, mpsc::UnboundedReceiver<SessionEvent>) {
    let collaborators = Collaborators {
        completion: Arc::new(completion),
        lookup: Arc::new(lookup),
        store,
    };
    EditingSession::open(DocumentId::new("doc"), collaborators, config)
        .await
        .expect("document opens")
}

pub fn drain(events: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}
