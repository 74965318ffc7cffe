use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use inkpad_core::{MentionCandidate, TriggerEvent};

use crate::error::LookupError;
use crate::service::EntityLookup;

/// Mention lookups keyed by a generation counter. Any newer query, or a
/// dismissed menu, makes the results of older lookups worthless.
pub struct MentionSearch<L> {
    lookup: Arc<L>,
    limit: usize,
    generation: Arc<AtomicU64>,
}

impl<L> Clone for MentionSearch<L> {
    fn clone(&self) -> Self {
        Self {
            lookup: Arc::clone(&self.lookup),
            limit: self.limit,
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<L: EntityLookup> MentionSearch<L> {
    pub fn new(lookup: Arc<L>, limit: usize) -> Self {
        Self {
            lookup,
            limit,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The query a trigger event asks to search for, if any.
    pub fn query_for(event: &TriggerEvent) -> Option<&str> {
        match event {
            TriggerEvent::ShowMentionMenu { query, .. } | TriggerEvent::UpdateMentionQuery { query } => {
                Some(query.as_str())
            }
            _ => None,
        }
    }

    /// Marks every lookup in flight as outdated.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Looks up candidates for `query`. `Ok(None)` means a newer query or a
    /// dismissal arrived while this one was running.
    pub async fn search(&self, query: &str) -> Result<Option<Vec<MentionCandidate>>, LookupError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let found = self.lookup.search(query, self.limit).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(query, "dropping outdated mention results");
            return Ok(None);
        }
        let mut candidates = found?;
        candidates.truncate(self.limit);
        Ok(Some(candidates))
    }
}
