use crate::diff::{diff_words, intraline_segments};
use crate::model::{DiffToken, DiffTokenKind, HunkDecision, ReviewHunk};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Item {
    Word(String),
    Hunk(usize),
}

/// A suggested rewrite broken into hunks the user accepts or rejects one by
/// one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Review {
    original: String,
    suggested: String,
    tokens: Vec<DiffToken>,
    items: Vec<Item>,
    hunks: Vec<ReviewHunk>,
}

impl Review {
    pub fn new(original: &str, suggested: &str) -> Self {
        let tokens = diff_words(original, suggested);
        let mut items = Vec::new();
        let mut hunks: Vec<ReviewHunk> = Vec::new();
        let mut open = false;

        for token in &tokens {
            if token.kind == DiffTokenKind::Unchanged {
                items.push(Item::Word(token.text.clone()));
                open = false;
                continue;
            }
            if !open {
                items.push(Item::Hunk(hunks.len()));
                hunks.push(ReviewHunk {
                    index: hunks.len(),
                    removed: Vec::new(),
                    added: Vec::new(),
                    decision: HunkDecision::Pending,
                    intraline: None,
                });
                open = true;
            }
            if let Some(hunk) = hunks.last_mut() {
                match token.kind {
                    DiffTokenKind::Removed => hunk.removed.push(token.text.clone()),
                    DiffTokenKind::Added => hunk.added.push(token.text.clone()),
                    DiffTokenKind::Unchanged => {}
                }
            }
        }

        for hunk in &mut hunks {
            if let ([old], [new]) = (hunk.removed.as_slice(), hunk.added.as_slice()) {
                hunk.intraline = Some(intraline_segments(old, new));
            }
        }

        Self {
            original: original.to_string(),
            suggested: suggested.to_string(),
            tokens,
            items,
            hunks,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn suggested(&self) -> &str {
        &self.suggested
    }

    pub fn tokens(&self) -> &[DiffToken] {
        &self.tokens
    }

    pub fn hunks(&self) -> &[ReviewHunk] {
        &self.hunks
    }

    pub fn has_changes(&self) -> bool {
        !self.hunks.is_empty()
    }

    /// Returns false for an unknown hunk index.
    pub fn accept(&mut self, index: usize) -> bool {
        self.decide(index, HunkDecision::Accepted)
    }

    pub fn reject(&mut self, index: usize) -> bool {
        self.decide(index, HunkDecision::Rejected)
    }

    pub fn accept_all(&mut self) {
        for hunk in &mut self.hunks {
            hunk.decision = HunkDecision::Accepted;
        }
    }

    pub fn reject_all(&mut self) {
        for hunk in &mut self.hunks {
            hunk.decision = HunkDecision::Rejected;
        }
    }

    pub fn is_fully_decided(&self) -> bool {
        self.hunks
            .iter()
            .all(|hunk| hunk.decision != HunkDecision::Pending)
    }

    /// The text after applying every decision. Keeping every hunk yields the
    /// suggestion verbatim and rejecting every hunk yields the original;
    /// mixed decisions join the kept words with single spaces.
    pub fn resolved_text(&self) -> String {
        if self.hunks.iter().all(ReviewHunk::keeps_suggestion) {
            return self.suggested.clone();
        }
        if self.hunks.iter().all(|hunk| !hunk.keeps_suggestion()) {
            return self.original.clone();
        }

        let mut words: Vec<&str> = Vec::new();
        for item in &self.items {
            match item {
                Item::Word(word) => words.push(word),
                Item::Hunk(index) => {
                    let hunk = &self.hunks[*index];
                    let kept = if hunk.keeps_suggestion() {
                        &hunk.added
                    } else {
                        &hunk.removed
                    };
                    words.extend(kept.iter().map(String::as_str));
                }
            }
        }
        words.join(" ")
    }

    fn decide(&mut self, index: usize, decision: HunkDecision) -> bool {
        match self.hunks.get_mut(index) {
            Some(hunk) => {
                hunk.decision = decision;
                true
            }
            None => false,
        }
    }
}
