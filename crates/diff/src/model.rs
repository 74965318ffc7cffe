#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiffTokenKind {
    Unchanged,
    Added,
    Removed,
}

/// One word of a word-level diff. Unchanged and added words carry the
/// suggested text's casing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffToken {
    pub text: String,
    pub kind: DiffTokenKind,
}

impl DiffToken {
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: DiffTokenKind::Unchanged,
        }
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: DiffTokenKind::Added,
        }
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: DiffTokenKind::Removed,
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != DiffTokenKind::Unchanged
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HunkDecision {
    /// Undecided hunks resolve to the suggestion.
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// A run of consecutive changed words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewHunk {
    pub index: usize,
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub decision: HunkDecision,
    /// Character-level detail for single-word replacements.
    pub intraline: Option<Intraline>,
}

impl ReviewHunk {
    pub fn is_replacement(&self) -> bool {
        !self.removed.is_empty() && !self.added.is_empty()
    }

    pub fn keeps_suggestion(&self) -> bool {
        self.decision != HunkDecision::Rejected
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intraline {
    pub old_segments: Vec<DiffSegment>,
    pub new_segments: Vec<DiffSegment>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffSegment {
    pub kind: DiffSegmentKind,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffSegmentKind {
    Unchanged,
    Added,
    Removed,
}
