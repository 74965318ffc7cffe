use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attrs::{AttrPatch, Attributes};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Op {
    InsertText {
        offset: usize,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attrs: Option<Attributes>,
    },
    RemoveText {
        range: Range<usize>,
    },
    SetAttributes {
        range: Range<usize>,
        patch: AttrPatch,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A batch of buffer ops applied all-or-nothing. Offsets in each op refer to
/// the buffer as left by the previous op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub ops: Vec<Op>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_after: Option<usize>,
    #[serde(default)]
    pub meta: TransactionMeta,
}

impl Transaction {
    pub fn new(ops: Vec<Op>) -> Self {
        Self {
            ops,
            cursor_after: None,
            meta: TransactionMeta::default(),
        }
    }

    pub fn cursor_after(mut self, cursor_after: usize) -> Self {
        self.cursor_after = Some(cursor_after);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.meta.source = Some(source.into());
        self
    }

    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }
}

/// What a single text mutation did, in the coordinates of the buffer before
/// the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRecord {
    pub range: Range<usize>,
    pub inserted_len: usize,
}

impl EditRecord {
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.range.len() as isize
    }

    /// Maps an offset from before the edit to after it. Offsets inside the
    /// replaced range collapse to its start.
    pub fn map_offset(&self, offset: usize) -> usize {
        if offset <= self.range.start {
            offset
        } else if offset >= self.range.end {
            offset - self.range.len() + self.inserted_len
        } else {
            self.range.start
        }
    }
}
