//! The document text plus its attribute runs.
//!
//! Every offset and length exposed by this crate is measured in UTF-16 code
//! units, the unit host text systems and IME callbacks report in. Offsets that
//! would split a surrogate pair are rejected.

use std::ops::Range;

use ropey::{LineType, Rope};

use crate::attrs::{AttrPatch, Attributes};
use crate::ops::{EditRecord, Op, Transaction};
use crate::runs::{Run, RunList};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },
    #[error("range {start}..{end} is outside a buffer of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("offset {offset} splits a surrogate pair")]
    SplitsCharacter { offset: usize },
}

pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    runs: RunList,
    painted: RunList,
    cursor: usize,
    selection: Option<Range<usize>>,
    typing_attributes: Option<Attributes>,
    revision: u64,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::from_str("")
    }

    pub fn from_str(text: &str) -> Self {
        let text = normalize_newlines(text);
        let len = utf16_len(&text);
        Self {
            rope: Rope::from_str(&text),
            runs: RunList::new(len),
            painted: RunList::new(len),
            cursor: len,
            selection: None,
            typing_attributes: None,
            revision: 0,
        }
    }

    /// Restores a buffer from stored text and explicit runs.
    pub fn from_parts(text: &str, runs: &[Run]) -> Result<Self, EditError> {
        let mut buffer = Self::from_str(text);
        let len = buffer.len();
        for run in runs {
            buffer.check_range(&run.range)?;
        }
        buffer.runs = RunList::from_runs(len, runs);
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        self.rope.len_utf16()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len() == 0
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn slice(&self, range: Range<usize>) -> String {
        self.assert_valid(&range);
        let start = self.byte_of(range.start);
        let end = self.byte_of(range.end);
        self.rope.slice(start..end).to_string()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// The selection, or an empty range at the cursor.
    pub fn selected_range(&self) -> Range<usize> {
        self.selection
            .clone()
            .unwrap_or(self.cursor..self.cursor)
    }

    /// Moves the caret, clamped into the buffer. Moving drops the selection
    /// and any pending typing attributes.
    pub fn set_cursor(&mut self, offset: usize) {
        let offset = self.clip_offset(offset);
        if offset != self.cursor {
            self.typing_attributes = None;
        }
        self.cursor = offset;
        self.selection = None;
    }

    pub fn set_selection(&mut self, range: Range<usize>) {
        self.assert_valid(&range);
        if range.is_empty() {
            self.set_cursor(range.start);
            return;
        }
        self.typing_attributes = None;
        self.cursor = range.end;
        self.selection = Some(range);
    }

    pub fn typing_attributes(&self) -> Option<&Attributes> {
        self.typing_attributes.as_ref()
    }

    pub fn set_typing_attributes(&mut self, attrs: Option<Attributes>) {
        self.typing_attributes = attrs;
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len() || !self.is_boundary(offset) {
            return None;
        }
        self.rope.get_char(self.byte_of(offset)).ok()
    }

    /// The character ending at `offset` together with its start offset.
    pub fn char_before(&self, offset: usize) -> Option<(usize, char)> {
        if offset == 0 || offset > self.len() || !self.is_boundary(offset) {
            return None;
        }
        let byte = self.byte_of(offset);
        let start_byte = self.rope.floor_char_boundary(byte - 1);
        let ch = self.rope.get_char(start_byte).ok()?;
        Some((self.rope.byte_to_utf16_idx(start_byte), ch))
    }

    /// Effective attributes at `offset`: explicit styling layered over the
    /// painted markdown styling.
    pub fn attributes_at(&self, offset: usize) -> Attributes {
        self.runs
            .attrs_at(offset)
            .merged_over(&self.painted.attrs_at(offset))
    }

    pub fn explicit_attributes_at(&self, offset: usize) -> Attributes {
        self.runs.attrs_at(offset)
    }

    pub fn painted_attributes_at(&self, offset: usize) -> Attributes {
        self.painted.attrs_at(offset)
    }

    pub fn runs(&self) -> Vec<Run> {
        self.runs.runs()
    }

    pub fn painted_runs(&self) -> Vec<Run> {
        self.painted.runs()
    }

    /// Runs a renderer should draw: boundaries of both layers combined, each
    /// carrying the merged attributes.
    pub fn resolved_runs(&self) -> Vec<Run> {
        let len = self.len();
        let mut bounds: Vec<usize> = vec![0, len];
        for run in self.runs.runs().into_iter().chain(self.painted.runs()) {
            bounds.push(run.range.start);
            bounds.push(run.range.end);
        }
        bounds.sort_unstable();
        bounds.dedup();

        let mut out: Vec<Run> = Vec::new();
        for pair in bounds.windows(2) {
            let range = pair[0]..pair[1];
            if range.is_empty() {
                continue;
            }
            let attrs = self.attributes_at(range.start);
            if let Some(prev) = out.last_mut() {
                if prev.attrs == attrs && prev.range.end == range.start {
                    prev.range.end = range.end;
                    continue;
                }
            }
            out.push(Run { range, attrs });
        }
        out
    }

    pub fn line_range(&self, containing: usize) -> Range<usize> {
        let offset = self.clip_offset(containing);
        let byte = self.byte_of(offset);
        let line = self.rope.byte_to_line_idx(byte, LineType::LF);
        let start_byte = self.rope.line_to_byte_idx(line, LineType::LF);
        let end_byte = if line + 1 < self.rope.len_lines(LineType::LF) {
            self.rope.line_to_byte_idx(line + 1, LineType::LF) - 1
        } else {
            self.rope.len()
        };
        self.rope.byte_to_utf16_idx(start_byte)..self.rope.byte_to_utf16_idx(end_byte)
    }

    pub fn line_text(&self, range: Range<usize>) -> String {
        self.slice(range)
    }

    pub fn insert(&mut self, offset: usize, text: &str, attrs: Option<Attributes>) -> EditRecord {
        self.replace(offset..offset, text, attrs)
    }

    pub fn delete(&mut self, range: Range<usize>) -> EditRecord {
        self.replace(range, "", None)
    }

    /// Replaces `range` with `text`. Attributes default to the typing
    /// attributes when inserting at the caret, otherwise to a continuation of
    /// the preceding character.
    ///
    /// Panics if `range` is inverted, out of bounds or splits a character.
    pub fn replace(&mut self, range: Range<usize>, text: &str, attrs: Option<Attributes>) -> EditRecord {
        self.assert_valid(&range);
        self.replace_unchecked(range, text, attrs)
    }

    pub fn set_attributes(&mut self, range: Range<usize>, patch: &AttrPatch) {
        self.assert_valid(&range);
        if range.is_empty() || patch.is_empty() {
            return;
        }
        self.runs.update_range(range, |attrs| patch.apply_to(attrs));
        self.revision += 1;
    }

    /// Applies every op of `tx` or none of them.
    pub fn apply(&mut self, tx: &Transaction) -> Result<Vec<EditRecord>, EditError> {
        let mut scratch = self.clone();
        let mut edits = Vec::with_capacity(tx.ops.len());
        for op in &tx.ops {
            match op {
                Op::InsertText {
                    offset,
                    text,
                    attrs,
                } => {
                    scratch.check_range(&(*offset..*offset))?;
                    edits.push(scratch.replace_unchecked(*offset..*offset, text, attrs.clone()));
                }
                Op::RemoveText { range } => {
                    scratch.check_range(range)?;
                    edits.push(scratch.replace_unchecked(range.clone(), "", None));
                }
                Op::SetAttributes { range, patch } => {
                    scratch.check_range(range)?;
                    scratch.set_attributes(range.clone(), patch);
                }
            }
        }
        if let Some(cursor) = tx.cursor_after {
            scratch.check_range(&(cursor..cursor))?;
            scratch.cursor = cursor;
            scratch.selection = None;
        }
        *self = scratch;
        Ok(edits)
    }

    pub(crate) fn replace_painted_layer(&mut self, painted: RunList) -> bool {
        debug_assert_eq!(painted.total_len(), self.len());
        if painted == self.painted {
            return false;
        }
        self.painted = painted;
        true
    }

    pub fn check_range(&self, range: &Range<usize>) -> Result<(), EditError> {
        if range.start > range.end {
            return Err(EditError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        let len = self.len();
        if range.end > len {
            return Err(EditError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        for offset in [range.start, range.end] {
            if !self.is_boundary(offset) {
                return Err(EditError::SplitsCharacter { offset });
            }
        }
        Ok(())
    }

    fn replace_unchecked(&mut self, range: Range<usize>, text: &str, attrs: Option<Attributes>) -> EditRecord {
        let text = normalize_newlines(text);
        let inserted_len = utf16_len(&text);
        let attrs = attrs.unwrap_or_else(|| self.attributes_for_insert(range.start));

        let start_byte = self.byte_of(range.start);
        let end_byte = self.byte_of(range.end);
        if start_byte < end_byte {
            self.rope.remove(start_byte..end_byte);
        }
        if !text.is_empty() {
            self.rope.insert(start_byte, &text);
        }

        self.runs.delete_range(range.clone());
        self.runs.insert_range(range.start, inserted_len, attrs);
        self.painted.delete_range(range.clone());
        self.painted
            .insert_range(range.start, inserted_len, Attributes::default());

        let edit = EditRecord {
            range,
            inserted_len,
        };

        self.cursor = if edit.range.is_empty() && self.cursor == edit.range.start {
            self.cursor + inserted_len
        } else {
            edit.map_offset(self.cursor)
        };
        self.selection = self.selection.take().and_then(|sel| {
            let mapped = edit.map_offset(sel.start)..edit.map_offset(sel.end);
            (!mapped.is_empty()).then_some(mapped)
        });
        self.revision += 1;

        debug_assert_eq!(self.runs.total_len(), self.len());
        edit
    }

    fn attributes_for_insert(&self, offset: usize) -> Attributes {
        if offset == self.cursor {
            if let Some(typing) = &self.typing_attributes {
                return typing.clone();
            }
        }
        if offset == 0 {
            return Attributes::default();
        }
        self.runs.attrs_at(offset - 1).continuation()
    }

    fn assert_valid(&self, range: &Range<usize>) {
        if let Err(err) = self.check_range(range) {
            panic!("invalid buffer range: {err}");
        }
    }

    fn byte_of(&self, offset: usize) -> usize {
        self.rope.utf16_to_byte_idx(offset)
    }

    fn is_boundary(&self, offset: usize) -> bool {
        self.rope.byte_to_utf16_idx(self.byte_of(offset)) == offset
    }

    fn clip_offset(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        self.rope.byte_to_utf16_idx(self.byte_of(offset))
    }
}
