use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attrs::Attributes;

/// A contiguous range of the buffer tagged with one attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub range: Range<usize>,
    pub attrs: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    len: usize,
    attrs: Attributes,
}

/// Attribute runs stored as lengths so that edits only touch the spans they
/// cross. Spans always cover exactly `[0, total_len)` and adjacent spans never
/// carry equal attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RunList {
    spans: Vec<Span>,
}

impl RunList {
    pub(crate) fn new(total_len: usize) -> Self {
        let spans = (total_len > 0)
            .then(|| Span {
                len: total_len,
                attrs: Attributes::default(),
            })
            .into_iter()
            .collect();
        Self { spans }
    }

    /// Rebuilds a run list from explicit runs. Gaps are filled with plain
    /// attributes; runs must be sorted, non-overlapping and inside `total_len`.
    pub(crate) fn from_runs(total_len: usize, runs: &[Run]) -> Self {
        let mut list = Self::new(total_len);
        for run in runs {
            assert!(
                run.range.start <= run.range.end && run.range.end <= total_len,
                "run {:?} outside buffer of length {total_len}",
                run.range
            );
            let attrs = run.attrs.clone();
            list.update_range(run.range.clone(), |a| *a = attrs.clone());
        }
        list
    }

    pub(crate) fn total_len(&self) -> usize {
        self.spans.iter().map(|s| s.len).sum()
    }

    /// Attributes of the character at `offset`; past the end, those of the
    /// last character.
    pub(crate) fn attrs_at(&self, offset: usize) -> Attributes {
        let total_len = self.total_len();
        if total_len == 0 {
            return Attributes::default();
        }
        let (ix, _) = self.locate(offset.min(total_len - 1));
        self.spans[ix].attrs.clone()
    }

    pub(crate) fn delete_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        let covered = self.isolate(range);
        self.spans.drain(covered);
        self.normalize();
    }

    pub(crate) fn insert_range(&mut self, offset: usize, len: usize, attrs: Attributes) {
        if len == 0 {
            return;
        }
        let ix = self.split_at(offset);
        self.spans.insert(ix, Span { len, attrs });
        self.normalize();
    }

    pub(crate) fn update_range(&mut self, range: Range<usize>, mut update: impl FnMut(&mut Attributes)) {
        if range.is_empty() {
            return;
        }
        let covered = self.isolate(range);
        self.spans[covered]
            .iter_mut()
            .for_each(|span| update(&mut span.attrs));
        self.normalize();
    }

    pub(crate) fn runs(&self) -> Vec<Run> {
        let mut start = 0usize;
        self.spans
            .iter()
            .map(|span| {
                let range = start..start + span.len;
                start = range.end;
                Run {
                    range,
                    attrs: span.attrs.clone(),
                }
            })
            .collect()
    }

    /// Span index holding `offset` and the offset's distance into it. Offsets
    /// at or past the end map to `(spans.len(), 0)`.
    fn locate(&self, offset: usize) -> (usize, usize) {
        let mut start = 0usize;
        for (ix, span) in self.spans.iter().enumerate() {
            if offset < start + span.len {
                return (ix, offset - start);
            }
            start += span.len;
        }
        (self.spans.len(), 0)
    }

    /// Makes `offset` a span boundary and returns the index of the span that
    /// now starts there.
    fn split_at(&mut self, offset: usize) -> usize {
        let (ix, within) = self.locate(offset);
        if within == 0 {
            return ix;
        }
        let head = &mut self.spans[ix];
        let tail = Span {
            len: head.len - within,
            attrs: head.attrs.clone(),
        };
        head.len = within;
        self.spans.insert(ix + 1, tail);
        ix + 1
    }

    /// Span indices exactly covering `range`.
    fn isolate(&mut self, range: Range<usize>) -> Range<usize> {
        let start = self.split_at(range.start);
        let end = self.split_at(range.end);
        start..end
    }

    fn normalize(&mut self) {
        self.spans.retain(|span| span.len > 0);
        self.spans.dedup_by(|next, prev| {
            let same = next.attrs == prev.attrs;
            if same {
                prev.len += next.len;
            }
            same
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> Attributes {
        Attributes {
            bold: true,
            ..Default::default()
        }
    }

    #[test]
    fn delete_truncates_straddling_runs() {
        let mut runs = RunList::new(10);
        runs.update_range(2..6, |a| a.bold = true);
        runs.delete_range(4..8);

        assert_eq!(runs.total_len(), 6);
        assert_eq!(
            runs.runs(),
            vec![
                Run {
                    range: 0..2,
                    attrs: Attributes::default()
                },
                Run {
                    range: 2..4,
                    attrs: bold()
                },
                Run {
                    range: 4..6,
                    attrs: Attributes::default()
                },
            ]
        );
    }

    #[test]
    fn insert_shifts_following_runs() {
        let mut runs = RunList::new(6);
        runs.update_range(3..6, |a| a.bold = true);
        runs.insert_range(1, 2, Attributes::default());

        assert_eq!(runs.total_len(), 8);
        assert!(!runs.attrs_at(4).bold);
        assert!(runs.attrs_at(5).bold);
    }

    #[test]
    fn adjacent_equal_runs_merge() {
        let mut runs = RunList::new(4);
        runs.update_range(0..2, |a| a.bold = true);
        runs.update_range(2..4, |a| a.bold = true);
        assert_eq!(runs.runs().len(), 1);
    }

    #[test]
    fn deleting_everything_leaves_an_empty_list() {
        let mut runs = RunList::new(3);
        runs.update_range(0..3, |a| a.bold = true);
        runs.delete_range(0..3);
        assert_eq!(runs.total_len(), 0);
        assert!(runs.runs().is_empty());
        assert_eq!(runs.attrs_at(0), Attributes::default());
    }

    #[test]
    fn updates_split_only_the_spans_they_cross() {
        let mut runs = RunList::new(9);
        runs.update_range(3..6, |a| a.bold = true);
        runs.update_range(3..9, |a| a.italic = true);

        let ranges: Vec<_> = runs.runs().into_iter().map(|run| run.range).collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9]);
        assert!(runs.attrs_at(4).bold && runs.attrs_at(4).italic);
        assert!(!runs.attrs_at(7).bold && runs.attrs_at(7).italic);
        assert_eq!(runs.attrs_at(40), runs.attrs_at(8));
    }
}
