use similar::TextDiff;

use crate::model::{DiffSegment, DiffSegmentKind, DiffToken, Intraline};

/// Splits on runs of whitespace. Whitespace itself is never a token.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Word-level diff of `original` against `suggested`.
///
/// Words match case-insensitively through a longest-common-subsequence table.
/// The backtrack from the end prefers an added word whenever skipping the
/// suggested word keeps at least as long a subsequence as skipping the
/// original word, so insertions are shown before deletions on equal-cost
/// alignments.
pub fn diff_words(original: &str, suggested: &str) -> Vec<DiffToken> {
    let old = tokenize(original);
    let new = tokenize(suggested);
    let old_keys: Vec<String> = old.iter().map(|w| w.to_lowercase()).collect();
    let new_keys: Vec<String> = new.iter().map(|w| w.to_lowercase()).collect();
    let (m, n) = (old.len(), new.len());

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if old_keys[i - 1] == new_keys[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }

    let mut tokens = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_keys[i - 1] == new_keys[j - 1] {
            tokens.push(DiffToken::unchanged(new[j - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i][j - 1] >= dp[i - 1][j]) {
            tokens.push(DiffToken::added(new[j - 1]));
            j -= 1;
        } else {
            tokens.push(DiffToken::removed(old[i - 1]));
            i -= 1;
        }
    }
    tokens.reverse();
    tokens
}

/// Entry point for callers that hold the engine as a value.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordDiffEngine;

impl WordDiffEngine {
    pub fn diff(&self, original: &str, suggested: &str) -> Vec<DiffToken> {
        diff_words(original, suggested)
    }
}

pub(crate) fn intraline_segments(old_text: &str, new_text: &str) -> Intraline {
    let diff = TextDiff::from_chars(old_text, new_text);

    let mut old_segments = Vec::new();
    let mut new_segments = Vec::new();

    for change in diff.iter_all_changes() {
        let value = change.value().to_string();
        match change.tag() {
            similar::ChangeTag::Equal => {
                push_segment(&mut old_segments, DiffSegmentKind::Unchanged, value.clone());
                push_segment(&mut new_segments, DiffSegmentKind::Unchanged, value);
            }
            similar::ChangeTag::Delete => {
                push_segment(&mut old_segments, DiffSegmentKind::Removed, value);
            }
            similar::ChangeTag::Insert => {
                push_segment(&mut new_segments, DiffSegmentKind::Added, value);
            }
        }
    }

    Intraline {
        old_segments,
        new_segments,
    }
}

fn push_segment(segments: &mut Vec<DiffSegment>, kind: DiffSegmentKind, text: String) {
    if text.is_empty() {
        return;
    }

    if let Some(last) = segments.last_mut() {
        if last.kind == kind {
            last.text.push_str(&text);
            return;
        }
    }

    segments.push(DiffSegment { kind, text });
}
