use std::ops::Range;

use crate::buffer::{TextBuffer, utf16_len};
use crate::ops::{EditRecord, Op, Transaction};

pub const DIVIDER_MARKER: &str = "───";
pub const BULLET: &str = "• ";
pub const RIGHT_ARROW: &str = "→ ";
pub const LEFT_ARROW: &str = "← ";
pub const UNCHECKED_BOX: &str = "☐ ";
pub const CHECKED_BOX: &str = "☑ ";

/// A replacement inside one line. `range` is in UTF-16 units relative to the
/// line start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRewrite {
    pub range: Range<usize>,
    pub replacement: String,
    pub cursor_to_end: bool,
}

impl LineRewrite {
    fn new(range: Range<usize>, replacement: &str) -> Self {
        Self {
            range,
            replacement: replacement.to_string(),
            cursor_to_end: false,
        }
    }

    /// Where a caret at `cursor` (line-relative) lands after the rewrite. A
    /// caret is never left inside the replaced span.
    pub fn map_cursor(&self, cursor: usize) -> usize {
        let replacement_len = utf16_len(&self.replacement);
        if self.cursor_to_end {
            return self.range.start + replacement_len;
        }
        if cursor <= self.range.start {
            cursor
        } else if cursor >= self.range.end {
            cursor - self.range.len() + replacement_len
        } else {
            self.range.start + replacement_len
        }
    }

    pub fn apply_to_line(&self, line: &str) -> String {
        let start = byte_index(line, self.range.start);
        let end = byte_index(line, self.range.end);
        let mut out = String::with_capacity(line.len() + self.replacement.len());
        out.push_str(&line[..start]);
        out.push_str(&self.replacement);
        out.push_str(&line[end..]);
        out
    }
}

fn byte_index(line: &str, utf16_offset: usize) -> usize {
    let mut units = 0usize;
    for (ix, ch) in line.char_indices() {
        if units >= utf16_offset {
            return ix;
        }
        units += ch.len_utf16();
    }
    line.len()
}

pub trait ShorthandRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn rewrite(&self, line: &str) -> Option<LineRewrite>;
}

struct DividerRule;

impl ShorthandRule for DividerRule {
    fn id(&self) -> &'static str {
        "shorthand.divider"
    }

    fn rewrite(&self, line: &str) -> Option<LineRewrite> {
        if line.trim() != "---" {
            return None;
        }
        let mut rewrite = LineRewrite::new(0..utf16_len(line), DIVIDER_MARKER);
        rewrite.cursor_to_end = true;
        Some(rewrite)
    }
}

struct BulletRule;

impl ShorthandRule for BulletRule {
    fn id(&self) -> &'static str {
        "shorthand.bullet"
    }

    fn rewrite(&self, line: &str) -> Option<LineRewrite> {
        if line.starts_with("**") {
            return None;
        }
        if line.starts_with("- ") || line.starts_with("* ") {
            return Some(LineRewrite::new(0..2, BULLET));
        }
        None
    }
}

struct InfixRule {
    id: &'static str,
    pattern: &'static str,
    replacement: &'static str,
}

impl ShorthandRule for InfixRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn rewrite(&self, line: &str) -> Option<LineRewrite> {
        let ix = line.find(self.pattern)?;
        let start = utf16_len(&line[..ix]);
        Some(LineRewrite::new(
            start..start + utf16_len(self.pattern),
            self.replacement,
        ))
    }
}

struct CheckboxRule;

impl ShorthandRule for CheckboxRule {
    fn id(&self) -> &'static str {
        "shorthand.checkbox"
    }

    fn rewrite(&self, line: &str) -> Option<LineRewrite> {
        ["[] ", "[ ] "]
            .into_iter()
            .find(|prefix| line.starts_with(prefix))
            .map(|prefix| LineRewrite::new(0..prefix.len(), UNCHECKED_BOX))
    }
}

struct CheckedBoxRule;

impl ShorthandRule for CheckedBoxRule {
    fn id(&self) -> &'static str {
        "shorthand.checked_box"
    }

    fn rewrite(&self, line: &str) -> Option<LineRewrite> {
        let prefix = line.get(..4)?;
        prefix
            .eq_ignore_ascii_case("[x] ")
            .then(|| LineRewrite::new(0..4, CHECKED_BOX))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRewrite {
    pub rule: &'static str,
    pub edits: Vec<EditRecord>,
}

/// Rewrites typed shorthand on the caret's line. At most one rule fires per
/// edit, in registration order.
pub struct LiveTransformer {
    rules: Vec<Box<dyn ShorthandRule>>,
}

impl Default for LiveTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTransformer {
    pub fn new() -> Self {
        Self::with_rules(vec![
            Box::new(DividerRule),
            Box::new(BulletRule),
            Box::new(InfixRule {
                id: "shorthand.right_arrow",
                pattern: "-> ",
                replacement: RIGHT_ARROW,
            }),
            Box::new(InfixRule {
                id: "shorthand.left_arrow",
                pattern: "<- ",
                replacement: LEFT_ARROW,
            }),
            Box::new(CheckboxRule),
            Box::new(CheckedBoxRule),
        ])
    }

    pub fn with_rules(rules: Vec<Box<dyn ShorthandRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Pure form of the rewrite: returns the new line, the new line-relative
    /// caret and the rule that fired.
    pub fn rewrite_line(&self, line: &str, cursor: usize) -> Option<(String, usize, &'static str)> {
        let (rule, rewrite) = self.first_match(line)?;
        Some((rewrite.apply_to_line(line), rewrite.map_cursor(cursor), rule))
    }

    pub fn apply(&self, buffer: &mut TextBuffer) -> Option<AppliedRewrite> {
        let cursor = buffer.cursor();
        let line_range = buffer.line_range(cursor);
        let line = buffer.line_text(line_range.clone());
        let (rule, rewrite) = self.first_match(&line)?;

        let start = line_range.start + rewrite.range.start;
        let end = line_range.start + rewrite.range.end;
        let cursor_after = line_range.start + rewrite.map_cursor(cursor - line_range.start);
        let attrs = buffer.explicit_attributes_at(start);

        let tx = Transaction::new(vec![
            Op::RemoveText { range: start..end },
            Op::InsertText {
                offset: start,
                text: rewrite.replacement.clone(),
                attrs: Some(attrs),
            },
        ])
        .cursor_after(cursor_after)
        .source(rule);

        match buffer.apply(&tx) {
            Ok(edits) => {
                tracing::debug!(rule, line = %line, cursor_after, "shorthand rewritten");
                Some(AppliedRewrite { rule, edits })
            }
            Err(err) => {
                tracing::warn!(rule, %err, "shorthand rewrite rejected");
                None
            }
        }
    }

    fn first_match(&self, line: &str) -> Option<(&'static str, LineRewrite)> {
        self.rules
            .iter()
            .find_map(|rule| rule.rewrite(line).map(|rw| (rule.id(), rw)))
    }
}
