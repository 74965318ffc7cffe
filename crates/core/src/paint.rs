use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::attrs::{Attributes, HeadingLevel};
use crate::buffer::TextBuffer;
use crate::runs::RunList;

static BOLD_STAR: LazyLock<Regex> = LazyLock::new(|| compile(r"\*\*[^*\n]+\*\*"));
static BOLD_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| compile(r"__[^_\n]+__"));
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| compile(r"\*[^*\n]+\*"));
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| compile(r"_[^_\n]+_"));
static STRIKE: LazyLock<Regex> = LazyLock::new(|| compile(r"~~[^~\n]+~~"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| compile(r"`[^`\n]+`"));
static HEADING: LazyLock<Regex> = LazyLock::new(|| compile(r"(?m)^(#{1,3}) [^\n]*"));

fn compile(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(re) => re,
        Err(err) => panic!("invalid built-in pattern {pattern:?}: {err}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Paint {
    Bold,
    Italic,
    Strike,
    Code,
    Heading(HeadingLevel),
}

impl Paint {
    fn apply(self, attrs: &mut Attributes) {
        match self {
            Paint::Bold => attrs.bold = true,
            Paint::Italic => attrs.italic = true,
            Paint::Strike => attrs.strikethrough = true,
            Paint::Code => attrs.code = true,
            Paint::Heading(level) => attrs.heading = Some(level),
        }
    }
}

/// Paints inline markdown (`**bold**`, `*italic*`, `~~strike~~`, `` `code` ``,
/// `#` headings)
/// into the buffer's derived attribute layer. Delimiters stay in the text.
/// The layer is rebuilt from the text on every pass, so repainting unchanged
/// text leaves it untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct StylePainter;

impl StylePainter {
    pub fn new() -> Self {
        Self
    }

    /// Returns whether the painted layer changed.
    pub fn paint(&self, buffer: &mut TextBuffer) -> bool {
        let text = buffer.text();
        let layer = self.layer_for(&text, buffer.len());
        let changed = buffer.replace_painted_layer(layer);
        if changed {
            tracing::trace!(revision = buffer.revision(), "markdown styling repainted");
        }
        changed
    }

    fn layer_for(&self, text: &str, len: usize) -> RunList {
        let units = utf16_offsets(text);
        let mut layer = RunList::new(len);
        let mut paint = |range: Range<usize>, kind: Paint| {
            layer.update_range(units[range.start]..units[range.end], |attrs| kind.apply(attrs));
        };

        for caps in HEADING.captures_iter(text) {
            let (Some(line), Some(hashes)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            paint(line.range(), Paint::Heading(hashes.len() as HeadingLevel));
        }
        for range in delimited(text, &BOLD_STAR, None) {
            paint(range, Paint::Bold);
        }
        for range in delimited(text, &BOLD_UNDERSCORE, None) {
            paint(range, Paint::Bold);
        }
        for range in delimited(text, &ITALIC_STAR, Some('*')) {
            paint(range, Paint::Italic);
        }
        for range in delimited(text, &ITALIC_UNDERSCORE, Some('_')) {
            paint(range, Paint::Italic);
        }
        for range in delimited(text, &STRIKE, None) {
            paint(range, Paint::Strike);
        }
        for range in delimited(text, &INLINE_CODE, None) {
            paint(range, Paint::Code);
        }
        layer
    }
}

/// Byte ranges of `re` matches. With `single`, a match touching another copy
/// of the delimiter is part of a doubled delimiter and is skipped; underscores
/// additionally must not sit inside a word.
fn delimited(text: &str, re: &Regex, single: Option<char>) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut at = 0usize;
    while at <= text.len() {
        let Some(m) = re.find_at(text, at) else {
            break;
        };
        let accepted = match single {
            None => true,
            Some(delim) => {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                let touches = |ch: Option<char>| ch == Some(delim);
                let wordy = |ch: Option<char>| delim == '_' && ch.is_some_and(char::is_alphanumeric);
                !touches(before) && !touches(after) && !wordy(before) && !wordy(after)
            }
        };
        if accepted {
            out.push(m.range());
            at = m.end();
        } else {
            at = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
    }
    out
}

/// UTF-16 offset for every byte offset that starts a character, plus the end.
fn utf16_offsets(text: &str) -> Vec<usize> {
    let mut units = vec![0usize; text.len() + 1];
    let mut unit = 0usize;
    for (ix, ch) in text.char_indices() {
        units[ix] = unit;
        unit += ch.len_utf16();
    }
    units[text.len()] = unit;
    units
}
