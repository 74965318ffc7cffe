use serde::{Deserialize, Serialize};

use crate::attrs::{AttrPatch, Attributes, HeadingLevel, MAX_HEADING_LEVEL};
use crate::buffer::{EditError, TextBuffer, utf16_len};
use crate::ops::{EditRecord, Op, Transaction};
use crate::transform::BULLET;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trait", content = "level", rename_all = "snake_case")]
pub enum FormatTrait {
    Bold,
    Italic,
    Strikethrough,
    Heading(HeadingLevel),
    BulletList,
    NumberedList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Bullet,
    Numbered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveTraits {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub heading: Option<HeadingLevel>,
    pub list: Option<ListKind>,
}

pub(crate) fn heading_marker(level: HeadingLevel) -> String {
    format!("{} ", "#".repeat(level as usize))
}

/// Level and marker length of a `#`, `##` or `###` prefix.
pub(crate) fn parse_heading_marker(line: &str) -> Option<(HeadingLevel, usize)> {
    let hashes = line.chars().take_while(|ch| *ch == '#').count();
    if hashes == 0 || hashes > MAX_HEADING_LEVEL as usize {
        return None;
    }
    line[hashes..]
        .starts_with(' ')
        .then_some((hashes as HeadingLevel, hashes + 1))
}

/// List kind, item number and prefix length of a `• ` or `N. ` prefix.
pub(crate) fn parse_list_prefix(line: &str) -> Option<(ListKind, usize, usize)> {
    if line.starts_with(BULLET) {
        return Some((ListKind::Bullet, 0, utf16_len(BULLET)));
    }
    let digits = line.chars().take_while(|ch| ch.is_ascii_digit()).count();
    if digits == 0 || !line[digits..].starts_with(". ") {
        return None;
    }
    let number = line[..digits].parse().ok()?;
    Some((ListKind::Numbered, number, digits + 2))
}

/// Number the item starting at `line_start` gets when it continues the list
/// on the previous line.
pub(crate) fn next_list_number(buffer: &TextBuffer, line_start: usize) -> usize {
    if line_start == 0 {
        return 1;
    }
    let previous = buffer.line_range(line_start - 1);
    match parse_list_prefix(&buffer.line_text(previous)) {
        Some((ListKind::Numbered, number, _)) => number.saturating_add(1),
        _ => 1,
    }
}

fn line_starts(buffer: &TextBuffer, from: usize, to: usize) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut offset = from;
    loop {
        let line = buffer.line_range(offset);
        starts.push(line.start);
        if line.end + 1 >= to || line.end >= buffer.len() {
            break;
        }
        offset = line.end + 1;
    }
    starts
}

/// Applies character and paragraph styling either to the selection or to the
/// typing attributes at the caret.
#[derive(Debug, Default)]
pub struct FormattingController {
    heading_mode: bool,
}

impl FormattingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading_mode(&self) -> bool {
        self.heading_mode
    }

    /// Heading typing carries on until the next line break.
    pub fn arm_heading_mode(&mut self, buffer: &mut TextBuffer, level: HeadingLevel) {
        let mut typing = self.caret_attributes(buffer);
        typing.heading = Some(level);
        buffer.set_typing_attributes(Some(typing));
        self.heading_mode = true;
    }

    pub fn on_line_break(&mut self, buffer: &mut TextBuffer) {
        if !self.heading_mode {
            return;
        }
        tracing::trace!("line break ends heading mode");
        self.heading_mode = false;
        buffer.set_typing_attributes(Some(Attributes::plain()));
    }

    pub fn toggle(&mut self, buffer: &mut TextBuffer, format: FormatTrait) -> Result<Vec<EditRecord>, EditError> {
        let selection = buffer.selection();
        match (format, selection) {
            (FormatTrait::Heading(level), selection) => {
                let level = level.clamp(1, MAX_HEADING_LEVEL);
                let range = selection.unwrap_or(buffer.cursor()..buffer.cursor());
                let first_line = buffer.line_range(range.start);
                let current = parse_heading_marker(&buffer.line_text(first_line.clone()));
                let target = match current {
                    Some((current, _)) if current == level => None,
                    _ => Some(level),
                };

                let mut edits = Vec::new();
                for line_start in line_starts(buffer, range.start, range.end).into_iter().rev() {
                    edits.extend(set_line_heading(buffer, line_start, target)?);
                }

                if buffer.selection().is_none() {
                    match target {
                        Some(level) => self.arm_heading_mode(buffer, level),
                        None => {
                            self.heading_mode = false;
                            buffer.set_typing_attributes(Some(Attributes::plain()));
                        }
                    }
                }
                tracing::debug!(?target, lines = edits.len(), "heading toggled");
                Ok(edits)
            }
            (FormatTrait::BulletList | FormatTrait::NumberedList, selection) => {
                let kind = if format == FormatTrait::BulletList {
                    ListKind::Bullet
                } else {
                    ListKind::Numbered
                };
                let range = selection.unwrap_or(buffer.cursor()..buffer.cursor());
                let first_line = buffer.line_range(range.start);
                let target = match parse_list_prefix(&buffer.line_text(first_line)) {
                    Some((current, _, _)) if current == kind => None,
                    _ => Some(kind),
                };

                let mut edits = Vec::new();
                for line_start in line_starts(buffer, range.start, range.end) {
                    let line_start = edits
                        .iter()
                        .fold(line_start, |offset, edit: &EditRecord| edit.map_offset(offset));
                    edits.extend(set_line_list(buffer, line_start, target)?);
                }
                Ok(edits)
            }
            (format, Some(range)) => {
                let first = buffer.explicit_attributes_at(range.start);
                let on = !has_trait(&first, format);
                buffer.set_attributes(range, &patch_for(format, on));
                Ok(Vec::new())
            }
            (format, None) => {
                let mut typing = self.caret_attributes(buffer);
                let on = !has_trait(&typing, format);
                patch_for(format, on).apply_to(&mut typing);
                buffer.set_typing_attributes(Some(typing));
                Ok(Vec::new())
            }
        }
    }

    pub fn active_traits(&self, buffer: &TextBuffer) -> ActiveTraits {
        let attrs = match buffer.selection() {
            Some(range) => buffer.explicit_attributes_at(range.start),
            None => self.caret_attributes(buffer),
        };
        let line = buffer.line_text(buffer.line_range(buffer.selected_range().start));
        ActiveTraits {
            bold: attrs.bold,
            italic: attrs.italic,
            strikethrough: attrs.strikethrough,
            heading: parse_heading_marker(&line)
                .map(|(level, _)| level)
                .or(attrs.heading),
            list: parse_list_prefix(&line).map(|(kind, _, _)| kind),
        }
    }

    fn caret_attributes(&self, buffer: &TextBuffer) -> Attributes {
        if let Some(typing) = buffer.typing_attributes() {
            return typing.clone();
        }
        match buffer.cursor() {
            0 => Attributes::plain(),
            cursor => buffer.explicit_attributes_at(cursor - 1).continuation(),
        }
    }
}

fn has_trait(attrs: &Attributes, format: FormatTrait) -> bool {
    match format {
        FormatTrait::Bold => attrs.bold,
        FormatTrait::Italic => attrs.italic,
        FormatTrait::Strikethrough => attrs.strikethrough,
        FormatTrait::Heading(level) => attrs.heading == Some(level),
        FormatTrait::BulletList | FormatTrait::NumberedList => false,
    }
}

fn patch_for(format: FormatTrait, on: bool) -> AttrPatch {
    match format {
        FormatTrait::Bold => AttrPatch::bold(on),
        FormatTrait::Italic => AttrPatch::italic(on),
        FormatTrait::Strikethrough => AttrPatch::strikethrough(on),
        FormatTrait::Heading(level) => AttrPatch::heading(on.then_some(level)),
        FormatTrait::BulletList | FormatTrait::NumberedList => AttrPatch::default(),
    }
}

/// Puts the line starting at `line_start` at heading `target` (or back to a
/// normal paragraph), replacing any existing marker.
pub(crate) fn set_line_heading(
    buffer: &mut TextBuffer,
    line_start: usize,
    target: Option<HeadingLevel>,
) -> Result<Vec<EditRecord>, EditError> {
    let line = buffer.line_range(line_start);
    let text = buffer.line_text(line.clone());
    let existing = parse_heading_marker(&text);

    let mut tx = Transaction::new(Vec::new()).source("format:heading");
    let mut line_len = line.len();
    if let Some((_, marker_len)) = existing {
        tx.push(Op::RemoveText {
            range: line.start..line.start + marker_len,
        });
        line_len -= marker_len;
    }
    if let Some(level) = target {
        let marker = heading_marker(level);
        line_len += utf16_len(&marker);
        let attrs = buffer.explicit_attributes_at(line.start);
        tx.push(Op::InsertText {
            offset: line.start,
            text: marker,
            attrs: Some(Attributes {
                link: None,
                ..attrs
            }),
        });
    }
    tx.push(Op::SetAttributes {
        range: line.start..line.start + line_len,
        patch: AttrPatch::heading(target),
    });
    buffer.apply(&tx)
}

/// Puts the line starting at `line_start` into list `target`, or removes its
/// list prefix.
pub(crate) fn set_line_list(
    buffer: &mut TextBuffer,
    line_start: usize,
    target: Option<ListKind>,
) -> Result<Vec<EditRecord>, EditError> {
    let line = buffer.line_range(line_start);
    let text = buffer.line_text(line.clone());
    let mut tx = Transaction::new(Vec::new()).source("format:list");

    if let Some((_, _, prefix_len)) = parse_list_prefix(&text) {
        tx.push(Op::RemoveText {
            range: line.start..line.start + prefix_len,
        });
    }
    if let Some(kind) = target {
        let prefix = match kind {
            ListKind::Bullet => BULLET.to_string(),
            ListKind::Numbered => format!("{}. ", next_list_number(buffer, line.start)),
        };
        tx.push(Op::InsertText {
            offset: line.start,
            text: prefix,
            attrs: Some(Attributes::plain()),
        });
    }
    buffer.apply(&tx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_markers_parse_up_to_level_three() {
        assert_eq!(parse_heading_marker("# a"), Some((1, 2)));
        assert_eq!(parse_heading_marker("### a"), Some((3, 4)));
        assert_eq!(parse_heading_marker("#### a"), None);
        assert_eq!(parse_heading_marker("#a"), None);
    }

    #[test]
    fn list_prefixes_parse() {
        assert_eq!(parse_list_prefix("• a"), Some((ListKind::Bullet, 0, 2)));
        assert_eq!(parse_list_prefix("12. a"), Some((ListKind::Numbered, 12, 4)));
        assert_eq!(parse_list_prefix("12.a"), None);
    }
}
