use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attrs::{AttrPatch, Attributes, BlockKind, HeadingLevel, LinkTarget};
use crate::buffer::{EditError, TextBuffer, utf16_len};
use crate::formatting::next_list_number;
use crate::ops::{EditRecord, Op, Transaction};
use crate::transform::{BULLET, DIVIDER_MARKER, UNCHECKED_BOX};
use crate::trigger::{DismissReason, MENTION, SLASH, TriggerDetector, TriggerEvent, TriggerKind, TriggerState};

pub const QUOTE_MARKER: &str = "▎ ";
pub const CALLOUT_MARKER: &str = "💡 ";
pub const CODE_FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashCommand {
    Heading1,
    Heading2,
    BulletList,
    NumberedList,
    Checkbox,
    Quote,
    Code,
    Divider,
    Callout,
    LinkEntity,
}

impl SlashCommand {
    pub const ALL: [SlashCommand; 10] = [
        SlashCommand::Heading1,
        SlashCommand::Heading2,
        SlashCommand::BulletList,
        SlashCommand::NumberedList,
        SlashCommand::Checkbox,
        SlashCommand::Quote,
        SlashCommand::Code,
        SlashCommand::Divider,
        SlashCommand::Callout,
        SlashCommand::LinkEntity,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SlashCommand::Heading1 => "heading1",
            SlashCommand::Heading2 => "heading2",
            SlashCommand::BulletList => "bullet_list",
            SlashCommand::NumberedList => "numbered_list",
            SlashCommand::Checkbox => "checkbox",
            SlashCommand::Quote => "quote",
            SlashCommand::Code => "code",
            SlashCommand::Divider => "divider",
            SlashCommand::Callout => "callout",
            SlashCommand::LinkEntity => "link_entity",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SlashCommand::Heading1 => "Heading 1",
            SlashCommand::Heading2 => "Heading 2",
            SlashCommand::BulletList => "Bulleted list",
            SlashCommand::NumberedList => "Numbered list",
            SlashCommand::Checkbox => "Checkbox",
            SlashCommand::Quote => "Quote",
            SlashCommand::Code => "Code block",
            SlashCommand::Divider => "Divider",
            SlashCommand::Callout => "Callout",
            SlashCommand::LinkEntity => "Link to…",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            SlashCommand::Heading1 => &["h1", "title", "heading"],
            SlashCommand::Heading2 => &["h2", "subtitle", "heading"],
            SlashCommand::BulletList => &["bullet", "list", "ul"],
            SlashCommand::NumberedList => &["number", "ordered", "list", "ol"],
            SlashCommand::Checkbox => &["todo", "task", "check"],
            SlashCommand::Quote => &["blockquote", "citation"],
            SlashCommand::Code => &["snippet", "pre", "monospace"],
            SlashCommand::Divider => &["separator", "hr", "rule"],
            SlashCommand::Callout => &["note", "tip", "highlight"],
            SlashCommand::LinkEntity => &["link", "mention", "reference"],
        }
    }

    /// Case-insensitive substring match against id, label and keywords. An
    /// empty query matches everything.
    pub fn matches(self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.id().contains(&query)
            || self.label().to_lowercase().contains(&query)
            || self.keywords().iter().any(|k| k.contains(&query))
    }

    pub fn filter(query: &str) -> Vec<SlashCommand> {
        Self::ALL.into_iter().filter(|c| c.matches(query)).collect()
    }

    pub fn heading_level(self) -> Option<HeadingLevel> {
        match self {
            SlashCommand::Heading1 => Some(1),
            SlashCommand::Heading2 => Some(2),
            _ => None,
        }
    }

    /// The content inserted in place of the `/` at `anchor`. `None` for
    /// commands that wait on a further choice.
    pub fn template(self, buffer: &TextBuffer, anchor: usize) -> Option<CommandTemplate> {
        let template = match self {
            SlashCommand::Heading1 | SlashCommand::Heading2 => {
                let level = self.heading_level()?;
                CommandTemplate::new(
                    format!("{} ", "#".repeat(level as usize)),
                    Attributes::plain().with_heading(level),
                )
                .line_attrs(AttrPatch::heading(Some(level)))
            }
            SlashCommand::BulletList => CommandTemplate::new(BULLET, Attributes::plain()),
            SlashCommand::NumberedList => {
                let line_start = buffer.line_range(anchor).start;
                let number = if line_start == anchor {
                    next_list_number(buffer, line_start)
                } else {
                    1
                };
                CommandTemplate::new(format!("{number}. "), Attributes::plain())
            }
            SlashCommand::Checkbox => CommandTemplate::new(UNCHECKED_BOX, Attributes::plain())
                .line_attrs(AttrPatch::block(Some(BlockKind::Checkbox))),
            SlashCommand::Quote => CommandTemplate::new(QUOTE_MARKER, Attributes::plain())
                .line_attrs(AttrPatch::block(Some(BlockKind::Quote))),
            SlashCommand::Code => {
                let attrs = Attributes {
                    code: true,
                    ..Attributes::plain().with_block(BlockKind::CodeBlock)
                };
                CommandTemplate::new(format!("{CODE_FENCE}\n\n{CODE_FENCE}"), attrs)
                    .cursor(CursorPolicy::At(utf16_len(CODE_FENCE) + 1))
            }
            SlashCommand::Divider => CommandTemplate::new(
                format!("{DIVIDER_MARKER}\n"),
                Attributes::plain().with_block(BlockKind::Divider),
            ),
            SlashCommand::Callout => CommandTemplate::new(CALLOUT_MARKER, Attributes::plain())
                .line_attrs(AttrPatch::block(Some(BlockKind::Callout))),
            SlashCommand::LinkEntity => return None,
        };
        Some(template)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPolicy {
    AfterInsert,
    /// Offset inside the inserted text.
    At(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub text: String,
    pub attrs: Attributes,
    /// Applied to the whole line the template lands on. Only single-line
    /// templates carry line attributes.
    pub line_attrs: Option<AttrPatch>,
    pub cursor: CursorPolicy,
}

impl CommandTemplate {
    fn new(text: impl Into<String>, attrs: Attributes) -> Self {
        Self {
            text: text.into(),
            attrs,
            line_attrs: None,
            cursor: CursorPolicy::AfterInsert,
        }
    }

    fn line_attrs(mut self, patch: AttrPatch) -> Self {
        self.line_attrs = Some(patch);
        self
    }

    fn cursor(mut self, cursor: CursorPolicy) -> Self {
        self.cursor = cursor;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MentionCandidate {
    pub entity_id: String,
    pub entity_type: String,
    pub title: String,
}

impl MentionCandidate {
    pub fn new(entity_id: impl Into<String>, entity_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type: entity_type.into(),
            title: title.into(),
        }
    }

    pub fn link_target(&self) -> LinkTarget {
        LinkTarget::entity(self.entity_type.clone(), self.entity_id.clone())
    }

    pub fn label(&self) -> String {
        format!("{MENTION}{}", self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("no {0:?} trigger is active")]
    NoActiveTrigger(TriggerKind),
    #[error("trigger at offset {anchor} no longer holds {expected:?}")]
    StaleTrigger { anchor: usize, expected: char },
    #[error(transparent)]
    Edit(#[from] EditError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Inserted { range: Range<usize> },
    AwaitingEntity { anchor: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub outcome: CommandOutcome,
    pub edits: Vec<EditRecord>,
    pub event: Option<TriggerEvent>,
}

/// Turns a resolved menu choice into one buffer transaction.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(
        &self,
        buffer: &mut TextBuffer,
        detector: &mut TriggerDetector,
        command: SlashCommand,
        anchor: usize,
    ) -> Result<Execution, CommandError> {
        if buffer.char_at(anchor) != Some(SLASH) {
            detector.dismiss(DismissReason::Invalidated);
            return Err(CommandError::StaleTrigger {
                anchor,
                expected: SLASH,
            });
        }

        let Some(template) = command.template(buffer, anchor) else {
            let tx = Transaction::new(vec![
                Op::RemoveText {
                    range: anchor..anchor + 1,
                },
                Op::InsertText {
                    offset: anchor,
                    text: MENTION.to_string(),
                    attrs: Some(Attributes::plain()),
                },
            ])
            .cursor_after(anchor + 1)
            .source(format!("command:{}", command.id()));
            let edits = buffer.apply(&tx)?;
            let event = detector.begin_mention(anchor);
            tracing::debug!(command = command.id(), anchor, "awaiting entity selection");
            return Ok(Execution {
                outcome: CommandOutcome::AwaitingEntity { anchor },
                edits,
                event: Some(event),
            });
        };

        let text_len = utf16_len(&template.text);
        let line = buffer.line_range(anchor);
        let mut tx = Transaction::new(vec![
            Op::RemoveText {
                range: anchor..anchor + 1,
            },
            Op::InsertText {
                offset: anchor,
                text: template.text.clone(),
                attrs: Some(template.attrs.clone()),
            },
        ]);
        if let Some(patch) = template.line_attrs.clone() {
            debug_assert!(!template.text.contains('\n'));
            tx.push(Op::SetAttributes {
                range: line.start..line.end - 1 + text_len,
                patch,
            });
        }
        let cursor_after = match template.cursor {
            CursorPolicy::AfterInsert => anchor + text_len,
            CursorPolicy::At(offset) => anchor + offset.min(text_len),
        };
        let tx = tx
            .cursor_after(cursor_after)
            .source(format!("command:{}", command.id()));

        let edits = buffer.apply(&tx)?;
        let event = detector.dismiss(DismissReason::Committed);
        tracing::debug!(command = command.id(), anchor, cursor_after, "slash command executed");
        Ok(Execution {
            outcome: CommandOutcome::Inserted {
                range: anchor..anchor + text_len,
            },
            edits,
            event,
        })
    }

    /// Replaces the active `@query` with a tagged `@title` link followed by a
    /// plain space.
    pub fn insert_mention(
        &self,
        buffer: &mut TextBuffer,
        detector: &mut TriggerDetector,
        candidate: &MentionCandidate,
    ) -> Result<Execution, CommandError> {
        let TriggerState::MentionActive { anchor, .. } = detector.state() else {
            return Err(CommandError::NoActiveTrigger(TriggerKind::Mention));
        };
        let anchor = *anchor;
        let cursor = buffer.cursor();
        if cursor <= anchor || buffer.char_at(anchor) != Some(MENTION) {
            detector.dismiss(DismissReason::Invalidated);
            return Err(CommandError::StaleTrigger {
                anchor,
                expected: MENTION,
            });
        }

        let label = candidate.label();
        let label_len = utf16_len(&label);
        let tx = Transaction::new(vec![
            Op::RemoveText {
                range: anchor..cursor,
            },
            Op::InsertText {
                offset: anchor,
                text: label,
                attrs: Some(Attributes::plain().with_link(candidate.link_target())),
            },
            Op::InsertText {
                offset: anchor + label_len,
                text: " ".to_string(),
                attrs: Some(Attributes::plain()),
            },
        ])
        .cursor_after(anchor + label_len + 1)
        .source("command:mention");

        let edits = buffer.apply(&tx)?;
        buffer.set_typing_attributes(Some(Attributes::plain()));
        let event = detector.dismiss(DismissReason::Committed);
        tracing::debug!(
            entity_type = %candidate.entity_type,
            entity_id = %candidate.entity_id,
            anchor,
            "mention inserted"
        );
        Ok(Execution {
            outcome: CommandOutcome::Inserted {
                range: anchor..anchor + label_len,
            },
            edits,
            event,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_keywords_case_insensitively() {
        assert_eq!(SlashCommand::filter("TODO"), vec![SlashCommand::Checkbox]);
        assert_eq!(
            SlashCommand::filter("head"),
            vec![SlashCommand::Heading1, SlashCommand::Heading2]
        );
        assert_eq!(SlashCommand::filter("").len(), SlashCommand::ALL.len());
    }

    #[test]
    fn stale_slash_anchor_is_rejected() {
        let mut buffer = TextBuffer::from_str("abc");
        let mut detector = TriggerDetector::new();
        let err = CommandExecutor::new()
            .execute(&mut buffer, &mut detector, SlashCommand::Quote, 1)
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::StaleTrigger {
                anchor: 1,
                expected: '/'
            }
        );
        assert_eq!(buffer.text(), "abc");
    }
}
