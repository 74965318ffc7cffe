use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attrs::Attributes;
use crate::buffer::{EditError, TextBuffer};
use crate::commands::{CommandError, CommandExecutor, CommandOutcome, MentionCandidate, SlashCommand};
use crate::formatting::{ActiveTraits, FormatTrait, FormattingController};
use crate::ops::{EditRecord, Op, Transaction};
use crate::paint::StylePainter;
use crate::transform::LiveTransformer;
use crate::trigger::{DismissReason, TriggerDetector, TriggerEvent, TriggerKind, TriggerState};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_true")]
    pub live_transform: bool,
    #[serde(default = "default_true")]
    pub paint_markdown: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            live_transform: true,
            paint_markdown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    Trigger(TriggerEvent),
    TextChanged { revision: u64 },
    Transformed { rule: &'static str },
}

/// The single owner of a document's buffer. Every mutation goes through one
/// of its methods, which keep the trigger state, shorthand rewriting and
/// painted styling in step with the text.
pub struct Editor {
    buffer: TextBuffer,
    detector: TriggerDetector,
    transformer: LiveTransformer,
    painter: StylePainter,
    formatting: FormattingController,
    executor: CommandExecutor,
    config: EditorConfig,
    events: Vec<EditorEvent>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::from_buffer(TextBuffer::new(), config)
    }

    pub fn from_buffer(buffer: TextBuffer, config: EditorConfig) -> Self {
        let mut editor = Self {
            buffer,
            detector: TriggerDetector::new(),
            transformer: LiveTransformer::new(),
            painter: StylePainter::new(),
            formatting: FormattingController::new(),
            executor: CommandExecutor::new(),
            config,
            events: Vec::new(),
        };
        editor.repaint();
        editor
    }

    pub fn with_transformer(mut self, transformer: LiveTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn trigger_state(&self) -> &TriggerState {
        self.detector.state()
    }

    pub fn heading_mode(&self) -> bool {
        self.formatting.heading_mode()
    }

    pub fn active_traits(&self) -> ActiveTraits {
        self.formatting.active_traits(&self.buffer)
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Types `text` at the caret, replacing the selection if there is one.
    pub fn insert_text(&mut self, text: &str) {
        if text.is_empty() && self.buffer.selection().is_none() {
            return;
        }
        let revision = self.buffer.revision();
        let range = self.buffer.selected_range();
        let edit = self.buffer.replace(range, text, None);
        self.after_keystroke(revision, edit, text.contains(['\n', '\r']));
    }

    /// Deletes the selection, or the character before the caret.
    pub fn delete_backward(&mut self) {
        let range = match self.buffer.selection() {
            Some(range) => range,
            None => {
                let cursor = self.buffer.cursor();
                match self.buffer.char_before(cursor) {
                    Some((start, _)) => start..cursor,
                    None => return,
                }
            }
        };
        let revision = self.buffer.revision();
        let edit = self.buffer.delete(range);
        self.after_keystroke(revision, edit, false);
    }

    /// Panics on a range outside the buffer.
    pub fn delete_range(&mut self, range: Range<usize>) {
        let revision = self.buffer.revision();
        let edit = self.buffer.delete(range);
        self.after_keystroke(revision, edit, false);
    }

    pub fn set_cursor(&mut self, offset: usize) {
        self.buffer.set_cursor(offset);
        self.revalidate();
    }

    pub fn set_selection(&mut self, range: Range<usize>) {
        self.buffer.set_selection(range);
        self.revalidate();
    }

    pub fn focus_lost(&mut self) {
        self.dismiss(DismissReason::FocusLost);
    }

    pub fn scrolled(&mut self) {
        self.dismiss(DismissReason::Scrolled);
    }

    pub fn escape(&mut self) {
        self.dismiss(DismissReason::Escape);
    }

    pub fn toggle_format(&mut self, format: FormatTrait) -> Result<(), EditError> {
        let revision = self.buffer.revision();
        let edits = self.formatting.toggle(&mut self.buffer, format)?;
        self.track_edits(&edits);
        self.revalidate();
        self.finish(revision);
        Ok(())
    }

    /// Runs `command` for the open slash menu.
    pub fn run_slash_command(&mut self, command: SlashCommand) -> Result<CommandOutcome, CommandError> {
        let TriggerState::SlashActive { anchor, .. } = self.detector.state() else {
            return Err(CommandError::NoActiveTrigger(TriggerKind::Slash));
        };
        let anchor = *anchor;
        let revision = self.buffer.revision();
        let result = self
            .executor
            .execute(&mut self.buffer, &mut self.detector, command, anchor);
        let execution = match result {
            Ok(execution) => execution,
            Err(err) => {
                if !self.detector.is_active() {
                    self.push_trigger(Some(TriggerEvent::DismissMenu));
                }
                return Err(err);
            }
        };
        self.push_trigger(execution.event);
        if let Some(level) = command.heading_level() {
            self.formatting.arm_heading_mode(&mut self.buffer, level);
        }
        self.finish(revision);
        Ok(execution.outcome)
    }

    pub fn insert_mention(&mut self, candidate: &MentionCandidate) -> Result<CommandOutcome, CommandError> {
        let revision = self.buffer.revision();
        let was_active = self.detector.is_active();
        let execution = match self
            .executor
            .insert_mention(&mut self.buffer, &mut self.detector, candidate)
        {
            Ok(execution) => execution,
            Err(err) => {
                if was_active && !self.detector.is_active() {
                    self.push_trigger(Some(TriggerEvent::DismissMenu));
                }
                return Err(err);
            }
        };
        self.push_trigger(execution.event);
        self.finish(revision);
        Ok(execution.outcome)
    }

    /// Replaces `range` with `text` in one transaction and leaves the caret
    /// after it. Used to accept assistant rewrites.
    pub fn replace_range(
        &mut self,
        range: Range<usize>,
        text: &str,
        attrs: Option<Attributes>,
    ) -> Result<EditRecord, EditError> {
        let revision = self.buffer.revision();
        let attrs = attrs.or_else(|| Some(self.buffer.explicit_attributes_at(range.start).continuation()));
        let start = range.start;
        let inserted_len = text.encode_utf16().count();
        let record = EditRecord {
            range: range.clone(),
            inserted_len,
        };
        let tx = Transaction::new(vec![
            Op::RemoveText { range },
            Op::InsertText {
                offset: start,
                text: text.to_string(),
                attrs,
            },
        ])
        .cursor_after(start + inserted_len)
        .source("assistant");
        let edits = self.buffer.apply(&tx)?;
        self.track_edits(&edits);
        self.revalidate();
        self.finish(revision);
        Ok(record)
    }

    fn after_keystroke(&mut self, revision: u64, edit: EditRecord, line_break: bool) {
        let dismissed = self.track_edits(std::slice::from_ref(&edit));
        if !dismissed {
            let event = self.detector.evaluate_after_edit(&self.buffer);
            self.push_trigger(event);
        }

        if self.config.live_transform {
            if let Some(applied) = self.transformer.apply(&mut self.buffer) {
                self.track_edits(&applied.edits);
                self.revalidate();
                self.events.push(EditorEvent::Transformed { rule: applied.rule });
            }
        }
        if line_break {
            self.formatting.on_line_break(&mut self.buffer);
        }
        self.finish(revision);
    }

    /// Shifts or drops the trigger anchor for each edit. Returns whether the
    /// open menu was dismissed.
    fn track_edits(&mut self, edits: &[EditRecord]) -> bool {
        let mut dismissed = false;
        for edit in edits {
            if let Some(event) = self.detector.apply_edit(edit) {
                dismissed = true;
                self.push_trigger(Some(event));
            }
        }
        dismissed
    }

    fn revalidate(&mut self) {
        let event = self.detector.revalidate(&self.buffer);
        self.push_trigger(event);
    }

    fn dismiss(&mut self, reason: DismissReason) {
        let event = self.detector.dismiss(reason);
        self.push_trigger(event);
    }

    fn push_trigger(&mut self, event: Option<TriggerEvent>) {
        if let Some(event) = event {
            self.events.push(EditorEvent::Trigger(event));
        }
    }

    fn finish(&mut self, revision_before: u64) {
        self.repaint();
        let revision = self.buffer.revision();
        if revision != revision_before {
            self.events.push(EditorEvent::TextChanged { revision });
        }
    }

    fn repaint(&mut self) {
        if self.config.paint_markdown {
            self.painter.paint(&mut self.buffer);
        }
    }
}
