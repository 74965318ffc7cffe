use serde::{Deserialize, Serialize};

use crate::buffer::TextBuffer;
use crate::ops::EditRecord;

pub const SLASH: char = '/';
pub const MENTION: char = '@';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Slash,
    Mention,
}

impl TriggerKind {
    pub fn trigger_char(self) -> char {
        match self {
            TriggerKind::Slash => SLASH,
            TriggerKind::Mention => MENTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    SlashActive { anchor: usize, query: String },
    MentionActive { anchor: usize, query: String },
}

impl TriggerState {
    pub fn kind(&self) -> Option<TriggerKind> {
        match self {
            TriggerState::Idle => None,
            TriggerState::SlashActive { .. } => Some(TriggerKind::Slash),
            TriggerState::MentionActive { .. } => Some(TriggerKind::Mention),
        }
    }

    pub fn anchor(&self) -> Option<usize> {
        match self {
            TriggerState::Idle => None,
            TriggerState::SlashActive { anchor, .. } | TriggerState::MentionActive { anchor, .. } => {
                Some(*anchor)
            }
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            TriggerState::Idle => None,
            TriggerState::SlashActive { query, .. } | TriggerState::MentionActive { query, .. } => {
                Some(query.as_str())
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TriggerState::Idle)
    }
}

/// Requests the detector makes of the host's menu UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TriggerEvent {
    ShowSlashMenu { anchor: usize },
    UpdateSlashQuery { query: String },
    ShowMentionMenu { anchor: usize, query: String },
    UpdateMentionQuery { query: String },
    DismissMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    FocusLost,
    Scrolled,
    Escape,
    Committed,
    Invalidated,
}

/// Recognizes `/` command and `@` mention contexts from the text around the
/// caret. Never fails: any mismatch between its state and the buffer resets
/// it to idle.
#[derive(Debug, Default)]
pub struct TriggerDetector {
    state: TriggerState,
}

impl TriggerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TriggerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_idle()
    }

    /// Evaluation after a text change. May open a menu when idle.
    pub fn evaluate_after_edit(&mut self, buffer: &TextBuffer) -> Option<TriggerEvent> {
        if self.state.is_idle() {
            return self.try_open(buffer);
        }
        self.validate(buffer, true)
    }

    /// Evaluation after a caret or selection move. Never opens a menu.
    pub fn revalidate(&mut self, buffer: &TextBuffer) -> Option<TriggerEvent> {
        if self.state.is_idle() {
            return None;
        }
        self.validate(buffer, false)
    }

    /// Keeps the anchor in step with an edit. An anchor inside the removed
    /// range is gone, so the menu closes.
    pub fn apply_edit(&mut self, edit: &EditRecord) -> Option<TriggerEvent> {
        let anchor = self.state.anchor()?;
        if edit.range.contains(&anchor) {
            tracing::trace!(anchor, ?edit, "trigger anchor removed by edit");
            return self.dismiss(DismissReason::Invalidated);
        }
        let shifted = if edit.range.start > anchor {
            anchor
        } else {
            anchor - edit.range.len() + edit.inserted_len
        };
        match &mut self.state {
            TriggerState::SlashActive { anchor, .. } | TriggerState::MentionActive { anchor, .. } => {
                *anchor = shifted;
            }
            TriggerState::Idle => {}
        }
        None
    }

    /// Forces the idle state. Emits a dismissal only if a menu was open.
    pub fn dismiss(&mut self, reason: DismissReason) -> Option<TriggerEvent> {
        if self.state.is_idle() {
            return None;
        }
        tracing::debug!(?reason, state = ?self.state, "dismissing trigger menu");
        self.state = TriggerState::Idle;
        Some(TriggerEvent::DismissMenu)
    }

    /// Enters the mention state at an `@` placed programmatically, e.g. by
    /// the link-entity slash command.
    pub fn begin_mention(&mut self, anchor: usize) -> TriggerEvent {
        self.state = TriggerState::MentionActive {
            anchor,
            query: String::new(),
        };
        TriggerEvent::ShowMentionMenu {
            anchor,
            query: String::new(),
        }
    }

    fn try_open(&mut self, buffer: &TextBuffer) -> Option<TriggerEvent> {
        let cursor = buffer.cursor();
        let (anchor, ch) = buffer.char_before(cursor)?;
        match ch {
            SLASH => {
                let starts_word = match buffer.char_before(anchor) {
                    None => true,
                    Some((_, prev)) => prev.is_whitespace(),
                };
                if !starts_word {
                    return None;
                }
                tracing::debug!(anchor, "slash trigger opened");
                self.state = TriggerState::SlashActive {
                    anchor,
                    query: String::new(),
                };
                Some(TriggerEvent::ShowSlashMenu { anchor })
            }
            MENTION => {
                tracing::debug!(anchor, "mention trigger opened");
                Some(self.begin_mention(anchor))
            }
            _ => None,
        }
    }

    fn validate(&mut self, buffer: &TextBuffer, after_edit: bool) -> Option<TriggerEvent> {
        let cursor = buffer.cursor();
        let (kind, anchor, previous_query) = match &self.state {
            TriggerState::Idle => return None,
            TriggerState::SlashActive { anchor, query } => (TriggerKind::Slash, *anchor, query.clone()),
            TriggerState::MentionActive { anchor, query } => {
                (TriggerKind::Mention, *anchor, query.clone())
            }
        };

        if cursor <= anchor || buffer.char_at(anchor) != Some(kind.trigger_char()) {
            return self.dismiss(DismissReason::Invalidated);
        }

        let query = buffer.slice(anchor + 1..cursor);
        match kind {
            TriggerKind::Slash => {
                let changed = query != previous_query;
                self.state = TriggerState::SlashActive {
                    anchor,
                    query: query.clone(),
                };
                changed.then_some(TriggerEvent::UpdateSlashQuery { query })
            }
            TriggerKind::Mention => {
                if query.chars().any(char::is_whitespace) {
                    return self.dismiss(DismissReason::Invalidated);
                }
                let changed = query != previous_query;
                self.state = TriggerState::MentionActive {
                    anchor,
                    query: query.clone(),
                };
                (after_edit || changed).then_some(TriggerEvent::UpdateMentionQuery { query })
            }
        }
    }
}
