use inkpad_core::{
    Editor, EditorConfig, EditorEvent, TextBuffer, TriggerDetector, TriggerEvent, TriggerState,
};
use proptest::prelude::*;

fn editor_with(text: &str) -> Editor {
    Editor::from_buffer(TextBuffer::from_str(text), EditorConfig::default())
}

fn type_text(editor: &mut Editor, text: &str) {
    for ch in text.chars() {
        editor.insert_text(&ch.to_string());
    }
}

fn trigger_events(editor: &mut Editor) -> Vec<TriggerEvent> {
    editor
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::Trigger(event) => Some(event),
            _ => None,
        })
        .collect()
}

proptest! {
    #[test]
    fn slash_opens_exactly_after_a_word_boundary(
        text in "[ab /@\n]{0,12}",
        cursor_seed in 0usize..64,
    ) {
        let chars: Vec<char> = text.chars().collect();
        let cursor = cursor_seed % (chars.len() + 1);
        let mut buffer = TextBuffer::from_str(&text);
        buffer.set_cursor(cursor);

        let mut detector = TriggerDetector::new();
        detector.evaluate_after_edit(&buffer);

        let expected = cursor > 0
            && chars[cursor - 1] == '/'
            && (cursor == 1 || chars[cursor - 2].is_whitespace());
        let opened = matches!(detector.state(), TriggerState::SlashActive { .. });
        prop_assert_eq!(opened, expected);
        if opened {
            prop_assert_eq!(detector.state().anchor(), Some(cursor - 1));
        }
    }

    #[test]
    fn active_trigger_always_points_at_its_character(
        keys in proptest::collection::vec(prop_oneof![
            Just("/".to_string()),
            Just("@".to_string()),
            Just(" ".to_string()),
            Just("a".to_string()),
            Just("\n".to_string()),
            Just("<bs>".to_string()),
        ], 0..24),
    ) {
        let mut editor = editor_with("");
        for key in keys {
            if key == "<bs>" {
                editor.delete_backward();
            } else {
                editor.insert_text(&key);
            }
            let state = editor.trigger_state().clone();
            if let (Some(kind), Some(anchor)) = (state.kind(), state.anchor()) {
                prop_assert!(anchor < editor.buffer().cursor());
                prop_assert_eq!(editor.buffer().char_at(anchor), Some(kind.trigger_char()));
            }
        }
    }
}

#[test]
fn slash_at_line_start_opens_menu() {
    let mut editor = editor_with("first\n");
    editor.insert_text("/");
    assert_eq!(
        trigger_events(&mut editor),
        vec![TriggerEvent::ShowSlashMenu { anchor: 6 }]
    );
}

#[test]
fn slash_query_updates_on_change_and_closes_when_slash_is_deleted() {
    let mut editor = editor_with("");
    type_text(&mut editor, "/he");
    assert_eq!(
        trigger_events(&mut editor),
        vec![
            TriggerEvent::ShowSlashMenu { anchor: 0 },
            TriggerEvent::UpdateSlashQuery {
                query: "h".to_string()
            },
            TriggerEvent::UpdateSlashQuery {
                query: "he".to_string()
            },
        ]
    );

    editor.set_cursor(1);
    assert_eq!(
        trigger_events(&mut editor),
        vec![TriggerEvent::UpdateSlashQuery {
            query: String::new()
        }]
    );

    editor.delete_backward();
    assert_eq!(trigger_events(&mut editor), vec![TriggerEvent::DismissMenu]);
    assert!(editor.trigger_state().is_idle());
}

#[test]
fn mention_opens_after_any_character() {
    let mut editor = editor_with("mail");
    editor.insert_text("@");
    assert_eq!(
        trigger_events(&mut editor),
        vec![TriggerEvent::ShowMentionMenu {
            anchor: 4,
            query: String::new()
        }]
    );
}

#[test]
fn deleting_the_at_sign_dismisses_exactly_once() {
    let mut editor = editor_with("Hey, ");
    type_text(&mut editor, "@joh");
    assert_eq!(
        editor.trigger_state(),
        &TriggerState::MentionActive {
            anchor: 5,
            query: "joh".to_string()
        }
    );
    editor.take_events();

    editor.delete_range(5..6);

    assert_eq!(editor.buffer().text(), "Hey, joh");
    assert_eq!(trigger_events(&mut editor), vec![TriggerEvent::DismissMenu]);
    assert!(editor.trigger_state().is_idle());
}

#[test]
fn whitespace_ends_a_mention() {
    let mut editor = editor_with("");
    type_text(&mut editor, "@al");
    editor.take_events();

    editor.insert_text(" ");
    assert_eq!(trigger_events(&mut editor), vec![TriggerEvent::DismissMenu]);
}

#[test]
fn second_trigger_does_not_open_another_menu() {
    let mut editor = editor_with("");
    type_text(&mut editor, "/a@");
    assert_eq!(
        editor.trigger_state(),
        &TriggerState::SlashActive {
            anchor: 0,
            query: "a@".to_string()
        }
    );
    let events = trigger_events(&mut editor);
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, TriggerEvent::ShowMentionMenu { .. }))
    );
}

#[test]
fn external_signals_force_idle() {
    let signals: [fn(&mut Editor); 3] = [Editor::focus_lost, Editor::scrolled, Editor::escape];
    for signal in signals {
        let mut editor = editor_with("");
        editor.insert_text("@");
        editor.take_events();

        signal(&mut editor);
        assert!(editor.trigger_state().is_idle());
        assert_eq!(trigger_events(&mut editor), vec![TriggerEvent::DismissMenu]);

        signal(&mut editor);
        assert!(trigger_events(&mut editor).is_empty());
    }
}

#[test]
fn caret_moving_before_the_anchor_dismisses() {
    let mut editor = editor_with("go ");
    type_text(&mut editor, "@x");
    editor.take_events();

    editor.set_cursor(2);
    assert_eq!(trigger_events(&mut editor), vec![TriggerEvent::DismissMenu]);

    editor.set_cursor(5);
    assert!(editor.trigger_state().is_idle());
    assert!(trigger_events(&mut editor).is_empty());
}

#[test]
fn edits_before_the_anchor_shift_it() {
    let mut detector = TriggerDetector::new();
    detector.evaluate_after_edit(&TextBuffer::from_str("a @"));

    let mut buffer = TextBuffer::from_str("a @b");
    let edit = buffer.insert(0, "zz", None);
    assert_eq!(detector.apply_edit(&edit), None);
    assert_eq!(detector.state().anchor(), Some(4));

    assert_eq!(buffer.cursor(), 6);
    assert_eq!(
        detector.revalidate(&buffer),
        Some(TriggerEvent::UpdateMentionQuery {
            query: "b".to_string()
        })
    );
}

#[test]
fn selecting_over_the_anchor_dismisses() {
    let mut editor = editor_with("");
    type_text(&mut editor, "/q");
    editor.take_events();

    editor.set_selection(0..2);
    editor.insert_text("x");
    assert_eq!(editor.buffer().text(), "x");
    assert!(editor.trigger_state().is_idle());
    assert!(trigger_events(&mut editor).contains(&TriggerEvent::DismissMenu));
}
