use inkpad_core::{
    AttrPatch, Attributes, DocumentSnapshot, EditError, LinkTarget, Op, Run, TextBuffer, Transaction,
};

#[test]
fn deletion_truncates_straddling_runs() {
    let mut buffer = TextBuffer::from_str("hello world");
    buffer.set_attributes(0..5, &AttrPatch::bold(true));

    let edit = buffer.delete(3..8);
    assert_eq!(edit.range, 3..8);
    assert_eq!(edit.delta(), -5);
    assert_eq!(buffer.text(), "helrld");
    assert_eq!(
        buffer.runs(),
        vec![
            Run {
                range: 0..3,
                attrs: Attributes {
                    bold: true,
                    ..Attributes::plain()
                },
            },
            Run {
                range: 3..6,
                attrs: Attributes::plain(),
            },
        ]
    );
}

#[test]
fn insertion_shifts_later_runs() {
    let mut buffer = TextBuffer::from_str("ab cd");
    buffer.set_attributes(3..5, &AttrPatch::italic(true));
    buffer.insert(0, "xyz", Some(Attributes::plain()));

    assert_eq!(buffer.text(), "xyzab cd");
    assert!(buffer.attributes_at(6).italic);
    assert!(buffer.attributes_at(7).italic);
    assert!(!buffer.attributes_at(5).italic);
}

#[test]
fn typing_continues_style_but_not_links() {
    let mut buffer = TextBuffer::from_str("ab");
    buffer.set_attributes(0..2, &AttrPatch::bold(true));
    buffer.insert(2, "x", None);
    assert!(buffer.explicit_attributes_at(2).bold);

    let link = LinkTarget::entity("person", "7");
    buffer.insert(3, "@Ann", Some(Attributes::plain().with_link(link.clone())));
    buffer.insert(7, "y", None);

    assert_eq!(buffer.text(), "abx@Anny");
    assert_eq!(buffer.explicit_attributes_at(6).link, Some(link));
    assert_eq!(buffer.explicit_attributes_at(7).link, None);
}

#[test]
fn typing_attributes_apply_at_the_caret_only() {
    let mut buffer = TextBuffer::from_str("ab");
    buffer.set_typing_attributes(Some(Attributes {
        italic: true,
        ..Attributes::plain()
    }));
    buffer.insert(0, "z", None);
    assert!(!buffer.explicit_attributes_at(0).italic);

    buffer.insert(3, "c", None);
    assert!(buffer.explicit_attributes_at(3).italic);
}

#[test]
fn moving_the_caret_drops_typing_attributes() {
    let mut buffer = TextBuffer::from_str("abc");
    buffer.set_typing_attributes(Some(Attributes::plain().with_heading(1)));
    buffer.set_cursor(1);
    assert!(buffer.typing_attributes().is_none());
}

#[test]
fn line_ranges_exclude_the_newline() {
    let buffer = TextBuffer::from_str("one\ntwo\n");
    assert_eq!(buffer.line_range(0), 0..3);
    assert_eq!(buffer.line_range(3), 0..3);
    assert_eq!(buffer.line_range(4), 4..7);
    assert_eq!(buffer.line_range(8), 8..8);
    assert_eq!(buffer.line_text(4..7), "two");
}

#[test]
fn failed_transaction_leaves_buffer_untouched() {
    let mut buffer = TextBuffer::from_str("abc");
    let revision = buffer.revision();

    let tx = Transaction::new(vec![
        Op::InsertText {
            offset: 1,
            text: "x".to_string(),
            attrs: None,
        },
        Op::RemoveText { range: 2..10 },
    ]);
    let err = buffer.apply(&tx).unwrap_err();

    assert_eq!(
        err,
        EditError::OutOfBounds {
            start: 2,
            end: 10,
            len: 4
        }
    );
    assert_eq!(buffer.text(), "abc");
    assert_eq!(buffer.revision(), revision);
}

#[test]
fn transaction_ops_see_earlier_ops() {
    let mut buffer = TextBuffer::from_str("a/b");
    let tx = Transaction::new(vec![
        Op::RemoveText { range: 1..2 },
        Op::InsertText {
            offset: 1,
            text: "--".to_string(),
            attrs: None,
        },
        Op::SetAttributes {
            range: 1..3,
            patch: AttrPatch::strikethrough(true),
        },
    ])
    .cursor_after(3)
    .source("test");

    let edits = buffer.apply(&tx).unwrap();
    assert_eq!(edits.len(), 2);
    assert_eq!(buffer.text(), "a--b");
    assert_eq!(buffer.cursor(), 3);
    assert!(buffer.explicit_attributes_at(2).strikethrough);
    assert!(!buffer.explicit_attributes_at(3).strikethrough);
}

#[test]
fn transactions_serialize_as_tagged_ops() {
    let tx = Transaction::new(vec![Op::RemoveText { range: 0..1 }]).source("menu");
    let json = serde_json::to_value(&tx).unwrap();
    assert_eq!(json["ops"][0]["op"], "remove_text");
    assert_eq!(json["meta"]["source"], "menu");

    let back: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(back, tx);
}

#[test]
fn snapshot_restores_explicit_runs() {
    let mut buffer = TextBuffer::from_str("note for @Ann");
    buffer.set_attributes(0..4, &AttrPatch::bold(true));
    buffer.insert(13, "!", Some(Attributes::plain()));

    let json = DocumentSnapshot::from_buffer(&buffer).to_json_pretty().unwrap();
    let restored = DocumentSnapshot::from_json_str(&json)
        .unwrap()
        .into_buffer()
        .unwrap();

    assert_eq!(restored.text(), buffer.text());
    assert_eq!(restored.runs(), buffer.runs());
}

#[test]
fn snapshot_envelope_has_defaults() {
    let snapshot = DocumentSnapshot::from_json_str(r#"{ "text": "hi" }"#).unwrap();
    assert_eq!(snapshot.schema, "inkpad");
    assert_eq!(snapshot.version, 1);
    assert!(snapshot.runs.is_empty());
    assert!(snapshot.matches_text("hi"));
}

#[test]
fn href_decoding_distinguishes_entities_from_urls() {
    assert_eq!(
        LinkTarget::from_href("entity:project/12"),
        LinkTarget::entity("project", "12")
    );
    assert_eq!(
        LinkTarget::from_href("https://example.com/a"),
        LinkTarget::url("https://example.com/a")
    );
    assert_eq!(LinkTarget::entity("project", "12").to_href(), "entity:project/12");
}
