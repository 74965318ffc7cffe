mod common;

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeCompletion, MemoryStore, open_session};
use inkpad_session::{AssistAction, AssistError, CompletionError, SessionConfig, VARIANT_MARKER};

const LONG: &str = "This note is long and winded";

async fn selected(completion: FakeCompletion, config: SessionConfig) -> common::TestSession {
    let store = Arc::new(MemoryStore::with_document("doc", LONG, None));
    let (mut session, _events) = open_session(completion, store, config).await;
    session.edit(|editor| editor.set_selection(0..LONG.len()));
    session
}

#[tokio::test(start_paused = true)]
async fn condensed_text_replaces_the_selection() {
    let mut session = selected(FakeCompletion::answering("  A short note.\n"), SessionConfig::new()).await;

    let result = session.rewrite(AssistAction::Condense, pending()).await.unwrap();
    assert_eq!(result.suggestions, vec!["A short note."]);

    let record = session.apply_rewrite(&result, 0).unwrap();
    assert_eq!(record.range, 0..LONG.len());
    assert_eq!(session.editor().buffer().text(), "A short note.");
    assert_eq!(session.editor().buffer().cursor(), 13);
}

#[tokio::test(start_paused = true)]
async fn prompts_carry_the_action_and_the_selection() {
    let completion = Arc::new(FakeCompletion::answering("More words."));
    let store = Arc::new(MemoryStore::with_document("doc", LONG, None));
    let collaborators = inkpad_session::Collaborators {
        completion: completion.clone(),
        lookup: Arc::new(common::FakeLookup::new(Vec::new())),
        store,
    };
    let (mut session, _events) =
        inkpad_session::EditingSession::open("doc".into(), collaborators, SessionConfig::new())
            .await
            .unwrap();
    session.edit(|editor| editor.set_selection(5..9));

    session.rewrite(AssistAction::Expand, pending()).await.unwrap();
    assert_eq!(
        completion.calls(),
        vec![(
            AssistAction::Expand.system_prompt().to_string(),
            "note".to_string()
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn results_for_edited_text_are_refused() {
    let mut session = selected(FakeCompletion::answering("Shorter."), SessionConfig::new()).await;
    let result = session.rewrite(AssistAction::Condense, pending()).await.unwrap();

    session.edit(|editor| {
        editor.set_cursor(LONG.len());
        editor.insert_text("!");
    });
    assert_eq!(session.apply_rewrite(&result, 0), Err(AssistError::Stale));
    assert_eq!(session.editor().buffer().text(), format!("{LONG}!"));
}

#[tokio::test(start_paused = true)]
async fn moving_the_selection_also_makes_results_stale() {
    let mut session = selected(FakeCompletion::answering("Shorter."), SessionConfig::new()).await;
    let result = session.rewrite(AssistAction::Condense, pending()).await.unwrap();

    session.edit(|editor| editor.set_selection(0..4));
    assert_eq!(session.apply_rewrite(&result, 0), Err(AssistError::Stale));
}

#[tokio::test(start_paused = true)]
async fn cancelling_wins_over_a_slow_answer() {
    let completion = FakeCompletion::answering("late").slow(Duration::from_secs(10));
    let session = selected(completion, SessionConfig::new()).await;

    let err = session
        .rewrite(AssistAction::Rephrase, tokio::time::sleep(Duration::from_secs(1)))
        .await
        .unwrap_err();
    assert_eq!(err, AssistError::Cancelled);
    assert!(err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn slow_answers_time_out() {
    let completion = FakeCompletion::answering("late").slow(Duration::from_secs(10));
    let config = SessionConfig {
        completion_timeout_ms: 2_000,
        ..SessionConfig::new()
    };
    let session = selected(completion, config).await;

    let err = session.rewrite(AssistAction::Expand, pending()).await.unwrap_err();
    assert_eq!(err, AssistError::TimedOut);
    assert_eq!(err.user_message(), "The assistant did not answer in time.");
}

#[tokio::test(start_paused = true)]
async fn service_failures_surface_as_completion_errors() {
    let session = selected(FakeCompletion::answering(" \n\t"), SessionConfig::new()).await;
    assert_eq!(
        session.rewrite(AssistAction::Condense, pending()).await,
        Err(AssistError::Completion(CompletionError::MalformedResponse))
    );

    let session = selected(
        FakeCompletion::with_result(Err(CompletionError::NoCredential)),
        SessionConfig::new(),
    )
    .await;
    let err = session.rewrite(AssistAction::Condense, pending()).await.unwrap_err();
    assert!(!err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn rephrasing_offers_at_most_three_variants() {
    let raw = format!("One way.\n{VARIANT_MARKER}\nTwo ways.\n{VARIANT_MARKER}\n\n{VARIANT_MARKER}\nThree ways.\n{VARIANT_MARKER}\nFour ways.");
    let mut session = selected(FakeCompletion::answering(&raw), SessionConfig::new()).await;

    let result = session.rewrite(AssistAction::Rephrase, pending()).await.unwrap();
    assert_eq!(result.suggestions, vec!["One way.", "Two ways.", "Three ways."]);
    assert_eq!(session.apply_rewrite(&result, 3), Err(AssistError::NoSuchSuggestion(3)));

    session.apply_rewrite(&result, 1).unwrap();
    assert_eq!(session.editor().buffer().text(), "Two ways.");
}

#[tokio::test(start_paused = true)]
async fn continuing_writes_at_the_caret() {
    let store = Arc::new(MemoryStore::with_document("doc", "It was late", None));
    let (mut session, _events) = open_session(
        FakeCompletion::answering("The streets were empty."),
        store,
        SessionConfig::new(),
    )
    .await;

    let result = session.rewrite(AssistAction::Continue, pending()).await.unwrap();
    session.apply_rewrite(&result, 0).unwrap();
    assert_eq!(
        session.editor().buffer().text(),
        "It was late The streets were empty."
    );
}

#[tokio::test(start_paused = true)]
async fn empty_selection_is_rejected_before_calling_out() {
    let completion = Arc::new(FakeCompletion::answering("unused"));
    let store = Arc::new(MemoryStore::with_document("doc", LONG, None));
    let collaborators = inkpad_session::Collaborators {
        completion: completion.clone(),
        lookup: Arc::new(common::FakeLookup::new(Vec::new())),
        store,
    };
    let (session, _events) =
        inkpad_session::EditingSession::open("doc".into(), collaborators, SessionConfig::new())
            .await
            .unwrap();

    assert_eq!(
        session.rewrite(AssistAction::Condense, pending()).await,
        Err(AssistError::EmptySelection)
    );
    assert!(completion.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn partially_accepted_review_is_applied() {
    let store = Arc::new(MemoryStore::with_document("doc", "the colour is red today", None));
    let (mut session, _events) = open_session(
        FakeCompletion::answering("the color is blue today"),
        store,
        SessionConfig::new(),
    )
    .await;
    session.edit(|editor| editor.set_selection(0..23));

    let result = session.rewrite(AssistAction::Rephrase, pending()).await.unwrap();
    let mut review = result.review(0).unwrap();
    assert_eq!(review.hunks().len(), 2);
    review.accept(0);
    review.reject(1);

    session.apply_review(&result, &review).unwrap();
    assert_eq!(session.editor().buffer().text(), "the color is red today");
}
