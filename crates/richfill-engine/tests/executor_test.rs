mod common;

use common::{Behavior, ScriptedSession};
use richfill_engine::executor::StrategyExecutor;
use richfill_engine::handle::EditorHandle;
use richfill_engine::protocol::{ElementRef, FailureKind, RetryPolicy};
use richfill_engine::registry::StrategyRegistry;
use richfill_engine::session::PageSession;
use richfill_engine::variant::EditorVariant;
use richfill_engine::verifier::Verifier;
use std::time::Duration;

fn quill_handle() -> EditorHandle {
    EditorHandle::new(
        ElementRef {
            id: 1,
            selector: "div.ql-editor".into(),
        },
        EditorVariant::Quill,
    )
}

#[tokio::test(start_paused = true)]
async fn test_short_circuits_on_first_verified_attempt() {
    let mut session = ScriptedSession::quill()
        .on("direct-model-mutation", [Behavior::Ignore, Behavior::Apply]);
    let registry = StrategyRegistry::default();
    let executor = StrategyExecutor::default();

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "Hello, world!",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(60),
            None,
        )
        .await;

    assert!(result.succeeded);
    assert_eq!(result.strategy_used.as_deref(), Some("direct-model-mutation"));
    assert_eq!(result.attempts_log.len(), 2);
    assert_eq!(result.attempts_log[1].attempt, 2);
    assert_eq!(session.attempts, vec!["direct-model-mutation"; 2]);
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded_and_backoff_grows() {
    let mut session = ScriptedSession::quill()
        .on("direct-model-mutation", [Behavior::Ignore])
        .on("simulated-typing", [Behavior::Ignore])
        .on("generic-fallback", [Behavior::Ignore]);
    let registry = StrategyRegistry::default();
    let executor = StrategyExecutor::new(
        RetryPolicy::new(4, Duration::from_millis(100), 3.0),
        Duration::ZERO,
    );

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "body",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(60),
            None,
        )
        .await;

    assert!(!result.succeeded);
    assert_eq!(result.failure, Some(FailureKind::Exhausted));
    for name in registry.chain_names(EditorVariant::Quill) {
        assert_eq!(session.attempts_of(name), 4, "attempts of {}", name);
    }

    let times: Vec<u64> = result
        .attempts_log
        .iter()
        .filter(|o| o.strategy == "direct-model-mutation")
        .map(|o| o.elapsed_ms)
        .collect();
    let gaps: Vec<u64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    assert_eq!(gaps.len(), 3);
    for (gap, expected) in gaps.iter().zip([100, 300, 900]) {
        assert!(*gap >= expected && *gap < expected + 5, "gap {} vs {}", gap, expected);
    }
    assert!(gaps.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_execution_errors_are_logged_and_consumed() {
    let mut session = ScriptedSession::quill()
        .on("direct-model-mutation", [Behavior::Fail])
        .on("simulated-typing", [Behavior::Apply]);
    let registry = StrategyRegistry::default();
    let executor = StrategyExecutor::default();

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "line one\nline two",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(60),
            None,
        )
        .await;

    assert!(result.succeeded);
    assert_eq!(result.strategy_used.as_deref(), Some("simulated-typing"));
    assert_eq!(result.attempts_log.len(), 4);
    for outcome in &result.attempts_log[..3] {
        match &outcome.failure {
            Some(FailureKind::StrategyExecution { code, .. }) => assert_eq!(code, "SCRIPT_ERROR"),
            other => panic!("unexpected failure {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_deadline_beats_remaining_retries() {
    let mut session = ScriptedSession::quill()
        .on("direct-model-mutation", [Behavior::Ignore]);
    let registry = StrategyRegistry::default();
    // Attempts verify at 500ms and 1500ms; the next 1000ms backoff would end past 2s.
    let executor = StrategyExecutor::default();

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "body",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(2),
            None,
        )
        .await;

    assert!(!result.succeeded);
    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert_eq!(result.attempts_log.len(), 2);
    assert_eq!(session.attempts, vec!["direct-model-mutation"; 2]);
    assert!(session.elapsed() <= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_hung_attempt_is_abandoned_at_deadline() {
    let mut session = ScriptedSession::quill()
        .on("direct-model-mutation", [Behavior::Hang]);
    let registry = StrategyRegistry::default();
    let executor = StrategyExecutor::default();

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "body",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(5),
            None,
        )
        .await;

    assert_eq!(result.failure, Some(FailureKind::Timeout));
    assert_eq!(result.attempts_log.len(), 1);
    assert_eq!(result.attempts_log[0].failure, Some(FailureKind::Timeout));
    assert_eq!(session.attempts.len(), 1);
    let elapsed = session.elapsed();
    assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_millis(5010));
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_editor_never_verifies() {
    let mut session = ScriptedSession::quill().unreadable();
    let registry = StrategyRegistry::default();
    let executor = StrategyExecutor::new(RetryPolicy::new(1, Duration::ZERO, 1.0), Duration::ZERO);

    let result = executor
        .execute(
            &mut session,
            &quill_handle(),
            "body",
            registry.chain_for(EditorVariant::Quill),
            Duration::from_secs(60),
            None,
        )
        .await;

    assert_eq!(result.failure, Some(FailureKind::Exhausted));
    assert_eq!(result.attempts_log.len(), 3);
    assert!(result.attempts_log.iter().all(|o| o.observed_content.is_none()));
}

#[tokio::test]
async fn test_verifier_reads_live_editor_content() {
    let verifier = Verifier::new();
    let handle = quill_handle();

    let mut session = ScriptedSession::tiptap();
    session.content = r#"<p class="is-empty is-editor-empty" data-placeholder="Share your thoughts"><br class="ProseMirror-trailingBreak"></p>"#.to_string();
    assert!(!verifier.verify(&mut session, &handle, "Share your thoughts").await);
    assert!(verifier.verify(&mut session, &handle, "").await);

    session.content = "<p>Share your thoughts</p><p><br></p>".to_string();
    assert!(verifier.verify(&mut session, &handle, "Share your thoughts").await);

    let mut unreadable = ScriptedSession::quill().unreadable();
    assert!(!verifier.verify(&mut unreadable, &handle, "").await);
}
