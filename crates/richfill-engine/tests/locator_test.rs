mod common;

use common::ScriptedSession;
use richfill_engine::locator::{LocateError, LocatorResolver};
use richfill_engine::protocol::SelectorDescriptor;
use richfill_engine::session::PageSession;
use std::time::Duration;

fn candidates(selectors: &[&str]) -> Vec<SelectorDescriptor> {
    selectors.iter().map(|s| SelectorDescriptor::from(*s)).collect()
}

#[tokio::test(start_paused = true)]
async fn test_first_match_in_priority_order() {
    let mut session = ScriptedSession::new()
        .with_element(".ProseMirror", 2)
        .with_element("div.ql-editor", 1);
    let resolver = LocatorResolver::default();

    let element = resolver
        .resolve(
            &mut session,
            &candidates(&["div.ql-editor", ".ProseMirror"]),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    assert_eq!(element.id, 1);
    assert_eq!(session.probes, vec!["div.ql-editor"]);
}

#[tokio::test(start_paused = true)]
async fn test_dead_selector_only_costs_its_wait_window() {
    let mut session = ScriptedSession::new().with_element("#content-input", 9);
    let resolver = LocatorResolver::new(Duration::from_millis(1500), Duration::from_millis(250));

    let element = resolver
        .resolve(
            &mut session,
            &candidates(&["div.ql-editor", "#content-input"]),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

    assert_eq!(element.selector, "#content-input");
    let elapsed = session.elapsed();
    assert!(elapsed >= Duration::from_millis(1500) && elapsed < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_per_candidate_wait_overrides_default() {
    let mut session = ScriptedSession::new().with_element(".tiptap", 4);
    let resolver = LocatorResolver::default();
    let list = vec![
        SelectorDescriptor::new("div.ql-editor").with_wait(Duration::from_millis(100)),
        SelectorDescriptor::from(".tiptap"),
    ];

    resolver
        .resolve(&mut session, &list, Duration::from_secs(30))
        .await
        .unwrap();

    assert!(session.elapsed() < Duration::from_millis(150));
}

#[tokio::test(start_paused = true)]
async fn test_late_element_found_on_a_later_sweep() {
    let mut session = ScriptedSession::new().with_late_element(
        "div.ql-editor",
        1,
        Duration::from_secs(4),
    );
    let resolver = LocatorResolver::new(Duration::from_millis(500), Duration::from_millis(250));

    let element = resolver
        .resolve(
            &mut session,
            &candidates(&["div.ql-editor", ".tiptap"]),
            Duration::from_secs(10),
        )
        .await
        .unwrap();

    assert_eq!(element.id, 1);
    assert!(session.probes.len() > 2);
}

#[tokio::test(start_paused = true)]
async fn test_session_errors_count_as_misses() {
    let mut session = ScriptedSession::new()
        .with_invalid_selector("div[")
        .with_element(".ProseMirror", 5);
    let resolver = LocatorResolver::default();

    let element = resolver
        .resolve(
            &mut session,
            &candidates(&["div[", ".ProseMirror"]),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(element.id, 5);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_within_timeout() {
    let mut session = ScriptedSession::new();
    let resolver = LocatorResolver::default();

    let err = resolver
        .resolve(
            &mut session,
            &candidates(&["div.ql-editor", ".tiptap"]),
            Duration::from_secs(4),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, LocateError::NotFound { candidates: 2, .. }));
    let elapsed = session.elapsed();
    assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_millis(4010));
}

#[tokio::test(start_paused = true)]
async fn test_empty_candidate_list() {
    let mut session = ScriptedSession::new();
    let err = LocatorResolver::default()
        .resolve(&mut session, &[], Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::NoCandidates));
}
