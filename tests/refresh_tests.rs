/// Refresh scheduler tests
///
/// Focus/lifecycle gating, quiet-tick reconciliation and the
/// editor re-entrancy guard.
/// Run with: cargo test --test refresh_tests
use notesync::lifecycle::activity_channel;
use notesync::{EngineConfig, EngineError, MockRemote, Note, NoteDraft, NoteSession};
use std::sync::Arc;
use std::time::Duration;

const PERIOD: Duration = Duration::from_secs(5);

fn sample_note(id: &str, title: &str) -> Note {
    NoteDraft::new(title, format!("{title} body"))
        .owner("owner-1")
        .into_note(id, chrono::Utc::now())
}

fn config() -> EngineConfig {
    EngineConfig::new().refresh_period(PERIOD)
}

#[tokio::test(start_paused = true)]
async fn test_focus_runs_loud_fetch_with_indicator_on_empty_store() {
    let remote = Arc::new(MockRemote::new());
    remote.set_latency(Duration::from_millis(100));
    remote
        .seed(vec![sample_note("a", "first"), sample_note("b", "second")])
        .await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    let mut loading = session.loading();
    session.focus_gained().await;

    loading.wait_for(|on| *on).await.unwrap();
    loading.wait_for(|on| !*on).await.unwrap();
    assert_eq!(session.snapshot().await.len(), 2);
    assert_eq!(remote.list_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_quiet_tick_applies_changed_collection() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();

    remote
        .seed(vec![sample_note("a", "first"), sample_note("b", "second")])
        .await;
    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;

    assert_eq!(session.snapshot().await.len(), 2);
    assert!(remote.list_calls() >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_fetch_produces_no_observable_mutation() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();
    visible.borrow_and_update();

    // Two more quiet fetches with an unchanged remote collection: the
    // results are discarded without re-publishing the store.
    tokio::time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;
    assert!(remote.list_calls() >= 3);
    assert!(!visible.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_background_stops_fetching_and_foreground_resumes() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();

    publisher.background();
    tokio::time::sleep(Duration::from_millis(20)).await;
    let while_backgrounded = remote.list_calls();

    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(remote.list_calls(), while_backgrounded);

    publisher.foreground();
    tokio::time::sleep(Duration::from_millis(100)).await;
    // Exactly one immediate quiet fetch on resume...
    assert_eq!(remote.list_calls(), while_backgrounded + 1);

    // ...and the repeating timer is running again.
    tokio::time::sleep(PERIOD + Duration::from_millis(200)).await;
    assert_eq!(remote.list_calls(), while_backgrounded + 2);
}

#[tokio::test(start_paused = true)]
async fn test_foreground_resume_without_focus_stays_idle() {
    let remote = Arc::new(MockRemote::new());
    let (publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    publisher.background();
    tokio::time::sleep(Duration::from_millis(20)).await;
    publisher.foreground();
    tokio::time::sleep(PERIOD * 2).await;

    assert_eq!(remote.list_calls(), 0);
    drop(session);
}

#[tokio::test(start_paused = true)]
async fn test_focus_lost_cancels_timer() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();

    session.focus_lost().await;
    let after_focus_lost = remote.list_calls();
    tokio::time::sleep(PERIOD * 3).await;
    assert_eq!(remote.list_calls(), after_focus_lost);
}

#[tokio::test(start_paused = true)]
async fn test_open_editor_skips_quiet_ticks() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();

    session.open_editor();
    let while_editing = remote.list_calls();
    remote
        .seed(vec![sample_note("a", "first"), sample_note("b", "second")])
        .await;
    tokio::time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;

    // The guard short-circuits before the remote call is even issued.
    assert_eq!(remote.list_calls(), while_editing);
    assert_eq!(session.snapshot().await.len(), 1);

    session.close_editor();
    tokio::time::sleep(PERIOD + Duration::from_secs(1)).await;
    assert_eq!(session.snapshot().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_loud_fetch_error_is_surfaced() {
    let remote = Arc::new(MockRemote::new());
    remote.fail_list(true);
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut errors = session.last_error();
    errors
        .wait_for(|error| matches!(error, Some(EngineError::Network(_))))
        .await
        .unwrap();

    session.dismiss_error();
    assert!(session.last_error().borrow().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_quiet_fetch_error_is_swallowed() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(vec![sample_note("a", "first")]).await;
    let (_publisher, activity_rx) = activity_channel();
    let session = NoteSession::start(remote.clone(), activity_rx, config());

    session.focus_gained().await;
    let mut visible = session.visible();
    visible.wait_for(|notes| notes.len() == 1).await.unwrap();

    remote.fail_list(true);
    tokio::time::sleep(PERIOD * 2 + Duration::from_secs(1)).await;

    // Failed quiet ticks happened, but neither an error nor a store change
    // was observable.
    assert!(remote.list_calls() >= 3);
    assert!(session.last_error().borrow().is_none());
    assert_eq!(session.snapshot().await.len(), 1);
}
