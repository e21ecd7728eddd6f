//! Feed session event loop with tokio mpsc command/notification pattern.
//!
//! One session per mounted feed screen.  The loop runs in a dedicated
//! tokio task: the host sends [`FeedIntent`]s in, the loop drives the
//! IO-free [`FeedScreen`] plus the [`ApiClient`], and emits [`FeedEvent`]s
//! out.  Hosts treat events as change signals and re-render from
//! snapshots.
//!
//! Backend calls run in spawned tasks that report back over an internal
//! channel.  Tearing the session down drops that channel's receiver, so a
//! late response dies in flight instead of touching dead state.

use std::time::Instant;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use wayfare_api::ApiClient;
use wayfare_feed::mapper::map_record;
use wayfare_feed::pagination::PageRequest;
use wayfare_feed::playback::PlaybackIntent;
use wayfare_feed::screen::{FeedScreen, FeedScreenConfig, FeedSnapshot};
use wayfare_feed::LikeAttempt;
use wayfare_shared::constants::CHANNEL_CAPACITY;
use wayfare_shared::{FeedError, FeedPage, LikeReceipt, ReelCard, ReelId};

// ---------------------------------------------------------------------------
// Command / notification types
// ---------------------------------------------------------------------------

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum FeedIntent {
    /// The host list crossed its trailing threshold.
    LoadMore,
    /// Clear a failed page load and try again.
    Retry,
    /// Pull-to-refresh: reload the feed from the top.
    Refresh,
    /// The most visible card changed (raw, pre-debounce).
    VisibleIndexHint(Option<usize>),
    /// Toggle the viewer's like on a reel.
    ToggleLike(ReelId),
    /// Submit a comment on a reel.
    SubmitComment { reel: ReelId, content: String },
    /// The host completed a native share action for a reel.
    ShareCompleted(ReelId),
    /// Fetch one reel's fresh record for a detail view.
    ReelDetails {
        reel: ReelId,
        reply: oneshot::Sender<Result<ReelCard, FeedError>>,
    },
    /// Toggle audio for the active reel and every one after.
    ToggleMute,
    /// Request a snapshot of the current feed state.
    Snapshot(oneshot::Sender<FeedSnapshot>),
    /// Tear the session down.
    Shutdown,
}

/// Notifications sent *from* the session task to the host.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FeedEvent {
    /// A page merged into the feed.
    PageLoaded {
        appended: usize,
        total: usize,
        exhausted: bool,
    },
    /// A page load failed; already-loaded cards are intact.
    LoadFailed { error: FeedError },
    /// Pause / play instructions for the host player.  Execute in order;
    /// when racing, the highest `seq` wins per card.
    Playback { intents: Vec<PlaybackIntent> },
    /// The viewer's mute toggle changed.
    MuteChanged {
        muted: bool,
        active_index: Option<usize>,
    },
    /// A like toggle was applied optimistically.
    LikeApplied {
        reel: ReelId,
        likes: u64,
        liked: bool,
    },
    /// The backend confirmed a like toggle with authoritative counts.
    LikeSettled {
        reel: ReelId,
        likes: u64,
        liked: bool,
    },
    /// A like toggle failed and was rolled back.  Toast-level.
    LikeFailed { reel: ReelId, error: FeedError },
    /// A like toggle was ignored because one is already in flight.
    LikeThrottled { reel: ReelId },
    /// The backend accepted a comment.
    CommentPosted { reel: ReelId, comments: u64 },
    /// Comment submission failed.  Toast-level.
    CommentFailed { reel: ReelId, error: FeedError },
    /// A completed share was recorded.
    ShareRecorded { reel: ReelId, shares: u64 },
}

/// Configuration for spawning a feed session.
pub struct SessionConfig {
    /// Screen tunables (page size, prefetch margin, settle debounce).
    pub screen: FeedScreenConfig,
    /// Capacity of the intent and event channels.
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            screen: FeedScreenConfig::default(),
            channel_capacity: CHANNEL_CAPACITY,
        }
    }
}

/// Result of one backend call running in a spawned task, stamped with the
/// fetch generation that started it.  A refresh bumps the generation, so
/// continuations belonging to the discarded feed are recognizably stale.
#[derive(Debug)]
struct TaskResult {
    generation: u64,
    outcome: TaskOutcome,
}

#[derive(Debug)]
enum TaskOutcome {
    Page(Result<FeedPage, FeedError>),
    Like {
        reel: ReelId,
        result: Result<LikeReceipt, FeedError>,
    },
    Comment {
        reel: ReelId,
        result: Result<(), FeedError>,
    },
}

/// Spawn the feed session in a background tokio task.
///
/// Returns channels for sending intents and receiving events, plus the
/// session id used in log lines.  The first page fetch starts
/// immediately; a mounted feed always loads.
pub fn spawn_feed_session(
    api: ApiClient,
    config: SessionConfig,
) -> (mpsc::Sender<FeedIntent>, mpsc::Receiver<FeedEvent>, Uuid) {
    let session_id = Uuid::new_v4();
    let (intent_tx, mut intent_rx) = mpsc::channel::<FeedIntent>(config.channel_capacity);
    let (event_tx, event_rx) = mpsc::channel::<FeedEvent>(config.channel_capacity);
    let (task_tx, mut task_rx) = mpsc::channel::<TaskResult>(config.channel_capacity);

    let mut screen = FeedScreen::new(config.screen);

    info!(session = %session_id, "Feed session started");

    tokio::spawn(async move {
        // Fetch generation for this screen's feed.  Refresh bumps it, so
        // results stamped with an older value belong to the discarded feed.
        let mut generation: u64 = 0;

        if let Some(request) = screen.request_initial_page() {
            spawn_page_fetch(&api, request, generation, &task_tx);
        }

        loop {
            let deadline = screen
                .next_visibility_deadline()
                .map(tokio::time::Instant::from_std);

            tokio::select! {
                // --- Incoming intents ---
                intent = intent_rx.recv() => {
                    match intent {
                        Some(FeedIntent::LoadMore) => {
                            if let Some(request) = screen.on_end_reached() {
                                spawn_page_fetch(&api, request, generation, &task_tx);
                            }
                        }
                        Some(FeedIntent::Retry) => {
                            if let Some(request) = screen.retry() {
                                spawn_page_fetch(&api, request, generation, &task_tx);
                            }
                        }
                        Some(FeedIntent::Refresh) => {
                            generation += 1;
                            let outcome = screen.refresh();
                            if let Some(pause) = outcome.playback {
                                let _ = event_tx
                                    .send(FeedEvent::Playback { intents: vec![pause] })
                                    .await;
                            }
                            if let Some(request) = outcome.fetch {
                                spawn_page_fetch(&api, request, generation, &task_tx);
                            }
                        }
                        Some(FeedIntent::VisibleIndexHint(index)) => {
                            screen.on_visible_index_hint(index, Instant::now());
                        }
                        Some(FeedIntent::ToggleLike(reel)) => {
                            match screen.toggle_like(&reel) {
                                LikeAttempt::Fired(request) => {
                                    if let Some(card) = screen.card_by_id(&request.reel) {
                                        let _ = event_tx
                                            .send(FeedEvent::LikeApplied {
                                                reel: request.reel.clone(),
                                                likes: card.counts.likes,
                                                liked: card.viewer_has_liked,
                                            })
                                            .await;
                                    }
                                    spawn_like_toggle(&api, request.reel, generation, &task_tx);
                                }
                                LikeAttempt::RejectedPending => {
                                    let _ = event_tx
                                        .send(FeedEvent::LikeThrottled { reel })
                                        .await;
                                }
                                LikeAttempt::UnknownReel => {}
                            }
                        }
                        Some(FeedIntent::SubmitComment { reel, content }) => {
                            let content = content.trim().to_string();
                            if content.is_empty() {
                                debug!(reel = %reel.short(), "ignoring empty comment");
                            } else {
                                spawn_comment_post(&api, reel, content, generation, &task_tx);
                            }
                        }
                        Some(FeedIntent::ShareCompleted(reel)) => {
                            if let Some(shares) = screen.record_share(&reel) {
                                let _ = event_tx
                                    .send(FeedEvent::ShareRecorded { reel, shares })
                                    .await;
                            }
                        }
                        Some(FeedIntent::ReelDetails { reel, reply }) => {
                            spawn_details_fetch(&api, reel, reply);
                        }
                        Some(FeedIntent::ToggleMute) => {
                            let muted = screen.toggle_mute();
                            let _ = event_tx
                                .send(FeedEvent::MuteChanged {
                                    muted,
                                    active_index: screen.active_index(),
                                })
                                .await;
                        }
                        Some(FeedIntent::Snapshot(reply)) => {
                            let _ = reply.send(screen.snapshot());
                        }
                        Some(FeedIntent::Shutdown) => {
                            info!(session = %session_id, "Feed session shutdown requested");
                            break;
                        }
                        None => {
                            // All senders dropped
                            info!(session = %session_id, "Intent channel closed, shutting down feed session");
                            break;
                        }
                    }
                }

                // --- Backend call results ---
                result = task_rx.recv() => {
                    // task_tx lives in this scope, so recv never yields None.
                    let Some(TaskResult { generation: stamped, outcome }) = result else {
                        continue
                    };
                    if stamped != generation {
                        debug!(
                            stamped,
                            current = generation,
                            "discarding backend result from before a refresh"
                        );
                        continue;
                    }
                    match outcome {
                        TaskOutcome::Page(Ok(page)) => {
                            let outcome = screen.apply_page(page);
                            let _ = event_tx
                                .send(FeedEvent::PageLoaded {
                                    appended: outcome.appended,
                                    total: screen.len(),
                                    exhausted: outcome.exhausted,
                                })
                                .await;
                            if !outcome.playback.is_empty() {
                                let _ = event_tx
                                    .send(FeedEvent::Playback { intents: outcome.playback })
                                    .await;
                            }
                            if let Some(reel) = outcome.view_ping {
                                spawn_view_ping(&api, reel);
                            }
                        }
                        TaskOutcome::Page(Err(error)) => {
                            screen.apply_page_failure(error.clone());
                            let _ = event_tx.send(FeedEvent::LoadFailed { error }).await;
                        }
                        TaskOutcome::Like { reel, result: Ok(receipt) } => {
                            if screen.settle_like(&reel, receipt) {
                                let _ = event_tx
                                    .send(FeedEvent::LikeSettled {
                                        reel,
                                        likes: receipt.likes,
                                        liked: receipt.liked,
                                    })
                                    .await;
                            }
                        }
                        TaskOutcome::Like { reel, result: Err(error) } => {
                            if screen.roll_back_like(&reel) {
                                let _ = event_tx.send(FeedEvent::LikeFailed { reel, error }).await;
                            } else {
                                warn!(reel = %reel.short(), "like failure for a reel no longer in the feed");
                            }
                        }
                        TaskOutcome::Comment { reel, result: Ok(()) } => {
                            if let Some(comments) = screen.record_comment_posted(&reel) {
                                let _ = event_tx
                                    .send(FeedEvent::CommentPosted { reel, comments })
                                    .await;
                            }
                        }
                        TaskOutcome::Comment { reel, result: Err(error) } => {
                            let _ = event_tx.send(FeedEvent::CommentFailed { reel, error }).await;
                        }
                    }
                }

                // --- Visibility dwell elapsed ---
                () = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)),
                    if deadline.is_some() =>
                {
                    let outcome = screen.poll_visibility(Instant::now());
                    if !outcome.playback.is_empty() {
                        let _ = event_tx
                            .send(FeedEvent::Playback { intents: outcome.playback })
                            .await;
                    }
                    if let Some(reel) = outcome.view_ping {
                        spawn_view_ping(&api, reel);
                    }
                    if let Some(request) = outcome.fetch {
                        spawn_page_fetch(&api, request, generation, &task_tx);
                    }
                }
            }
        }

        info!(session = %session_id, "Feed session terminated");
    });

    (intent_tx, event_rx, session_id)
}

// ---------------------------------------------------------------------------
// Backend call tasks
// ---------------------------------------------------------------------------

fn spawn_page_fetch(
    api: &ApiClient,
    request: PageRequest,
    generation: u64,
    results: &mpsc::Sender<TaskResult>,
) {
    let api = api.clone();
    let results = results.clone();
    tokio::spawn(async move {
        let result = fetch_page(&api, &request).await;
        // A dropped receiver means the session is gone; the late response
        // is discarded here.
        let _ = results
            .send(TaskResult {
                generation,
                outcome: TaskOutcome::Page(result),
            })
            .await;
    });
}

async fn fetch_page(api: &ApiClient, request: &PageRequest) -> Result<FeedPage, FeedError> {
    let raw = api
        .fetch_reels(request.cursor.as_deref(), request.limit)
        .await?;
    let cards = raw.reels.iter().map(map_record).collect();
    Ok(FeedPage {
        cards,
        next_cursor: raw.cursor,
        has_more: raw.has_more,
    })
}

fn spawn_like_toggle(
    api: &ApiClient,
    reel: ReelId,
    generation: u64,
    results: &mpsc::Sender<TaskResult>,
) {
    let api = api.clone();
    let results = results.clone();
    tokio::spawn(async move {
        let result = api.toggle_like(&reel).await.map_err(FeedError::from);
        let _ = results
            .send(TaskResult {
                generation,
                outcome: TaskOutcome::Like { reel, result },
            })
            .await;
    });
}

fn spawn_comment_post(
    api: &ApiClient,
    reel: ReelId,
    content: String,
    generation: u64,
    results: &mpsc::Sender<TaskResult>,
) {
    let api = api.clone();
    let results = results.clone();
    tokio::spawn(async move {
        let result = api
            .post_comment(&reel, &content)
            .await
            .map(|_| ())
            .map_err(FeedError::from);
        let _ = results
            .send(TaskResult {
                generation,
                outcome: TaskOutcome::Comment { reel, result },
            })
            .await;
    });
}

/// Detail fetches bypass session state entirely: the record goes straight
/// back to the requester, and a reply after the host gave up dies on the
/// dropped oneshot.
fn spawn_details_fetch(
    api: &ApiClient,
    reel: ReelId,
    reply: oneshot::Sender<Result<ReelCard, FeedError>>,
) {
    let api = api.clone();
    tokio::spawn(async move {
        let result = api
            .fetch_reel(&reel)
            .await
            .map(|raw| map_record(&raw))
            .map_err(FeedError::from);
        let _ = reply.send(result);
    });
}

/// View pings are fire-and-forget: failures are logged and never surface.
fn spawn_view_ping(api: &ApiClient, reel: ReelId) {
    let api = api.clone();
    tokio::spawn(async move {
        if let Err(error) = api.record_view(&reel).await {
            debug!(reel = %reel.short(), error = %error, "view ping failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use wayfare_api::{ApiConfig, MemoryTokenStore};

    #[derive(Default)]
    struct StubState {
        fail_next_page: AtomicBool,
        view_calls: AtomicUsize,
        front_page_requests: AtomicUsize,
        /// Hold the cursor="c1" response long enough for a refresh to land
        /// while it is in flight.
        delay_tail_page: AtomicBool,
        /// Serve a different feed to front-page requests after the first,
        /// so refreshed cards are distinguishable from the originals.
        fresh_after_refresh: AtomicBool,
    }

    async fn reels_page(
        State(state): State<Arc<StubState>>,
        Query(query): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if state.fail_next_page.swap(false, Ordering::SeqCst) {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false})),
            );
        }
        let body = match query.get("cursor").map(String::as_str) {
            None => {
                let serial = state.front_page_requests.fetch_add(1, Ordering::SeqCst);
                if serial > 0 && state.fresh_after_refresh.load(Ordering::SeqCst) {
                    let reels: Vec<Value> = (1..=2)
                        .map(|n| json!({"id": format!("f{n}"), "likes": 5}))
                        .collect();
                    json!({"success": true, "data": {"reels": reels, "cursor": "fc1", "has_more": true}})
                } else {
                    let reels: Vec<Value> = (1..=8)
                        .map(|n| json!({"id": format!("r{n}"), "likes": 10}))
                        .collect();
                    json!({"success": true, "data": {"reels": reels, "cursor": "c1", "has_more": true}})
                }
            }
            Some("c1") => {
                if state.delay_tail_page.load(Ordering::SeqCst) {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }
                // First id overlaps the previous page.
                let reels: Vec<Value> = (8..=11)
                    .map(|n| json!({"id": format!("r{n}"), "likes": 10}))
                    .collect();
                json!({"success": true, "data": {"reels": reels, "cursor": null, "has_more": false}})
            }
            Some("fc1") => {
                json!({"success": true, "data": {"reels": [json!({"id": "f3", "likes": 5})], "cursor": null, "has_more": false}})
            }
            Some(other) => panic!("unexpected cursor {other}"),
        };
        (StatusCode::OK, Json(body))
    }

    async fn toggle_like() -> Json<Value> {
        // Slow enough that a second toggle lands while this one is in
        // flight.
        tokio::time::sleep(Duration::from_millis(100)).await;
        Json(json!({"success": true, "data": {"likes": 100, "liked": true}}))
    }

    async fn post_comment() -> Json<Value> {
        Json(json!({"success": true, "data": {"id": "cm1", "content": "x"}}))
    }

    async fn record_view(State(state): State<Arc<StubState>>) -> Json<Value> {
        state.view_calls.fetch_add(1, Ordering::SeqCst);
        Json(json!({"success": true, "data": {"views": 1}}))
    }

    async fn reel_details(Path(id): Path<String>) -> Json<Value> {
        Json(json!({
            "success": true,
            "data": {
                "id": id,
                "title": "Alfama at dusk",
                "location": "Lisbon",
                "likes": 44,
                "views": 512,
                "creator": {"username": "ana"}
            }
        }))
    }

    async fn spawn_backend(state: Arc<StubState>) -> SocketAddr {
        let router = Router::new()
            .route("/api/v1/reels", get(reels_page))
            .route("/api/v1/reels/{id}", get(reel_details))
            .route("/api/v1/reels/{id}/like", post(toggle_like))
            .route("/api/v1/reels/{id}/comment", post(post_comment))
            .route("/api/v1/reels/{id}/view", post(record_view))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    async fn spawn_session(
        addr: SocketAddr,
    ) -> (mpsc::Sender<FeedIntent>, mpsc::Receiver<FeedEvent>) {
        let api = ApiClient::new(
            ApiConfig {
                base_url: format!("http://{addr}/api/v1"),
                ..ApiConfig::default()
            },
            Arc::new(MemoryTokenStore::with_token("jwt-test")),
        )
        .unwrap();
        let config = SessionConfig {
            screen: FeedScreenConfig {
                page_size: 10,
                prefetch_margin: 3,
                settle_debounce: Duration::from_millis(30),
            },
            ..SessionConfig::default()
        };
        let (intents, events, _id) = spawn_feed_session(api, config);
        (intents, events)
    }

    async fn next_event(events: &mut mpsc::Receiver<FeedEvent>) -> FeedEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn assert_no_event(events: &mut mpsc::Receiver<FeedEvent>) {
        let result = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(result.is_err(), "expected silence, got {result:?}");
    }

    async fn snapshot(intents: &mpsc::Sender<FeedIntent>) -> FeedSnapshot {
        let (tx, rx) = oneshot::channel();
        intents.send(FeedIntent::Snapshot(tx)).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("timed out waiting for snapshot")
            .expect("session dropped the snapshot request")
    }

    #[tokio::test]
    async fn test_session_loads_paginates_and_exhausts() {
        let addr = spawn_backend(Arc::new(StubState::default())).await;
        let (intents, mut events) = spawn_session(addr).await;

        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 8, total: 8, exhausted: false }
        );
        // The top reel auto-activates.
        match next_event(&mut events).await {
            FeedEvent::Playback { intents } => {
                assert_eq!(intents.len(), 1);
                assert_eq!(intents[0].index, 0);
            }
            other => panic!("expected playback, got {other:?}"),
        }

        intents.send(FeedIntent::LoadMore).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 3, total: 11, exhausted: true }
        );

        let view = snapshot(&intents).await;
        assert_eq!(view.cards.len(), 11);
        assert!(view.exhausted);
        assert_eq!(view.cards[0].id.as_str(), "r1");
        assert_eq!(view.cards[10].id.as_str(), "r11");

        // Exhausted: further triggers stay silent.
        intents.send(FeedIntent::LoadMore).await.unwrap();
        assert_no_event(&mut events).await;
    }

    #[tokio::test]
    async fn test_like_applied_throttled_then_settled() {
        let addr = spawn_backend(Arc::new(StubState::default())).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded
        next_event(&mut events).await; // Playback

        let reel = ReelId::new("r1");
        intents.send(FeedIntent::ToggleLike(reel.clone())).await.unwrap();
        intents.send(FeedIntent::ToggleLike(reel.clone())).await.unwrap();

        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::LikeApplied { reel: reel.clone(), likes: 11, liked: true }
        );
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::LikeThrottled { reel: reel.clone() }
        );
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::LikeSettled { reel: reel.clone(), likes: 100, liked: true }
        );

        // Settled accepts the next toggle, starting from backend numbers.
        intents.send(FeedIntent::ToggleLike(reel.clone())).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::LikeApplied { reel, likes: 99, liked: false }
        );
    }

    #[tokio::test]
    async fn test_failed_first_page_then_retry() {
        let state = Arc::new(StubState::default());
        state.fail_next_page.store(true, Ordering::SeqCst);
        let addr = spawn_backend(state).await;
        let (intents, mut events) = spawn_session(addr).await;

        match next_event(&mut events).await {
            FeedEvent::LoadFailed { error } => assert!(error.is_recoverable()),
            other => panic!("expected load failure, got {other:?}"),
        }
        let view = snapshot(&intents).await;
        assert!(view.error.is_some());
        assert!(view.cards.is_empty());

        intents.send(FeedIntent::Retry).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 8, total: 8, exhausted: false }
        );
        assert!(snapshot(&intents).await.error.is_none());
    }

    #[tokio::test]
    async fn test_visibility_switches_playback_and_counts_views_once() {
        let state = Arc::new(StubState::default());
        let addr = spawn_backend(state.clone()).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded
        next_event(&mut events).await; // Playback for index 0

        intents
            .send(FeedIntent::VisibleIndexHint(Some(2)))
            .await
            .unwrap();
        match next_event(&mut events).await {
            FeedEvent::Playback { intents } => {
                assert_eq!(intents.len(), 2);
                assert_eq!(intents[0].index, 0);
                assert_eq!(intents[1].index, 2);
                assert!(intents[1].seq > intents[0].seq);
            }
            other => panic!("expected playback, got {other:?}"),
        }

        // r1 on mount plus r3 now; both fire-and-forget pings land.
        for _ in 0..50 {
            if state.view_calls.load(Ordering::SeqCst) == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.view_calls.load(Ordering::SeqCst), 2);

        // Repeating the same hint changes nothing.
        intents
            .send(FeedIntent::VisibleIndexHint(Some(2)))
            .await
            .unwrap();
        assert_no_event(&mut events).await;
        assert_eq!(state.view_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_comment_share_and_mute_events() {
        let addr = spawn_backend(Arc::new(StubState::default())).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded
        next_event(&mut events).await; // Playback

        let reel = ReelId::new("r2");
        intents
            .send(FeedIntent::SubmitComment { reel: reel.clone(), content: "   ".into() })
            .await
            .unwrap();
        intents
            .send(FeedIntent::SubmitComment { reel: reel.clone(), content: "great spot".into() })
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::CommentPosted { reel: reel.clone(), comments: 1 }
        );

        intents
            .send(FeedIntent::ShareCompleted(reel.clone()))
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::ShareRecorded { reel, shares: 1 }
        );

        intents.send(FeedIntent::ToggleMute).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::MuteChanged { muted: true, active_index: Some(0) }
        );

        intents.send(FeedIntent::Shutdown).await.unwrap();
        let closed = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if events.recv().await.is_none() {
                    break;
                }
            }
        })
        .await;
        assert!(closed.is_ok(), "event channel should close after shutdown");
    }

    #[tokio::test]
    async fn test_refresh_discards_in_flight_page() {
        let state = Arc::new(StubState::default());
        state.delay_tail_page.store(true, Ordering::SeqCst);
        state.fresh_after_refresh.store(true, Ordering::SeqCst);
        let addr = spawn_backend(state).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded (r1..r8)
        next_event(&mut events).await; // Playback

        // The tail fetch stalls at the stub; refresh lands while it is
        // still in flight.
        intents.send(FeedIntent::LoadMore).await.unwrap();
        intents.send(FeedIntent::Refresh).await.unwrap();

        // Pause for the reel that was playing.
        match next_event(&mut events).await {
            FeedEvent::Playback { intents } => assert_eq!(intents.len(), 1),
            other => panic!("expected playback, got {other:?}"),
        }
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 2, total: 2, exhausted: false }
        );
        next_event(&mut events).await; // Playback for the fresh top reel

        // Let the stale tail page arrive; it belongs to the old generation
        // and must change nothing.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_no_event(&mut events).await;
        let view = snapshot(&intents).await;
        let ids: Vec<&str> = view.cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["f1", "f2"]);
        assert!(!view.exhausted);

        // Pagination of the refreshed feed still works from its own cursor.
        intents.send(FeedIntent::LoadMore).await.unwrap();
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 1, total: 3, exhausted: true }
        );
    }

    #[tokio::test]
    async fn test_reel_details_fetch_maps_record() {
        let addr = spawn_backend(Arc::new(StubState::default())).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded
        next_event(&mut events).await; // Playback

        let (tx, rx) = oneshot::channel();
        intents
            .send(FeedIntent::ReelDetails { reel: ReelId::new("r3"), reply: tx })
            .await
            .unwrap();
        let card = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("timed out waiting for details")
            .expect("session dropped the details request")
            .expect("details fetch failed");
        assert_eq!(card.id.as_str(), "r3");
        assert_eq!(card.title, "Alfama at dusk");
        assert_eq!(card.location, "Lisbon");
        assert_eq!(card.counts.likes, 44);
        assert_eq!(card.counts.views, 512);
        assert_eq!(card.creator.unwrap().username, "ana");
    }

    #[tokio::test]
    async fn test_refresh_reloads_from_top() {
        let addr = spawn_backend(Arc::new(StubState::default())).await;
        let (intents, mut events) = spawn_session(addr).await;
        next_event(&mut events).await; // PageLoaded
        next_event(&mut events).await; // Playback

        intents.send(FeedIntent::LoadMore).await.unwrap();
        next_event(&mut events).await; // PageLoaded, feed now exhausted

        intents.send(FeedIntent::Refresh).await.unwrap();
        // Pause for the reel that was playing.
        match next_event(&mut events).await {
            FeedEvent::Playback { intents } => assert_eq!(intents.len(), 1),
            other => panic!("expected playback, got {other:?}"),
        }
        assert_eq!(
            next_event(&mut events).await,
            FeedEvent::PageLoaded { appended: 8, total: 8, exhausted: false }
        );
        // Fresh cards re-activate from the top.
        match next_event(&mut events).await {
            FeedEvent::Playback { intents } => assert_eq!(intents[0].index, 0),
            other => panic!("expected playback, got {other:?}"),
        }
        let view = snapshot(&intents).await;
        assert_eq!(view.cards.len(), 8);
        assert!(!view.exhausted);
    }
}
