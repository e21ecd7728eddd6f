//! Headless feed screen.
//!
//! Composition root a front-end embeds: owns the pagination, playback and
//! engagement controllers, applies the shell rules (debounced visibility
//! commits, trailing-threshold prefetch, one view ping per reel) and hands
//! read-only [`FeedSnapshot`]s to the render layer.  State is only ever
//! changed through controller methods; the screen itself performs no IO
//! and returns request values for a driver to execute.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use wayfare_shared::constants::{
    DEFAULT_PAGE_SIZE, SETTLE_DEBOUNCE_MS, TRAILING_FETCH_THRESHOLD,
};
use wayfare_shared::{FeedError, FeedPage, LikeReceipt, ReelCard, ReelId};

use crate::engagement::{EngagementController, LikePhase, LikeRequest, ToggleOutcome, ViewTracker};
use crate::pagination::{FeedController, FeedState, PageRequest};
use crate::playback::{PlaybackController, PlaybackIntent, VisibilityDebouncer};

/// Tunables a host may override before mounting the screen.
#[derive(Debug, Clone)]
pub struct FeedScreenConfig {
    /// Reels requested per page.
    pub page_size: u32,
    /// Remaining-card threshold at which the next page is prefetched.
    pub prefetch_margin: usize,
    /// Dwell before a visibility candidate becomes the active reel.
    pub settle_debounce: Duration,
}

impl Default for FeedScreenConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_margin: TRAILING_FETCH_THRESHOLD,
            settle_debounce: Duration::from_millis(SETTLE_DEBOUNCE_MS),
        }
    }
}

/// Read-only view of the screen, cheap to clone and serialize for a host
/// render pass.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub cards: Vec<ReelCard>,
    pub loading: bool,
    pub exhausted: bool,
    /// Terminal empty feed: render the empty state, not a spinner.
    pub empty: bool,
    pub error: Option<FeedError>,
    pub active_index: Option<usize>,
    pub muted: bool,
}

/// Effects of merging one fetched page.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    /// Cards actually appended after de-duplication.
    pub appended: usize,
    pub exhausted: bool,
    /// Pause / play instructions, present when the first cards arrived and
    /// the top reel auto-activated.
    pub playback: Vec<PlaybackIntent>,
    /// Reel whose view ping should fire now.
    pub view_ping: Option<ReelId>,
}

/// Effects of a committed visibility change.
#[derive(Debug, Clone, Default)]
pub struct VisibilityOutcome {
    pub playback: Vec<PlaybackIntent>,
    pub view_ping: Option<ReelId>,
    /// Prefetch triggered by settling close to the feed tail.
    pub fetch: Option<PageRequest>,
}

/// Effects of starting a pull-to-refresh.
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    /// Pause for the previously active reel, if one was playing.
    pub playback: Option<PlaybackIntent>,
    pub fetch: Option<PageRequest>,
}

/// Outcome of a like toggle routed through the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeAttempt {
    /// Optimistic flip applied; execute the request.
    Fired(LikeRequest),
    /// A mutation for this reel is already in flight.
    RejectedPending,
    /// The reel is not part of this feed.
    UnknownReel,
}

pub struct FeedScreen {
    config: FeedScreenConfig,
    feed: FeedController,
    playback: PlaybackController,
    engagement: EngagementController,
    views: ViewTracker,
    debouncer: VisibilityDebouncer,
}

impl FeedScreen {
    pub fn new(config: FeedScreenConfig) -> Self {
        let feed = FeedController::new(config.page_size);
        let debouncer = VisibilityDebouncer::new(config.settle_debounce);
        Self {
            config,
            feed,
            playback: PlaybackController::new(),
            engagement: EngagementController::new(),
            views: ViewTracker::new(),
            debouncer,
        }
    }

    // ------------------------------------------------------------------
    // Pagination
    // ------------------------------------------------------------------

    /// First fetch after mounting.
    pub fn request_initial_page(&mut self) -> Option<PageRequest> {
        self.feed.next_page_request()
    }

    /// The host list crossed its trailing threshold.
    pub fn on_end_reached(&mut self) -> Option<PageRequest> {
        self.feed.next_page_request()
    }

    /// Clear a failed load and ask again.
    pub fn retry(&mut self) -> Option<PageRequest> {
        self.feed.retry()
    }

    /// Pull-to-refresh: drop all feed and engagement state, pause whatever
    /// was playing and fetch the first page again.  The viewer's mute
    /// choice and already-counted views survive.
    pub fn refresh(&mut self) -> RefreshOutcome {
        self.feed = FeedController::new(self.config.page_size);
        self.engagement = EngagementController::new();
        self.debouncer = VisibilityDebouncer::new(self.config.settle_debounce);
        let playback = self.playback.clamp_to(0);
        debug!("feed refresh started");
        RefreshOutcome {
            playback,
            fetch: self.feed.next_page_request(),
        }
    }

    /// Merge one fetched page.  When the very first cards arrive the top
    /// reel activates without waiting for a visibility signal.
    pub fn apply_page(&mut self, page: FeedPage) -> PageOutcome {
        let was_empty = self.feed.is_empty();
        let appended = self.feed.apply_page(page);

        let mut outcome = PageOutcome {
            appended,
            exhausted: self.feed.state().exhausted,
            ..PageOutcome::default()
        };
        if was_empty && appended > 0 {
            outcome.playback = self.playback.on_visible_index_changed(Some(0), self.feed.len());
            self.debouncer.sync_committed(Some(0));
            outcome.view_ping = self.view_ping_for_active();
        }
        outcome
    }

    pub fn apply_page_failure(&mut self, error: FeedError) {
        self.feed.apply_failure(error);
    }

    // ------------------------------------------------------------------
    // Visibility and playback
    // ------------------------------------------------------------------

    /// Raw most-visible signal from the host list, pre-debounce.  Returns
    /// the deadline at which [`FeedScreen::poll_visibility`] should next
    /// run, if a candidate is now pending.
    pub fn on_visible_index_hint(&mut self, index: Option<usize>, now: Instant) -> Option<Instant> {
        self.debouncer.observe(index, now)
    }

    /// When the pending visibility candidate becomes committable.
    pub fn next_visibility_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    /// Commit the pending visibility candidate if its dwell elapsed, and
    /// apply the consequences: playback switch, view ping, tail prefetch.
    pub fn poll_visibility(&mut self, now: Instant) -> VisibilityOutcome {
        let Some(committed) = self.debouncer.poll_commit(now) else {
            return VisibilityOutcome::default();
        };

        let playback = self
            .playback
            .on_visible_index_changed(committed, self.feed.len());
        let view_ping = if playback.is_empty() {
            None
        } else {
            self.view_ping_for_active()
        };
        let fetch = match self.playback.active_index() {
            Some(index) if self.near_tail(index) => self.feed.next_page_request(),
            _ => None,
        };
        VisibilityOutcome {
            playback,
            view_ping,
            fetch,
        }
    }

    /// Flip the viewer's mute toggle.
    pub fn toggle_mute(&mut self) -> bool {
        self.playback.toggle_mute()
    }

    fn near_tail(&self, index: usize) -> bool {
        self.feed.len().saturating_sub(index + 1) < self.config.prefetch_margin
    }

    fn view_ping_for_active(&mut self) -> Option<ReelId> {
        let index = self.playback.active_index()?;
        let id = self.feed.card(index)?.id.clone();
        self.views.mark_viewed(&id).then_some(id)
    }

    // ------------------------------------------------------------------
    // Engagement
    // ------------------------------------------------------------------

    pub fn toggle_like(&mut self, id: &ReelId) -> LikeAttempt {
        let Some(card) = self.feed.card_mut_by_id(id) else {
            warn!(reel = %id, "like toggle for a reel not in this feed");
            return LikeAttempt::UnknownReel;
        };
        match self.engagement.toggle_like(card) {
            ToggleOutcome::Fired(request) => LikeAttempt::Fired(request),
            ToggleOutcome::RejectedPending => LikeAttempt::RejectedPending,
        }
    }

    /// Apply the backend's authoritative like receipt.  Returns `false`
    /// for reels not in this feed.
    pub fn settle_like(&mut self, id: &ReelId, receipt: LikeReceipt) -> bool {
        let Some(card) = self.feed.card_mut_by_id(id) else {
            return false;
        };
        self.engagement.settle_like(card, receipt);
        true
    }

    /// Roll a failed like mutation back to its pre-toggle state.
    pub fn roll_back_like(&mut self, id: &ReelId) -> bool {
        let Some(card) = self.feed.card_mut_by_id(id) else {
            return false;
        };
        self.engagement.roll_back_like(card);
        true
    }

    /// The backend accepted a new comment; bump the counter.  Returns the
    /// new count, or `None` for unknown reels.
    pub fn record_comment_posted(&mut self, id: &ReelId) -> Option<u64> {
        let card = self.feed.card_mut_by_id(id)?;
        card.counts.record_comment();
        Some(card.counts.comments)
    }

    /// The host completed a share action; bump the counter.
    pub fn record_share(&mut self, id: &ReelId) -> Option<u64> {
        let card = self.feed.card_mut_by_id(id)?;
        card.counts.record_share();
        Some(card.counts.shares)
    }

    pub fn like_phase(&self, id: &ReelId) -> LikePhase {
        self.engagement.phase(id)
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn state(&self) -> &FeedState {
        self.feed.state()
    }

    pub fn len(&self) -> usize {
        self.feed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feed.is_empty()
    }

    pub fn card_by_id(&self, id: &ReelId) -> Option<&ReelCard> {
        self.feed.cards().iter().find(|card| &card.id == id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.playback.active_index()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.feed.state();
        FeedSnapshot {
            cards: state.cards.clone(),
            loading: state.loading,
            exhausted: state.exhausted,
            empty: self.feed.is_empty_terminal(),
            error: state.error.clone(),
            active_index: self.playback.active_index(),
            muted: self.playback.is_muted(),
        }
    }
}

impl Default for FeedScreen {
    fn default() -> Self {
        Self::new(FeedScreenConfig::default())
    }
}
