//! Visibility-driven playback.
//!
//! At most one reel plays at a time.  The host list reports which card is
//! most visible; [`VisibilityDebouncer`] makes fast flicks settle before
//! anything reacts, and [`PlaybackController`] turns committed changes
//! into pause / play instructions.
//!
//! Instructions carry a monotonically increasing sequence number.  A host
//! that executes them asynchronously must let the highest sequence win and
//! drop anything older, so a stale play can never resurrect a reel that
//! was paused afterwards.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

/// What the host player should do with one card slot.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackAction {
    Play,
    Pause,
}

/// One playback instruction for the host.  Newest `seq` wins.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackIntent {
    pub seq: u64,
    /// Position of the card in the feed.
    pub index: usize,
    pub action: PlaybackAction,
    /// Audio state the player should apply while executing this intent.
    pub muted: bool,
}

/// Read-only playback state exposed through snapshots.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Index of the reel currently playing, if any.
    pub active_index: Option<usize>,
    /// Viewer-chosen mute toggle, carried across card changes.
    pub muted: bool,
}

/// Owns the single-active-reel invariant.
#[derive(Debug, Clone, Default)]
pub struct PlaybackController {
    state: PlaybackState,
    next_seq: u64,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.active_index
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    /// Apply a committed visibility change.  Indices at or past `cards_len`
    /// are treated as "nothing visible".  Returns the pause / play
    /// instructions the host should execute, oldest first.
    pub fn on_visible_index_changed(
        &mut self,
        index: Option<usize>,
        cards_len: usize,
    ) -> Vec<PlaybackIntent> {
        let target = index.filter(|i| *i < cards_len);
        let previous = self.state.active_index;
        if target == previous {
            return Vec::new();
        }
        self.state.active_index = target;

        let mut intents = Vec::new();
        if let Some(prev) = previous {
            intents.push(self.intent(prev, PlaybackAction::Pause));
        }
        if let Some(next) = target {
            intents.push(self.intent(next, PlaybackAction::Play));
        }
        debug!(from = ?previous, to = ?target, "active reel changed");
        intents
    }

    /// Re-check the active index after the card collection changed size.
    /// Returns a pause instruction if the active card no longer exists.
    pub fn clamp_to(&mut self, cards_len: usize) -> Option<PlaybackIntent> {
        let active = self.state.active_index?;
        if active < cards_len {
            return None;
        }
        self.state.active_index = None;
        debug!(index = active, cards_len, "active reel fell out of range");
        Some(self.intent(active, PlaybackAction::Pause))
    }

    /// Flip the viewer's mute toggle.  Returns the new state; the host
    /// applies it to whichever reel is active now and every one after.
    pub fn toggle_mute(&mut self) -> bool {
        self.state.muted = !self.state.muted;
        debug!(muted = self.state.muted, "mute toggled");
        self.state.muted
    }

    fn intent(&mut self, index: usize, action: PlaybackAction) -> PlaybackIntent {
        self.next_seq += 1;
        PlaybackIntent {
            seq: self.next_seq,
            index,
            action,
            muted: self.state.muted,
        }
    }
}

/// A raw visibility signal waiting out its dwell period.
#[derive(Debug, Clone, Copy)]
struct PendingSignal {
    /// `None` means "no card is sufficiently visible".
    index: Option<usize>,
    since: Instant,
}

/// Debounces raw most-visible reports so fast flings skip intermediate
/// cards without ever starting their players.
///
/// The newest signal always replaces a pending one (its dwell restarts);
/// a signal equal to the committed index cancels the pending one instead.
#[derive(Debug, Clone)]
pub struct VisibilityDebouncer {
    settle: Duration,
    pending: Option<PendingSignal>,
    committed: Option<usize>,
}

impl VisibilityDebouncer {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            pending: None,
            committed: None,
        }
    }

    /// Record the latest raw signal.  Returns the instant at which the
    /// signal becomes committable, or `None` when nothing is pending.
    pub fn observe(&mut self, index: Option<usize>, now: Instant) -> Option<Instant> {
        if let Some(pending) = &self.pending {
            if pending.index == index {
                // Same candidate still dwelling, keep its original clock.
                return Some(pending.since + self.settle);
            }
        }
        if index == self.committed {
            // Flicked away and back before anything settled.
            self.pending = None;
            return None;
        }
        self.pending = Some(PendingSignal { index, since: now });
        Some(now + self.settle)
    }

    /// Commit the pending signal once it has dwelled long enough.
    /// The outer `Option` is "did anything commit"; the inner one is the
    /// committed visible index.
    pub fn poll_commit(&mut self, now: Instant) -> Option<Option<usize>> {
        let pending = self.pending.as_ref()?;
        if now.duration_since(pending.since) < self.settle {
            return None;
        }
        let index = pending.index;
        self.pending = None;
        self.committed = index;
        Some(index)
    }

    /// When the current pending signal will become committable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.since + self.settle)
    }

    pub fn committed(&self) -> Option<usize> {
        self.committed
    }

    /// Adopt an index decided outside the debounce path, such as the
    /// automatic activation of the first card.  Discards any pending
    /// signal for the same index.
    pub fn sync_committed(&mut self, index: Option<usize>) {
        if let Some(pending) = &self.pending {
            if pending.index == index {
                self.pending = None;
            }
        }
        self.committed = index;
    }
}
