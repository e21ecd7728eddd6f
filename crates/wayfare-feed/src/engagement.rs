//! Engagement state: optimistic like toggling with backend reconciliation,
//! plus one-shot view tracking.
//!
//! A like toggle flips the card immediately so the UI never waits on the
//! network.  While the round trip is in flight further toggles for that
//! reel are rejected, which keeps reconciliation trivial: the backend
//! response either overwrites the guess with authoritative numbers or the
//! saved snapshot restores the exact pre-toggle state.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use wayfare_shared::{LikeReceipt, ReelCard, ReelId};

/// Lifecycle of the like control for one reel.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum LikePhase {
    /// No mutation attempted, or the last one rolled back.
    Idle,
    /// An optimistic mutation is in flight; further toggles are rejected.
    Pending,
    /// The last mutation was reconciled with backend counts.
    Settled,
}

/// Backend mutation the driver should execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    pub reel: ReelId,
    /// Liked state the viewer is asking for (already applied optimistically).
    pub liked: bool,
}

/// Outcome of a toggle attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Optimistic flip applied; the driver should send the request.
    Fired(LikeRequest),
    /// A mutation for this reel is already in flight; nothing changed.
    RejectedPending,
}

/// Pre-toggle values restored verbatim if the backend rejects the toggle.
#[derive(Debug, Clone, Copy)]
struct ToggleSnapshot {
    prior_liked: bool,
    prior_likes: u64,
}

#[derive(Debug, Clone)]
enum LikeState {
    Pending(ToggleSnapshot),
    Settled,
}

/// Per-screen like state machine.  Reels not present in the map are
/// [`LikePhase::Idle`].
#[derive(Debug, Clone, Default)]
pub struct EngagementController {
    states: HashMap<ReelId, LikeState>,
}

impl EngagementController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, id: &ReelId) -> LikePhase {
        match self.states.get(id) {
            Some(LikeState::Pending(_)) => LikePhase::Pending,
            Some(LikeState::Settled) => LikePhase::Settled,
            None => LikePhase::Idle,
        }
    }

    /// Toggle the viewer's like on `card`.  Applies the flip optimistically
    /// and hands back the request to execute, or rejects the toggle while
    /// one is already in flight.
    pub fn toggle_like(&mut self, card: &mut ReelCard) -> ToggleOutcome {
        if matches!(self.states.get(&card.id), Some(LikeState::Pending(_))) {
            debug!(reel = %card.id, "like toggle rejected: mutation in flight");
            return ToggleOutcome::RejectedPending;
        }

        let snapshot = ToggleSnapshot {
            prior_liked: card.viewer_has_liked,
            prior_likes: card.counts.likes,
        };
        if card.viewer_has_liked {
            card.counts.likes = card.counts.likes.saturating_sub(1);
        } else {
            card.counts.likes = card.counts.likes.saturating_add(1);
        }
        card.viewer_has_liked = !card.viewer_has_liked;
        self.states.insert(card.id.clone(), LikeState::Pending(snapshot));

        debug!(
            reel = %card.id,
            liked = card.viewer_has_liked,
            likes = card.counts.likes,
            "optimistic like applied"
        );
        ToggleOutcome::Fired(LikeRequest {
            reel: card.id.clone(),
            liked: card.viewer_has_liked,
        })
    }

    /// The backend confirmed the mutation.  Its counts overwrite whatever
    /// the optimistic update guessed.
    pub fn settle_like(&mut self, card: &mut ReelCard, receipt: LikeReceipt) {
        if !matches!(self.states.get(&card.id), Some(LikeState::Pending(_))) {
            warn!(reel = %card.id, "like receipt without a pending mutation, ignoring");
            return;
        }
        card.counts.likes = receipt.likes;
        card.viewer_has_liked = receipt.liked;
        self.states.insert(card.id.clone(), LikeState::Settled);
        debug!(
            reel = %card.id,
            likes = receipt.likes,
            liked = receipt.liked,
            "like settled with backend counts"
        );
    }

    /// The backend rejected the mutation.  Restores the exact pre-toggle
    /// flag and count and returns the reel to [`LikePhase::Idle`].
    pub fn roll_back_like(&mut self, card: &mut ReelCard) {
        match self.states.remove(&card.id) {
            Some(LikeState::Pending(snapshot)) => {
                card.viewer_has_liked = snapshot.prior_liked;
                card.counts.likes = snapshot.prior_likes;
                debug!(
                    reel = %card.id,
                    liked = card.viewer_has_liked,
                    likes = card.counts.likes,
                    "like rolled back to pre-toggle state"
                );
            }
            Some(other) => {
                self.states.insert(card.id.clone(), other);
                warn!(reel = %card.id, "rollback without a pending mutation, ignoring");
            }
            None => {
                warn!(reel = %card.id, "rollback without a pending mutation, ignoring");
            }
        }
    }
}

/// Tracks which reels were counted as viewed during this screen session,
/// so scrolling back over a reel never double-counts it.
#[derive(Debug, Clone, Default)]
pub struct ViewTracker {
    seen: HashSet<ReelId>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` on the first sighting only; the caller fires the
    /// view ping exactly then.
    pub fn mark_viewed(&mut self, id: &ReelId) -> bool {
        self.seen.insert(id.clone())
    }

    pub fn viewed_count(&self) -> usize {
        self.seen.len()
    }
}
