//! Canonical domain types shared by every Wayfare front-end.
//!
//! Backend records arrive loosely typed; the structs here are the
//! normalized shapes the rest of the client works with.  Everything
//! derives `Serialize` so snapshots can be handed directly to a host UI
//! layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReelId
// ---------------------------------------------------------------------------

/// Backend-issued reel identifier.  Opaque to the client: stable across
/// refetches, never reused, compared only for equality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReelId(pub String);

impl ReelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Truncated form for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ReelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Creator
// ---------------------------------------------------------------------------

/// The account that published a reel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub username: String,
    /// Always present after mapping; a placeholder URL fills the gap.
    pub avatar_url: String,
}

// ---------------------------------------------------------------------------
// EngagementCounts
// ---------------------------------------------------------------------------

/// Like / comment / share / view counters for one reel.  Counters never go
/// negative; each moves independently of the others.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounts {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub views: u64,
}

impl EngagementCounts {
    /// Bump the comment counter after the backend accepts a new comment.
    pub fn record_comment(&mut self) {
        self.comments = self.comments.saturating_add(1);
    }

    /// Bump the share counter after the host completes a share action.
    pub fn record_share(&mut self) {
        self.shares = self.shares.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// ReelCard
// ---------------------------------------------------------------------------

/// One fully normalized feed item.  Every field is populated after mapping;
/// optional fields mean "the backend genuinely has nothing", not "the
/// record was malformed".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReelCard {
    pub id: ReelId,
    pub title: String,
    /// Empty string when the record carries no description.
    pub description: String,
    /// Human-readable place label shown on the card chrome.
    pub location: String,
    pub thumbnail_url: String,
    /// Playable media URL; `None` renders as a static card.
    pub media_url: Option<String>,
    pub counts: EngagementCounts,
    /// Whether the signed-in viewer has liked this reel.
    pub viewer_has_liked: bool,
    pub creator: Option<Creator>,
    pub tags: Vec<String>,
    /// Media length in seconds; `0.0` when unknown.
    pub duration_secs: f64,
    pub created_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// FeedPage
// ---------------------------------------------------------------------------

/// One mapped backend page, ready to merge into feed state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedPage {
    /// Cards in backend order.
    pub cards: Vec<ReelCard>,
    /// Cursor for the page after this one, `None` on the first ever page
    /// only if the backend omitted it.
    pub next_cursor: Option<String>,
    /// Whether the backend claims more pages exist.
    pub has_more: bool,
}

// ---------------------------------------------------------------------------
// LikeReceipt
// ---------------------------------------------------------------------------

/// Authoritative outcome of a like toggle, as reported by the backend.
/// These values overwrite whatever the optimistic update guessed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeReceipt {
    pub likes: u64,
    pub liked: bool,
}
