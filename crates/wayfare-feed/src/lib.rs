//! # wayfare-feed
//!
//! Deterministic core of the Wayfare reel feed client.
//!
//! Everything in this crate is synchronous and IO-free: controllers take
//! signals (visibility changes, fetched pages, backend receipts) and
//! return the requests and playback instructions a driver should execute.
//! That keeps the feed rules testable without a backend or a clock, and
//! lets any host runtime supply the IO.

pub mod engagement;
pub mod mapper;
pub mod pagination;
pub mod playback;
pub mod screen;

pub use engagement::{EngagementController, LikePhase, LikeRequest, ToggleOutcome, ViewTracker};
pub use mapper::map_record;
pub use pagination::{FeedController, FeedState, PageRequest};
pub use playback::{
    PlaybackAction, PlaybackController, PlaybackIntent, PlaybackState, VisibilityDebouncer,
};
pub use screen::{
    FeedScreen, FeedScreenConfig, FeedSnapshot, LikeAttempt, PageOutcome, RefreshOutcome,
    VisibilityOutcome,
};
