//! # wayfare-shared
//!
//! Canonical types, constants and the error taxonomy shared by the Wayfare
//! reel feed client crates.
//!
//! Nothing here performs IO.  The crate exists so the mapper, the feed
//! controllers and the HTTP collaborator all agree on one normalized shape
//! for reels and one classification for failures.

pub mod constants;
pub mod display;
pub mod types;

mod error;

pub use error::{FeedError, FeedErrorKind};
pub use types::*;
