//! # wayfare-client
//!
//! Embeddable reel feed session for Wayfare front-ends.
//!
//! A host (mobile shell, web bridge, test harness) builds an
//! [`ApiClient`], spawns a session with [`spawn_feed_session`] and talks
//! to it over typed channels: [`FeedIntent`]s in, [`FeedEvent`]s out.
//! The session owns all feed state; hosts render from snapshots and
//! treat events as change signals.

pub mod session;

use tracing_subscriber::{fmt, EnvFilter};

pub use session::{spawn_feed_session, FeedEvent, FeedIntent, SessionConfig};
pub use wayfare_api::{ApiClient, ApiConfig, MemoryTokenStore, TokenStore};
pub use wayfare_feed::screen::{FeedScreenConfig, FeedSnapshot};

/// Install the tracing subscriber for a host process.  Call once at
/// startup; safe to skip when the host already installed one.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("wayfare_client=debug,wayfare_feed=debug,wayfare_api=info,warn")
    });

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    tracing::info!("Wayfare feed client logging initialised");
}
