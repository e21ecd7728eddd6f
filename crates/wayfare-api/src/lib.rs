//! # wayfare-api
//!
//! HTTP collaborator for the Wayfare backend REST API.
//!
//! Wraps `reqwest` with the backend's `{success, data, error}` envelope,
//! bearer-token handling and the handful of reel endpoints the feed
//! client needs.  Payloads come back either typed (receipts) or as raw
//! JSON records for `wayfare-feed`'s mapper to normalize.

pub mod client;
pub mod config;
pub mod envelope;
pub mod token;

mod error;

pub use client::ApiClient;
pub use config::ApiConfig;
pub use envelope::{CommentReceipt, Envelope, RawFeedPage};
pub use error::ApiError;
pub use token::{MemoryTokenStore, TokenStore};
