use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error classification surfaced to hosts.  Only the kind drives
/// UI decisions; the detail string is for logs and toasts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FeedErrorKind {
    /// Transport failure, timeout, non-2xx status, or a `success: false`
    /// envelope.  Recoverable: the host may offer a retry.
    NetworkOrServer,

    /// A backend record could not be interpreted at all.  The mapper
    /// defaults field-by-field instead of failing, so this kind marks
    /// payloads broken above the record level.
    MalformedRecord,

    /// An internal state transition was about to break an invariant.
    /// Indicates a client bug, not a backend problem.
    StateInvariantViolation,
}

/// A feed-level error carried in screen state and emitted to hosts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct FeedError {
    pub kind: FeedErrorKind,
    pub detail: String,
}

impl FeedError {
    pub fn new(kind: FeedErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::NetworkOrServer, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::MalformedRecord, detail)
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::new(FeedErrorKind::StateInvariantViolation, detail)
    }

    /// Whether the host should offer a retry affordance.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind, FeedErrorKind::NetworkOrServer)
    }
}
