//! Opaque auth token storage.
//!
//! The signed-in device holds a bearer token in whatever secure store the
//! host platform provides.  This crate only defines the seam: the client
//! snapshots the token once per request, and clears it when the backend
//! rejects it.

use std::sync::{PoisonError, RwLock};

/// Where the bearer token lives.  Implementations must be cheap to call;
/// the client reads the token on every request.
pub trait TokenStore: Send + Sync {
    /// Current token, if the viewer is signed in.
    fn load(&self) -> Option<String>;

    /// Replace the stored token after a sign-in.
    fn save(&self, token: &str);

    /// Drop the token.  Called on sign-out and when the backend answers
    /// 401, so a revoked credential is never retried.
    fn clear(&self);
}

/// Process-local token store.  Hosts that keep the token elsewhere
/// implement [`TokenStore`] themselves; tests use this one directly.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load(), None);

        store.save("jwt-abc");
        assert_eq!(store.load().as_deref(), Some("jwt-abc"));

        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_with_token() {
        let store = MemoryTokenStore::with_token("jwt-xyz");
        assert_eq!(store.load().as_deref(), Some("jwt-xyz"));
    }
}
