use std::collections::HashMap;
use std::sync::PoisonError;
use std::sync::RwLock;

use chrono::Utc;

/// Tracks tokens invalidated before their natural expiry.
///
/// Each entry keeps the token's own expiry so it can be dropped once the
/// token would have been rejected anyway. A single lock guards the map, so a
/// revoke acknowledged to its caller is observed by every later lookup.
pub struct RevocationStore {
    entries: RwLock<HashMap<String, i64>>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Revoke a token until `expires_at` (Unix timestamp).
    ///
    /// Idempotent. Revoking a token already past expiry is a no-op: such a
    /// token is rejected on expiry grounds regardless. Expired entries are
    /// pruned opportunistically on the same write lock.
    pub fn revoke(&self, token: &str, expires_at: i64) {
        let now = Utc::now().timestamp();
        if expires_at <= now {
            return;
        }

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, exp| *exp > now);
        entries.insert(token.to_string(), expires_at);
    }

    /// Check whether a token has been revoked and is still within the window
    /// where that revocation matters.
    ///
    /// Unknown tokens and entries past their retained expiry are not revoked.
    pub fn is_revoked(&self, token: &str) -> bool {
        let now = Utc::now().timestamp();
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .is_some_and(|exp| *exp > now)
    }

    /// Drop entries whose retained expiry is at or before `now`.
    pub fn prune(&self, now: i64) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, exp| *exp > now);
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_revoke_and_lookup() {
        let store = RevocationStore::new();
        let expires_at = Utc::now().timestamp() + 3600;

        store.revoke("token-a", expires_at);

        assert!(store.is_revoked("token-a"));
        assert!(!store.is_revoked("token-b"));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let store = RevocationStore::new();
        let expires_at = Utc::now().timestamp() + 3600;

        store.revoke("token-a", expires_at);
        store.revoke("token-a", expires_at);

        assert!(store.is_revoked("token-a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_revoking_expired_token_is_noop() {
        let store = RevocationStore::new();
        let past = Utc::now().timestamp() - 10;

        store.revoke("token-a", past);

        assert!(!store.is_revoked("token-a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_prune_drops_only_expired_entries() {
        let store = RevocationStore::new();
        let now = Utc::now().timestamp();

        store.revoke("live", now + 3600);
        store.revoke("dying", now + 1);

        store.prune(now + 2);

        assert!(store.is_revoked("live"));
        assert!(!store.is_revoked("dying"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_revoke_and_lookup() {
        let store = Arc::new(RevocationStore::new());
        let expires_at = Utc::now().timestamp() + 3600;

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for j in 0..50 {
                        store.revoke(&format!("token-{}-{}", i, j), expires_at);
                    }
                })
            })
            .collect();

        for handle in writers {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8 * 50);
        assert!(store.is_revoked("token-0-0"));
        assert!(store.is_revoked("token-7-49"));
    }
}
