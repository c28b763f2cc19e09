//! Cache for the authority's public key.
//!
//! Holds exactly one current key, replaced in place by the background
//! refresh task. Readers clone an `Arc` to the key under a short read lock,
//! so they always observe either the old or the new key in full, and never
//! wait on a fetch in progress.

use rsa::RsaPublicKey;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Default key refresh period in seconds (5 minutes).
pub const DEFAULT_REFRESH_PERIOD_SECONDS: u64 = 300;

/// Thread-safe holder of the current verification key and refresh period.
///
/// Constructed once at startup, then shared by `Arc` into every request
/// handling context and into the refresh task.
pub struct KeyCache {
    /// Current key; `None` until the first successful fetch.
    key: RwLock<Option<Arc<RsaPublicKey>>>,

    /// How long the refresh task sleeps between fetches.
    refresh_period: RwLock<Duration>,
}

impl KeyCache {
    /// Create an empty cache with the default refresh period.
    pub fn new() -> Self {
        Self::with_refresh_period(Duration::from_secs(DEFAULT_REFRESH_PERIOD_SECONDS))
    }

    /// Create an empty cache with a custom refresh period.
    pub fn with_refresh_period(refresh_period: Duration) -> Self {
        Self {
            key: RwLock::new(None),
            refresh_period: RwLock::new(refresh_period),
        }
    }

    /// Current key, or `None` if no fetch has ever succeeded.
    pub async fn get(&self) -> Option<Arc<RsaPublicKey>> {
        self.key.read().await.clone()
    }

    /// Atomically replace the current key.
    pub async fn store(&self, key: RsaPublicKey) {
        let mut current = self.key.write().await;
        let rotated = current.as_deref().is_some_and(|old| *old != key);
        *current = Some(Arc::new(key));
        tracing::debug!(target: "s3o.auth.key_cache", rotated, "Stored s3o public key");
    }

    /// Change how often the refresh task fetches the key.
    ///
    /// Takes effect on the task's next sleep; a sleep already in progress
    /// is not shortened or extended.
    pub async fn set_refresh_period(&self, period: Duration) {
        let mut current = self.refresh_period.write().await;
        *current = period;
        tracing::info!(
            target: "s3o.auth.key_cache",
            period_secs = period.as_secs_f64(),
            "Key refresh period changed"
        );
    }

    /// The refresh period the task will use for its next sleep.
    pub async fn refresh_period(&self) -> Duration {
        *self.refresh_period.read().await
    }
}

impl Default for KeyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use s3o_test_utils::test_keypair;

    #[tokio::test]
    async fn test_empty_cache_has_no_key() {
        let cache = KeyCache::new();
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_default_refresh_period_is_five_minutes() {
        let cache = KeyCache::default();
        assert_eq!(cache.refresh_period().await, Duration::from_secs(300));
    }

    #[tokio::test]
    async fn test_store_replaces_key() {
        let first = test_keypair(1).unwrap();
        let second = test_keypair(2).unwrap();
        let cache = KeyCache::new();

        cache.store(first.public_key().clone()).await;
        assert_eq!(cache.get().await.unwrap().as_ref(), first.public_key());

        cache.store(second.public_key().clone()).await;
        assert_eq!(cache.get().await.unwrap().as_ref(), second.public_key());
    }

    #[tokio::test]
    async fn test_reader_keeps_key_it_already_holds() {
        let first = test_keypair(1).unwrap();
        let second = test_keypair(2).unwrap();
        let cache = KeyCache::new();

        cache.store(first.public_key().clone()).await;
        let held = cache.get().await.unwrap();
        cache.store(second.public_key().clone()).await;

        assert_eq!(held.as_ref(), first.public_key());
    }

    #[tokio::test]
    async fn test_set_refresh_period() {
        let cache = KeyCache::with_refresh_period(Duration::from_secs(60));
        assert_eq!(cache.refresh_period().await, Duration::from_secs(60));

        cache.set_refresh_period(Duration::from_millis(250)).await;
        assert_eq!(cache.refresh_period().await, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_concurrent_readers_and_writer() {
        let first = test_keypair(1).unwrap();
        let second = test_keypair(2).unwrap();
        let cache = Arc::new(KeyCache::new());
        cache.store(first.public_key().clone()).await;

        let mut readers = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let first = first.public_key().clone();
            let second = second.public_key().clone();
            readers.push(tokio::spawn(async move {
                for _ in 0..100 {
                    let key = cache.get().await.unwrap();
                    assert!(key.as_ref() == &first || key.as_ref() == &second);
                }
            }));
        }

        for _ in 0..10 {
            cache.store(second.public_key().clone()).await;
            cache.store(first.public_key().clone()).await;
        }

        for reader in readers {
            reader.await.unwrap();
        }
    }
}
