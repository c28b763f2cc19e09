//! Public key refresh background task.
//!
//! Fetches the authority's public key immediately at start, then again after
//! every refresh period. A successful fetch replaces the cached key; a failed
//! one is logged and the previous key stays in place until the next tick.
//! Failures are never retried early.
//!
//! # Graceful Shutdown
//!
//! The task exits when its cancellation token is cancelled, including while a
//! fetch is in flight or during the sleep between fetches.

use crate::auth::{KeyCache, PublicKeyFetcher};
use crate::observability::metrics::record_key_refresh;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

/// Fetch the key once and store it on success.
///
/// Returns `true` if the cache was updated.
pub async fn refresh_once(cache: &KeyCache, fetcher: &PublicKeyFetcher) -> bool {
    let start = Instant::now();

    match fetcher.fetch().await {
        Ok(key) => {
            cache.store(key).await;
            record_key_refresh(None, start.elapsed());
            info!(target: "s3o.task.key_refresh", "Refreshed s3o public key");
            true
        }
        Err(e) => {
            record_key_refresh(Some(e.error_type()), start.elapsed());
            warn!(
                target: "s3o.task.key_refresh",
                error = %e,
                error_type = e.error_type(),
                "Failed to refresh s3o public key, keeping previous key"
            );
            false
        }
    }
}

/// Run the key refresh loop until `cancel_token` is cancelled.
///
/// The refresh period is read from the cache before every sleep, so
/// `KeyCache::set_refresh_period` takes effect on the next tick.
pub async fn start_key_refresh(
    cache: Arc<KeyCache>,
    fetcher: PublicKeyFetcher,
    cancel_token: CancellationToken,
) {
    info!(
        target: "s3o.task.key_refresh",
        url = %fetcher.url(),
        "Key refresh task started"
    );

    loop {
        tokio::select! {
            _ = refresh_once(&cache, &fetcher) => {}
            _ = cancel_token.cancelled() => break,
        }

        let period = cache.refresh_period().await;

        tokio::select! {
            _ = tokio::time::sleep(period) => {}
            _ = cancel_token.cancelled() => break,
        }
    }

    info!(
        target: "s3o.task.key_refresh",
        "Key refresh task received shutdown signal, exiting"
    );
}

/// Spawn `start_key_refresh` on the current runtime.
pub fn spawn_key_refresh(
    cache: Arc<KeyCache>,
    fetcher: PublicKeyFetcher,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        start_key_refresh(cache, fetcher, cancel_token)
            .instrument(tracing::info_span!("s3o.task.key_refresh")),
    )
}
