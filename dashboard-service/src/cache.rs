use std::{future::Future, time::Duration};

use tokio::{sync::Mutex, time::Instant};

struct CacheEntry<T> {
    value: T,
    fetched_at: Instant,
}

/// Single-slot memo with a fixed time-to-live.
///
/// The slot lock is held across the fetch, so concurrent misses wait for one
/// fetch instead of each hitting the data store. Errors are never stored.
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get_or_try_fetch<F, Fut, E>(&self, fetch: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                metrics::counter!("snapshot_cache_hits_total").increment(1);
                return Ok(entry.value.clone());
            }
        }

        let value = fetch().await?;
        *slot = Some(CacheEntry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn counted(calls: &AtomicUsize) -> Result<usize, String> {
        Ok(calls.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[tokio::test(start_paused = true)]
    async fn reuses_value_within_ttl() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(1));
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_once_ttl_has_elapsed() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(1));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(2));
        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(2));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let cache: TtlCache<usize> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let res = cache
            .get_or_try_fetch(|| async { Err::<usize, String>("store unreachable".to_string()) })
            .await;
        assert_eq!(res, Err("store unreachable".to_string()));

        assert_eq!(cache.get_or_try_fetch(|| counted(&calls)).await, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
