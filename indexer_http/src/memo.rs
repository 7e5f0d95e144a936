use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A process-wide, time-expiring memo of `getBlockRewards`/
/// `getSyncCommitteeRewards` responses, keyed on the primitive slot only
/// (spec §4.3, §5 "memoization caches"). A simple mutex-guarded map is
/// sufficient per the §9 re-architecture guidance.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((inserted_at, value)) if inserted_at.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(key, (Instant::now(), value));
    }

    /// Runs `compute` only if the key is absent or expired; otherwise
    /// returns the cached value without invoking it. This is the shape
    /// `getBlockRewards`/`getSyncCommitteeRewards` are built on (spec §8
    /// property 7: at most one upstream call per 10-minute window).
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<V, E>>,
    {
        if let Some(cached) = self.get(&key) {
            return Ok(cached);
        }
        let value = compute().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

pub const MEMO_TTL: Duration = Duration::from_secs(10 * 60);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn get_or_compute_calls_upstream_once() {
        let cache: TtlCache<u64, i32> = TtlCache::new(Duration::from_secs(600));
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            let result = cache
                .get_or_compute(5, || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<i32, ()>(99)
                    }
                })
                .await;
            assert_eq!(result.unwrap(), 99);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let cache: TtlCache<u64, i32> = TtlCache::new(Duration::from_millis(1));
        cache.insert(1, 10);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get(&1), None);
    }
}
