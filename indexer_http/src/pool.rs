use sensitive_url::SensitiveUrl;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Which class of upstream node a call should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Deep historical state; used for epoch-scoped and historical-slot
    /// lookups.
    Archive,
    /// Head-adjacent state at higher throughput; promoted to `Archive` when
    /// the indexer has fallen far enough behind head (§4.2 "indexer-delayed").
    Full,
}

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub base_url: SensitiveUrl,
    pub concurrency: usize,
    pub retries: u32,
    pub base_delay: Duration,
}

/// A rate-limited upstream node: a base URL plus a counted semaphore
/// bounding in-flight requests to `concurrency`.
#[derive(Clone)]
pub struct Pool {
    pub config: PoolConfig,
    semaphore: Arc<Semaphore>,
}

impl Pool {
    pub fn new(config: PoolConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        Self { config, semaphore }
    }

    /// Acquires a permit. Held until dropped; release order is whatever
    /// tokio's semaphore picks, matching the "order of release is not
    /// guaranteed" contract in spec §4.2.
    pub async fn acquire(&self) -> tokio::sync::OwnedSemaphorePermit {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("pool semaphore is never closed")
    }

    pub fn base_url(&self) -> SensitiveUrl {
        self.config.base_url.clone()
    }
}

/// Two logical pools backing one upstream node pair: "archive" for deep
/// historical state, "full" for head-proximate state (spec §4.2).
#[derive(Clone)]
pub struct PoolPair {
    pub archive: Pool,
    pub full: Pool,
}

impl PoolPair {
    pub fn new(archive: PoolConfig, full: PoolConfig) -> Self {
        Self {
            archive: Pool::new(archive),
            full: Pool::new(full),
        }
    }

    pub fn get(&self, kind: PoolKind) -> &Pool {
        match kind {
            PoolKind::Archive => &self.archive,
            PoolKind::Full => &self.full,
        }
    }
}

/// `isIndexerDelayed`: `true` when the indexer has fallen more than 250
/// slots/epochs behind head, per spec §4.2. Callers that would prefer
/// `Full` should promote to `Archive` in that case.
pub fn is_indexer_delayed(current: u64, value: u64) -> bool {
    current.saturating_sub(value) > 250
}

/// Resolves the effective pool for a call, applying the delay-promotion
/// policy: a `Full`-preferring call promotes to `Archive` when delayed.
pub fn resolve_pool_kind(preferred: PoolKind, delayed: bool) -> PoolKind {
    match preferred {
        PoolKind::Full if delayed => PoolKind::Archive,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_threshold_is_250() {
        assert!(!is_indexer_delayed(1000, 751));
        assert!(is_indexer_delayed(1000, 749));
        assert!(!is_indexer_delayed(1000, 750));
    }

    #[test]
    fn full_promotes_to_archive_when_delayed() {
        assert_eq!(resolve_pool_kind(PoolKind::Full, true), PoolKind::Archive);
        assert_eq!(resolve_pool_kind(PoolKind::Full, false), PoolKind::Full);
        assert_eq!(resolve_pool_kind(PoolKind::Archive, true), PoolKind::Archive);
    }
}
