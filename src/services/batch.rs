// src/services/batch.rs

//! Quote batch cache.
//!
//! Owns the working set of quotes. The batch is read from storage at
//! startup and replaced wholesale only by a fully successful refetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use futures::future::join_all;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{AppError, Result};
use crate::models::{Batch, QuoteRecord};
use crate::services::notify::Notifier;
use crate::services::provider::QuoteProvider;
use crate::storage::{BATCH_KEY, PersistentStore};

/// Default number of quotes per batch.
pub const DEFAULT_BATCH_SIZE: usize = 40;

/// Message shown when a refetch fails.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load quotes";

/// Where the batch returned by [`QuoteBatchCache::ensure_loaded`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    /// Read from storage
    Cache,
    /// Fetched from the provider because storage was empty
    Fetched,
}

/// Result of the startup load.
#[derive(Debug, Clone)]
pub struct LoadedBatch {
    pub batch: Batch,
    pub source: BatchSource,
}

/// Clears the in-flight flag on every exit path, including cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cache of the current quote batch.
pub struct QuoteBatchCache {
    store: PersistentStore,
    provider: Arc<dyn QuoteProvider>,
    notifier: Arc<dyn Notifier>,
    batch: RwLock<Batch>,
    in_flight: AtomicBool,
    batch_size: usize,
}

impl QuoteBatchCache {
    /// Create an empty cache.
    pub fn new(
        store: PersistentStore,
        provider: Arc<dyn QuoteProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            provider,
            notifier,
            batch: RwLock::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the number of quotes fetched by [`Self::ensure_loaded`].
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Copy of the current in-memory batch.
    pub fn batch(&self) -> Batch {
        self.batch
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.batch
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a refetch is pending.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn replace(&self, batch: Batch) {
        *self
            .batch
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = batch;
    }

    /// Read the persisted batch, empty if absent or malformed.
    pub async fn load_or_empty(&self) -> Batch {
        let batch: Batch = self.store.load(BATCH_KEY).await.unwrap_or_default();
        log::debug!("Loaded {} cached quotes", batch.len());
        self.replace(batch.clone());
        batch
    }

    /// Fetch `count` quotes concurrently and replace the batch.
    ///
    /// All requests are issued at once and awaited jointly. The batch is
    /// replaced and persisted only when every request succeeds; otherwise the
    /// previous batch stays in place and the notifier is told.
    pub async fn refetch(&self, count: usize) -> Result<Batch> {
        if count == 0 {
            return Err(AppError::validation("refetch count must be > 0"));
        }
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or_else(|| {
            log::warn!("Refetch requested while another is pending");
            AppError::RefetchInProgress
        })?;

        log::info!("Fetching {} quotes from provider", count);
        let results = join_all((0..count).map(|_| self.provider.fetch_one())).await;

        let mut batch = Vec::with_capacity(count);
        let mut failed = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(quote) => batch.push(quote),
                Err(e) => {
                    log::debug!("Quote fetch failed: {}", e);
                    failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(error) = first_error {
            log::error!(
                "Batch fetch failed: {} of {} requests failed ({})",
                failed,
                count,
                error
            );
            self.notifier.error(FETCH_FAILED_MESSAGE);
            return Err(AppError::fetch_failure(count, failed, error));
        }

        self.replace(batch.clone());
        self.store.save(BATCH_KEY, &batch).await;
        log::info!("Cached {} fresh quotes", batch.len());
        Ok(batch)
    }

    /// Load the cached batch, fetching a new one only when it is empty.
    pub async fn ensure_loaded(&self) -> Result<LoadedBatch> {
        let cached = self.load_or_empty().await;
        if !cached.is_empty() {
            return Ok(LoadedBatch {
                batch: cached,
                source: BatchSource::Cache,
            });
        }

        log::info!("Quote cache is empty");
        let batch = self.refetch(self.batch_size).await?;
        Ok(LoadedBatch {
            batch,
            source: BatchSource::Fetched,
        })
    }
}

/// Pick a quote uniformly at random.
pub fn pick_random(batch: &[QuoteRecord]) -> Result<QuoteRecord> {
    pick_random_with(batch, &mut rand::thread_rng())
}

/// Pick a quote uniformly at random using the given generator.
pub fn pick_random_with<R: Rng + ?Sized>(batch: &[QuoteRecord], rng: &mut R) -> Result<QuoteRecord> {
    batch.choose(rng).cloned().ok_or(AppError::EmptyBatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notify::QueuedNotifier;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Semaphore;

    /// Numbered quotes; fails the n-th call when asked to.
    struct CountingProvider {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl CountingProvider {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: Some(call),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for CountingProvider {
        async fn fetch_one(&self) -> Result<QuoteRecord> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(n) {
                return Err(AppError::invalid_quote("boom"));
            }
            Ok(QuoteRecord::new(format!("Quote {n}"), "Author").with_tags(["test"]))
        }
    }

    /// Blocks every fetch until permits are released.
    struct GatedProvider {
        gate: Semaphore,
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl GatedProvider {
        fn new() -> Self {
            Self {
                gate: Semaphore::new(0),
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QuoteProvider for GatedProvider {
        async fn fetch_one(&self) -> Result<QuoteRecord> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| AppError::capability("gate", e))?;
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(QuoteRecord::new("Gated", "Author"))
        }
    }

    fn cache_with(
        provider: Arc<dyn QuoteProvider>,
    ) -> (QuoteBatchCache, PersistentStore, Arc<QueuedNotifier>) {
        let store = PersistentStore::in_memory();
        let notifier = Arc::new(QueuedNotifier::new());
        let cache = QuoteBatchCache::new(store.clone(), provider, notifier.clone());
        (cache, store, notifier)
    }

    #[tokio::test]
    async fn test_load_or_empty_without_data() {
        let (cache, _, _) = cache_with(Arc::new(CountingProvider::ok()));
        assert!(cache.load_or_empty().await.is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_refetch_persists_full_batch() {
        let provider = Arc::new(CountingProvider::ok());
        let (cache, store, notifier) = cache_with(provider.clone());

        let batch = cache.refetch(40).await.unwrap();
        assert_eq!(batch.len(), 40);
        assert_eq!(provider.calls(), 40);
        assert_eq!(cache.batch(), batch);

        let persisted: Option<Batch> = store.load(BATCH_KEY).await;
        assert_eq!(persisted, Some(batch));
        assert!(notifier.drain().is_empty());
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_refetch_failure_keeps_previous_batch() {
        let (cache, store, notifier) = cache_with(Arc::new(CountingProvider::failing_on(7)));
        let previous = vec![QuoteRecord::new("Old", "Timer")];
        store.save(BATCH_KEY, &previous).await;
        cache.load_or_empty().await;

        let err = cache.refetch(10).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::FetchFailure {
                requested: 10,
                failed: 1,
                ..
            }
        ));
        assert_eq!(cache.batch(), previous);
        let persisted: Option<Batch> = store.load(BATCH_KEY).await;
        assert_eq!(persisted, Some(previous));
        assert_eq!(notifier.messages(), vec![FETCH_FAILED_MESSAGE.to_string()]);
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_refetch_zero_rejected() {
        let (cache, _, _) = cache_with(Arc::new(CountingProvider::ok()));
        assert!(matches!(
            cache.refetch(0).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_requests_are_issued_concurrently() {
        let provider = Arc::new(GatedProvider::new());
        let (cache, _, _) = cache_with(provider.clone());

        let mut pending = Box::pin(cache.refetch(8));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        assert_eq!(provider.peak.load(Ordering::SeqCst), 8);

        provider.gate.add_permits(8);
        let batch = pending.await.unwrap();
        assert_eq!(batch.len(), 8);
    }

    #[tokio::test]
    async fn test_overlapping_refetch_rejected() {
        let provider = Arc::new(GatedProvider::new());
        let (cache, _, _) = cache_with(provider.clone());

        let mut first = Box::pin(cache.refetch(3));
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(cache.is_loading());

        let second = cache.refetch(3).await;
        assert!(matches!(second, Err(AppError::RefetchInProgress)));

        provider.gate.add_permits(3);
        assert_eq!(first.await.unwrap().len(), 3);
        assert!(!cache.is_loading());
    }

    #[tokio::test]
    async fn test_cancelled_refetch_releases_flag() {
        let provider = Arc::new(GatedProvider::new());
        let (cache, _, _) = cache_with(provider.clone());

        {
            let mut first = Box::pin(cache.refetch(2));
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert!(cache.is_loading());
        }
        assert!(!cache.is_loading());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_loaded_uses_cache() {
        let provider = Arc::new(CountingProvider::ok());
        let (cache, store, _) = cache_with(provider.clone());
        store.save(BATCH_KEY, &vec![QuoteRecord::new("A", "X")]).await;

        let loaded = cache.ensure_loaded().await.unwrap();
        assert_eq!(loaded.source, BatchSource::Cache);
        assert_eq!(loaded.batch.len(), 1);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_loaded_fetches_when_empty() {
        let provider = Arc::new(CountingProvider::ok());
        let (cache, _, _) = cache_with(provider.clone());
        let cache = cache.with_batch_size(5);

        let loaded = cache.ensure_loaded().await.unwrap();
        assert_eq!(loaded.source, BatchSource::Fetched);
        assert_eq!(loaded.batch.len(), 5);
        assert_eq!(provider.calls(), 5);
    }

    #[test]
    fn test_pick_random_empty() {
        assert!(matches!(pick_random(&[]), Err(AppError::EmptyBatch)));
    }

    #[test]
    fn test_pick_random_covers_batch() {
        let batch: Batch = (0..4)
            .map(|i| QuoteRecord::new(format!("Q{i}"), "A"))
            .collect();
        let mut rng = StdRng::seed_from_u64(7);

        let seen: HashSet<String> = (0..200)
            .map(|_| pick_random_with(&batch, &mut rng).unwrap().content)
            .collect();
        assert_eq!(seen.len(), 4);
    }
}
