//! Scan coordination and the shared retrieval state.
//!
//! [`IndexService`] owns the live index handle, the answer engine built on
//! it, the digest store and the scan lock. Any number of callers may
//! trigger [`IndexService::maybe_rescan`]; at most one scan runs at a time
//! and the others return [`ScanOutcome::Busy`] immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::Config;
use crate::embeddings::create_embedder;
use crate::engine::AnswerEngine;
use crate::generation::{create_generator, GenerativeModel};
use crate::index::{BuildKind, Chunker, ChunkerConfig, IndexBuilder, PdfLoader, VectorIndex};
use crate::server::metrics::{INDEXED_FILES, INDEXED_WINDOWS, REBUILD_DURATION, SCANS_TOTAL};
use crate::server::observability::spans;
use crate::storage::HashStore;
use crate::{Error, Result};

/// How long a chat request waits for the first index.
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one [`IndexService::maybe_rescan`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Another scan holds the lock.
    Busy,
    /// The previous scan is more recent than the scan interval.
    Skipped,
    /// No document changed; the index was kept.
    Unchanged,
    /// The index was rebuilt from the documents.
    Rebuilt,
    /// The persisted index was loaded.
    Loaded,
}

impl ScanOutcome {
    /// Metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Busy => "busy",
            Self::Skipped => "skipped",
            Self::Unchanged => "unchanged",
            Self::Rebuilt => "rebuilt",
            Self::Loaded => "loaded",
        }
    }
}

/// Snapshot of the service state for `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub index_ready: bool,
    pub engine_ready: bool,
    pub indexed_file_count: usize,
    pub last_scan_time: Option<DateTime<Utc>>,
    pub indexed_window_count: usize,
    pub scan_in_progress: bool,
}

#[derive(Default)]
struct LiveState {
    index: Option<Arc<VectorIndex>>,
    engine: Option<Arc<AnswerEngine>>,
}

#[derive(Debug, Clone, Copy)]
struct ScanStamp {
    started: Instant,
    at: DateTime<Utc>,
}

/// Clears the in-progress flag when a scan ends.
struct ScanningFlag<'a>(&'a AtomicBool);

impl<'a> ScanningFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ScanningFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owner of the shared index, answer engine and scan state.
pub struct IndexService {
    builder: IndexBuilder,
    generator: Arc<dyn GenerativeModel>,
    hashes: Arc<HashStore>,
    scan_interval: Duration,
    ready_timeout: Duration,
    state: RwLock<LiveState>,
    last_scan: RwLock<Option<ScanStamp>>,
    scan_lock: Mutex<()>,
    scanning: AtomicBool,
    ready: watch::Sender<bool>,
}

impl IndexService {
    /// Create a service. No scan runs until one is triggered.
    pub fn new(builder: IndexBuilder, generator: Arc<dyn GenerativeModel>, hashes: HashStore) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            builder,
            generator,
            hashes: Arc::new(hashes),
            scan_interval: Duration::from_secs(3600),
            ready_timeout: READY_TIMEOUT,
            state: RwLock::new(LiveState::default()),
            last_scan: RwLock::new(None),
            scan_lock: Mutex::new(()),
            scanning: AtomicBool::new(false),
            ready,
        }
    }

    /// Set the minimum time between executed scans.
    #[must_use]
    pub fn with_scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval = interval;
        self
    }

    /// Set how long chat requests wait for the first index.
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Assemble a service from configuration: providers, PDF loader and
    /// the persisted digest store.
    ///
    /// A digest store that cannot be decoded is replaced by an empty one,
    /// which makes the first scan rebuild.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.provider)?;
        let generator = create_generator(&config.provider)?;

        let hashes = HashStore::load(config.hash_store_path()).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Ignoring unreadable hash store");
            HashStore::empty(config.hash_store_path())
        });

        let chunker = Chunker::new(ChunkerConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        });

        let builder = IndexBuilder::new(
            &config.docs_dir,
            config.index_dir(),
            chunker,
            Arc::new(PdfLoader),
            embedder,
        );

        Ok(Self::new(builder, generator, hashes).with_scan_interval(config.scan_interval))
    }

    /// Minimum time between executed scans.
    #[must_use]
    pub const fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// How long chat requests wait for the first index.
    #[must_use]
    pub const fn ready_timeout(&self) -> Duration {
        self.ready_timeout
    }

    /// Current answer engine, if an index has been built or loaded.
    #[must_use]
    pub fn engine(&self) -> Option<Arc<AnswerEngine>> {
        self.state.read().engine.clone()
    }

    /// Current index handle.
    #[must_use]
    pub fn index(&self) -> Option<Arc<VectorIndex>> {
        self.state.read().index.clone()
    }

    /// Digest store.
    #[must_use]
    pub fn hashes(&self) -> &HashStore {
        &self.hashes
    }

    /// Scan the documents directory and rebuild the index if needed.
    ///
    /// Returns [`ScanOutcome::Busy`] without waiting when another scan is
    /// running. Once an index exists, scans closer together than the scan
    /// interval are skipped. On error the previous index stays live.
    ///
    /// # Errors
    ///
    /// Returns an error if change detection, the build or persisting the
    /// digests fails. A new index is served even if its digests could not
    /// be persisted; the next scan then rebuilds it.
    pub async fn maybe_rescan(&self) -> Result<ScanOutcome> {
        let Ok(_guard) = self.scan_lock.try_lock() else {
            tracing::debug!("Scan already in progress");
            SCANS_TOTAL.with_label_values(&[ScanOutcome::Busy.as_str()]).inc();
            return Ok(ScanOutcome::Busy);
        };
        let _scanning = ScanningFlag::raise(&self.scanning);

        let has_index = self.state.read().index.is_some();
        let last = *self.last_scan.read();

        if has_index && last.is_some_and(|l| l.started.elapsed() < self.scan_interval) {
            tracing::debug!("Scan interval not elapsed, skipping");
            SCANS_TOTAL.with_label_values(&[ScanOutcome::Skipped.as_str()]).inc();
            return Ok(ScanOutcome::Skipped);
        }

        *self.last_scan.write() = Some(ScanStamp {
            started: Instant::now(),
            at: Utc::now(),
        });

        let result = self.scan(has_index).await;
        match &result {
            Ok(outcome) => {
                SCANS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
            }
            Err(e) => {
                tracing::error!(error = %e, "Scan failed, keeping previous index");
                SCANS_TOTAL.with_label_values(&["error"]).inc();
            }
        }
        result
    }

    async fn scan(&self, has_index: bool) -> Result<ScanOutcome> {
        let detector = self.builder.detector().clone();
        let known = self.hashes.snapshot();
        let changes = tokio::task::spawn_blocking(move || detector.detect(&known))
            .await
            .map_err(|e| Error::internal(format!("change detection task failed: {e}")))??;

        let changed = changes.has_changes();
        if !changed && has_index {
            tracing::info!(files = changes.files_seen, "No document changes");
            return Ok(ScanOutcome::Unchanged);
        }

        tracing::info!(
            files = changes.files_seen,
            changed = changes.updated.len(),
            "Updating vector index"
        );

        let timer = REBUILD_DURATION.start_timer();
        let output = self.builder.build_or_load(changed).await?;
        timer.observe_duration();

        self.install(output.index);

        // Digests are applied in memory only once written.
        if changed {
            let hashes = Arc::clone(&self.hashes);
            let updated = changes.updated;
            tokio::task::spawn_blocking(move || hashes.commit(updated))
                .await
                .map_err(|e| Error::internal(format!("hash store save task failed: {e}")))??;
        }

        #[allow(clippy::cast_possible_wrap)]
        let files = self.hashes.len() as i64;
        INDEXED_FILES.set(files);

        Ok(match output.kind {
            BuildKind::Loaded => ScanOutcome::Loaded,
            BuildKind::Rebuilt => ScanOutcome::Rebuilt,
        })
    }

    /// Swap in a new index and an engine over it.
    fn install(&self, index: Arc<VectorIndex>) {
        let engine = Arc::new(AnswerEngine::new(
            Arc::clone(&index),
            Arc::clone(self.builder.embedder()),
            Arc::clone(&self.generator),
        ));

        #[allow(clippy::cast_possible_wrap)]
        let windows = index.len() as i64;
        INDEXED_WINDOWS.set(windows);

        {
            let mut state = self.state.write();
            state.index = Some(index);
            state.engine = Some(engine);
        }

        self.ready.send_replace(true);
        tracing::info!("Answer engine ready");
    }

    /// Wait until an answer engine exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotReady`] if none appears within `timeout`.
    pub async fn wait_until_ready(&self, timeout: Duration) -> Result<Arc<AnswerEngine>> {
        if let Some(engine) = self.engine() {
            return Ok(engine);
        }

        let mut rx = self.ready.subscribe();
        let ready = async {
            loop {
                if *rx.borrow_and_update() {
                    return true;
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        };

        if tokio::time::timeout(timeout, ready).await.unwrap_or(false) {
            if let Some(engine) = self.engine() {
                return Ok(engine);
            }
        }

        Err(Error::not_ready(
            "System is still initializing, please try again shortly",
        ))
    }

    /// Trigger a rescan in the background and log its outcome.
    pub fn spawn_rescan(self: &Arc<Self>, trigger: &'static str) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(
            async move {
                match service.maybe_rescan().await {
                    Ok(outcome) => tracing::debug!(outcome = outcome.as_str(), "Scan finished"),
                    Err(e) => tracing::warn!(error = %e, "Background scan failed"),
                }
            }
            .instrument(spans::scan_span(trigger)),
        )
    }

    /// Rescan immediately, then one scan interval after each scan finishes.
    pub fn run_periodic(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let period = self.scan_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            loop {
                if let Err(e) = service
                    .maybe_rescan()
                    .instrument(spans::scan_span("timer"))
                    .await
                {
                    tracing::warn!(error = %e, "Periodic scan failed");
                }
                tokio::time::sleep(period).await;
            }
        })
    }

    /// Current service state.
    #[must_use]
    pub fn status(&self) -> ServiceStatus {
        let (index_ready, engine_ready, windows) = {
            let state = self.state.read();
            (
                state.index.is_some(),
                state.engine.is_some(),
                state.index.as_ref().map_or(0, |i| i.len()),
            )
        };

        ServiceStatus {
            index_ready,
            engine_ready,
            indexed_file_count: self.hashes.len(),
            last_scan_time: self.last_scan.read().map(|s| s.at),
            indexed_window_count: windows,
            scan_in_progress: self.scanning.load(Ordering::SeqCst),
        }
    }
}

impl std::fmt::Debug for IndexService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexService")
            .field("docs_dir", &self.builder.detector().root())
            .field("scan_interval", &self.scan_interval)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::generation::ExtractiveGenerator;
    use crate::index::PlainTextLoader;
    use std::path::Path;
    use tempfile::TempDir;

    fn service(root: &Path, interval: Duration) -> IndexService {
        let builder = IndexBuilder::new(
            root.join("docs"),
            root.join("embeddings/vector_index"),
            Chunker::default_chunker(),
            Arc::new(PlainTextLoader),
            Arc::new(HashingEmbedder::new()),
        );
        let hashes = HashStore::empty(root.join("embeddings/file_hashes.json"));
        IndexService::new(builder, Arc::new(ExtractiveGenerator), hashes).with_scan_interval(interval)
    }

    fn setup() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("docs")).unwrap();
        std::fs::write(tmp.path().join("docs/a.pdf"), "Paging maps pages to frames.").unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_first_scan_builds() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::ZERO);

        assert!(svc.engine().is_none());
        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Rebuilt);

        let status = svc.status();
        assert!(status.index_ready);
        assert!(status.engine_ready);
        assert_eq!(status.indexed_file_count, 1);
        assert_eq!(status.indexed_window_count, 1);
        assert!(status.last_scan_time.is_some());
        assert!(!status.scan_in_progress);
        assert!(tmp.path().join("embeddings/file_hashes.json").is_file());
    }

    #[tokio::test]
    async fn test_unchanged_second_scan() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::ZERO);
        svc.maybe_rescan().await.unwrap();
        let before = svc.index().unwrap();

        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Unchanged);
        assert!(Arc::ptr_eq(&before, &svc.index().unwrap()));
    }

    #[tokio::test]
    async fn test_interval_skips_once_indexed() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::from_secs(3600));
        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Rebuilt);

        std::fs::write(tmp.path().join("docs/b.pdf"), "New notes.").unwrap();
        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_cold_start_loads_artifact() {
        let tmp = setup();
        let first = service(tmp.path(), Duration::ZERO);
        first.maybe_rescan().await.unwrap();

        let hashes = HashStore::load(tmp.path().join("embeddings/file_hashes.json")).unwrap();
        let builder = IndexBuilder::new(
            tmp.path().join("docs"),
            tmp.path().join("embeddings/vector_index"),
            Chunker::default_chunker(),
            Arc::new(PlainTextLoader),
            Arc::new(HashingEmbedder::new()),
        );
        let restarted = IndexService::new(builder, Arc::new(ExtractiveGenerator), hashes)
            .with_scan_interval(Duration::ZERO);

        assert_eq!(restarted.maybe_rescan().await.unwrap(), ScanOutcome::Loaded);
        assert!(restarted.engine().is_some());
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_index() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::ZERO);
        svc.maybe_rescan().await.unwrap();

        std::fs::remove_dir_all(tmp.path().join("docs")).unwrap();
        assert!(svc.maybe_rescan().await.is_err());
        assert!(svc.engine().is_some());
        assert!(!svc.status().scan_in_progress);
    }

    #[tokio::test]
    async fn test_index_served_when_digest_save_fails() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::ZERO);
        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Rebuilt);

        let hash_file = tmp.path().join("embeddings/file_hashes.json");
        std::fs::remove_file(&hash_file).unwrap();
        std::fs::create_dir(&hash_file).unwrap();
        std::fs::write(tmp.path().join("docs/b.pdf"), "Frames hold pages.").unwrap();

        assert!(svc.maybe_rescan().await.is_err());
        assert_eq!(svc.index().unwrap().len(), 2);
        assert_eq!(svc.hashes().len(), 1);

        std::fs::remove_dir(&hash_file).unwrap();
        assert_eq!(svc.maybe_rescan().await.unwrap(), ScanOutcome::Rebuilt);
        assert_eq!(svc.hashes().len(), 2);
        assert_eq!(svc.index().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_periodic_scans_every_interval() {
        let tmp = setup();
        let svc = Arc::new(service(tmp.path(), Duration::from_secs(1)));
        let timer = svc.run_periodic();

        let mut seen = Vec::new();
        for _ in 0..52 {
            if let Some(at) = svc.status().last_scan_time {
                if seen.last() != Some(&at) {
                    seen.push(at);
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        timer.abort();

        // Scans start at roughly 0 s, 1 s and 2 s.
        assert_eq!(seen.len(), 3, "scan times: {seen:?}");
    }

    #[tokio::test]
    async fn test_wait_until_ready_times_out() {
        let tmp = setup();
        let svc = service(tmp.path(), Duration::ZERO);
        let err = svc
            .wait_until_ready(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotReady(_)));
    }

    #[tokio::test]
    async fn test_wait_until_ready_after_background_scan() {
        let tmp = setup();
        let svc = Arc::new(service(tmp.path(), Duration::ZERO));

        svc.spawn_rescan("test");
        let engine = svc.wait_until_ready(Duration::from_secs(5)).await.unwrap();
        assert_eq!(engine.index().len(), 1);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(ScanOutcome::Busy.as_str(), "busy");
        assert_eq!(ScanOutcome::Loaded.as_str(), "loaded");
    }
}
