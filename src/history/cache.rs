//! Periodically refreshed history cache.

use chrono::{DateTime, Utc};
use crossbeam::channel::{self, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{HistoryIndex, HistoryLookup, HistorySource};
use crate::config::HistoryConfig;
use crate::error::HistoryError;
use crate::models::QuestionId;

/// Concurrent holder of the current [`HistoryIndex`].
///
/// Not ready until the first successful [`refresh`](Self::refresh). Lookups
/// take a shared lock; a refresh takes the exclusive lock only to swap the
/// index pointer.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use u_exam::history::{HistoryExclusionCache, InMemoryHistory, PaperRecord};
///
/// let store = Arc::new(InMemoryHistory::new());
/// store.record(PaperRecord::new("p1", Utc::now(), vec![7, 8]));
///
/// let cache = HistoryExclusionCache::new(store, chrono::Duration::days(730));
/// assert!(!cache.is_ready());
/// cache.refresh().unwrap();
/// assert!(cache.lookup(7));
/// assert!(!cache.lookup(9));
/// ```
pub struct HistoryExclusionCache {
    source: Arc<dyn HistorySource>,
    window: chrono::Duration,
    index: RwLock<Option<Arc<HistoryIndex>>>,
}

impl HistoryExclusionCache {
    /// Creates an empty (not ready) cache.
    pub fn new(source: Arc<dyn HistorySource>, window: chrono::Duration) -> Self {
        Self {
            source,
            window,
            index: RwLock::new(None),
        }
    }

    /// Creates a cache, refreshes it once synchronously, and starts the
    /// background refresher.
    ///
    /// # Errors
    /// Fails if the first refresh fails or the refresher thread cannot start.
    pub fn start(
        source: Arc<dyn HistorySource>,
        config: &HistoryConfig,
    ) -> Result<(Arc<Self>, RefreshHandle), HistoryError> {
        let cache = Arc::new(Self::new(source, config.window()));
        cache.refresh()?;
        let handle = cache.spawn_refresher(config.refresh_interval())?;
        Ok((cache, handle))
    }

    /// Rebuilds the index from the source as of now.
    pub fn refresh(&self) -> Result<usize, HistoryError> {
        self.refresh_at(Utc::now())
    }

    /// Rebuilds the index as of `now`.
    ///
    /// On source failure the previous index stays in place. An index built
    /// for an earlier `now` than the installed one is discarded, so a slow
    /// refresh never replaces a newer snapshot.
    pub fn refresh_at(&self, now: DateTime<Utc>) -> Result<usize, HistoryError> {
        let records = self.source.papers_since(now - self.window)?;
        let index = Arc::new(HistoryIndex::build(&records, now, self.window));
        let count = index.len();

        {
            let mut slot = self.index.write();
            if let Some(current) = slot.as_ref() {
                if current.built_at() > index.built_at() {
                    debug!(
                        event = "history_refresh_stale",
                        built_at = %index.built_at(),
                        current = %current.built_at(),
                    );
                    return Ok(current.len());
                }
            }
            *slot = Some(index);
        }

        info!(
            event = "history_refreshed",
            papers = records.len(),
            questions = count,
        );
        Ok(count)
    }

    /// Whether at least one refresh has completed.
    pub fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    /// Whether the question was used recently. False before the first refresh.
    pub fn lookup(&self, id: QuestionId) -> bool {
        self.index
            .read()
            .as_ref()
            .is_some_and(|index| index.contains(id))
    }

    /// The current index, if any.
    ///
    /// The snapshot stays valid (and unchanged) across later refreshes.
    pub fn snapshot(&self) -> Option<Arc<HistoryIndex>> {
        self.index.read().clone()
    }

    /// Starts a background thread refreshing every `interval`.
    ///
    /// The thread holds only a weak reference and exits once the cache is
    /// dropped or the returned handle is stopped.
    pub fn spawn_refresher(self: &Arc<Self>, interval: Duration) -> Result<RefreshHandle, HistoryError> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);
        let weak: Weak<Self> = Arc::downgrade(self);

        let thread = thread::Builder::new()
            .name("history-refresh".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(cache) = weak.upgrade() else {
                            break;
                        };
                        if let Err(e) = cache.refresh() {
                            warn!(event = "history_refresh_failed", error = %e);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| HistoryError::Spawn(e.to_string()))?;

        debug!(event = "history_refresher_started", interval_ms = interval.as_millis() as u64);
        Ok(RefreshHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

impl HistoryLookup for HistoryExclusionCache {
    fn contains(&self, id: QuestionId) -> bool {
        self.lookup(id)
    }

    fn last_used(&self, id: QuestionId) -> Option<DateTime<Utc>> {
        self.index.read().as_ref().and_then(|index| index.last_used(id))
    }
}

impl std::fmt::Debug for HistoryExclusionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryExclusionCache")
            .field("window_days", &self.window.num_days())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Handle of a running refresher thread. Stops the thread on drop.
#[derive(Debug)]
pub struct RefreshHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// Stops the refresher and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(event = "history_refresher_panicked");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
