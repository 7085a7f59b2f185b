use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::discovery::{DiscoveryProvider, ProviderError};
use crate::logging;
use crate::model::{Item, Snapshot};

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Result of a forced refresh, reported back to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub success: bool,
    pub timestamp_ms: u64,
    pub error: Option<String>,
}

/// What one refresh produced.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub snapshot: Arc<Snapshot>,
    pub window_error: Option<ProviderError>,
    pub tab_error: Option<ProviderError>,
}

impl RefreshReport {
    pub fn all_failed(&self) -> bool {
        self.window_error.is_some() && self.tab_error.is_some()
    }

    fn error_summary(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.window_error.as_ref().map(|e| format!("windows: {e}")),
            self.tab_error.as_ref().map(|e| format!("tabs: {e}")),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

/// Clears the in-flight flag however the refresh ends.
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Marks one provider call as running. Moves into the provider thread so a call that
/// outlives its refresh keeps the provider busy until it actually returns.
struct ProviderCallGuard {
    busy: Arc<AtomicBool>,
}

impl ProviderCallGuard {
    fn acquire(busy: &Arc<AtomicBool>) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                busy: Arc::clone(busy),
            })
    }
}

impl Drop for ProviderCallGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Windows,
    Tabs,
}

/// Holds the latest inventory snapshot and refreshes it when it goes stale.
pub struct InventoryCache {
    windows: Arc<dyn DiscoveryProvider>,
    tabs: Arc<dyn DiscoveryProvider>,
    clock: Arc<dyn Clock>,
    staleness: Duration,
    provider_timeout: Duration,
    current: RwLock<Arc<Snapshot>>,
    refreshing: AtomicBool,
    windows_busy: Arc<AtomicBool>,
    tabs_busy: Arc<AtomicBool>,
}

impl InventoryCache {
    pub fn new(
        windows: Arc<dyn DiscoveryProvider>,
        tabs: Arc<dyn DiscoveryProvider>,
        staleness: Duration,
        provider_timeout: Duration,
    ) -> Self {
        Self::with_clock(
            windows,
            tabs,
            Arc::new(SystemClock),
            staleness,
            provider_timeout,
        )
    }

    pub fn with_clock(
        windows: Arc<dyn DiscoveryProvider>,
        tabs: Arc<dyn DiscoveryProvider>,
        clock: Arc<dyn Clock>,
        staleness: Duration,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            windows,
            tabs,
            clock,
            staleness,
            provider_timeout,
            current: RwLock::new(Arc::new(Snapshot::empty())),
            refreshing: AtomicBool::new(false),
            windows_busy: Arc::new(AtomicBool::new(false)),
            tabs_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Current snapshot without triggering a refresh.
    pub fn current(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn is_stale(&self, snapshot: &Snapshot) -> bool {
        match snapshot.captured_at_ms {
            None => true,
            Some(at) => {
                self.clock.now_ms().saturating_sub(at) > self.staleness.as_millis() as u64
            }
        }
    }

    /// Returns a fresh-enough snapshot. Callers arriving mid-refresh get the
    /// current one immediately instead of waiting.
    pub fn get(&self) -> Arc<Snapshot> {
        let snapshot = self.current();
        if !self.is_stale(&snapshot) {
            return snapshot;
        }

        match self.try_refresh() {
            Some(report) => report.snapshot,
            None => snapshot,
        }
    }

    pub fn force_refresh(&self) -> RefreshOutcome {
        match self.try_refresh() {
            Some(report) => RefreshOutcome {
                success: !report.all_failed(),
                timestamp_ms: report.snapshot.captured_at_ms.unwrap_or_default(),
                error: report.error_summary(),
            },
            None => RefreshOutcome {
                success: false,
                timestamp_ms: self.current().captured_at_ms.unwrap_or_default(),
                error: Some("refresh already in progress".to_string()),
            },
        }
    }

    /// Runs one refresh unless another is in flight.
    pub fn try_refresh(&self) -> Option<RefreshReport> {
        let _guard = RefreshGuard::acquire(&self.refreshing)?;

        let started = Instant::now();
        let (windows, tabs) = self.collect_all_settled();
        let (window_items, window_error) = split_result(windows);
        let (tab_items, tab_error) = split_result(tabs);

        let snapshot = Arc::new(Snapshot::new(window_items, tab_items, self.clock.now_ms()));
        self.swap(Arc::clone(&snapshot));

        logging::info(&format!(
            "inventory refreshed windows={} tabs={} elapsed_ms={}",
            snapshot.windows.len(),
            snapshot.tabs.len(),
            started.elapsed().as_millis()
        ));

        Some(RefreshReport {
            snapshot,
            window_error,
            tab_error,
        })
    }

    fn swap(&self, snapshot: Arc<Snapshot>) {
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Runs both providers on their own threads and waits for both to settle, or for the
    /// provider timeout. A provider that misses the deadline counts as timed out, and is not
    /// called again until its earlier call returns. One that panics counts as failed.
    fn collect_all_settled(
        &self,
    ) -> (
        Result<Vec<Item>, ProviderError>,
        Result<Vec<Item>, ProviderError>,
    ) {
        let (sender, receiver) = mpsc::channel();
        let mut windows: Option<Result<Vec<Item>, ProviderError>> = None;
        let mut tabs: Option<Result<Vec<Item>, ProviderError>> = None;

        for (source, provider, busy) in [
            (Source::Windows, Arc::clone(&self.windows), &self.windows_busy),
            (Source::Tabs, Arc::clone(&self.tabs), &self.tabs_busy),
        ] {
            let name = provider.provider_name();
            let settled = match ProviderCallGuard::acquire(busy) {
                Some(call) => {
                    let sender = sender.clone();
                    thread::Builder::new()
                        .name(format!("quickhop-{name}"))
                        .spawn(move || {
                            let _call = call;
                            let _ = sender.send((source, provider.discover()));
                        })
                        .err()
                        .map(|error| {
                            Err(ProviderError::new(format!(
                                "failed to start {name} provider: {error}"
                            )))
                        })
                }
                None => {
                    logging::warn(&format!(
                        "{name} provider is still busy with an earlier call; skipping it"
                    ));
                    Some(Err(ProviderError::timeout(format!(
                        "{name} provider is still running an earlier call"
                    ))))
                }
            };
            match source {
                Source::Windows => windows = settled,
                Source::Tabs => tabs = settled,
            }
        }
        drop(sender);

        let deadline = Instant::now() + self.provider_timeout;
        let mut disconnected = false;
        while windows.is_none() || tabs.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok((Source::Windows, result)) => windows = Some(result),
                Ok((Source::Tabs, result)) => tabs = Some(result),
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    logging::warn("inventory refresh hit the provider timeout");
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        let timeout = self.provider_timeout;
        let unsettled = |name: &str| {
            if disconnected {
                Err(ProviderError::new(format!(
                    "{name} provider stopped without a result"
                )))
            } else {
                Err(ProviderError::timeout(format!(
                    "{name} provider did not settle within {}ms",
                    timeout.as_millis()
                )))
            }
        };
        (
            windows.unwrap_or_else(|| unsettled(self.windows.provider_name())),
            tabs.unwrap_or_else(|| unsettled(self.tabs.provider_name())),
        )
    }
}

fn split_result(result: Result<Vec<Item>, ProviderError>) -> (Vec<Item>, Option<ProviderError>) {
    match result {
        Ok(items) => (items, None),
        Err(error) => {
            logging::info(&format!("provider contributed no items: {error}"));
            (Vec::new(), Some(error))
        }
    }
}
