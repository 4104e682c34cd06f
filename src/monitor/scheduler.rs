//! Background scheduling of monitor cycles.

use crate::core::{DictionarySnapshot, HotswapDictionary, MonitorSettings};
use crate::error::{DictError, Result};
use crate::monitor::DictionaryMonitor;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::watch;

/// Name of the dedicated worker thread.
pub const WORKER_THREAD_NAME: &str = "dict-monitor";

static GLOBAL: Scheduler = Scheduler::new();

/// Process-wide scheduler.
pub fn global() -> &'static Scheduler {
    &GLOBAL
}

/// Start the process-wide monitor from `settings`, or return the one
/// already running.
///
/// Safe to call from every analyzer/plugin instance: only the first call
/// starts a worker.
///
/// # Errors
///
/// Returns [`DictError::Configuration`] if no location can be resolved.
pub fn init_global(settings: &MonitorSettings) -> Result<Arc<SchedulerHandle>> {
    GLOBAL.initialize_from_settings(settings)
}

/// Runs a [`DictionaryMonitor`] on one dedicated background thread.
///
/// `initialize` is idempotent: however many times it is called, at most one
/// worker is running per scheduler. Cycles are strictly sequential with
/// fixed-delay timing, i.e. the next cycle starts `interval` after the
/// previous one *finished*, so a slow download never causes cycles to pile
/// up.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::prelude::*;
/// use std::time::Duration;
///
/// # fn example() -> Result<()> {
/// let scheduler = Scheduler::new();
/// let handle = scheduler.initialize(Duration::from_secs(20), Duration::from_millis(10), || {
///     DictionaryMonitor::builder()
///         .with_location("https://dict.example.com/polyphone.txt")
///         .build()
/// })?;
///
/// // Tokenizer side
/// let snapshot = handle.get();
///
/// // Plugin unload
/// scheduler.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    active: Mutex<Option<Arc<SchedulerHandle>>>,
}

impl Scheduler {
    /// Create a scheduler with no worker.
    pub const fn new() -> Self {
        Self {
            active: parking_lot::const_mutex(None),
        }
    }

    /// Start the worker unless one is already running.
    ///
    /// `make_monitor` is only invoked when a worker is actually started. A
    /// worker that was told to stop but is still finishing its last cycle
    /// counts as running.
    ///
    /// # Errors
    ///
    /// Propagates errors from `make_monitor` and fails if the worker thread
    /// or its runtime cannot be created. No worker is left running on error.
    pub fn initialize<F>(
        &self,
        interval: Duration,
        initial_delay: Duration,
        make_monitor: F,
    ) -> Result<Arc<SchedulerHandle>>
    where
        F: FnOnce() -> Result<DictionaryMonitor>,
    {
        let mut active = self.active.lock();
        if let Some(handle) = active.as_ref() {
            if handle.is_running() {
                tracing::debug!("dictionary monitor already running");
                return Ok(Arc::clone(handle));
            }
        }

        let monitor = make_monitor()?;
        let handle = Arc::new(SchedulerHandle::spawn(monitor, interval, initial_delay)?);
        *active = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// [`Scheduler::initialize`] with a monitor built from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`DictError::Configuration`] if no location can be resolved.
    pub fn initialize_from_settings(
        &self,
        settings: &MonitorSettings,
    ) -> Result<Arc<SchedulerHandle>> {
        self.initialize(settings.interval(), settings.initial_delay(), || {
            DictionaryMonitor::builder().with_settings(settings).build()
        })
    }

    /// The running worker's handle, if any.
    pub fn handle(&self) -> Option<Arc<SchedulerHandle>> {
        self.active.lock().clone()
    }

    /// Stop the worker, if any. A later `initialize` may start a new one.
    pub fn shutdown(&self) {
        let handle = self.active.lock().take();
        if let Some(handle) = handle {
            handle.shutdown();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running monitor worker.
///
/// Dropping the last handle shuts the worker down.
pub struct SchedulerHandle {
    dictionary: HotswapDictionary,
    source: String,
    cycles: Arc<AtomicU64>,
    exited: Arc<AtomicBool>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

/// Marks the worker as exited when its thread unwinds or returns.
struct ExitGuard(Arc<AtomicBool>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl SchedulerHandle {
    fn spawn(
        monitor: DictionaryMonitor,
        interval: Duration,
        initial_delay: Duration,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let dictionary = monitor.dictionary().clone();
        let source = monitor.source_name();
        let cycles = Arc::new(AtomicU64::new(0));
        let exited = Arc::new(AtomicBool::new(false));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker_cycles = Arc::clone(&cycles);
        let exit_guard = ExitGuard(Arc::clone(&exited));
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _exit_guard = exit_guard;
                runtime.block_on(run_schedule(
                    monitor,
                    interval,
                    initial_delay,
                    shutdown_rx,
                    worker_cycles,
                ));
                drop(runtime);
            })
            .map_err(DictError::Io)?;

        tracing::info!(
            source = %source,
            interval_ms = interval.as_millis() as u64,
            initial_delay_ms = initial_delay.as_millis() as u64,
            "dictionary monitor started"
        );

        Ok(Self {
            dictionary,
            source,
            cycles,
            exited,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// The shared dictionary the worker publishes into.
    pub fn dictionary(&self) -> &HotswapDictionary {
        &self.dictionary
    }

    /// The latest published snapshot. Lock-free.
    pub fn get(&self) -> Arc<DictionarySnapshot> {
        self.dictionary.get()
    }

    /// Name of the polled source.
    pub fn source_name(&self) -> &str {
        &self.source
    }

    /// Number of cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// Whether the worker thread is still alive.
    ///
    /// Stays `true` after a shutdown request until the last cycle has
    /// finished and the thread has exited.
    pub fn is_running(&self) -> bool {
        !self.exited.load(Ordering::SeqCst)
    }

    /// Whether a shutdown has been requested.
    pub fn is_stopping(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Cancel the pending schedule and wait for the worker to exit.
    ///
    /// A cycle already in progress runs to completion; no new cycle starts.
    /// Calling this more than once is harmless. Called from the worker thread
    /// itself (a subscriber callback), it only signals; the thread exits once
    /// the current cycle returns.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let worker = {
            let mut worker = self.worker.lock();
            let on_worker = worker
                .as_ref()
                .is_some_and(|worker| worker.thread().id() == thread::current().id());
            if on_worker {
                return;
            }
            worker.take()
        };

        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!(source = %self.source, "dictionary monitor worker panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_schedule(
    monitor: DictionaryMonitor,
    interval: Duration,
    initial_delay: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
    cycles: Arc<AtomicU64>,
) {
    let monitor = Arc::new(tokio::sync::Mutex::new(monitor));
    let mut delay = initial_delay;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown_rx.changed() => break,
        }
        if *shutdown_rx.borrow() {
            break;
        }

        // Spawned so that a panicking cycle is caught here instead of killing the worker.
        let cycle_monitor = Arc::clone(&monitor);
        let task = tokio::spawn(async move { cycle_monitor.lock().await.run_once().await });
        let result = task.await;
        let cycle = cycles.fetch_add(1, Ordering::SeqCst) + 1;
        match result {
            Err(err) if err.is_panic() => {
                tracing::error!(cycle, error = %err, "dictionary monitor cycle panicked");
            }
            Err(err) => tracing::warn!(cycle, error = %err, "dictionary monitor cycle cancelled"),
            Ok(_) => {}
        }

        delay = interval;
    }

    tracing::info!(cycles = cycles.load(Ordering::SeqCst), "dictionary monitor stopped");
}
