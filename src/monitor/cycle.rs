//! One check-and-maybe-reload cycle.

use crate::core::{DictionarySnapshot, HotswapDictionary, Validate, validate_all};
use crate::error::DictError;
use crate::monitor::MonitorBuilder;
use crate::sources::{ChangeResult, DictionarySource, Validators};
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::MonitorMetrics;

/// How a single cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// The source reported no change.
    NoOp,
    /// A new snapshot was published.
    Reloaded {
        /// Entries in the published snapshot
        entries: usize,
    },
    /// The change check, the download or validation failed. Nothing was touched.
    Failed(DictError),
}

impl CycleOutcome {
    /// Whether a new snapshot was published.
    pub fn is_reloaded(&self) -> bool {
        matches!(self, Self::Reloaded { .. })
    }

    /// Whether the cycle failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Polls one dictionary source and publishes changed content.
///
/// The monitor is the only writer of its [`HotswapDictionary`]. Validators
/// are private to it and only advance after a snapshot has been loaded,
/// validated and published, so a failed download is retried on the next
/// cycle against the same prior validators.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_dict::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let mut monitor = DictionaryMonitor::builder()
///     .with_location("https://dict.example.com/polyphone.txt")
///     .with_initial_snapshot(DictionarySnapshot::parse_str("行=xíng háng\n"))
///     .build()?;
///
/// let dictionary = monitor.dictionary().clone();
/// match monitor.run_once().await {
///     CycleOutcome::Reloaded { entries } => println!("reloaded {} entries", entries),
///     CycleOutcome::NoOp => {}
///     CycleOutcome::Failed(err) => eprintln!("keeping old dictionary: {}", err),
/// }
/// let snapshot = dictionary.get();
/// # Ok(())
/// # }
/// ```
pub struct DictionaryMonitor {
    source: Box<dyn DictionarySource>,
    validators: Validators,
    dictionary: HotswapDictionary,
    checks: Vec<Box<dyn Validate>>,
    #[cfg(feature = "metrics")]
    metrics: Option<MonitorMetrics>,
}

impl DictionaryMonitor {
    /// Create a new builder.
    pub fn builder() -> MonitorBuilder {
        MonitorBuilder::new()
    }

    pub(crate) fn from_parts(
        source: Box<dyn DictionarySource>,
        dictionary: HotswapDictionary,
        checks: Vec<Box<dyn Validate>>,
    ) -> Self {
        Self {
            source,
            validators: Validators::default(),
            dictionary,
            checks,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: MonitorMetrics) -> Self {
        metrics.record_snapshot(&self.dictionary.get());
        self.metrics = Some(metrics);
        self
    }

    /// The shared dictionary this monitor publishes into.
    pub fn dictionary(&self) -> &HotswapDictionary {
        &self.dictionary
    }

    /// Validators committed by the last successful reload.
    pub fn validators(&self) -> &Validators {
        &self.validators
    }

    /// Name of the polled source.
    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Run one cycle: check, and on change load, validate and publish.
    ///
    /// Never returns an error: every failure ends the cycle as
    /// [`CycleOutcome::Failed`] with the dictionary and validators untouched.
    pub async fn run_once(&mut self) -> CycleOutcome {
        let start = Instant::now();
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.start_cycle();
        }

        let outcome = self.cycle().await;
        self.log_outcome(&outcome, start);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(&outcome, start);
            metrics.update_snapshot_age();
        }

        outcome
    }

    async fn cycle(&mut self) -> CycleOutcome {
        let observed = match self.source.check(&self.validators).await {
            ChangeResult::Unchanged => return CycleOutcome::NoOp,
            ChangeResult::Unreachable(err) => return CycleOutcome::Failed(err),
            ChangeResult::Changed(observed) => observed,
        };

        tracing::debug!(
            source = %self.source.name(),
            last_modified = ?observed.last_modified,
            etag = ?observed.etag,
            "dictionary changed, loading"
        );

        let snapshot = match self.source.load().await {
            Ok(snapshot) => snapshot,
            Err(err) => return CycleOutcome::Failed(err),
        };

        if let Err(err) = self.validate(&snapshot) {
            return CycleOutcome::Failed(err);
        }

        let entries = snapshot.len();
        let published = self.dictionary.store(snapshot);
        self.validators = observed;
        self.dictionary.notify(&published);

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_snapshot(&published);
        }

        CycleOutcome::Reloaded { entries }
    }

    fn validate(&self, snapshot: &DictionarySnapshot) -> Result<(), DictError> {
        validate_all(&self.checks, snapshot).map_err(DictError::from)
    }

    fn log_outcome(&self, outcome: &CycleOutcome, start: Instant) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match outcome {
            CycleOutcome::NoOp => {
                tracing::debug!(source = %self.source.name(), elapsed_ms, "dictionary unchanged");
            }
            CycleOutcome::Reloaded { entries } => {
                tracing::info!(
                    source = %self.source.name(),
                    entries,
                    elapsed_ms,
                    "dictionary reloaded"
                );
            }
            CycleOutcome::Failed(err) => {
                tracing::warn!(
                    source = %self.source.name(),
                    error = %err,
                    elapsed_ms,
                    "dictionary reload failed, keeping current snapshot"
                );
            }
        }
    }
}
